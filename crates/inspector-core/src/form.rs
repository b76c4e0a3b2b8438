//! URL-encoded and multipart form parsing
//!
//! Both parsers work on a borrowed body so the caller keeps the original
//! bytes. Multipart parsing only retains field values and file metadata;
//! file contents are measured and dropped.

use bytes::Bytes;

/// Upper bound on the number of parts accepted in one multipart body
pub const MAX_MULTIPART_PARTS: usize = 1000;

/// Default memory budget for multipart field values: 32MB
pub const DEFAULT_MULTIPART_MAX_MEMORY: usize = 32 << 20;

/// Errors raised while parsing form bodies.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// The url-encoded body could not be decoded.
    #[error("invalid url-encoded form: {0}")]
    UrlEncoded(#[from] serde_urlencoded::de::Error),

    /// The Content-Type header has no `boundary` parameter.
    #[error("missing boundary in Content-Type")]
    MissingBoundary,

    /// The multipart body does not follow the boundary framing.
    #[error("malformed multipart body: {0}")]
    Malformed(&'static str),

    /// Field values exceed the configured memory budget.
    #[error("multipart field values exceed {limit} bytes")]
    TooLarge {
        /// The configured budget in bytes
        limit: usize,
    },

    /// The body holds more parts than [`MAX_MULTIPART_PARTS`].
    #[error("multipart body has more than {0} parts")]
    TooManyParts(usize),
}

/// A parsed `multipart/form-data` body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    /// Non-file fields in body order
    pub values: Vec<(String, String)>,
    /// File fields, metadata only
    pub files: Vec<FilePart>,
}

/// Metadata of an uploaded file part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Form field name
    pub field: String,
    /// Client-supplied file name
    pub file_name: String,
    /// Part content type, if declared
    pub content_type: Option<String>,
    /// Size of the part body in bytes
    pub size: usize,
}

/// Decode an `application/x-www-form-urlencoded` payload (or query string).
///
/// Repeated keys are kept in order.
pub fn parse_urlencoded(input: &[u8]) -> Result<Vec<(String, String)>, FormError> {
    Ok(serde_urlencoded::from_bytes::<Vec<(String, String)>>(input)?)
}

/// Extract the `boundary` parameter from a multipart Content-Type value.
pub fn extract_boundary(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let part = part.trim();
        let (key, value) = part.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("boundary") {
            let boundary = value.trim().trim_matches('"');
            (!boundary.is_empty()).then(|| boundary.to_string())
        } else {
            None
        }
    })
}

/// Parse a `multipart/form-data` body framed by `boundary`.
///
/// Field values count against `max_memory`; exceeding it fails the whole
/// parse. File parts never count since their bytes are not retained.
pub fn parse_multipart(
    body: &Bytes,
    boundary: &str,
    max_memory: usize,
) -> Result<MultipartForm, FormError> {
    let delimiter = format!("--{}", boundary).into_bytes();
    let mut form = MultipartForm::default();
    let mut value_bytes = 0usize;
    let mut parts = 0usize;

    let mut pos = find_delimiter(body, &delimiter, 0)
        .ok_or(FormError::Malformed("missing opening boundary"))?
        + delimiter.len();

    loop {
        let rest = &body[pos..];
        if rest.starts_with(b"--") {
            break;
        }
        pos += if rest.starts_with(b"\r\n") { 2 } else { 1 };

        let next = find_delimiter(body, &delimiter, pos)
            .ok_or(FormError::Malformed("unterminated part"))?;
        let part = trim_line_end(&body[pos..next]);

        parts += 1;
        if parts > MAX_MULTIPART_PARTS {
            return Err(FormError::TooManyParts(MAX_MULTIPART_PARTS));
        }

        let (headers, data) = split_part(part);
        let headers = parse_part_headers(headers);

        if let Some(field) = headers.name {
            match headers.file_name.filter(|f| !f.is_empty()) {
                Some(file_name) => form.files.push(FilePart {
                    field,
                    file_name,
                    content_type: headers.content_type,
                    size: data.len(),
                }),
                None => {
                    value_bytes += data.len();
                    if value_bytes > max_memory {
                        return Err(FormError::TooLarge { limit: max_memory });
                    }
                    form.values
                        .push((field, String::from_utf8_lossy(data).into_owned()));
                }
            }
        }

        pos = next + delimiter.len();
    }

    Ok(form)
}

#[derive(Default)]
struct PartHeaders {
    name: Option<String>,
    file_name: Option<String>,
    content_type: Option<String>,
}

fn parse_part_headers(raw: &[u8]) -> PartHeaders {
    let mut headers = PartHeaders::default();
    let raw = String::from_utf8_lossy(raw);

    for line in raw.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        if key.trim().eq_ignore_ascii_case("content-disposition") {
            for param in value.split(';') {
                let param = param.trim();
                if let Some(name) = param.strip_prefix("name=") {
                    headers.name = Some(name.trim_matches('"').to_string());
                } else if let Some(file_name) = param.strip_prefix("filename=") {
                    headers.file_name = Some(file_name.trim_matches('"').to_string());
                }
            }
        } else if key.trim().eq_ignore_ascii_case("content-type") {
            headers.content_type = Some(value.to_string());
        }
    }

    headers
}

/// Split a part into its header block and body at the first blank line.
fn split_part(part: &[u8]) -> (&[u8], &[u8]) {
    if part.starts_with(b"\r\n") {
        return (&[], &part[2..]);
    }
    if let Some(i) = find(part, b"\r\n\r\n", 0) {
        return (&part[..i], &part[i + 4..]);
    }
    if let Some(i) = find(part, b"\n\n", 0) {
        return (&part[..i], &part[i + 2..]);
    }
    (part, &[])
}

fn trim_line_end(data: &[u8]) -> &[u8] {
    data.strip_suffix(b"\r\n")
        .or_else(|| data.strip_suffix(b"\n"))
        .unwrap_or(data)
}

/// Find the next delimiter line at or after `from`.
///
/// A delimiter starts a line and is followed by `--` or a line break, so
/// the same text inside a field value is not mistaken for framing.
fn find_delimiter(body: &[u8], delimiter: &[u8], mut from: usize) -> Option<usize> {
    loop {
        let at = find(body, delimiter, from)?;
        let line_start = at == 0 || body[at - 1] == b'\n';
        let tail = &body[at + delimiter.len()..];
        let closes_line =
            tail.starts_with(b"--") || tail.starts_with(b"\r\n") || tail.starts_with(b"\n");
        if line_start && closes_line {
            return Some(at);
        }
        from = at + 1;
    }
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() || needle.is_empty() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_body() -> Bytes {
        Bytes::from_static(
            b"--XyZ\r\n\
Content-Disposition: form-data; name=\"title\"\r\n\
\r\n\
hello world\r\n\
--XyZ\r\n\
Content-Disposition: form-data; name=\"tag\"\r\n\
\r\n\
a\r\n\
--XyZ\r\n\
Content-Disposition: form-data; name=\"tag\"\r\n\
\r\n\
b\r\n\
--XyZ\r\n\
Content-Disposition: form-data; name=\"upload\"; filename=\"notes.txt\"\r\n\
Content-Type: text/plain\r\n\
\r\n\
0123456789\r\n\
--XyZ--\r\n",
        )
    }

    #[test]
    fn test_parse_urlencoded_keeps_duplicates() {
        let pairs = parse_urlencoded(b"a=1&b=two+words&a=3").unwrap();
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "two words".to_string()),
                ("a".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_extract_boundary() {
        assert_eq!(
            extract_boundary("multipart/form-data; boundary=XyZ"),
            Some("XyZ".to_string())
        );
        assert_eq!(
            extract_boundary("multipart/form-data; boundary=\"quoted\""),
            Some("quoted".to_string())
        );
        assert_eq!(extract_boundary("multipart/form-data"), None);
    }

    #[test]
    fn test_parse_multipart_values_and_files() {
        let form = parse_multipart(&sample_body(), "XyZ", DEFAULT_MULTIPART_MAX_MEMORY).unwrap();

        assert_eq!(
            form.values,
            vec![
                ("title".to_string(), "hello world".to_string()),
                ("tag".to_string(), "a".to_string()),
                ("tag".to_string(), "b".to_string()),
            ]
        );
        assert_eq!(
            form.files,
            vec![FilePart {
                field: "upload".to_string(),
                file_name: "notes.txt".to_string(),
                content_type: Some("text/plain".to_string()),
                size: 10,
            }]
        );
    }

    #[test]
    fn test_parse_multipart_memory_limit() {
        // "hello world" alone is 11 bytes
        let err = parse_multipart(&sample_body(), "XyZ", 8).unwrap_err();
        assert!(matches!(err, FormError::TooLarge { limit: 8 }));
    }

    #[test]
    fn test_file_parts_do_not_count_against_limit() {
        let body = Bytes::from_static(
            b"--b\r\nContent-Disposition: form-data; name=\"f\"; filename=\"big.bin\"\r\n\r\n\
0123456789abcdef\r\n--b--\r\n",
        );
        let form = parse_multipart(&body, "b", 4).unwrap();
        assert_eq!(form.files[0].size, 16);
        assert!(form.values.is_empty());
    }

    #[test]
    fn test_boundary_text_inside_values() {
        let body = Bytes::from_static(
            b"--B\r\n\
Content-Disposition: form-data; name=\"note\"\r\n\
\r\n\
see --Bob\r\n\
--B\r\n\
Content-Disposition: form-data; name=\"path\"\r\n\
\r\n\
--Bin/x\r\n\
--B--\r\n",
        );
        let form = parse_multipart(&body, "B", 1024).unwrap();
        assert_eq!(
            form.values,
            vec![
                ("note".to_string(), "see --Bob".to_string()),
                ("path".to_string(), "--Bin/x".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_multipart_malformed() {
        let body = Bytes::from_static(b"no boundary here");
        assert!(matches!(
            parse_multipart(&body, "XyZ", 1024),
            Err(FormError::Malformed(_))
        ));

        let body = Bytes::from_static(b"--XyZ\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nvalue");
        assert!(matches!(
            parse_multipart(&body, "XyZ", 1024),
            Err(FormError::Malformed("unterminated part"))
        ));
    }
}
