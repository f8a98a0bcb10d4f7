/// Returns the index of the first occurrence of `needle` in `haystack`.
pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Splits `haystack` on every occurrence of `needle`, returning the pieces
/// between occurrences (excluding the needle itself).
pub fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut result = Vec::new();
    let mut start = 0;
    while start <= haystack.len() {
        if let Some(pos) = find_subsequence(&haystack[start..], needle) {
            result.push(&haystack[start..start + pos]);
            start += pos + needle.len();
        } else {
            result.push(&haystack[start..]);
            break;
        }
    }
    result
}

/// Extracts the boundary token from a Content-Type header value like
/// `multipart/form-data; boundary=----WebKitFormBoundaryXXX`.
///
/// Returns `None` for anything that is not `multipart/form-data`.
pub fn extract_boundary(content_type: &str) -> Option<String> {
    let mut params = content_type.split(';').map(|s| s.trim());
    let mime = params.next()?;
    if !mime.eq_ignore_ascii_case("multipart/form-data") {
        return None;
    }
    params
        .find_map(|s| s.strip_prefix("boundary="))
        .map(|b| b.trim_matches('"').to_owned())
        .filter(|b| !b.is_empty())
}

/// A file part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// The `filename` parameter; empty when the browser sent no file.
    pub filename: String,
    pub data: Vec<u8>,
}

/// Finds the file part whose `name="<field_name>"` matches.
///
/// Parts without a `filename` parameter are plain form fields and are
/// skipped, so a text field called `image` does not count as an upload.
pub fn extract_file_field(body: &[u8], boundary: &str, field_name: &str) -> Option<FilePart> {
    let delimiter = format!("--{}", boundary);
    let parts = split_on(body, delimiter.as_bytes());
    let sep = b"\r\n\r\n";

    for part in parts {
        let Some(sep_pos) = find_subsequence(part, sep) else {
            continue;
        };
        let headers = String::from_utf8_lossy(&part[..sep_pos]);
        let Some(disposition) = content_disposition(&headers) else {
            continue;
        };
        let params = disposition_params(disposition);
        if param(&params, "name") != Some(field_name) {
            continue;
        }
        let filename = param(&params, "filename*")
            .and_then(decode_ext_value)
            .or_else(|| param(&params, "filename").map(str::to_owned));
        if let Some(filename) = filename {
            let raw = &part[sep_pos + sep.len()..];
            let trimmed = raw.strip_suffix(b"\r\n").unwrap_or(raw);
            return Some(FilePart { filename, data: trimmed.to_vec() });
        }
    }
    None
}

/// The value of the `Content-Disposition` header within a part's header block.
fn content_disposition(headers: &str) -> Option<&str> {
    headers.split("\r\n").find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim().eq_ignore_ascii_case("content-disposition").then(|| value.trim())
    })
}

/// Splits the parameters of a disposition into `(lowercase key, value)`
/// pairs. Quoted values are unquoted and may contain `;`.
fn disposition_params(disposition: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut chars = disposition.chars().peekable();

    // Skip the disposition type (`form-data`).
    for c in chars.by_ref() {
        if c == ';' {
            break;
        }
    }

    while chars.peek().is_some() {
        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' || c == ';' {
                break;
            }
            key.push(c);
            chars.next();
        }

        let mut value = String::new();
        if chars.next() == Some('=') {
            while chars.peek().map_or(false, |c| c.is_whitespace()) {
                chars.next();
            }
            if chars.peek() == Some(&'"') {
                chars.next();
                while let Some(c) = chars.next() {
                    match c {
                        '"' => break,
                        '\\' if matches!(chars.peek(), Some('"' | '\\')) => value.extend(chars.next()),
                        _ => value.push(c),
                    }
                }
                for c in chars.by_ref() {
                    if c == ';' {
                        break;
                    }
                }
            } else {
                for c in chars.by_ref() {
                    if c == ';' {
                        break;
                    }
                    value.push(c);
                }
                value = value.trim().to_owned();
            }
        }

        let key = key.trim().to_ascii_lowercase();
        if !key.is_empty() {
            params.push((key, value));
        }
    }
    params
}

fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

/// Decodes an RFC 5987 extended value such as `UTF-8''na%C3%AFve.jpg`.
fn decode_ext_value(value: &str) -> Option<String> {
    let (charset, rest) = value.split_once('\'')?;
    let (_language, encoded) = rest.split_once('\'')?;
    let bytes = urlencoding::decode_binary(encoded.as_bytes());
    if charset.eq_ignore_ascii_case("utf-8") {
        String::from_utf8(bytes.into_owned()).ok()
    } else if charset.eq_ignore_ascii_case("iso-8859-1") {
        Some(bytes.iter().map(|&b| char::from(b)).collect())
    } else {
        None
    }
}

/// Builders for multipart request bodies in tests.
#[cfg(test)]
pub mod testing {
    pub const BOUNDARY: &str = "----FoodFreshBoundary7MA4YWxk";

    pub fn content_type() -> String {
        format!("multipart/form-data; boundary={}", BOUNDARY)
    }

    /// Encodes `(content-disposition, data)` pairs as a form-data body.
    pub fn body(parts: &[(&str, &[u8])]) -> Vec<u8> {
        let mut out = Vec::new();
        for (disposition, data) in parts {
            out.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            out.extend_from_slice(format!("Content-Disposition: {}\r\n", disposition).as_bytes());
            out.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            out.extend_from_slice(data);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        out
    }

    /// A body carrying a single `image` file part.
    pub fn image_upload(filename: &str, data: &[u8]) -> Vec<u8> {
        let disposition = format!("form-data; name=\"image\"; filename=\"{}\"", filename);
        body(&[(disposition.as_str(), data)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::testing::{body, BOUNDARY};

    #[test]
    fn boundary_requires_multipart_form_data() {
        assert_eq!(
            extract_boundary("multipart/form-data; boundary=\"abc\"").as_deref(),
            Some("abc")
        );
        assert_eq!(extract_boundary("application/json; boundary=abc"), None);
        assert_eq!(extract_boundary("multipart/form-data"), None);
        assert_eq!(extract_boundary(""), None);
    }

    #[test]
    fn finds_the_named_file_part() {
        let payload: &[u8] = b"\x89PNG\r\n\r\nbinary\r\nstuff";
        let b = body(&[
            ("form-data; name=\"note\"", b"hello".as_slice()),
            ("form-data; name=\"image\"; filename=\"apple.png\"", payload),
        ]);
        let part = extract_file_field(&b, BOUNDARY, "image").unwrap();
        assert_eq!(part.filename, "apple.png");
        assert_eq!(part.data, payload);
    }

    #[test]
    fn filename_named_like_the_field_is_not_a_match() {
        let b = body(&[("form-data; name=\"photo\"; filename=\"image\"", b"x".as_slice())]);
        assert_eq!(extract_file_field(&b, BOUNDARY, "image"), None);
    }

    #[test]
    fn text_field_is_not_a_file() {
        let b = body(&[("form-data; name=\"image\"", b"not a file".as_slice())]);
        assert_eq!(extract_file_field(&b, BOUNDARY, "image"), None);
    }

    #[test]
    fn empty_filename_is_preserved() {
        let b = body(&[("form-data; name=\"image\"; filename=\"\"", b"".as_slice())]);
        let part = extract_file_field(&b, BOUNDARY, "image").unwrap();
        assert_eq!(part.filename, "");
        assert!(part.data.is_empty());
    }

    #[test]
    fn quoted_values_may_contain_semicolons() {
        let b = body(&[("form-data; name=\"image\"; filename=\"a;b.jpg\"", b"x".as_slice())]);
        let part = extract_file_field(&b, BOUNDARY, "image").unwrap();
        assert_eq!(part.filename, "a;b.jpg");
    }

    #[test]
    fn escaped_quotes_stay_in_the_filename() {
        let params = disposition_params(r#"form-data; name="image"; filename="say \"hi\".png""#);
        assert_eq!(param(&params, "filename"), Some(r#"say "hi".png"#));
        assert_eq!(param(&params, "name"), Some("image"));
    }

    #[test]
    fn extended_filename_is_decoded_and_preferred() {
        let b = body(&[(
            "form-data; name=\"image\"; filename=\"fallback.jpg\"; filename*=UTF-8''na%C3%AFve%20pear.jpg",
            b"x".as_slice(),
        )]);
        let part = extract_file_field(&b, BOUNDARY, "image").unwrap();
        assert_eq!(part.filename, "na\u{ef}ve pear.jpg");

        let b = body(&[("form-data; name=\"image\"; filename*=iso-8859-1'en'caf%E9.png", b"x".as_slice())]);
        assert_eq!(extract_file_field(&b, BOUNDARY, "image").unwrap().filename, "caf\u{e9}.png");
    }
}
