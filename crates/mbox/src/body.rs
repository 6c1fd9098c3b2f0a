use crate::headers::HeaderMap;
use base64::Engine as _;

/// Pick and decode the readable text of a message body.
///
/// Multipart bodies yield their first `text/plain` part (or the first part
/// when none is plain text). Transfer encodings are decoded; anything that
/// fails to decode is returned as found.
pub fn extract_text(headers: &HeaderMap, body: &str) -> String {
    let is_multipart = headers
        .content_type()
        .is_some_and(|ct| ct.starts_with("multipart/"));
    if is_multipart {
        if let Some(boundary) = headers.content_type_param("boundary") {
            if let Some(text) = first_readable_part(body, &boundary) {
                return text;
            }
        }
    }
    decode_transfer(headers.get("Content-Transfer-Encoding"), body)
}

fn first_readable_part(body: &str, boundary: &str) -> Option<String> {
    let parts = split_parts(body, boundary);
    let mut fallback: Option<String> = None;

    for part in parts {
        let (part_headers, offset) = HeaderMap::parse(part);
        let part_body = &part[offset..];
        let content_type = part_headers
            .content_type()
            .unwrap_or_else(|| "text/plain".to_string());

        if content_type.starts_with("multipart/") {
            if let Some(nested) = part_headers.content_type_param("boundary") {
                if let Some(text) = first_readable_part(part_body, &nested) {
                    return Some(text);
                }
            }
            continue;
        }

        let decoded = decode_transfer(part_headers.get("Content-Transfer-Encoding"), part_body);
        if content_type == "text/plain" {
            return Some(decoded);
        }
        if fallback.is_none() {
            fallback = Some(decoded);
        }
    }

    fallback
}

fn split_parts<'a>(body: &'a str, boundary: &str) -> Vec<&'a str> {
    let delimiter = format!("--{boundary}");
    let closing = format!("--{boundary}--");
    let mut parts = Vec::new();
    let mut current_start: Option<usize> = None;
    let mut offset = 0usize;

    for line in body.split_inclusive('\n') {
        let content = line.trim_end();
        if content == closing {
            if let Some(start) = current_start.take() {
                parts.push(&body[start..offset]);
            }
            return parts;
        }
        if content == delimiter {
            if let Some(start) = current_start {
                parts.push(&body[start..offset]);
            }
            current_start = Some(offset + line.len());
        }
        offset += line.len();
    }

    if let Some(start) = current_start {
        parts.push(&body[start..]);
    }
    parts
}

fn decode_transfer(encoding: Option<&str>, body: &str) -> String {
    match encoding.map(|e| e.trim().to_ascii_lowercase()).as_deref() {
        Some("base64") => decode_base64(body).unwrap_or_else(|| body.to_string()),
        Some("quoted-printable") => decode_quoted_printable(body),
        _ => body.to_string(),
    }
}

fn decode_base64(body: &str) -> Option<String> {
    let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

fn decode_quoted_printable(body: &str) -> String {
    let input = body.as_bytes();
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0usize;

    while i < input.len() {
        let b = input[i];
        if b != b'=' {
            out.push(b);
            i += 1;
            continue;
        }
        // Soft line break.
        if input.get(i + 1) == Some(&b'\n') {
            i += 2;
            continue;
        }
        if input.get(i + 1) == Some(&b'\r') && input.get(i + 2) == Some(&b'\n') {
            i += 3;
            continue;
        }
        let hex = input
            .get(i + 1..i + 3)
            .and_then(|pair| std::str::from_utf8(pair).ok())
            .and_then(|pair| u8::from_str_radix(pair, 16).ok());
        match hex {
            Some(byte) => {
                out.push(byte);
                i += 3;
            }
            None => {
                out.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}
