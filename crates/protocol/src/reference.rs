/// Normalize a Message-ID / In-Reply-To header value.
///
/// The first `<...>` token wins when present, so trailing comments such as
/// `<id@host> (from Bob at 12:00)` still match the referenced Message-ID.
/// Blank values become `None`.
pub fn normalize_reference(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(start) = trimmed.find('<') {
        if let Some(len) = trimmed[start..].find('>') {
            let token = &trimmed[start..=start + len];
            if token.len() > 2 {
                return Some(token.to_string());
            }
        }
    }

    Some(trimmed.split_whitespace().collect::<Vec<_>>().join(" "))
}
