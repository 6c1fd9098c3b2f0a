use crate::error::{IdentityError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Replaces everything between the first two and the last character of a
/// local part.
pub const MASK: &str = "***";

static DISPLAY_AND_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*)<([^<>]+)>").expect("display regex"));

static EMBEDDED_ADDRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9.\-+_]+@[A-Za-z0-9.\-+_]+\.[A-Za-z]+").expect("address regex")
});

static SEPARATOR_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[<>().\s]+").expect("separator regex"));

static NON_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]+").expect("token regex"));

/// Mask a bare `local@domain` address: `john.doe@example.com` becomes
/// `jo***e@example.com`.
pub fn mask_email(address: &str) -> Result<String> {
    let address = address.trim();
    let (local, domain) = address
        .split_once('@')
        .ok_or_else(|| IdentityError::malformed(address))?;
    if local.is_empty() || domain.is_empty() {
        return Err(IdentityError::malformed(address));
    }

    let chars: Vec<char> = local.chars().collect();
    let head: String = chars.iter().take(2).collect();
    let tail = chars[chars.len() - 1];
    Ok(format!("{head}{MASK}{tail}@{domain}"))
}

/// The address portion of a From header: the `<...>` content when present,
/// otherwise the whole trimmed value.
pub fn address_part(raw_from: &str) -> &str {
    match DISPLAY_AND_ADDRESS.captures(raw_from) {
        Some(caps) => caps.get(2).map_or(raw_from.trim(), |m| m.as_str().trim()),
        None => raw_from.trim(),
    }
}

/// Masked display form of a From header, display name kept verbatim.
pub fn mask_address(raw_from: &str) -> Result<String> {
    mask_address_with(raw_from, "@")
}

/// Like [`mask_address`] but with `@` rendered as `at`.
pub fn mask_address_with(raw_from: &str, at: &str) -> Result<String> {
    if let Some(caps) = DISPLAY_AND_ADDRESS.captures(raw_from) {
        let name = caps.get(1).map_or("", |m| m.as_str());
        let address = caps.get(2).map_or("", |m| m.as_str());
        let masked = mask_email(address)?.replace('@', at);
        return Ok(format!("{name}<{masked}>"));
    }
    Ok(mask_email(raw_from)?.replace('@', at))
}

/// Opaque, lower-case, filesystem-safe token for a sender.
pub fn derive_identity(raw_from: &str) -> Result<String> {
    let masked = mask_email(address_part(raw_from))?;
    let token = masked.replace('*', "_").replace('@', "_at_");
    let token = SEPARATOR_RUNS.replace_all(&token, "_");
    let token = NON_TOKEN.replace_all(&token, "");
    Ok(token.to_lowercase())
}

/// Mask every address-looking substring of free text.
pub fn mask_all_emails(text: &str) -> String {
    let mut found: Vec<&str> = EMBEDDED_ADDRESS
        .find_iter(text)
        .map(|m| m.as_str())
        .collect();
    // Longest first so a short address never clobbers part of a longer one.
    found.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    found.dedup();

    let mut out = text.to_string();
    for address in found {
        if let Ok(masked) = mask_email(address) {
            out = out.replace(address, &masked);
        }
    }
    out
}
