//! Instance key helpers shared by both sides.

/// Separator between an image's base key and its instance counter
pub const INSTANCE_SEPARATOR: &str = "__inst_";

/// `hero__inst_3` → `hero`. Keys without an instance suffix are returned as is.
pub fn base_key(key: &str) -> &str {
    match key.rfind(INSTANCE_SEPARATOR) {
        Some(pos) if is_counter(&key[pos + INSTANCE_SEPARATOR.len()..]) => &key[..pos],
        _ => key,
    }
}

pub fn instance_number(key: &str) -> Option<u32> {
    let pos = key.rfind(INSTANCE_SEPARATOR)?;
    key[pos + INSTANCE_SEPARATOR.len()..].parse().ok()
}

pub fn instance_key(base: &str, n: u32) -> String {
    format!("{}{}{}", base, INSTANCE_SEPARATOR, n)
}

fn is_counter(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
