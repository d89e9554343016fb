const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Derives a short, stable identifier from arbitrary text.
///
/// This is a 32-bit rolling hash (`h * 31 + unit` over UTF-16 code units)
/// rendered in base 36. It is a debug identifier, not a collision-proof one.
pub fn hash(text: &str) -> String {
    let mut h: i32 = 0;
    for unit in text.encode_utf16() {
        h = h.wrapping_shl(5).wrapping_sub(h).wrapping_add(unit as i32);
    }

    to_base36(h.unsigned_abs())
}

/// The `sourceId` baked into instrumented components.
pub fn source_id(file_identity: &str, component_name: &str) -> String {
    hash(&format!("{}:{}", file_identity, component_name))
}

fn to_base36(mut value: u32) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();

    String::from_utf8_lossy(&digits).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash("/p/src/Button.tsx:Button"), hash("/p/src/Button.tsx:Button"));
    }

    #[test]
    fn test_hash_known_values() {
        assert_eq!(hash(""), "0");
        // 'a' == 97
        assert_eq!(hash("a"), "2p");
        // 97 * 31 + 98 == 3105
        assert_eq!(hash("ab"), "2e9");
    }

    #[test]
    fn test_hash_only_base36_digits() {
        let id = hash("a rather long component identifier that overflows 32 bits");
        assert!(!id.is_empty());
        assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_source_id_distinguishes_components() {
        let button = source_id("/p/src/Button.tsx", "Button");
        let icon = source_id("/p/src/Button.tsx", "ButtonIcon");
        let other_file = source_id("/p/src/Other.tsx", "Button");

        assert_ne!(button, icon);
        assert_ne!(button, other_file);
        assert_eq!(button, hash("/p/src/Button.tsx:Button"));
    }
}
