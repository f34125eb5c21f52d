/// The label stored in place of `*`. The literal `*` would collide with the
/// store's own pattern syntax in KEYS scans.
pub const WILDCARD_LABEL: &str = "$";

/// Derive the storage key for a (domain, label) pair. Keys are always lower
/// cased; lookups are case insensitive.
pub fn record_key(domain: &str, label: &str) -> String {
    let domain = domain.to_ascii_lowercase();
    let label = label.to_ascii_lowercase();
    if label.is_empty() || label == "@" {
        domain
    } else if label == "*" {
        format!("{WILDCARD_LABEL}.{domain}")
    } else {
        format!("{label}.{domain}")
    }
}

/// The human-facing form of a storage key: the wildcard escape reads back
/// as `*.`.
pub fn display_key(key: &str) -> String {
    match key.strip_prefix("$.") {
        Some(rest) => format!("*.{rest}"),
        None => key.to_string(),
    }
}

/// KEYS pattern matching every record below a zone (the bare zone key
/// itself is not covered and must be checked separately).
pub fn zone_members_pattern(domain: &str) -> String {
    format!("*.{}", domain.to_ascii_lowercase())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn key_shapes() {
        assert_eq!(record_key("example.com", "@"), "example.com");
        assert_eq!(record_key("example.com", ""), "example.com");
        assert_eq!(record_key("example.com", "*"), "$.example.com");
        assert_eq!(record_key("example.com", "web"), "web.example.com");
    }

    #[test]
    fn keys_are_lowercased() {
        assert_eq!(record_key("Example.COM", "Web"), "web.example.com");
        assert_eq!(record_key("EXAMPLE.com", "*"), "$.example.com");
    }

    #[test]
    fn display_restores_the_wildcard() {
        assert_eq!(display_key("$.example.com"), "*.example.com");
        assert_eq!(display_key("web.example.com"), "web.example.com");
    }
}
