use crate::AdminError;
use regex::Regex;
use std::sync::LazyLock;

// Letters, digits and hyphens per label; glob characters are accepted here
// and rejected separately by operations that require exact names.
static DOMAIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[a-zA-Z0-9*?](?:[a-zA-Z0-9*?-]{0,61}[a-zA-Z0-9*?])?\.)+[a-zA-Z0-9*?][a-zA-Z0-9*?-]{0,61}[a-zA-Z0-9*?]$",
    )
    .expect("domain pattern compiles")
});

static LABEL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$")
        .expect("label pattern compiles")
});

const TRUE_VALUES: &[&str] = &["t", "true", "y", "yes", "ok", "1"];
const FALSE_VALUES: &[&str] = &["f", "false", "n", "no", "0"];

/// Validate a zone domain. Glob characters are allowed only when `globs` is
/// set (listing and removal filters); mutations require an exact name.
pub fn validate_domain(domain: &str, globs: bool) -> Result<(), AdminError> {
    if domain.is_empty() {
        return Err(AdminError::invalid("missing domain"));
    }
    if !DOMAIN_PATTERN.is_match(domain) {
        return Err(AdminError::invalid(format!(
            "'{domain}' is not a valid domain name"
        )));
    }
    if !globs && domain.contains(['*', '?']) {
        return Err(AdminError::invalid(format!(
            "domain '{domain}' must not contain wildcard characters"
        )));
    }
    Ok(())
}

/// Validate a record label for mutation: `@` (the zone apex) and `*` (the
/// wildcard record) are fine, anything else must be one or more plain
/// labels.
pub fn validate_label(label: &str) -> Result<(), AdminError> {
    if label == "@" || label == "*" || label.is_empty() {
        return Ok(());
    }
    if !LABEL_PATTERN.is_match(label) {
        return Err(AdminError::invalid(format!(
            "'{label}' is not a valid record name"
        )));
    }
    Ok(())
}

/// A name that can be the target of CNAME/NS/MX records.
pub fn validate_target_name(value: &str) -> Result<(), AdminError> {
    if value.is_empty() {
        return Err(AdminError::invalid("missing value"));
    }
    let trimmed = value.strip_suffix('.').unwrap_or(value);
    if trimmed.contains(['*', '?']) || !DOMAIN_PATTERN.is_match(trimmed) {
        return Err(AdminError::invalid(format!(
            "'{value}' is not a valid domain name"
        )));
    }
    Ok(())
}

/// Crack an SRV value of the form `target:port`.
pub fn parse_srv_value(value: &str) -> Result<(String, u16), AdminError> {
    let (target, port) = value.rsplit_once(':').ok_or_else(|| {
        AdminError::invalid(format!("SRV value '{value}' must look like target:port"))
    })?;
    let port: u16 = port
        .parse()
        .map_err(|_| AdminError::invalid(format!("'{port}' is not a valid port number")))?;
    validate_target_name(target)?;
    Ok((target.to_string(), port))
}

/// Parse the tri-state boolean flags (`--enabled`, `--healthy`, `--multi`).
pub fn parse_tristate(value: &str) -> Result<bool, String> {
    let lowered = value.to_ascii_lowercase();
    if TRUE_VALUES.contains(&lowered.as_str()) {
        Ok(true)
    } else if FALSE_VALUES.contains(&lowered.as_str()) {
        Ok(false)
    } else {
        Err(format!("'{value}' is not a boolean value"))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn domains() {
        assert!(validate_domain("example.com", false).is_ok());
        assert!(validate_domain("sub.example.com", false).is_ok());
        assert!(validate_domain("", false).is_err());
        assert!(validate_domain("no-dots", false).is_err());
        assert!(validate_domain("*.example.com", false).is_err());
        assert!(validate_domain("*.example.com", true).is_ok());
    }

    #[test]
    fn labels() {
        assert!(validate_label("@").is_ok());
        assert!(validate_label("*").is_ok());
        assert!(validate_label("web").is_ok());
        assert!(validate_label("a.b").is_ok());
        assert!(validate_label("-bad").is_err());
        assert!(validate_label("ha?").is_err());
    }

    #[test]
    fn srv_values() {
        let (target, port) = parse_srv_value("sip.example.com:5060").unwrap();
        assert_eq!(target, "sip.example.com");
        assert_eq!(port, 5060);
        assert!(parse_srv_value("sip.example.com").is_err());
        assert!(parse_srv_value("sip.example.com:99999").is_err());
        assert!(parse_srv_value("not a name:80").is_err());
    }

    #[test]
    fn tristates() {
        assert_eq!(parse_tristate("yes"), Ok(true));
        assert_eq!(parse_tristate("OK"), Ok(true));
        assert_eq!(parse_tristate("0"), Ok(false));
        assert!(parse_tristate("maybe").is_err());
    }
}
