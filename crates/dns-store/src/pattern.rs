//! Glob patterns (`*` and `?`) as used by KEYS scans and administrative
//! filters, translated to anchored regular expressions for client-side
//! matching.

use regex::Regex;

/// Whether the string uses glob syntax at all.
pub fn is_glob(s: &str) -> bool {
    s.contains(['*', '?'])
}

/// Translate one glob into regex text (unanchored).
pub fn glob_to_regex_text(glob: &str) -> String {
    let mut pattern = String::new();
    for ch in glob.chars() {
        match ch {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            other => pattern.push_str(&regex::escape(&other.to_string())),
        }
    }
    pattern
}

/// Compile a set of globs into one anchored alternation. A candidate
/// matches when any of the globs matches it entirely.
pub fn compile_globs(globs: &[String]) -> Result<Regex, regex::Error> {
    let alternation = globs
        .iter()
        .map(|g| glob_to_regex_text(g))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("^(?:{alternation})$"))
}

/// Match a single glob against a candidate, for stores that have to apply
/// KEYS semantics themselves.
pub fn glob_matches(glob: &str, candidate: &str) -> bool {
    match compile_globs(&[glob.to_string()]) {
        Ok(re) => re.is_match(candidate),
        Err(_) => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn literal_text_is_escaped() {
        assert!(glob_matches("web.example.com", "web.example.com"));
        assert!(!glob_matches("web.example.com", "webxexample.com"));
    }

    #[test]
    fn star_spans_labels() {
        assert!(glob_matches("*.example.com", "a.b.example.com"));
        assert!(glob_matches("*.example.com", "$.example.com"));
        assert!(!glob_matches("*.example.com", "example.com"));
    }

    #[test]
    fn question_mark_matches_one_character() {
        assert!(glob_matches("we?.example.com", "web.example.com"));
        assert!(!glob_matches("we?.example.com", "weeb.example.com"));
    }

    #[test]
    fn matches_are_anchored() {
        assert!(!glob_matches("example.com", "bad-example.com"));
        assert!(!glob_matches("example.com", "example.com.evil"));
    }

    #[test]
    fn alternation_over_several_globs() {
        let re = compile_globs(&["*.a.com".to_string(), "*.b.com".to_string()]).unwrap();
        assert!(re.is_match("x.a.com"));
        assert!(re.is_match("y.b.com"));
        assert!(!re.is_match("z.c.com"));
    }
}
