//! Mirror target resolution
//!
//! Users paste full links, bare resource keys, or typed names
//! interchangeably, so the identifier goes through a tiered fallback:
//!
//! 1. A `/d/<key>` path segment in the string yields the key directly.
//! 2. A long bare token (over 20 chars, no whitespace, not a URL) is
//!    treated as a raw key.
//! 3. Anything that looks like a URL is used as-is.
//! 4. Everything else is a human-readable name to open-or-create.

/// A resolved remote-mirror identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorTarget {
    /// A raw resource key
    Key(String),
    /// A full URL to look up
    Url(String),
    /// A human-readable sheet name (open, or create on upload)
    Name(String),
}

impl MirrorTarget {
    /// Resolve a free-form identifier string
    pub fn resolve(input: &str) -> MirrorTarget {
        let input = input.trim();

        if let Some(key) = extract_path_key(input) {
            return MirrorTarget::Key(key);
        }

        let is_url = looks_like_url(input);
        if input.len() > 20 && !input.chars().any(char::is_whitespace) && !is_url {
            return MirrorTarget::Key(input.to_string());
        }

        if is_url {
            return MirrorTarget::Url(input.to_string());
        }

        MirrorTarget::Name(input.to_string())
    }

    /// Short description of what the target resolves to
    pub fn describe(&self) -> String {
        match self {
            MirrorTarget::Key(key) => format!("key {}", key),
            MirrorTarget::Url(url) => format!("url {}", url),
            MirrorTarget::Name(name) => format!("name '{}'", name),
        }
    }
}

/// Extract a resource key from a `/d/<key>` path segment, if present
fn extract_path_key(input: &str) -> Option<String> {
    let start = input.find("/d/")? + 3;
    let rest = &input[start..];
    let end = rest
        .find(|c| c == '/' || c == '?' || c == '#')
        .unwrap_or(rest.len());
    let key = &rest[..end];
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}

fn looks_like_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://") || input.contains("://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_with_path_key() {
        assert_eq!(
            MirrorTarget::resolve("https://mirror.example/d/ABC123/edit"),
            MirrorTarget::Key("ABC123".to_string())
        );
    }

    #[test]
    fn test_url_with_key_and_query() {
        assert_eq!(
            MirrorTarget::resolve("https://mirror.example/d/ABC123?gid=779517247"),
            MirrorTarget::Key("ABC123".to_string())
        );
        assert_eq!(
            MirrorTarget::resolve("https://mirror.example/d/ABC123"),
            MirrorTarget::Key("ABC123".to_string())
        );
    }

    #[test]
    fn test_long_bare_token_is_key() {
        assert_eq!(
            MirrorTarget::resolve("ABC123XYZ0123456789AB"),
            MirrorTarget::Key("ABC123XYZ0123456789AB".to_string())
        );
    }

    #[test]
    fn test_short_token_is_name() {
        assert_eq!(
            MirrorTarget::resolve("ABC123"),
            MirrorTarget::Name("ABC123".to_string())
        );
    }

    #[test]
    fn test_url_without_key_passes_through() {
        assert_eq!(
            MirrorTarget::resolve("https://mirror.example/view/weekly"),
            MirrorTarget::Url("https://mirror.example/view/weekly".to_string())
        );
    }

    #[test]
    fn test_name_with_spaces() {
        assert_eq!(
            MirrorTarget::resolve("Weekly Report"),
            MirrorTarget::Name("Weekly Report".to_string())
        );
        // Long, but whitespace keeps it a name
        assert_eq!(
            MirrorTarget::resolve("District Registry Mirror 2026"),
            MirrorTarget::Name("District Registry Mirror 2026".to_string())
        );
    }

    #[test]
    fn test_input_is_trimmed() {
        assert_eq!(
            MirrorTarget::resolve("  Weekly Report \n"),
            MirrorTarget::Name("Weekly Report".to_string())
        );
    }
}
