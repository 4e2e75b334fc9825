//! Registry token handling.
//!
//! The publish token travels from configuration (or `CARGO_REGISTRY_TOKEN`)
//! to the `cargo` argument list. It is wiped from memory when dropped and
//! never printed through `Debug` or `Display`.

use std::fmt;

use zeroize::Zeroize;

/// Environment variable consulted when the configuration carries no token.
pub const TOKEN_ENV_VAR: &str = "CARGO_REGISTRY_TOKEN";

/// Placeholder substituted for the token in anything shown to humans.
pub const REDACTED: &str = "***";

/// A registry API token that is zeroed on drop.
#[derive(Clone, Default, PartialEq, Eq, Zeroize)]
#[zeroize(drop)]
pub struct RegistryToken {
    value: String,
}

impl RegistryToken {
    /// Create a new token.
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }

    /// Get the raw token.
    ///
    /// Note: only the argument builder should need this.
    pub fn expose(&self) -> &str {
        &self.value
    }

    /// Check if no token was resolved.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Replace every occurrence of the token in `text` with [`REDACTED`].
    pub fn redact(&self, text: &str) -> String {
        if self.value.is_empty() {
            return text.to_string();
        }
        text.replace(&self.value, REDACTED)
    }
}

impl fmt::Debug for RegistryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            write!(f, "RegistryToken(<unset>)")
        } else {
            write!(f, "RegistryToken([REDACTED])")
        }
    }
}

impl fmt::Display for RegistryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_redacted_debug() {
        let token = RegistryToken::new("cio_secret");
        let debug = format!("{:?}", token);
        assert!(!debug.contains("cio_secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_token_redacted_display() {
        let token = RegistryToken::new("cio_secret");
        assert_eq!(token.to_string(), "[REDACTED]");
    }

    #[test]
    fn test_token_expose() {
        let token = RegistryToken::new("cio_secret");
        assert_eq!(token.expose(), "cio_secret");
        assert!(!token.is_empty());
        assert!(RegistryToken::default().is_empty());
    }

    #[test]
    fn test_redact_text() {
        let token = RegistryToken::new("abc123");
        assert_eq!(token.redact("--token abc123 --x abc123"), "--token *** --x ***");
        assert_eq!(RegistryToken::default().redact("--token"), "--token");
    }
}
