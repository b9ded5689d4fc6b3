//! Key validation and the reserved staging-name scheme.
//!
//! A key is a single, non-empty path segment. Names starting with `.` are
//! reserved for staging artifacts (`.<key>.tmp`), so a valid key can never
//! collide with one.

use crate::Error;

/// Prefix of every reserved entry in a store directory.
pub const RESERVED_PREFIX: char = '.';

/// Suffix of staging artifacts.
pub const STAGING_SUFFIX: &str = ".tmp";

/// Longest directory entry name, in bytes, on common filesystems.
pub const MAX_ENTRY_LEN: usize = 255;

/// Longest key, in bytes, whose staging artifact still fits in an entry.
pub const MAX_KEY_LEN: usize = MAX_ENTRY_LEN - 1 - STAGING_SUFFIX.len();

/// Check that `key` can name a document.
///
/// # Examples
///
/// ```rust
/// use dirb_bin_store::validate_key;
///
/// assert!(validate_key("x7Fq-_a").is_ok());
/// assert!(validate_key("a/b").is_err());
/// assert!(validate_key(".hidden").is_err());
/// ```
pub fn validate_key(key: &str) -> Result<(), Error> {
    let reason = if key.is_empty() {
        "empty key"
    } else if key.chars().any(std::path::is_separator) {
        "contains a path separator"
    } else if key.contains('\0') {
        "contains a NUL byte"
    } else if key.starts_with(RESERVED_PREFIX) {
        "leading '.' is reserved"
    } else if key.len() > MAX_KEY_LEN {
        "too long for its staging file name"
    } else {
        return Ok(());
    };

    Err(Error::InvalidKey {
        key: key.to_string(),
        reason,
    })
}

/// The staging artifact name for a (valid) key.
pub fn staging_name(key: &str) -> String {
    format!("{}{}{}", RESERVED_PREFIX, key, STAGING_SUFFIX)
}

/// If `name` is a staging artifact, the key it belongs to.
pub fn staged_key(name: &str) -> Option<&str> {
    let key = name
        .strip_prefix(RESERVED_PREFIX)?
        .strip_suffix(STAGING_SUFFIX)?;
    validate_key(key).ok().map(|_| key)
}

/// True if `name` is in the reserved namespace.
pub fn is_reserved(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn accepts_plain_segments() {
        for key in ["a", "book-1", "x_Y-z", "with space", "ünïcødé", "a.json", "a..b"] {
            assert!(validate_key(key).is_ok(), "{key:?} should be valid");
        }
    }

    #[test]
    fn rejects_unsafe_segments() {
        for key in ["", "a/b", "/", "a/", ".", "..", ".a.tmp", "nul\0byte"] {
            let err = validate_key(key).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidKey, "{key:?}");
        }
    }

    #[cfg(windows)]
    #[test]
    fn rejects_backslash_on_windows() {
        assert!(validate_key("a\\b").is_err());
    }

    #[test]
    fn length_is_bounded_by_staging_name() {
        let longest = "k".repeat(MAX_KEY_LEN);
        assert!(validate_key(&longest).is_ok());
        assert_eq!(staging_name(&longest).len(), MAX_ENTRY_LEN);

        let err = validate_key(&"k".repeat(MAX_KEY_LEN + 1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidKey);

        // Bytes, not chars.
        assert!(validate_key(&"é".repeat(MAX_KEY_LEN / 2 + 1)).is_err());
    }

    #[test]
    fn staging_names_are_reserved() {
        let name = staging_name("abc");
        assert_eq!(name, ".abc.tmp");
        assert!(is_reserved(&name));
        assert!(validate_key(&name).is_err());
        assert_eq!(staged_key(&name), Some("abc"));
    }

    #[test]
    fn staged_key_ignores_other_dotfiles() {
        assert_eq!(staged_key(".gitignore"), None);
        assert_eq!(staged_key(".tmp"), None);
        assert_eq!(staged_key("abc.tmp"), None);
    }
}
