//! Storage key layout for named collections
//!
//! Key construction is a pure function so every caller derives the same key
//! for the same name. `/` is reserved as the key separator; names containing
//! it (or blank names) are rejected up front rather than escaped.

use crate::error::{MixtapeError, Result};

/// Key holding the JSON array of known collection names
pub const REGISTRY_KEY: &str = "playlists.index";

/// Prefix under which each named collection is stored
pub const COLLECTION_PREFIX: &str = "playlist/";

/// Separator reserved inside keys
pub const SEPARATOR: char = '/';

/// Check that a collection name is usable in a key
///
/// # Errors
///
/// Returns `MixtapeError::InvalidName` if the name is blank or contains the
/// reserved separator.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(MixtapeError::InvalidName("name must not be blank".to_string()).into());
    }
    if name.contains(SEPARATOR) {
        return Err(MixtapeError::InvalidName(format!(
            "name must not contain '{}': {}",
            SEPARATOR, name
        ))
        .into());
    }
    Ok(())
}

/// Derive the storage key for a collection name
///
/// # Errors
///
/// Returns `MixtapeError::InvalidName` if the name is blank or contains the
/// reserved separator.
///
/// # Examples
///
/// ```
/// use mixtape::collections::keys::collection_key;
///
/// assert_eq!(collection_key("road-trip").unwrap(), "playlist/road-trip");
/// assert!(collection_key("a/b").is_err());
/// ```
pub fn collection_key(name: &str) -> Result<String> {
    validate_name(name)?;
    Ok(format!("{}{}", COLLECTION_PREFIX, name))
}

/// Recover the collection name from a storage key
///
/// Returns `None` for keys outside the collection prefix (the registry key,
/// settings keys, and anything else sharing the store).
pub fn name_from_key(key: &str) -> Option<&str> {
    key.strip_prefix(COLLECTION_PREFIX)
}
