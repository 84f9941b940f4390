//! Resource naming.
//!
//! A resource created without a name takes the last path segment of its URL.
//! If that is taken, `_2`, `_3`, ... up to `_999` are tried in turn.

use thiserror::Error;

use crate::resource::{url_file_name, ResourceStore, StoreError};

/// Highest numeric suffix tried before giving up.
pub const MAX_NAME_SUFFIX: u32 = 999;

#[derive(Debug, Error)]
pub enum NamingError {
    #[error("Cannot derive a resource name from URL '{0}'")]
    NoName(String),

    #[error("Resource name exhausted: '{base}' and '{base}_2' to '{base}_{max}' are all taken")]
    Exhausted { base: String, max: u32 },

    #[error("Resource store error: {0}")]
    Store(#[from] StoreError),
}

/// Base name for a URL: its last path segment, lowercased, with anything
/// outside `[a-z0-9._-]` replaced by `_`.
pub fn base_name(url: &str) -> Option<String> {
    let segment = url_file_name(url)?;
    let name: String = segment
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    Some(name)
}

/// First free name for a resource at `url`.
pub fn suggest_resource_name(store: &dyn ResourceStore, url: &str) -> Result<String, NamingError> {
    let base = base_name(url).ok_or_else(|| NamingError::NoName(url.to_string()))?;
    if !store.name_taken(&base)? {
        return Ok(base);
    }
    for n in 2..=MAX_NAME_SUFFIX {
        let candidate = format!("{}_{}", base, n);
        if !store.name_taken(&candidate)? {
            return Ok(candidate);
        }
    }
    Err(NamingError::Exhausted {
        base,
        max: MAX_NAME_SUFFIX,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryResourceStore;
    use crate::resource::Resource;

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("http://x.org/Sales%20Q1.CSV").as_deref(), Some("sales_20q1.csv"));
        assert_eq!(base_name("http://x.org/data/rows.csv?x=1").as_deref(), Some("rows.csv"));
        assert_eq!(base_name("http://"), None);
    }

    #[test]
    fn test_suffixes() {
        let store = MemoryResourceStore::new();
        assert_eq!(suggest_resource_name(&store, "http://x/a.csv").unwrap(), "a.csv");

        store.insert(Resource::new("1", "p", "u").with_name("a.csv"));
        store.insert(Resource::new("2", "p", "u").with_name("a.csv_2"));
        assert_eq!(suggest_resource_name(&store, "http://x/a.csv").unwrap(), "a.csv_3");
    }

    #[test]
    fn test_exhausted() {
        let store = MemoryResourceStore::new();
        store.insert(Resource::new("0", "p", "u").with_name("a"));
        for n in 2..=MAX_NAME_SUFFIX {
            store.insert(Resource::new(n.to_string(), "p", "u").with_name(format!("a_{}", n)));
        }
        let err = suggest_resource_name(&store, "http://x/a").unwrap_err();
        assert!(matches!(err, NamingError::Exhausted { max: 999, .. }));
        assert!(err.to_string().contains("exhausted"));
    }
}
