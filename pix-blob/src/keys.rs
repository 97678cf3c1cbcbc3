//! Key conventions for original and derived objects.
//!
//! Originals are uploaded under `original/<asset-id>/<filename>` so
//! the asset id travels inside the key itself; derivatives land at the
//! deterministic key obtained by substituting the namespace and
//! prefixing the filename. The derived key of
//! `original/42/cat.jpg` is `derived/42/preview_cat.jpg`.

/// Namespace segment for uploaded originals.
pub const ORIGINAL_PREFIX: &str = "original/";

/// Namespace segment for pipeline output. Never reprocessed.
pub const DERIVED_PREFIX: &str = "derived/";

/// Filename marker for derivatives.
pub const DERIVED_MARKER: &str = "preview_";

/// Strategy for generating and interpreting object keys.
pub trait KeyStrategy: Send + Sync {
    /// Key for a freshly uploaded original.
    fn original_key(&self, asset_id: &str, filename: &str) -> String;

    /// Deterministic derivative key for an original key, or `None`
    /// when the key is not under the original namespace.
    fn derived_key(&self, original_key: &str) -> Option<String>;

    /// The correlation id embedded in a key's directory segment, if
    /// the upload convention put one there.
    fn correlation_id<'a>(&self, key: &'a str) -> Option<&'a str>;

    fn is_original(&self, key: &str) -> bool {
        key.starts_with(ORIGINAL_PREFIX)
    }

    fn is_derived(&self, key: &str) -> bool {
        key.starts_with(DERIVED_PREFIX)
    }
}

/// Default key strategy: `original/<asset-id>/<filename>`.
#[derive(Debug, Clone, Default)]
pub struct DefaultKeyStrategy;

impl KeyStrategy for DefaultKeyStrategy {
    fn original_key(&self, asset_id: &str, filename: &str) -> String {
        format!("{ORIGINAL_PREFIX}{asset_id}/{filename}")
    }

    fn derived_key(&self, original_key: &str) -> Option<String> {
        let rest = original_key.strip_prefix(ORIGINAL_PREFIX)?;
        let (dir, filename) = match rest.rsplit_once('/') {
            Some((dir, filename)) => (Some(dir), filename),
            None => (None, rest),
        };
        if filename.is_empty() {
            return None;
        }
        let mut key = String::from(DERIVED_PREFIX);
        if let Some(dir) = dir {
            key.push_str(dir);
            key.push('/');
        }
        key.push_str(DERIVED_MARKER);
        key.push_str(filename);
        Some(key)
    }

    fn correlation_id<'a>(&self, key: &'a str) -> Option<&'a str> {
        let rest = key
            .strip_prefix(ORIGINAL_PREFIX)
            .or_else(|| key.strip_prefix(DERIVED_PREFIX))?;
        let (dir, _) = rest.rsplit_once('/')?;
        // Only a flat directory segment is a correlation id.
        if dir.is_empty() || dir.contains('/') {
            return None;
        }
        Some(dir)
    }
}

/// Filename component of a key.
pub fn file_name(key: &str) -> &str {
    key.rsplit_once('/').map(|(_, f)| f).unwrap_or(key)
}
