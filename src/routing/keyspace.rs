//! Key Namespacer
//!
//! Builds the fully qualified storage key sent to the backend nodes from an
//! application key, a bin name, and an optional site-wide prefix.

// == Key Space ==
/// Builds full keys of the form `[prefix ':'] bin ':' key`, percent-encoded
/// so the result is a safe wire-protocol token (no raw `:` colliding with
/// protocol delimiters, no whitespace).
///
/// The prefix is captured once at construction and fixed for the life of the
/// process; later configuration changes do not affect keys already built.
#[derive(Debug, Clone)]
pub struct KeySpace {
    prefix: Option<String>,
}

impl KeySpace {
    /// Creates a key space with an optional site-wide prefix.
    ///
    /// An empty prefix is treated as no prefix.
    pub fn new(prefix: Option<String>) -> Self {
        Self {
            prefix: prefix.filter(|p| !p.is_empty()),
        }
    }

    /// Builds the full storage key for `key` in `bin`.
    ///
    /// Pure: the same inputs always produce the same output. Empty `key` or
    /// `bin` are accepted and encoded as-is.
    pub fn build_key(&self, key: &str, bin: &str) -> String {
        let raw = match &self.prefix {
            Some(prefix) => format!("{}:{}:{}", prefix, bin, key),
            None => format!("{}:{}", bin, key),
        };
        urlencoding::encode(&raw).into_owned()
    }
}
