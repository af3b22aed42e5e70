//! Composite-key convention
//!
//! Record keys are ordered token sequences joined by [`SEPARATOR`], for example
//! `saml:config:tenant1`. The namespace of a record is its first two tokens
//! rejoined with the same separator, so `saml:config:tenant1` lives in the
//! `saml:config` namespace.
//!
//! ## Contract
//!
//! - Zero separators: the namespace is the whole key
//! - Exactly one separator: the namespace is the key unchanged
//! - Two or more separators: the namespace is a strict prefix of the key
//! - Empty key: rejected with [`Error::MalformedKey`]
//!
//! There is no escaping mechanism. Key producers must not put the separator
//! inside a token; [`compose`] enforces that for keys built through it.

use crate::error::{Error, Result};

/// Token separator for composite keys
pub const SEPARATOR: char = ':';

const SEPARATOR_STR: &str = ":";

/// Maximum key length in bytes accepted on the write path
pub const MAX_KEY_BYTES: usize = 1024;

/// Number of leading tokens that form a namespace
const NAMESPACE_TOKENS: usize = 2;

/// Derive the namespace of a key
///
/// This is the single source of truth the namespace migration depends on.
///
/// # Examples
///
/// ```
/// use fedstore_core::key::derive_namespace;
///
/// assert_eq!(derive_namespace("singleton").unwrap(), "singleton");
/// assert_eq!(derive_namespace("a:b").unwrap(), "a:b");
/// assert_eq!(derive_namespace("saml:config:tenant1").unwrap(), "saml:config");
/// assert!(derive_namespace("").is_err());
/// ```
///
/// # Errors
///
/// Returns [`Error::MalformedKey`] if `key` is empty.
pub fn derive_namespace(key: &str) -> Result<String> {
    CompositeKey::parse(key).map(|k| k.namespace().to_string())
}

/// Validate a key for the store's write path
///
/// Rejects empty keys, keys containing NUL bytes and keys longer than
/// [`MAX_KEY_BYTES`]. Keys already stored are never re-validated.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::malformed_key(key, "key is empty"));
    }

    if key.contains('\x00') {
        return Err(Error::malformed_key(key, "key contains a NUL byte"));
    }

    if key.len() > MAX_KEY_BYTES {
        return Err(Error::malformed_key(
            key,
            format!("key is {} bytes, maximum is {}", key.len(), MAX_KEY_BYTES),
        ));
    }

    Ok(())
}

/// Join tokens into a composite key
///
/// # Errors
///
/// Fails with [`Error::MalformedKey`] when there are no tokens, or a token is
/// empty or contains [`SEPARATOR`].
pub fn compose(tokens: &[&str]) -> Result<String> {
    if tokens.is_empty() {
        return Err(Error::malformed_key("", "no tokens to compose"));
    }

    for token in tokens {
        if token.is_empty() {
            return Err(Error::malformed_key(
                tokens.join(SEPARATOR_STR),
                "empty token",
            ));
        }
        if token.contains(SEPARATOR) {
            return Err(Error::malformed_key(
                *token,
                format!("token contains separator '{}'", SEPARATOR),
            ));
        }
    }

    Ok(tokens.join(SEPARATOR_STR))
}

/// A borrowed, non-empty composite key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompositeKey<'a> {
    raw: &'a str,
}

impl<'a> CompositeKey<'a> {
    /// Parse a key under the composite-key convention
    pub fn parse(raw: &'a str) -> Result<Self> {
        if raw.is_empty() {
            return Err(Error::malformed_key(raw, "key is empty"));
        }
        Ok(Self { raw })
    }

    /// The full key
    #[inline]
    pub fn as_str(&self) -> &'a str {
        self.raw
    }

    /// Tokens in key order
    pub fn tokens(&self) -> impl Iterator<Item = &'a str> {
        self.raw.split(SEPARATOR)
    }

    /// Number of tokens (separators + 1)
    pub fn token_count(&self) -> usize {
        self.raw.matches(SEPARATOR).count() + 1
    }

    /// The namespace: the first two tokens, borrowed from the key
    ///
    /// Equivalent to splitting on the separator, keeping at most two tokens
    /// and rejoining them, but slices instead of allocating.
    pub fn namespace(&self) -> &'a str {
        match self.raw.match_indices(SEPARATOR).nth(NAMESPACE_TOKENS - 1) {
            Some((idx, _)) => &self.raw[..idx],
            None => self.raw,
        }
    }

    /// Whether the namespace drops trailing tokens of the key
    pub fn is_truncated(&self) -> bool {
        self.token_count() > NAMESPACE_TOKENS
    }
}
