//! Error types shared by the cache crates.

use thiserror::Error;

/// Call arguments that cannot be turned into a cache key.
///
/// Raised before the cache state is touched: a failed key derivation never
/// counts as a hit or a miss.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum KeyError {
    /// NaN is not equal to itself and would never produce a hit.
    #[error("unusable cache key: NaN argument of type `{type_name}`")]
    NotANumber { type_name: &'static str },

    /// A custom [`CacheableKey`](crate::CacheableKey) implementation refused
    /// to produce a key.
    #[error("unusable cache key: unhashable argument of type `{type_name}`: {reason}")]
    Unhashable {
        type_name: &'static str,
        reason: String,
    },
}

impl KeyError {
    /// Builds an [`KeyError::Unhashable`] for values of type `T`.
    pub fn unhashable<T: ?Sized>(reason: impl Into<String>) -> Self {
        KeyError::Unhashable {
            type_name: std::any::type_name::<T>(),
            reason: reason.into(),
        }
    }
}

/// Failure surfaced by a cached call.
///
/// `E` is the wrapped function's own error type; it reaches every caller that
/// shared the failed computation unchanged.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum CacheError<E> {
    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("cached computation failed: {0}")]
    Computation(E),
}

impl<E> CacheError<E> {
    /// Returns the wrapped function's error, if this is one.
    pub fn into_computation(self) -> Option<E> {
        match self {
            CacheError::Computation(err) => Some(err),
            CacheError::Key(_) => None,
        }
    }

    pub fn is_key_error(&self) -> bool {
        matches!(self, CacheError::Key(_))
    }
}

/// Invalid cache configuration.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_size must not be negative, got {0}")]
    NegativeMaxSize(i64),

    #[error("invalid max_size `{0}`: expected an integer or \"unbounded\"")]
    InvalidMaxSize(String),

    #[error("cache name must not be empty")]
    EmptyName,
}
