use crate::error::ConfigError;
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// Default number of stored results when no size is configured.
pub const DEFAULT_MAX_SIZE: usize = 128;

/// How many results a cache may hold.
///
/// # Variants
///
/// * `Bounded(n)` - at most `n` results; the least recently used one is
///   evicted when a new result would exceed the bound
/// * `Unbounded` - results are never evicted automatically
/// * `Disabled` - nothing is stored; every call is a miss, but concurrent
///   calls with equal arguments still share one computation
///
/// # Examples
///
/// ```
/// use lrumemo_core::MaxSize;
///
/// assert_eq!(MaxSize::default().limit(), Some(128));
/// assert_eq!(MaxSize::from(None).limit(), None);
/// assert_eq!(MaxSize::from(Some(0)), MaxSize::Disabled);
/// assert!(MaxSize::try_from(-1_i64).is_err());
///
/// let parsed: MaxSize = "unbounded".parse().unwrap();
/// assert_eq!(parsed, MaxSize::Unbounded);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaxSize {
    Bounded(NonZeroUsize),
    Unbounded,
    Disabled,
}

impl MaxSize {
    /// Bounded size, or `Disabled` when `n` is zero.
    pub const fn bounded(n: usize) -> Self {
        match NonZeroUsize::new(n) {
            Some(n) => MaxSize::Bounded(n),
            None => MaxSize::Disabled,
        }
    }

    /// Capacity as reported by [`CacheInfo`](crate::CacheInfo): `None` when
    /// unbounded, `Some(0)` when disabled.
    pub const fn limit(&self) -> Option<usize> {
        match self {
            MaxSize::Bounded(n) => Some(n.get()),
            MaxSize::Unbounded => None,
            MaxSize::Disabled => Some(0),
        }
    }

    pub const fn is_disabled(&self) -> bool {
        matches!(self, MaxSize::Disabled)
    }
}

impl Default for MaxSize {
    fn default() -> Self {
        MaxSize::bounded(DEFAULT_MAX_SIZE)
    }
}

impl From<Option<usize>> for MaxSize {
    fn from(value: Option<usize>) -> Self {
        match value {
            Some(n) => MaxSize::bounded(n),
            None => MaxSize::Unbounded,
        }
    }
}

impl From<usize> for MaxSize {
    fn from(value: usize) -> Self {
        MaxSize::bounded(value)
    }
}

impl TryFrom<i64> for MaxSize {
    type Error = ConfigError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let n = usize::try_from(value).map_err(|_| ConfigError::NegativeMaxSize(value))?;
        Ok(MaxSize::bounded(n))
    }
}

impl FromStr for MaxSize {
    type Err = ConfigError;

    /// Accepts an integer or `"unbounded"` / `"none"` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "unbounded" | "none" => return Ok(MaxSize::Unbounded),
            _ => {}
        }
        let value: i64 = trimmed
            .parse()
            .map_err(|_| ConfigError::InvalidMaxSize(trimmed.to_string()))?;
        MaxSize::try_from(value)
    }
}

impl fmt::Display for MaxSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxSize::Bounded(n) => write!(f, "{n}"),
            MaxSize::Unbounded => f.write_str("unbounded"),
            MaxSize::Disabled => f.write_str("0"),
        }
    }
}

/// Parameters a cache was built with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheParameters {
    pub max_size: MaxSize,
    /// Whether arguments of different types are always distinct keys.
    pub typed: bool,
}

/// Builder-style configuration for an async LRU cache.
///
/// # Examples
///
/// ```
/// use lrumemo_core::{CacheConfig, MaxSize};
///
/// let config = CacheConfig::new()
///     .max_size(4)
///     .typed(true)
///     .name("fetch_user");
///
/// assert_eq!(config.parameters().max_size, MaxSize::bounded(4));
/// assert!(config.parameters().typed);
/// assert_eq!(config.name_str(), Some("fetch_user"));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheConfig {
    max_size: MaxSize,
    typed: bool,
    name: Option<String>,
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_size(mut self, max_size: impl Into<MaxSize>) -> Self {
        self.max_size = max_size.into();
        self
    }

    pub fn unbounded(self) -> Self {
        self.max_size(MaxSize::Unbounded)
    }

    pub fn typed(mut self, typed: bool) -> Self {
        self.typed = typed;
        self
    }

    /// Label used in log events.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name_str(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn parameters(&self) -> CacheParameters {
        CacheParameters {
            max_size: self.max_size,
            typed: self.typed,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.name {
            Some(name) if name.trim().is_empty() => Err(ConfigError::EmptyName),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_max_size() {
        assert_eq!(MaxSize::default(), MaxSize::bounded(128));
        assert_eq!(CacheConfig::new().parameters().max_size.limit(), Some(128));
        assert!(!CacheConfig::new().parameters().typed);
    }

    #[test]
    fn test_negative_max_size_is_rejected() {
        assert_eq!(
            MaxSize::try_from(-3_i64),
            Err(ConfigError::NegativeMaxSize(-3))
        );
        assert_eq!(MaxSize::try_from(0_i64), Ok(MaxSize::Disabled));
        assert_eq!(MaxSize::try_from(7_i64), Ok(MaxSize::bounded(7)));
    }

    #[test]
    fn test_parse_max_size() {
        assert_eq!("16".parse::<MaxSize>(), Ok(MaxSize::bounded(16)));
        assert_eq!(" None ".parse::<MaxSize>(), Ok(MaxSize::Unbounded));
        assert_eq!("0".parse::<MaxSize>(), Ok(MaxSize::Disabled));
        assert_eq!(
            "-1".parse::<MaxSize>(),
            Err(ConfigError::NegativeMaxSize(-1))
        );
        assert_eq!(
            "lots".parse::<MaxSize>(),
            Err(ConfigError::InvalidMaxSize("lots".to_string()))
        );
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for size in [MaxSize::bounded(3), MaxSize::Unbounded, MaxSize::Disabled] {
            assert_eq!(size.to_string().parse::<MaxSize>(), Ok(size));
        }
    }

    #[test]
    fn test_empty_name_is_invalid() {
        let config = CacheConfig::new().name("  ");
        assert_eq!(config.validate(), Err(ConfigError::EmptyName));
    }
}
