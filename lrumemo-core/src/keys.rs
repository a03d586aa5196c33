//! Cache key derivation.
//!
//! Call arguments are normalized into [`KeyPart`] values so that equal values
//! produce equal keys regardless of the concrete Rust type that carried them:
//! `1_i32`, `1_u64` and `1.0_f64` all become `KeyPart::Int(1)`. A cache built
//! with `typed = true` additionally records the type name of every top-level
//! argument, which keeps such values apart.

use crate::error::KeyError;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

/// Normalized, hashable value of a single argument.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyPart {
    /// `()` and `Option::None`.
    None,
    Bool(bool),
    /// Every integer type, and floats with an integral value.
    Int(i128),
    /// Integral values above `i128::MAX`, from `u128` or `f64`.
    UInt(u128),
    /// Bit pattern of a non-integral (or infinite) float.
    Float(u64),
    Str(Box<str>),
    /// Raw bytes, for custom [`CacheableKey`] implementations.
    Bytes(Box<[u8]>),
    Seq(Box<[KeyPart]>),
}

impl KeyPart {
    /// Normalizes a float, rejecting NaN.
    pub fn from_f64(value: f64, type_name: &'static str) -> Result<Self, KeyError> {
        if value.is_nan() {
            return Err(KeyError::NotANumber { type_name });
        }
        // i128::MAX as f64 rounds up to 2^127, which no i128 reaches.
        if value.fract() == 0.0 && value >= i128::MIN as f64 && value < i128::MAX as f64 {
            return Ok(KeyPart::Int(value as i128));
        }
        // Likewise u128::MAX as f64 rounds up to 2^128.
        if value.fract() == 0.0 && value > 0.0 && value < u128::MAX as f64 {
            return Ok(KeyPart::UInt(value as u128));
        }
        Ok(KeyPart::Float(value.to_bits()))
    }

    pub fn seq<'a, T, I>(items: I) -> Result<Self, KeyError>
    where
        T: CacheableKey + ?Sized + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let parts = items
            .into_iter()
            .map(CacheableKey::to_key_part)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(KeyPart::Seq(parts.into_boxed_slice()))
    }
}

/// Types that can be used as cached-call arguments.
///
/// Implementations must be pure: equal values must always produce equal
/// parts. Return [`KeyError::Unhashable`] for values that cannot be keyed.
///
/// # Examples
///
/// ```
/// use lrumemo_core::{CacheableKey, KeyError, KeyPart};
///
/// struct UserId(u64);
///
/// impl CacheableKey for UserId {
///     fn to_key_part(&self) -> Result<KeyPart, KeyError> {
///         Ok(KeyPart::Int(self.0 as i128))
///     }
/// }
///
/// assert_eq!(UserId(7).to_key_part(), 7_u8.to_key_part());
/// ```
pub trait CacheableKey {
    fn to_key_part(&self) -> Result<KeyPart, KeyError>;

    /// Type name recorded by typed caches.
    fn type_tag(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

macro_rules! impl_int_key {
    ($($ty:ty),*) => {
        $(
            impl CacheableKey for $ty {
                fn to_key_part(&self) -> Result<KeyPart, KeyError> {
                    Ok(KeyPart::Int(*self as i128))
                }
            }
        )*
    };
}

impl_int_key!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, usize);

impl CacheableKey for u128 {
    fn to_key_part(&self) -> Result<KeyPart, KeyError> {
        match i128::try_from(*self) {
            Ok(value) => Ok(KeyPart::Int(value)),
            Err(_) => Ok(KeyPart::UInt(*self)),
        }
    }
}

impl CacheableKey for f64 {
    fn to_key_part(&self) -> Result<KeyPart, KeyError> {
        KeyPart::from_f64(*self, "f64")
    }
}

impl CacheableKey for f32 {
    fn to_key_part(&self) -> Result<KeyPart, KeyError> {
        KeyPart::from_f64(f64::from(*self), "f32")
    }
}

impl CacheableKey for bool {
    fn to_key_part(&self) -> Result<KeyPart, KeyError> {
        Ok(KeyPart::Bool(*self))
    }
}

impl CacheableKey for char {
    fn to_key_part(&self) -> Result<KeyPart, KeyError> {
        let mut buf = [0u8; 4];
        Ok(KeyPart::Str(self.encode_utf8(&mut buf).into()))
    }
}

impl CacheableKey for str {
    fn to_key_part(&self) -> Result<KeyPart, KeyError> {
        Ok(KeyPart::Str(self.into()))
    }
}

impl CacheableKey for String {
    fn to_key_part(&self) -> Result<KeyPart, KeyError> {
        self.as_str().to_key_part()
    }
}

impl CacheableKey for () {
    fn to_key_part(&self) -> Result<KeyPart, KeyError> {
        Ok(KeyPart::None)
    }
}

impl<T: CacheableKey> CacheableKey for Option<T> {
    fn to_key_part(&self) -> Result<KeyPart, KeyError> {
        match self {
            Some(value) => value.to_key_part(),
            None => Ok(KeyPart::None),
        }
    }
}

impl<T: CacheableKey> CacheableKey for [T] {
    fn to_key_part(&self) -> Result<KeyPart, KeyError> {
        KeyPart::seq(self)
    }
}

impl<T: CacheableKey, const N: usize> CacheableKey for [T; N] {
    fn to_key_part(&self) -> Result<KeyPart, KeyError> {
        KeyPart::seq(self)
    }
}

impl<T: CacheableKey> CacheableKey for Vec<T> {
    fn to_key_part(&self) -> Result<KeyPart, KeyError> {
        KeyPart::seq(self)
    }
}

impl<T: CacheableKey> CacheableKey for VecDeque<T> {
    fn to_key_part(&self) -> Result<KeyPart, KeyError> {
        KeyPart::seq(self)
    }
}

impl<T: CacheableKey> CacheableKey for BTreeSet<T> {
    fn to_key_part(&self) -> Result<KeyPart, KeyError> {
        KeyPart::seq(self)
    }
}

impl<K: CacheableKey, V: CacheableKey> CacheableKey for BTreeMap<K, V> {
    fn to_key_part(&self) -> Result<KeyPart, KeyError> {
        let pairs = self
            .iter()
            .map(|(key, value)| (key, value).to_key_part())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(KeyPart::Seq(pairs.into_boxed_slice()))
    }
}

impl<T: CacheableKey + ?Sized> CacheableKey for &T {
    fn to_key_part(&self) -> Result<KeyPart, KeyError> {
        (**self).to_key_part()
    }

    fn type_tag(&self) -> &'static str {
        (**self).type_tag()
    }
}

impl<T: CacheableKey + ?Sized> CacheableKey for Box<T> {
    fn to_key_part(&self) -> Result<KeyPart, KeyError> {
        (**self).to_key_part()
    }

    fn type_tag(&self) -> &'static str {
        (**self).type_tag()
    }
}

impl<T: CacheableKey + ?Sized> CacheableKey for Arc<T> {
    fn to_key_part(&self) -> Result<KeyPart, KeyError> {
        (**self).to_key_part()
    }

    fn type_tag(&self) -> &'static str {
        (**self).type_tag()
    }
}

impl<T: CacheableKey + ?Sized> CacheableKey for Rc<T> {
    fn to_key_part(&self) -> Result<KeyPart, KeyError> {
        (**self).to_key_part()
    }

    fn type_tag(&self) -> &'static str {
        (**self).type_tag()
    }
}

impl<T> CacheableKey for Cow<'_, T>
where
    T: CacheableKey + ToOwned + ?Sized,
{
    fn to_key_part(&self) -> Result<KeyPart, KeyError> {
        (**self).to_key_part()
    }

    fn type_tag(&self) -> &'static str {
        (**self).type_tag()
    }
}

/// One argument slot of a [`CallKey`].
///
/// Positional and keyword arguments are different variants, so a keyword
/// argument can never collide with a positional one of equal value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeySlot {
    Positional(KeyPart),
    Keyword(Box<str>, KeyPart),
}

/// Hashable representation of one call's arguments.
///
/// # Examples
///
/// ```
/// use lrumemo_core::{CallArgs, CallKey};
///
/// let untyped = (1_i32, "a").call_key(false).unwrap();
/// assert_eq!(untyped, (1.0_f64, String::from("a")).call_key(false).unwrap());
///
/// let typed = (1_i32, "a").call_key(true).unwrap();
/// assert_ne!(typed, (1.0_f64, "a").call_key(true).unwrap());
///
/// let with_keyword = CallKey::builder(false)
///     .arg(&"report")
///     .and_then(|b| b.kwarg("page", &3))
///     .map(|b| b.build())
///     .unwrap();
/// assert_ne!(with_keyword, ("report", 3).call_key(false).unwrap());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallKey {
    slots: Box<[KeySlot]>,
    types: Option<Box<[&'static str]>>,
}

impl CallKey {
    pub fn builder(typed: bool) -> CallKeyBuilder {
        CallKeyBuilder {
            slots: Vec::new(),
            types: typed.then(Vec::new),
        }
    }

    pub fn slots(&self) -> &[KeySlot] {
        &self.slots
    }

    pub fn is_typed(&self) -> bool {
        self.types.is_some()
    }
}

/// Incremental construction of a [`CallKey`].
#[derive(Debug)]
pub struct CallKeyBuilder {
    slots: Vec<KeySlot>,
    types: Option<Vec<&'static str>>,
}

impl CallKeyBuilder {
    pub fn arg<T: CacheableKey + ?Sized>(mut self, value: &T) -> Result<Self, KeyError> {
        let part = value.to_key_part()?;
        self.slots.push(KeySlot::Positional(part));
        if let Some(types) = self.types.as_mut() {
            types.push(value.type_tag());
        }
        Ok(self)
    }

    pub fn kwarg<T: CacheableKey + ?Sized>(
        mut self,
        name: &str,
        value: &T,
    ) -> Result<Self, KeyError> {
        let part = value.to_key_part()?;
        self.slots.push(KeySlot::Keyword(name.into(), part));
        if let Some(types) = self.types.as_mut() {
            types.push(value.type_tag());
        }
        Ok(self)
    }

    pub fn build(self) -> CallKey {
        CallKey {
            slots: self.slots.into_boxed_slice(),
            types: self.types.map(Vec::into_boxed_slice),
        }
    }
}

/// Argument lists that can be turned into a [`CallKey`].
///
/// Implemented for tuples of up to eight [`CacheableKey`] values and for a
/// prebuilt `CallKey`.
pub trait CallArgs {
    fn call_key(&self, typed: bool) -> Result<CallKey, KeyError>;
}

impl CallArgs for CallKey {
    fn call_key(&self, _typed: bool) -> Result<CallKey, KeyError> {
        Ok(self.clone())
    }
}

macro_rules! impl_tuple_keys {
    ($(($($name:ident : $idx:tt),*)),* $(,)?) => {
        $(
            impl<$($name: CacheableKey),*> CallArgs for ($($name,)*) {
                #[allow(unused_mut)]
                fn call_key(&self, typed: bool) -> Result<CallKey, KeyError> {
                    let mut builder = CallKey::builder(typed);
                    $( builder = builder.arg(&self.$idx)?; )*
                    Ok(builder.build())
                }
            }

            impl<$($name: CacheableKey),*> CacheableKey for ($($name,)*) {
                fn to_key_part(&self) -> Result<KeyPart, KeyError> {
                    let parts = vec![$(self.$idx.to_key_part()?),*];
                    Ok(KeyPart::Seq(parts.into_boxed_slice()))
                }
            }
        )*
    };
}

impl_tuple_keys!(
    (A: 0),
    (A: 0, B: 1),
    (A: 0, B: 1, C: 2),
    (A: 0, B: 1, C: 2, D: 3),
    (A: 0, B: 1, C: 2, D: 3, E: 4),
    (A: 0, B: 1, C: 2, D: 3, E: 4, F: 5),
    (A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6),
    (A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7),
);

impl CallArgs for () {
    fn call_key(&self, typed: bool) -> Result<CallKey, KeyError> {
        Ok(CallKey::builder(typed).build())
    }
}
