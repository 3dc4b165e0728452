//! Numeric element types a registry can be built over, and the policy used to
//! default, validate and negate the amounts passed to it.

use std::fmt;

use rust_decimal::Decimal;

use crate::Error;

/// Identifies the numeric type a registry records its measurements as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    I8,
    I32,
    I64,
    U8,
    F32,
    F64,
    Decimal,
    /// A type outside the built-in family, identified by name. The default
    /// [`Amount::resolve`] rejects these.
    Other(&'static str),
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementType::I8 => "i8",
            ElementType::I32 => "i32",
            ElementType::I64 => "i64",
            ElementType::U8 => "u8",
            ElementType::F32 => "f32",
            ElementType::F64 => "f64",
            ElementType::Decimal => "decimal",
            ElementType::Other(name) => *name,
        };
        f.write_str(name)
    }
}

/// A single measurement value, tagged with its element type. This is what
/// crosses the boundary into the backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    I8(i8),
    I32(i32),
    I64(i64),
    U8(u8),
    F32(f32),
    F64(f64),
    Decimal(Decimal),
}

impl Number {
    pub fn element_type(&self) -> ElementType {
        match self {
            Number::I8(_) => ElementType::I8,
            Number::I32(_) => ElementType::I32,
            Number::I64(_) => ElementType::I64,
            Number::U8(_) => ElementType::U8,
            Number::F32(_) => ElementType::F32,
            Number::F64(_) => ElementType::F64,
            Number::Decimal(_) => ElementType::Decimal,
        }
    }

    /// The value `1` as `element_type`.
    pub fn one(element_type: ElementType) -> Result<Number, Error> {
        Ok(match element_type {
            ElementType::I8 => Number::I8(1),
            ElementType::I32 => Number::I32(1),
            ElementType::I64 => Number::I64(1),
            ElementType::U8 => Number::U8(1),
            ElementType::F32 => Number::F32(1.0),
            ElementType::F64 => Number::F64(1.0),
            ElementType::Decimal => Number::Decimal(Decimal::ONE),
            ElementType::Other(_) => return Err(Error::UnsupportedElementType(element_type)),
        })
    }

    /// Strictly greater than zero. NaN is not.
    pub fn is_positive(&self) -> bool {
        match *self {
            Number::I8(v) => v > 0,
            Number::I32(v) => v > 0,
            Number::I64(v) => v > 0,
            Number::U8(v) => v > 0,
            Number::F32(v) => v > 0.0,
            Number::F64(v) => v > 0.0,
            Number::Decimal(v) => v > Decimal::ZERO,
        }
    }

    /// Negate a positive amount. Unsigned types can't represent the result.
    pub(crate) fn negate(self) -> Result<Number, Error> {
        Ok(match self {
            Number::I8(v) => Number::I8(-v),
            Number::I32(v) => Number::I32(-v),
            Number::I64(v) => Number::I64(-v),
            Number::F32(v) => Number::F32(-v),
            Number::F64(v) => Number::F64(-v),
            Number::Decimal(v) => Number::Decimal(-v),
            Number::U8(_) => {
                return Err(Error::UnsignedNegation {
                    element_type: ElementType::U8,
                })
            }
        })
    }

    /// Apply the default amount policy for `element_type`: a missing amount
    /// becomes one, a present amount must be positive, and the result is
    /// negated when `make_negative` is set.
    pub fn resolve(
        element_type: ElementType,
        amount: Option<Number>,
        make_negative: bool,
    ) -> Result<Number, Error> {
        let amount = match amount {
            Some(amount) if amount.is_positive() => amount,
            Some(amount) => return Err(Error::InvalidAmount { amount }),
            None => Number::one(element_type)?,
        };
        if make_negative {
            amount.negate()
        } else {
            Ok(amount)
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::I8(v) => fmt::Display::fmt(v, f),
            Number::I32(v) => fmt::Display::fmt(v, f),
            Number::I64(v) => fmt::Display::fmt(v, f),
            Number::U8(v) => fmt::Display::fmt(v, f),
            Number::F32(v) => fmt::Display::fmt(v, f),
            Number::F64(v) => fmt::Display::fmt(v, f),
            Number::Decimal(v) => fmt::Display::fmt(v, f),
        }
    }
}

/// A numeric type a [`Registry`](crate::Registry) can be configured with.
///
/// The built-in family (`i8`, `i32`, `i64`, `u8`, `f32`, `f64` and
/// [`Decimal`]) is covered by the default [`resolve`](Amount::resolve). Other
/// types report [`ElementType::Other`] and must override `resolve`, otherwise
/// registry construction fails with [`Error::UnsupportedElementType`].
pub trait Amount: Copy + fmt::Debug + Send + Sync + 'static {
    const ELEMENT_TYPE: ElementType;

    fn into_number(self) -> Number;

    fn from_number(number: Number) -> Option<Self>;

    /// Default, validate and optionally negate an amount handed to
    /// `increase`/`decrease`.
    fn resolve(amount: Option<Self>, make_negative: bool) -> Result<Self, Error> {
        let number = Number::resolve(
            Self::ELEMENT_TYPE,
            amount.map(Self::into_number),
            make_negative,
        )?;
        Self::from_number(number).ok_or(Error::UnsupportedElementType(Self::ELEMENT_TYPE))
    }
}

macro_rules! impl_amount {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Amount for $ty {
                const ELEMENT_TYPE: ElementType = ElementType::$variant;

                fn into_number(self) -> Number {
                    Number::$variant(self)
                }

                fn from_number(number: Number) -> Option<Self> {
                    match number {
                        Number::$variant(value) => Some(value),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_amount! {
    i8 => I8,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    f32 => F32,
    f64 => F64,
    Decimal => Decimal,
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[derive(Debug, Clone, Copy)]
    struct Millis(u64);

    impl Amount for Millis {
        const ELEMENT_TYPE: ElementType = ElementType::Other("millis");

        fn into_number(self) -> Number {
            Number::I64(self.0 as i64)
        }

        fn from_number(number: Number) -> Option<Self> {
            match number {
                Number::I64(v) => u64::try_from(v).ok().map(Millis),
                _ => None,
            }
        }
    }

    fn assert_defaults<V: Amount + PartialEq>(one: V, minus_one: V) {
        assert_eq!(V::resolve(None, false).unwrap(), one);
        assert_eq!(V::resolve(None, true).unwrap(), minus_one);
    }

    fn assert_rejects<V: Amount>(amount: V) {
        assert!(
            matches!(V::resolve(Some(amount), false), Err(Error::InvalidAmount { .. })),
            "{amount:?} should be rejected"
        );
        assert!(
            matches!(V::resolve(Some(amount), true), Err(Error::InvalidAmount { .. })),
            "{amount:?} should be rejected"
        );
    }

    #[test]
    fn defaults_to_one() {
        assert_defaults(1i8, -1i8);
        assert_defaults(1i32, -1i32);
        assert_defaults(1i64, -1i64);
        assert_defaults(1f32, -1f32);
        assert_defaults(1f64, -1f64);
        assert_defaults(Decimal::ONE, Decimal::NEGATIVE_ONE);
        assert_eq!(u8::resolve(None, false).unwrap(), 1);
    }

    #[test]
    fn rejects_non_positive() {
        assert_rejects(0i8);
        assert_rejects(-1i8);
        assert_rejects(0i32);
        assert_rejects(-1i32);
        assert_rejects(0i64);
        assert_rejects(-1i64);
        assert_rejects(0u8);
        assert_rejects(0f32);
        assert_rejects(-1f32);
        assert_rejects(0f64);
        assert_rejects(-1f64);
        assert_rejects(f64::NAN);
        assert_rejects(Decimal::ZERO);
        assert_rejects(Decimal::NEGATIVE_ONE);
    }

    #[test]
    fn negates_when_asked() {
        assert_eq!(i64::resolve(Some(5), true).unwrap(), -5);
        assert_eq!(i64::resolve(Some(5), false).unwrap(), 5);
        assert_eq!(f32::resolve(Some(2.5), true).unwrap(), -2.5);
        assert_eq!(
            Decimal::resolve(Some(Decimal::new(125, 2)), true).unwrap(),
            Decimal::new(-125, 2)
        );
        assert_eq!(i8::resolve(Some(i8::MAX), true).unwrap(), -i8::MAX);
    }

    #[test]
    fn unsigned_cannot_negate() {
        assert!(matches!(
            u8::resolve(None, true),
            Err(Error::UnsignedNegation {
                element_type: ElementType::U8
            })
        ));
        assert_eq!(u8::resolve(Some(7), false).unwrap(), 7);
    }

    #[test]
    fn other_types_are_unsupported() {
        assert!(matches!(
            Millis::resolve(None, false),
            Err(Error::UnsupportedElementType(ElementType::Other("millis")))
        ));
    }

    #[test]
    fn number_reports_element_type() {
        assert_eq!(5i32.into_number().element_type(), ElementType::I32);
        assert_eq!(Decimal::ONE.into_number().element_type(), ElementType::Decimal);
        assert_eq!(i32::from_number(Number::I64(1)), None);
        assert_eq!(Number::F64(1.5).to_string(), "1.5");
        assert_eq!(ElementType::Other("millis").to_string(), "millis");
    }
}
