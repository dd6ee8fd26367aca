//! Signed fixed point decimal with 18 digits of precision
//!
//! All reward and tally arithmetic goes through [`Dec`]. Rounding is
//! explicit in method names: `mul`/`quo` round half to even, `*_truncate`
//! round toward zero, `quo_round_up` rounds away from zero.

use std::cmp::Ordering;
use std::str::FromStr;
use std::{fmt, ops};

use bincode::de::{BorrowDecoder, Decoder};
use bincode::enc::Encoder;
use bincode::error::{DecodeError, EncodeError};
use bincode::{BorrowDecode, Decode, Encode};
use num_bigint::BigInt;
use num_traits::{One as _, Signed as _, ToPrimitive as _, Zero as _};
use serde::{Deserialize, Serialize};
use snafu::Snafu;

pub const PRECISION: usize = 18;
const PRECISION_MULTIPLIER: u64 = 1_000_000_000_000_000_000;

fn multiplier() -> BigInt {
    BigInt::from(PRECISION_MULTIPLIER)
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Dec(BigInt);

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum ParseDecError {
    #[snafu(display("Empty decimal string"))]
    Empty,
    #[snafu(display("Too many fractional digits: {digits}"))]
    TooPrecise { digits: usize },
    #[snafu(display("Invalid decimal string: {value}"))]
    Invalid { value: String },
}

impl Dec {
    pub fn zero() -> Self {
        Self(BigInt::zero())
    }

    pub fn one() -> Self {
        Self(multiplier())
    }

    /// The smallest representable positive value (10^-18)
    pub fn smallest() -> Self {
        Self(BigInt::one())
    }

    pub fn from_int(i: impl Into<BigInt>) -> Self {
        Self(i.into() * multiplier())
    }

    /// `i * 10^-prec`, eg. `new_with_prec(5, 1)` is `0.5`
    pub fn new_with_prec(i: i64, prec: u32) -> Self {
        assert!(prec as usize <= PRECISION, "Precision too high");
        Self(BigInt::from(i) * BigInt::from(10u64.pow(PRECISION as u32 - prec)))
    }

    pub fn percent(p: i64) -> Self {
        Self::new_with_prec(p, 2)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    /// Multiply, rounding half to even
    pub fn mul(&self, other: &Dec) -> Dec {
        Self(chop_precision_and_round(&self.0 * &other.0))
    }

    /// Multiply, truncating toward zero
    pub fn mul_truncate(&self, other: &Dec) -> Dec {
        Self((&self.0 * &other.0) / multiplier())
    }

    pub fn mul_int(&self, i: u128) -> Dec {
        Self(&self.0 * BigInt::from(i))
    }

    /// Divide, rounding half to even
    ///
    /// # Panics
    ///
    /// On division by zero.
    pub fn quo(&self, other: &Dec) -> Dec {
        let mul = &self.0 * multiplier() * multiplier();
        Self(chop_precision_and_round(mul / &other.0))
    }

    /// Divide, truncating toward zero
    pub fn quo_truncate(&self, other: &Dec) -> Dec {
        Self((&self.0 * multiplier()) / &other.0)
    }

    /// Divide, rounding away from zero
    pub fn quo_round_up(&self, other: &Dec) -> Dec {
        let mul = &self.0 * multiplier();
        let quo = &mul / &other.0;
        let rem = &mul % &other.0;
        if rem.is_zero() {
            return Self(quo);
        }
        if mul.is_negative() == other.0.is_negative() {
            Self(quo + BigInt::one())
        } else {
            Self(quo - BigInt::one())
        }
    }

    /// Divide by an integer, truncating toward zero
    pub fn quo_int(&self, i: u128) -> Dec {
        Self(&self.0 / BigInt::from(i))
    }

    /// Integer part, rounding toward zero
    pub fn truncate_int(&self) -> BigInt {
        &self.0 / multiplier()
    }

    /// Integer part as `u128`, if non-negative and in range
    pub fn truncate_u128(&self) -> Option<u128> {
        self.truncate_int().to_u128()
    }

    pub fn abs(&self) -> Dec {
        Self(self.0.abs())
    }

    pub fn min(self, other: Dec) -> Dec {
        std::cmp::min(self, other)
    }

    pub fn max(self, other: Dec) -> Dec {
        std::cmp::max(self, other)
    }
}

/// Remove the precision from a value multiplied twice by the precision
/// multiplier, rounding half to even
fn chop_precision_and_round(d: BigInt) -> BigInt {
    if d.is_negative() {
        return -chop_precision_and_round(-d);
    }

    let multiplier = multiplier();
    let quo = &d / &multiplier;
    let rem = &d % &multiplier;

    if rem.is_zero() {
        return quo;
    }

    let half = multiplier / 2;
    match rem.cmp(&half) {
        Ordering::Less => quo,
        Ordering::Greater => quo + BigInt::one(),
        Ordering::Equal => {
            if (&quo % BigInt::from(2u32)).is_zero() {
                quo
            } else {
                quo + BigInt::one()
            }
        }
    }
}

impl ops::Add for Dec {
    type Output = Dec;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl<'a> ops::Add<&'a Dec> for &'a Dec {
    type Output = Dec;

    fn add(self, rhs: &'a Dec) -> Self::Output {
        Dec(&self.0 + &rhs.0)
    }
}

impl ops::AddAssign<&Dec> for Dec {
    fn add_assign(&mut self, rhs: &Dec) {
        self.0 += &rhs.0;
    }
}

impl ops::Sub for Dec {
    type Output = Dec;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl<'a> ops::Sub<&'a Dec> for &'a Dec {
    type Output = Dec;

    fn sub(self, rhs: &'a Dec) -> Self::Output {
        Dec(&self.0 - &rhs.0)
    }
}

impl ops::SubAssign<&Dec> for Dec {
    fn sub_assign(&mut self, rhs: &Dec) {
        self.0 -= &rhs.0;
    }
}

impl ops::Neg for Dec {
    type Output = Dec;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl From<u128> for Dec {
    fn from(value: u128) -> Self {
        Self::from_int(value)
    }
}

impl From<u64> for Dec {
    fn from(value: u64) -> Self {
        Self::from_int(value)
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let multiplier = multiplier();
        let abs = self.0.abs();
        let int = &abs / &multiplier;
        let frac = &abs % &multiplier;
        if self.0.is_negative() {
            f.write_str("-")?;
        }
        write!(f, "{int}.{frac:0>width$}", width = PRECISION)
    }
}

impl fmt::Debug for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Dec {
    type Err = ParseDecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseDecError::Empty);
        }
        let invalid = || ParseDecError::Invalid {
            value: s.to_owned(),
        };

        let (negative, unsigned) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (unsigned, ""),
        };

        if int_part.is_empty()
            || !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
            || (unsigned.contains('.') && frac_part.is_empty())
        {
            return Err(invalid());
        }
        if PRECISION < frac_part.len() {
            return Err(ParseDecError::TooPrecise {
                digits: frac_part.len(),
            });
        }

        let digits = format!("{int_part}{frac_part:0<width$}", width = PRECISION);
        let value = BigInt::from_str(&digits).map_err(|_| invalid())?;

        Ok(Self(if negative { -value } else { value }))
    }
}

impl Serialize for Dec {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Dec {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(d)?;
        Dec::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl Encode for Dec {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<(), EncodeError> {
        self.0.to_signed_bytes_be().encode(encoder)
    }
}

impl<C> Decode<C> for Dec {
    fn decode<D: Decoder<Context = C>>(decoder: &mut D) -> Result<Self, DecodeError> {
        let bytes: Vec<u8> = Decode::decode(decoder)?;
        Ok(Self(BigInt::from_signed_bytes_be(&bytes)))
    }
}

impl<'de, C> BorrowDecode<'de, C> for Dec {
    fn borrow_decode<D: BorrowDecoder<'de, Context = C>>(
        decoder: &mut D,
    ) -> Result<Self, DecodeError> {
        let bytes: Vec<u8> = Decode::decode(decoder)?;
        Ok(Self(BigInt::from_signed_bytes_be(&bytes)))
    }
}
