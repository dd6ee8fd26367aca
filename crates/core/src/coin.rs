use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use snafu::{OptionExt as _, Snafu, ensure};

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum CoinsError {
    #[snafu(display("Invalid denom: {denom}"))]
    InvalidDenom { denom: String },
    #[snafu(display("Duplicate denom: {denom}"))]
    DuplicateDenom { denom: String },
    #[snafu(display("Invalid coin: {value}"))]
    InvalidCoin { value: String },
}

/// Denoms are 3 to 128 characters, start with a letter, and contain only
/// alphanumerics or `/:._-`
pub fn validate_denom(denom: &str) -> Result<(), CoinsError> {
    let mut chars = denom.chars();
    let valid = (3..=128).contains(&denom.len())
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || "/:._-".contains(c));
    ensure!(
        valid,
        InvalidDenomSnafu {
            denom: denom.to_owned()
        }
    );
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    #[serde(with = "amount_str")]
    pub amount: u128,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for Coin {
    type Err = CoinsError;

    /// Parse `100stake`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .context(InvalidCoinSnafu { value: s })?;
        let (amount, denom) = s.split_at(split);
        let amount = amount
            .parse()
            .ok()
            .context(InvalidCoinSnafu { value: s })?;
        validate_denom(denom)?;
        Ok(Self::new(denom, amount))
    }
}

/// A set of coins: sorted by denom, unique denoms, no zero amounts
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Encode, Decode, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coin>", into = "Vec<Coin>")]
pub struct Coins(Vec<Coin>);

impl Coins {
    pub fn empty() -> Self {
        Self(vec![])
    }

    /// Validate and normalize
    ///
    /// Zero amounts are dropped, denoms sorted. Duplicate or malformed denoms
    /// are rejected.
    pub fn new(coins: impl IntoIterator<Item = Coin>) -> Result<Self, CoinsError> {
        let mut map = BTreeMap::new();
        for coin in coins {
            validate_denom(&coin.denom)?;
            if map.contains_key(&coin.denom) {
                return DuplicateDenomSnafu { denom: coin.denom }.fail();
            }
            map.insert(coin.denom, coin.amount);
        }
        Ok(Self::from_map(map))
    }

    pub fn single(denom: impl Into<String>, amount: u128) -> Result<Self, CoinsError> {
        Self::new([Coin::new(denom, amount)])
    }

    fn from_map(map: BTreeMap<String, u128>) -> Self {
        Self(
            map.into_iter()
                .filter(|(_, amount)| *amount != 0)
                .map(|(denom, amount)| Coin { denom, amount })
                .collect(),
        )
    }

    fn to_map(&self) -> BTreeMap<String, u128> {
        self.0
            .iter()
            .map(|c| (c.denom.clone(), c.amount))
            .collect()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.0.iter()
    }

    pub fn amount_of(&self, denom: &str) -> u128 {
        self.0
            .iter()
            .find(|c| c.denom == denom)
            .map(|c| c.amount)
            .unwrap_or_default()
    }

    /// Sum, `None` on overflow
    pub fn checked_add(&self, other: &Coins) -> Option<Coins> {
        let mut map = self.to_map();
        for coin in &other.0 {
            let entry = map.entry(coin.denom.clone()).or_default();
            *entry = entry.checked_add(coin.amount)?;
        }
        Some(Self::from_map(map))
    }

    /// Difference, `None` if any denom would go negative
    pub fn checked_sub(&self, other: &Coins) -> Option<Coins> {
        let mut map = self.to_map();
        for coin in &other.0 {
            let entry = map.entry(coin.denom.clone()).or_default();
            *entry = entry.checked_sub(coin.amount)?;
        }
        Some(Self::from_map(map))
    }

    /// Is every denom of `other` covered by `self`
    pub fn is_all_gte(&self, other: &Coins) -> bool {
        other
            .0
            .iter()
            .all(|coin| coin.amount <= self.amount_of(&coin.denom))
    }
}

impl TryFrom<Vec<Coin>> for Coins {
    type Error = CoinsError;

    fn try_from(value: Vec<Coin>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Coins> for Vec<Coin> {
    fn from(value: Coins) -> Self {
        value.0
    }
}

impl IntoIterator for Coins {
    type Item = Coin;
    type IntoIter = std::vec::IntoIter<Coin>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, coin) in self.0.iter().enumerate() {
            if i != 0 {
                f.write_str(",")?;
            }
            write!(f, "{coin}")?;
        }
        Ok(())
    }
}

impl FromStr for Coins {
    type Err = CoinsError;

    /// Parse `10stake,5uatom`; an empty string is an empty set
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::empty());
        }
        Self::new(
            s.split(',')
                .map(|c| Coin::from_str(c.trim()))
                .collect::<Result<Vec<_>, _>>()?,
        )
    }
}

/// Amounts as decimal strings
pub mod amount_str {
    use serde::{Deserialize as _, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u128, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
