use std::collections::BTreeMap;
use std::fmt;

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::coin::{Coin, Coins};
use crate::dec::Dec;

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct DecCoin {
    pub denom: String,
    pub amount: Dec,
}

impl DecCoin {
    pub fn new(denom: impl Into<String>, amount: Dec) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

impl fmt::Display for DecCoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Decimal coins: sorted by denom, unique, no zero amounts
///
/// Unlike [`Coins`] values can go negative when subtracting through
/// [`DecCoins::safe_sub`], which reports it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Encode, Decode, Serialize, Deserialize)]
#[serde(from = "Vec<DecCoin>", into = "Vec<DecCoin>")]
pub struct DecCoins(Vec<DecCoin>);

impl DecCoins {
    pub fn empty() -> Self {
        Self(vec![])
    }

    fn from_map(map: BTreeMap<String, Dec>) -> Self {
        Self(
            map.into_iter()
                .filter(|(_, amount)| !amount.is_zero())
                .map(|(denom, amount)| DecCoin { denom, amount })
                .collect(),
        )
    }

    fn to_map(&self) -> BTreeMap<String, Dec> {
        self.0
            .iter()
            .map(|c| (c.denom.clone(), c.amount.clone()))
            .collect()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DecCoin> {
        self.0.iter()
    }

    pub fn amount_of(&self, denom: &str) -> Dec {
        self.0
            .iter()
            .find(|c| c.denom == denom)
            .map(|c| c.amount.clone())
            .unwrap_or_default()
    }

    pub fn is_any_negative(&self) -> bool {
        self.0.iter().any(|c| c.amount.is_negative())
    }

    pub fn add(&self, other: &DecCoins) -> DecCoins {
        let mut map = self.to_map();
        for coin in &other.0 {
            *map.entry(coin.denom.clone()).or_default() += &coin.amount;
        }
        Self::from_map(map)
    }

    /// Subtract, returning the result and whether any denom went negative
    pub fn safe_sub(&self, other: &DecCoins) -> (DecCoins, bool) {
        let mut map = self.to_map();
        for coin in &other.0 {
            *map.entry(coin.denom.clone()).or_default() -= &coin.amount;
        }
        let res = Self::from_map(map);
        let negative = res.is_any_negative();
        (res, negative)
    }

    /// Subtract, `None` if any denom would go negative
    pub fn checked_sub(&self, other: &DecCoins) -> Option<DecCoins> {
        match self.safe_sub(other) {
            (res, false) => Some(res),
            (_, true) => None,
        }
    }

    /// Per denom minimum of `self` and `other`
    pub fn intersect(&self, other: &DecCoins) -> DecCoins {
        Self::from_map(
            self.0
                .iter()
                .map(|c| {
                    (
                        c.denom.clone(),
                        c.amount.clone().min(other.amount_of(&c.denom)),
                    )
                })
                .collect(),
        )
    }

    fn map_amounts(&self, f: impl Fn(&Dec) -> Dec) -> DecCoins {
        Self::from_map(
            self.0
                .iter()
                .map(|c| (c.denom.clone(), f(&c.amount)))
                .collect(),
        )
    }

    pub fn mul_dec(&self, d: &Dec) -> DecCoins {
        self.map_amounts(|a| a.mul(d))
    }

    pub fn mul_dec_truncate(&self, d: &Dec) -> DecCoins {
        self.map_amounts(|a| a.mul_truncate(d))
    }

    pub fn quo_dec_truncate(&self, d: &Dec) -> DecCoins {
        self.map_amounts(|a| a.quo_truncate(d))
    }

    /// Split into whole coins and the remaining decimal change
    ///
    /// Negative amounts are not representable as [`Coins`] and end up
    /// entirely in the change.
    pub fn truncate_decimal(&self) -> (Coins, DecCoins) {
        let mut truncated = BTreeMap::new();
        let mut change = BTreeMap::new();

        for coin in &self.0 {
            let whole = coin.amount.truncate_u128().unwrap_or_default();
            let rest = &coin.amount - &Dec::from_int(whole);
            if whole != 0 {
                truncated.insert(coin.denom.clone(), whole);
            }
            change.insert(coin.denom.clone(), rest);
        }

        let coins = Coins::new(
            truncated
                .into_iter()
                .map(|(denom, amount)| Coin { denom, amount }),
        )
        .expect("Denoms were already valid");

        (coins, Self::from_map(change))
    }
}

impl From<&Coins> for DecCoins {
    fn from(value: &Coins) -> Self {
        Self(
            value
                .iter()
                .map(|c| DecCoin::new(c.denom.clone(), Dec::from_int(c.amount)))
                .collect(),
        )
    }
}

impl From<Vec<DecCoin>> for DecCoins {
    fn from(value: Vec<DecCoin>) -> Self {
        let mut map: BTreeMap<String, Dec> = BTreeMap::new();
        for coin in value {
            *map.entry(coin.denom).or_default() += &coin.amount;
        }
        Self::from_map(map)
    }
}

impl From<DecCoins> for Vec<DecCoin> {
    fn from(value: DecCoins) -> Self {
        value.0
    }
}

impl fmt::Display for DecCoins {
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

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    fn dec(s: &str) -> Dec {
        Dec::from_str(s).expect("valid decimal")
    }

    fn dec_coins(items: &[(&str, &str)]) -> DecCoins {
        items
            .iter()
            .map(|(denom, amount)| DecCoin::new(*denom, dec(amount)))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn add_sub() {
        let a = dec_coins(&[("stake", "1.5"), ("uatom", "2")]);
        let b = dec_coins(&[("stake", "1.5")]);
        assert_eq!(a.add(&b), dec_coins(&[("stake", "3"), ("uatom", "2")]));
        assert_eq!(a.checked_sub(&b), Some(dec_coins(&[("uatom", "2")])));

        let (res, negative) = b.safe_sub(&a);
        assert!(negative);
        assert_eq!(res, dec_coins(&[("uatom", "-2")]));
        assert_eq!(b.checked_sub(&a), None);
    }

    #[test]
    fn intersect_takes_minimum() {
        let a = dec_coins(&[("stake", "5"), ("uatom", "2")]);
        let b = dec_coins(&[("stake", "3")]);
        assert_eq!(a.intersect(&b), dec_coins(&[("stake", "3")]));
    }

    #[test]
    fn truncate_decimal_splits_change() {
        let a = dec_coins(&[("stake", "10.25"), ("uatom", "0.5")]);
        let (coins, change) = a.truncate_decimal();
        assert_eq!(coins, Coins::from_str("10stake").expect("valid"));
        assert_eq!(change, dec_coins(&[("stake", "0.25"), ("uatom", "0.5")]));
    }

    #[test]
    fn scaling() {
        let a = dec_coins(&[("stake", "10")]);
        assert_eq!(a.mul_dec_truncate(&dec("0.25")), dec_coins(&[("stake", "2.5")]));
        assert_eq!(
            a.quo_dec_truncate(&dec("3")),
            dec_coins(&[("stake", "3.333333333333333333")])
        );
        assert!(a.mul_dec(&Dec::zero()).is_zero());
    }
}
