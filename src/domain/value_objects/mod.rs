//! Value Objects for the storefront

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

/// Storefront settlement currency. Every amount in the system is in naira.
pub const CURRENCY: &str = "NGN";

/// Nigerian mobile number, local (`0…`) or international (`+234…`) form.
pub static NIGERIAN_PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\+234|0)[789]\d{9}$").expect("valid phone pattern"));

static ORDER_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ORD-\d{6}-\d{4}$").expect("valid order number pattern"));

/// SKU (Stock Keeping Unit) value object
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sku(String);

impl Sku {
    pub fn new(value: impl Into<String>) -> Result<Self, SkuError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() { return Err(SkuError::Empty); }
        if value.len() > 50 { return Err(SkuError::TooLong); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum SkuError { Empty, TooLong }
impl std::error::Error for SkuError {}
impl fmt::Display for SkuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Empty => write!(f, "SKU empty"), Self::TooLong => write!(f, "SKU too long") }
    }
}

/// Naira amount.
///
/// Written to JSON as a number. Amounts are kobo-rounded, so the shortest
/// `f64` form reads back to the same decimal. Decimal strings are accepted
/// on input as well.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(Decimal);

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.to_f64() {
            Some(value) => serializer.serialize_f64(value),
            None => Err(<S::Error as ser::Error>::custom(format!("amount {} out of range", self.0))),
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire { Number(f64), Text(String) }

        let text = match Wire::deserialize(deserializer)? {
            Wire::Number(n) => n.to_string(),
            Wire::Text(s) => s,
        };
        text.trim().parse::<Decimal>().map(Money).map_err(de::Error::custom)
    }
}

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self { Self(amount) }
    pub fn naira(whole: i64) -> Self { Self(Decimal::from(whole)) }
    pub fn amount(&self) -> Decimal { self.0 }
    pub fn is_negative(&self) -> bool { self.0.is_sign_negative() && !self.0.is_zero() }
    pub fn multiply(&self, qty: u32) -> Money { Money(self.0 * Decimal::from(qty)) }

    /// Applies a fractional rate, rounding half-up to kobo.
    pub fn percent_of(&self, rate: Decimal) -> Money {
        Money((self.0 * rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money { Money(self.0 + rhs.0) }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) { self.0 += rhs.0; }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money { Money(self.0 - rhs.0) }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money { iter.fold(Money::ZERO, Add::add) }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self { Self(value) }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{} {:.2}", CURRENCY, self.0) }
}

/// Validated Nigerian mobile number.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(value: &str) -> Result<Self, PhoneError> {
        let value = value.trim();
        if NIGERIAN_PHONE.is_match(value) { Ok(Self(value.to_string())) } else { Err(PhoneError) }
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl TryFrom<String> for PhoneNumber {
    type Error = PhoneError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::parse(&value) }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self { value.0 }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub struct PhoneError;
impl std::error::Error for PhoneError {}
impl fmt::Display for PhoneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Invalid Nigerian phone number") }
}

/// `ORD-<6-digit time suffix>-<4-digit sequence>`, assigned once per order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber(String);

impl OrderNumber {
    /// The time suffix is the last six digits of the Unix-millisecond clock.
    pub fn generate(at: DateTime<Utc>, sequence: u16) -> Self {
        let suffix = at.timestamp_millis().rem_euclid(1_000_000);
        Self(format!("ORD-{:06}-{:04}", suffix, sequence % 10_000))
    }

    pub fn parse(value: &str) -> Result<Self, OrderNumberError> {
        if ORDER_NUMBER.is_match(value) { Ok(Self(value.to_string())) } else { Err(OrderNumberError) }
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl TryFrom<String> for OrderNumber {
    type Error = OrderNumberError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::parse(&value) }
}

impl From<OrderNumber> for String {
    fn from(value: OrderNumber) -> Self { value.0 }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub struct OrderNumberError;
impl std::error::Error for OrderNumberError {}
impl fmt::Display for OrderNumberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Malformed order number") }
}
