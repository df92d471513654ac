//! Amount and currency types shared by the checkout crates

use std::fmt::Display;

use error_stack::{report, ResultExt};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Deserialize, Serialize};

use crate::{consts, errors::ParsingError};

/// Currency as reported by the host checkout: ISO code plus the number of
/// minor-unit digits the cart totals are expressed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
    pub minor_unit: u32,
}

impl Currency {
    pub fn new(code: impl Into<String>, minor_unit: u32) -> Self {
        Self {
            code: code.into(),
            minor_unit,
        }
    }
}

/// Converts between the host's minor-unit amounts and the representation a
/// collaborator expects.
pub trait AmountConvertor: Send {
    type Output;
    fn convert(
        &self,
        amount: MinorUnit,
        currency: &Currency,
    ) -> Result<Self::Output, error_stack::Report<ParsingError>>;

    fn convert_back(
        &self,
        amount: Self::Output,
        currency: &Currency,
    ) -> Result<MinorUnit, error_stack::Report<ParsingError>>;
}

/// Core conversion type: minor units to a two-decimal major-unit string.
#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StringMajorUnitForCore;

impl AmountConvertor for StringMajorUnitForCore {
    type Output = StringMajorUnit;

    fn convert(
        &self,
        amount: MinorUnit,
        currency: &Currency,
    ) -> Result<Self::Output, error_stack::Report<ParsingError>> {
        amount.to_major_unit_as_string(currency)
    }

    fn convert_back(
        &self,
        amount: StringMajorUnit,
        currency: &Currency,
    ) -> Result<MinorUnit, error_stack::Report<ParsingError>> {
        amount.to_minor_unit_as_i64(currency)
    }
}

/// The unit in which the host checkout reports cart totals.
#[derive(
    Default, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Serialize, Deserialize,
)]
pub struct MinorUnit(i64);

impl MinorUnit {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn get_amount_as_i64(self) -> i64 {
        self.0
    }

    /// Convert to the major denomination, formatted with exactly two
    /// decimal places as the verification provider expects.
    fn to_major_unit_as_string(
        self,
        currency: &Currency,
    ) -> Result<StringMajorUnit, error_stack::Report<ParsingError>> {
        let amount_decimal = Decimal::new(self.0, currency.minor_unit);
        let rounded = amount_decimal.round_dp(consts::MAJOR_UNIT_DECIMAL_PLACES);
        Ok(StringMajorUnit::new(format!("{rounded:.2}")))
    }
}

impl Display for MinorUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A major-unit amount string, e.g. `"12.50"`.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringMajorUnit(String);

impl StringMajorUnit {
    pub fn new(value: String) -> Self {
        Self(value)
    }

    pub fn get_amount_as_string(&self) -> &str {
        &self.0
    }

    /// Whether the amount is zero, e.g. a free trial order.
    pub fn is_zero(&self) -> bool {
        Decimal::from_str_exact(&self.0)
            .map(|value| value.is_zero())
            .unwrap_or(false)
    }

    fn to_minor_unit_as_i64(
        &self,
        currency: &Currency,
    ) -> Result<MinorUnit, error_stack::Report<ParsingError>> {
        let major = Decimal::from_str_exact(&self.0)
            .change_context(ParsingError::DecimalParseFailure("StringMajorUnit"))?;
        let scale = Decimal::new(10_i64.pow(currency.minor_unit), 0);
        (major * scale)
            .to_i64()
            .map(MinorUnit::new)
            .ok_or_else(|| report!(ParsingError::DecimalParseFailure("StringMajorUnit")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_unit_to_major_unit_string() {
        let currency = Currency::new("USD", 2);
        let amount = StringMajorUnitForCore
            .convert(MinorUnit::new(1099), &currency)
            .unwrap();
        assert_eq!(amount.get_amount_as_string(), "10.99");
    }

    #[test]
    fn test_zero_decimal_currency_keeps_two_places() {
        let currency = Currency::new("JPY", 0);
        let amount = StringMajorUnitForCore
            .convert(MinorUnit::new(500), &currency)
            .unwrap();
        assert_eq!(amount.get_amount_as_string(), "500.00");
    }

    #[test]
    fn test_zero_amount_detection() {
        let currency = Currency::new("USD", 2);
        let amount = StringMajorUnitForCore
            .convert(MinorUnit::zero(), &currency)
            .unwrap();
        assert_eq!(amount.get_amount_as_string(), "0.00");
        assert!(amount.is_zero());
        assert!(!StringMajorUnit::new("0.01".to_string()).is_zero());
    }

    #[test]
    fn test_major_unit_round_trip() {
        let currency = Currency::new("USD", 2);
        let major = StringMajorUnit::new("12.50".to_string());
        let minor = StringMajorUnitForCore
            .convert_back(major, &currency)
            .unwrap();
        assert_eq!(minor.get_amount_as_i64(), 1250);
    }
}
