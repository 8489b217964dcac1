use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Represents a non-negative monetary amount.
///
/// This is a wrapper around `rust_decimal::Decimal`. It is currency-agnostic:
/// scaling into minor units is left to the network encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self> {
        if value >= Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PaymentError::validation(
                "amount",
                format!("must be non-negative, got {value}"),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// The amount expressed in hundredths, failing if that loses precision
    /// or does not fit.
    pub fn minor_units(&self) -> Option<i64> {
        let scaled = self.0.checked_mul(Decimal::ONE_HUNDRED)?;
        if scaled.fract() != Decimal::ZERO {
            return None;
        }
        scaled.trunc().to_i64()
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An ISO 4217 alphabetic currency code, stored upper-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency([u8; 3]);

impl Currency {
    pub fn as_str(&self) -> &str {
        // Constructed from ASCII letters only.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl FromStr for Currency {
    type Err = PaymentError;

    fn from_str(code: &str) -> Result<Self> {
        let bytes = code.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(PaymentError::validation(
                "currency",
                format!("expected a 3-letter code, got {code:?}"),
            ));
        }
        let mut upper = [0u8; 3];
        for (slot, byte) in upper.iter_mut().zip(bytes) {
            *slot = byte.to_ascii_uppercase();
        }
        Ok(Self(upper))
    }
}

impl TryFrom<String> for Currency {
    type Error = PaymentError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.as_str().to_string()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(1.0)).is_ok());
        assert!(Amount::new(dec!(0.0)).is_ok());
        assert!(matches!(
            Amount::new(dec!(-0.01)),
            Err(PaymentError::ValidationError { field: "amount", .. })
        ));
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(Amount::new(dec!(14)).unwrap().minor_units(), Some(1400));
        assert_eq!(Amount::new(dec!(2.02)).unwrap().minor_units(), Some(202));
        assert_eq!(Amount::new(dec!(2.325)).unwrap().minor_units(), None);
        assert_eq!(Amount::new(dec!(2.320)).unwrap().minor_units(), Some(232));
    }

    #[test]
    fn test_minor_units_overflow() {
        assert_eq!(Amount::new(Decimal::MAX).unwrap().minor_units(), None);
        assert_eq!(Amount::new(Decimal::from(i64::MAX)).unwrap().minor_units(), None);
    }

    #[test]
    fn test_amount_eq() {
        assert_eq!(Amount::new(dec!(1.50)).unwrap(), Amount::new(dec!(1.5)).unwrap());
    }

    #[test]
    fn test_currency_parsing() {
        let usd: Currency = "usd".parse().unwrap();
        assert_eq!(usd.as_str(), "USD");
        assert!("US".parse::<Currency>().is_err());
        assert!("US1".parse::<Currency>().is_err());
        assert!("EURO".parse::<Currency>().is_err());
    }

    #[test]
    fn test_currency_serde() {
        let eur: Currency = serde_json::from_str("\"eur\"").unwrap();
        assert_eq!(serde_json::to_string(&eur).unwrap(), "\"EUR\"");
        assert!(serde_json::from_str::<Currency>("\"eu\"").is_err());
    }
}
