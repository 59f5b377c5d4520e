use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Currencies the storefront sells in. `USD` is the base currency every
/// catalog base price is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    #[default]
    USD,
    NGN,
    GHS,
}

impl CurrencyCode {
    pub const BASE: CurrencyCode = CurrencyCode::USD;
    pub const ALL: [CurrencyCode; 3] = [CurrencyCode::USD, CurrencyCode::NGN, CurrencyCode::GHS];

    pub fn code(&self) -> &'static str {
        match self {
            CurrencyCode::USD => "USD",
            CurrencyCode::NGN => "NGN",
            CurrencyCode::GHS => "GHS",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CurrencyCode::USD => "$",
            CurrencyCode::NGN => "₦",
            CurrencyCode::GHS => "GH₵",
        }
    }

    /// Decimal places shown when formatting for display.
    pub fn display_decimals(&self) -> u32 {
        match self {
            CurrencyCode::NGN => 0,
            CurrencyCode::USD | CurrencyCode::GHS => 2,
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CurrencyCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(CurrencyCode::USD),
            "NGN" => Ok(CurrencyCode::NGN),
            "GHS" => Ok(CurrencyCode::GHS),
            other => Err(DomainError::Validation(format!(
                "unsupported currency '{other}'"
            ))),
        }
    }
}

/// An amount in a given currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Money {
    pub amount: BigDecimal,
    pub currency: CurrencyCode,
}

impl Money {
    pub fn new(amount: BigDecimal, currency: CurrencyCode) -> Self {
        Self { amount, currency }
    }

    pub fn zero(currency: CurrencyCode) -> Self {
        Self::new(BigDecimal::from(0), currency)
    }

    /// Locale-style display: currency symbol, thousands grouping and the
    /// currency's display precision, e.g. `₦1,500,000` or `$10.00`.
    pub fn format(&self) -> String {
        let decimals = self.currency.display_decimals() as usize;
        let rounded = round_half_up(&self.amount, decimals as i64).with_scale(decimals as i64);
        let (minor, _) = rounded.as_bigint_and_exponent();
        let digits = minor.to_string();
        let (sign, digits) = match digits.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", digits.as_str()),
        };

        let padded = format!("{digits:0>width$}", width = decimals + 1);
        let (whole, fraction) = padded.split_at(padded.len() - decimals);
        let whole = group_thousands(whole);
        if decimals == 0 {
            format!("{sign}{}{whole}", self.currency.symbol())
        } else {
            format!("{sign}{}{whole}.{fraction}", self.currency.symbol())
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

/// Rounds `value` to `scale` decimal places, ties away from zero.
pub fn round_half_up(value: &BigDecimal, scale: i64) -> BigDecimal {
    let factor = BigDecimal::from(10_i64.pow(scale as u32));
    let half = BigDecimal::from(1) / BigDecimal::from(2);
    let scaled = value * &factor;
    let shifted = if scaled < BigDecimal::from(0) {
        scaled - half
    } else {
        scaled + half
    };
    (shifted.with_scale(0) / factor).with_scale(scale)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Decimal places every stored amount is kept to.
pub const MONEY_SCALE: i64 = 2;

/// Checks that `amount` is stored exactly: at most [`MONEY_SCALE`] decimal
/// places and fewer than `integer_digits` digits before the point.
pub fn check_amount(field: &str, amount: &BigDecimal, integer_digits: u32) -> Result<(), DomainError> {
    if amount.with_scale(MONEY_SCALE) != *amount {
        return Err(DomainError::Validation(format!(
            "{field} must have at most {MONEY_SCALE} decimal places, got {amount}"
        )));
    }
    let limit = BigDecimal::from(10_i64.pow(integer_digits));
    if amount.abs() >= limit {
        return Err(DomainError::Validation(format!(
            "{field} must be below {limit}, got {amount}"
        )));
    }
    Ok(())
}

/// Static exchange-rate table, expressed as units of each currency per one
/// unit of the base currency.
#[derive(Debug, Clone)]
pub struct CurrencyConverter {
    rates: HashMap<CurrencyCode, BigDecimal>,
}

impl Default for CurrencyConverter {
    fn default() -> Self {
        let rates = HashMap::from([
            (CurrencyCode::USD, BigDecimal::from(1)),
            (CurrencyCode::NGN, BigDecimal::from(1500)),
            (CurrencyCode::GHS, BigDecimal::from(15)),
        ]);
        Self { rates }
    }
}

impl CurrencyConverter {
    /// Replace the rate for `currency`. The base currency is fixed at 1.
    pub fn with_rate(mut self, currency: CurrencyCode, rate: BigDecimal) -> Result<Self, DomainError> {
        if currency == CurrencyCode::BASE {
            return Err(DomainError::Validation(
                "the base currency rate is fixed at 1".into(),
            ));
        }
        if rate <= BigDecimal::from(0) {
            return Err(DomainError::Validation(format!(
                "exchange rate for {currency} must be positive"
            )));
        }
        self.rates.insert(currency, rate);
        Ok(self)
    }

    pub fn rate(&self, currency: CurrencyCode) -> BigDecimal {
        self.rates
            .get(&currency)
            .cloned()
            .unwrap_or_else(|| BigDecimal::from(1))
    }

    /// Converts `amount` from one currency to another, rounded to 2 places.
    pub fn convert(&self, amount: &BigDecimal, from: CurrencyCode, to: CurrencyCode) -> BigDecimal {
        if from == to {
            return amount.clone();
        }
        let converted = amount * &self.rate(to) / self.rate(from);
        round_half_up(&converted, 2)
    }
}
