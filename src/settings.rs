//! Display Settings
//!
//! Currency selection, exchange rate and delivery location. Catalog prices are
//! stored in AED; everything shown to the shopper passes through
//! [`Settings::convert_price`] so converted and unconverted amounts never mix.

use crate::store::models::Money;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// AED → USD rate used when none is configured
pub const DEFAULT_EXCHANGE_RATE: Decimal = Decimal::from_parts(27, 0, 0, false, 2);

/// Delivery locations offered by the location picker
pub const DELIVERY_LOCATIONS: [&str; 7] = [
    "دبي",
    "أبوظبي",
    "الشارقة",
    "عجمان",
    "رأس الخيمة",
    "الفجيرة",
    "أم القيوين",
];

/// Default delivery location (Abu Dhabi)
pub const DEFAULT_LOCATION: &str = "أبوظبي";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Currency {
    /// Base currency of the catalog
    #[default]
    #[serde(rename = "AED")]
    Aed,
    #[serde(rename = "USD")]
    Usd,
}

impl Currency {
    pub fn code(self) -> &'static str {
        match self {
            Currency::Aed => "AED",
            Currency::Usd => "USD",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Aed => "د.إ",
            Currency::Usd => "$",
        }
    }
}

/// Per-session display settings
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    currency: Currency,
    exchange_rate: Decimal,
    location: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(Currency::default(), DEFAULT_EXCHANGE_RATE)
    }
}

impl Settings {
    pub fn new(currency: Currency, exchange_rate: Decimal) -> Self {
        Self {
            currency,
            exchange_rate,
            location: DEFAULT_LOCATION.to_string(),
        }
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn set_currency(&mut self, currency: Currency) {
        self.currency = currency;
    }

    pub fn exchange_rate(&self) -> Decimal {
        self.exchange_rate
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Any string is accepted; the picker restricts choices on its side
    pub fn set_location(&mut self, location: impl Into<String>) {
        self.location = location.into();
    }

    pub fn currency_symbol(&self) -> &'static str {
        self.currency.symbol()
    }

    /// Maps a base-currency amount to the selected display currency.
    ///
    /// AED amounts pass through untouched. USD amounts are multiplied by the
    /// exchange rate and rounded to a whole unit, halves away from zero.
    pub fn convert_price(&self, amount: Money) -> Money {
        match self.currency {
            Currency::Aed => amount,
            Currency::Usd => (amount * self.exchange_rate)
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
        }
    }

    /// Converted amount followed by the currency symbol, e.g. `"270 $"`
    pub fn format_price(&self, amount: Money) -> String {
        format!(
            "{} {}",
            self.convert_price(amount).normalize(),
            self.currency_symbol()
        )
    }
}
