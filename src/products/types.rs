//! Wire types of the product API

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Error, Result};

/// Largest integer an `f64` holds exactly
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A price or price threshold.
///
/// The API is not consistent about numbers: prices may arrive as JSON numbers
/// or as numeric strings. Both normalize to a finite `f64` here, and anything
/// else is a deserialization error.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Deserialize)]
#[serde(try_from = "RawPrice")]
pub struct Price(f64);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Number(f64),
    Text(String),
}

impl TryFrom<RawPrice> for Price {
    type Error = String;

    fn try_from(raw: RawPrice) -> Result<Self, Self::Error> {
        let value = match raw {
            RawPrice::Number(value) => value,
            RawPrice::Text(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("price {:?} is not numeric", text))?,
        };
        Price::new(value).ok_or_else(|| format!("price {} is not finite", value))
    }
}

impl Price {
    /// Wrap a finite value
    pub fn new(value: f64) -> Option<Self> {
        value.is_finite().then_some(Price(value))
    }

    /// The numeric value
    pub fn value(self) -> f64 {
        self.0
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Whole prices go out as integers, the way a browser would send them.
        if self.0.fract() == 0.0 && self.0.abs() < MAX_EXACT_INTEGER {
            serializer.serialize_i64(self.0 as i64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{:.0}", self.0)
        } else {
            write!(f, "{:.2}", self.0)
        }
    }
}

/// A listing the user follows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedProduct {
    /// Server-assigned identifier
    #[serde(rename = "ProductID")]
    pub id: String,

    /// Listing URL, as given at creation
    pub url: String,

    /// Display name, filled in by the server once it has scraped the listing
    #[serde(default)]
    pub title: Option<String>,

    /// Desired price
    pub threshold: Price,

    /// Most recent price the server observed
    #[serde(
        rename = "lastCheckedPrice",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_checked_price: Option<Price>,
}

impl TrackedProduct {
    /// Shorthand for [`derive_status`]
    pub fn status(&self) -> PriceStatus {
        derive_status(self)
    }
}

/// How the last checked price compares with the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceStatus {
    /// Cheaper than wanted
    Below,
    /// Exactly the wanted price
    Equal,
    /// More expensive than wanted, or not priced yet
    Above,
}

/// Compare the last checked price with the threshold.
///
/// Recomputed on every call; never cached. A product the server has not priced
/// yet counts as [`PriceStatus::Above`].
pub fn derive_status(product: &TrackedProduct) -> PriceStatus {
    match product.last_checked_price {
        Some(price) if price < product.threshold => PriceStatus::Below,
        Some(price) if price == product.threshold => PriceStatus::Equal,
        _ => PriceStatus::Above,
    }
}

/// Body of a create request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProduct {
    /// Listing URL
    pub url: String,
    /// Desired price
    pub threshold: Price,
}

impl NewProduct {
    /// Validate raw form input
    pub fn parse(url: &str, threshold: &str) -> Result<Self> {
        let url = url.trim();
        let threshold = threshold.trim();

        if url.is_empty() || threshold.is_empty() {
            return Err(Error::validation(
                "Please fill in the product URL and the desired price.",
            ));
        }

        let threshold = threshold
            .parse::<f64>()
            .ok()
            .and_then(Price::new)
            .ok_or_else(|| Error::validation("The desired price must be a number."))?;

        if threshold.value() <= 0.0 {
            return Err(Error::validation(
                "The desired price must be greater than zero.",
            ));
        }

        Ok(Self {
            url: url.to_string(),
            threshold,
        })
    }
}

/// Contents of the "add product" form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductDraft {
    /// Listing URL as typed
    pub url: String,
    /// Desired price as typed
    pub threshold: String,
}

impl ProductDraft {
    /// True when both inputs are blank
    pub fn is_empty(&self) -> bool {
        self.url.trim().is_empty() && self.threshold.trim().is_empty()
    }
}
