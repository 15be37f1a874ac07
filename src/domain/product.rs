use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The product lines the business distributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProductType {
    A,
    GNY,
    C,
    K,
}

impl ProductType {
    pub const ALL: [ProductType; 4] = [ProductType::A, ProductType::GNY, ProductType::C, ProductType::K];

    pub fn code(&self) -> &'static str {
        match self {
            ProductType::A => "A",
            ProductType::GNY => "GNY",
            ProductType::C => "C",
            ProductType::K => "K",
        }
    }

    /// Human-readable name used in reports and listings.
    pub fn label(&self) -> &'static str {
        match self {
            ProductType::A => "Avena",
            ProductType::GNY => "Galletas",
            ProductType::C => "Cookies",
            ProductType::K => "Ketos",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ProductType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductType::ALL
            .into_iter()
            .find(|t| t.code().eq_ignore_ascii_case(s.trim()) || t.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown product type: {}", s))
    }
}

/// A product line item inside an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub quantity: u32,
}

impl Product {
    pub fn new(product_type: ProductType, quantity: u32) -> Self {
        Self { product_type, quantity }
    }
}

/// Parses `TYPE=QUANTITY`, e.g. `GNY=12`.
impl FromStr for Product {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, quantity) = s
            .split_once('=')
            .ok_or_else(|| format!("Expected TYPE=QUANTITY, got: {}", s))?;
        let product_type = kind.parse()?;
        let quantity = quantity
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("Invalid quantity '{}': {}", quantity, e))?;
        Ok(Self::new(product_type, quantity))
    }
}
