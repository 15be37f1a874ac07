use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Product;
use crate::clock::truncate_to_millis;

/// Delivery state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "Entregado")]
    Delivered,
    #[serde(rename = "Entregado + P")]
    DeliveredPaid,
    #[serde(rename = "Entregado + TRF")]
    DeliveredTransfer,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Delivered => "Entregado",
            OrderStatus::DeliveredPaid => "Entregado + P",
            OrderStatus::DeliveredTransfer => "Entregado + TRF",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the stored names plus the short forms `P` and `TRF`.
impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_ascii_lowercase();
        match compact.as_str() {
            "entregado" | "delivered" => Ok(OrderStatus::Delivered),
            "entregado+p" | "p" | "paid" => Ok(OrderStatus::DeliveredPaid),
            "entregado+trf" | "trf" | "transfer" => Ok(OrderStatus::DeliveredTransfer),
            _ => Err(format!("Unknown order status: {}", s)),
        }
    }
}

/// A customer order tracked through delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub gym_name: String,
    pub products: Vec<Product>,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Only meaningful for [`OrderStatus::DeliveredPaid`], but stored as given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Builds a fresh order whose `created_at` and `updated_at` are both `now`,
    /// truncated to milliseconds.
    pub fn new(
        id: impl Into<String>,
        gym_name: impl Into<String>,
        products: Vec<Product>,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> Self {
        let now = truncate_to_millis(now);
        Self {
            id: id.into(),
            gym_name: gym_name.into(),
            products,
            status,
            notes: None,
            price: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }
}

/// Partial update merged over an existing order.
///
/// `notes` and `price` use a nested `Option` so a patch can clear them:
/// `Some(None)` removes the value, `None` leaves it untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderPatch {
    pub gym_name: Option<String>,
    pub products: Option<Vec<Product>>,
    pub status: Option<OrderStatus>,
    pub notes: Option<Option<String>>,
    pub price: Option<Option<f64>>,
}

impl OrderPatch {
    pub fn is_empty(&self) -> bool {
        *self == OrderPatch::default()
    }

    pub fn gym_name(mut self, gym_name: impl Into<String>) -> Self {
        self.gym_name = Some(gym_name.into());
        self
    }

    pub fn products(mut self, products: Vec<Product>) -> Self {
        self.products = Some(products);
        self
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = Some(notes);
        self
    }

    pub fn price(mut self, price: Option<f64>) -> Self {
        self.price = Some(price);
        self
    }
}

/// Timestamps as UTC ISO-8601 with millisecond precision.
pub(crate) mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| crate::clock::truncate_to_millis(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProductType;
    use chrono::TimeZone;

    fn sample() -> Order {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();
        Order::new("1", "Gym A", vec![Product::new(ProductType::A, 3)], OrderStatus::Delivered, now)
    }

    #[test]
    fn serializes_camel_case_without_absent_fields() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["gymName"], "Gym A");
        assert_eq!(value["status"], "Entregado");
        assert_eq!(value["createdAt"], "2026-10-18T09:30:00.000Z");
        assert!(value.get("price").is_none());
        assert!(value.get("notes").is_none());
    }

    #[test]
    fn accepts_offset_timestamps() {
        let json = r#"{"id":"9","gymName":"G","products":[],"status":"Entregado + TRF",
            "createdAt":"2026-10-18T11:30:00+02:00","updatedAt":"2026-10-18T09:30:00.000Z"}"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.created_at, order.updated_at);
        assert_eq!(order.status, OrderStatus::DeliveredTransfer);
    }

    #[test]
    fn timestamps_keep_millisecond_precision() {
        let json = r#"{"id":"9","gymName":"G","products":[],"status":"Entregado",
            "createdAt":"2026-10-18T09:30:00.123456Z","updatedAt":"2026-10-18T09:30:00.123999Z"}"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.created_at, Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap() + chrono::TimeDelta::milliseconds(123));
        assert_eq!(order.updated_at, order.created_at);

        let now = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap() + chrono::TimeDelta::microseconds(7_654);
        let fresh = Order::new("2", "G", Vec::new(), OrderStatus::Delivered, now);
        assert_eq!(serde_json::to_value(&fresh).unwrap()["createdAt"], "2026-10-18T09:30:00.007Z");
        assert_eq!(serde_json::from_value::<Order>(serde_json::to_value(&fresh).unwrap()).unwrap(), fresh);
    }

    #[test]
    fn status_parses_short_forms() {
        assert_eq!("Entregado + P".parse::<OrderStatus>(), Ok(OrderStatus::DeliveredPaid));
        assert_eq!("trf".parse::<OrderStatus>(), Ok(OrderStatus::DeliveredTransfer));
        assert_eq!("entregado".parse::<OrderStatus>(), Ok(OrderStatus::Delivered));
        assert!("pending".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(OrderPatch::default().is_empty());
        assert!(!OrderPatch::default().notes(None).is_empty());
    }
}
