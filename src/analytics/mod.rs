//! Aggregations over a snapshot of orders for a time window.
//!
//! Everything here is a pure function of the orders and the supplied "now";
//! results are recomputed from scratch on every call.

pub mod report;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, Months, TimeDelta, TimeZone, Utc};
use serde::Serialize;

use crate::domain::{Order, OrderStatus, ProductType};

pub use report::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    /// Same calendar day as now.
    Day,
    /// The trailing seven calendar days.
    Week,
    /// The trailing calendar month.
    Month,
}

impl TimeWindow {
    /// Earliest instant still inside the window, in `now`'s time zone.
    pub fn start<Tz: TimeZone>(self, now: &DateTime<Tz>) -> DateTime<Tz> {
        match self {
            TimeWindow::Day => {
                let midnight = now.date_naive().and_time(chrono::NaiveTime::MIN);
                now.timezone()
                    .from_local_datetime(&midnight)
                    .earliest()
                    .unwrap_or_else(|| now.clone() - TimeDelta::hours(24))
            }
            TimeWindow::Week => now
                .clone()
                .checked_sub_days(Days::new(7))
                .unwrap_or_else(|| now.clone() - TimeDelta::days(7)),
            TimeWindow::Month => now
                .clone()
                .checked_sub_months(Months::new(1))
                .unwrap_or_else(|| now.clone() - TimeDelta::days(30)),
        }
    }

    pub fn contains<Tz: TimeZone>(self, created_at: DateTime<Utc>, now: &DateTime<Tz>) -> bool {
        let local = created_at.with_timezone(&now.timezone());
        match self {
            TimeWindow::Day => local.date_naive() == now.date_naive(),
            TimeWindow::Week | TimeWindow::Month => local >= self.start(now),
        }
    }

    /// Period name used in reports.
    pub fn label(self) -> &'static str {
        match self {
            TimeWindow::Day => "Día",
            TimeWindow::Week => "Semana",
            TimeWindow::Month => "Mes",
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
            TimeWindow::Month => "month",
        };
        f.write_str(name)
    }
}

impl FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "dia" | "día" => Ok(TimeWindow::Day),
            "week" | "semana" => Ok(TimeWindow::Week),
            "month" | "mes" => Ok(TimeWindow::Month),
            _ => Err(format!("Unknown time window: {} (expected day, week or month)", s)),
        }
    }
}

/// Orders created inside `window`, in collection order.
pub fn filter_window<'a, Tz: TimeZone>(orders: &'a [Order], window: TimeWindow, now: &DateTime<Tz>) -> Vec<&'a Order> {
    orders.iter().filter(|order| window.contains(order.created_at, now)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub window: TimeWindow,
    pub total_orders: usize,
    pub orders_by_gym: BTreeMap<String, usize>,
    /// Every product type is present, zero when unused.
    pub products_by_type: BTreeMap<ProductType, u64>,
    pub orders_by_status: BTreeMap<OrderStatus, usize>,
    /// Sum of `price` over all orders in the window, whatever their status.
    pub total_paid: f64,
}

impl Summary {
    pub fn compute(orders: &[&Order], window: TimeWindow) -> Self {
        let mut orders_by_gym = BTreeMap::new();
        let mut products_by_type: BTreeMap<ProductType, u64> = ProductType::ALL.into_iter().map(|t| (t, 0)).collect();
        let mut orders_by_status = BTreeMap::new();
        let mut total_paid = 0.0;

        for order in orders {
            *orders_by_gym.entry(order.gym_name.clone()).or_insert(0) += 1;
            *orders_by_status.entry(order.status).or_insert(0) += 1;
            for product in &order.products {
                *products_by_type.entry(product.product_type).or_insert(0) += u64::from(product.quantity);
            }
            if let Some(price) = order.price {
                total_paid += price;
            }
        }

        Self {
            window,
            total_orders: orders.len(),
            orders_by_gym,
            products_by_type,
            orders_by_status,
            total_paid,
        }
    }

    pub fn total_gyms(&self) -> usize {
        self.orders_by_gym.len()
    }

    pub fn total_units(&self) -> u64 {
        self.products_by_type.values().sum()
    }

    /// Percentage of the window's orders that have `status`; 0 for an empty window.
    pub fn status_share(&self, status: OrderStatus) -> f64 {
        if self.total_orders == 0 {
            return 0.0;
        }
        let count = self.orders_by_status.get(&status).copied().unwrap_or(0);
        count as f64 * 100.0 / self.total_orders as f64
    }

    /// The `n` gyms with the most orders, busiest first, ties by name.
    pub fn top_gyms(&self, n: usize) -> Vec<(String, usize)> {
        let mut gyms: Vec<(String, usize)> = self.orders_by_gym.iter().map(|(g, c)| (g.clone(), *c)).collect();
        gyms.sort_by(|(a_name, a), (b_name, b)| b.cmp(a).then_with(|| a_name.cmp(b_name)));
        gyms.truncate(n);
        gyms
    }
}

/// Filters `orders` to `window` and aggregates the result.
pub fn summarize<Tz: TimeZone>(orders: &[Order], window: TimeWindow, now: &DateTime<Tz>) -> Summary {
    Summary::compute(&filter_window(orders, window, now), window)
}
