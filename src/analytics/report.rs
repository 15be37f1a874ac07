use std::fmt;

use chrono::{DateTime, TimeZone};
use serde::Serialize;

use super::{Summary, TimeWindow};
use crate::domain::{Order, OrderStatus, ProductType};

const DATE_FORMAT: &str = "%d/%m/%Y";
const TOP_GYMS: usize = 5;

/// One row per product line of an order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRow {
    pub gym: String,
    pub date: String,
    pub status: OrderStatus,
    pub product: &'static str,
    pub quantity: u32,
    pub price: Option<f64>,
    pub notes: String,
}

/// Tabular analytics report: a summary block followed by detail rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub window: TimeWindow,
    /// `dd/mm/yyyy`, or `from - to` for multi-day windows.
    pub period: String,
    pub total_orders: usize,
    pub total_gyms: usize,
    pub total_units: u64,
    pub total_paid: f64,
    pub products: Vec<(ProductType, u64)>,
    /// Status, order count and percentage of the window's orders.
    pub statuses: Vec<(OrderStatus, usize, f64)>,
    pub top_gyms: Vec<(String, usize)>,
    pub details: Vec<DetailRow>,
}

impl AnalyticsReport {
    /// `orders` must be the filtered set `summary` was computed from.
    pub fn build<Tz>(orders: &[&Order], summary: &Summary, now: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let period = match summary.window {
            TimeWindow::Day => now.format(DATE_FORMAT).to_string(),
            window => format!(
                "{} - {}",
                window.start(now).format(DATE_FORMAT),
                now.format(DATE_FORMAT)
            ),
        };

        let mut sorted: Vec<&Order> = orders.to_vec();
        sorted.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.gym_name.cmp(&b.gym_name))
        });

        let tz = now.timezone();
        let details = sorted
            .into_iter()
            .flat_map(|order| {
                let date = order.created_at.with_timezone(&tz).format(DATE_FORMAT).to_string();
                order.products.iter().map(move |product| DetailRow {
                    gym: order.gym_name.clone(),
                    date: date.clone(),
                    status: order.status,
                    product: product.product_type.label(),
                    quantity: product.quantity,
                    price: order.price,
                    notes: order.notes.clone().unwrap_or_default(),
                })
            })
            .collect();

        let mut statuses: Vec<(OrderStatus, usize, f64)> = summary
            .orders_by_status
            .iter()
            .map(|(s, n)| (*s, *n, summary.status_share(*s)))
            .collect();
        statuses.sort_by(|(a, ..), (b, ..)| a.as_str().cmp(b.as_str()));

        Self {
            window: summary.window,
            period,
            total_orders: summary.total_orders,
            total_gyms: summary.total_gyms(),
            total_units: summary.total_units(),
            total_paid: summary.total_paid,
            products: summary.products_by_type.iter().map(|(t, n)| (*t, *n)).collect(),
            statuses,
            top_gyms: summary.top_gyms(TOP_GYMS),
            details,
        }
    }

    /// Flattens the report into a grid of cells, blank rows between blocks.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        let mut rows: Vec<Vec<String>> = Vec::new();
        fn cells(values: &[&str]) -> Vec<String> {
            values.iter().map(|v| v.to_string()).collect()
        }

        rows.push(cells(&["REPORTE DE ANÁLISIS"]));
        rows.push(cells(&["Fecha:", self.period.as_str()]));
        rows.push(cells(&["Periodo:", self.window.label()]));
        rows.push(Vec::new());

        rows.push(cells(&["RESUMEN"]));
        rows.push(cells(&["Total Ordenes:", self.total_orders.to_string().as_str()]));
        rows.push(cells(&["Total Gyms:", self.total_gyms.to_string().as_str()]));
        rows.push(cells(&["Total Productos:", self.total_units.to_string().as_str()]));
        rows.push(cells(&["Total Cobrado:", format!("{:.2}", self.total_paid).as_str()]));
        rows.push(Vec::new());

        rows.push(cells(&["PRODUCTOS POR TIPO"]));
        rows.push(cells(&["Tipo", "Cantidad"]));
        for (kind, units) in &self.products {
            rows.push(vec![format!("{} ({})", kind.label(), kind.code()), units.to_string()]);
        }
        rows.push(Vec::new());

        rows.push(cells(&["ESTADO DE ORDENES"]));
        rows.push(cells(&["Estado", "Cantidad", "Porcentaje"]));
        for (status, count, share) in &self.statuses {
            rows.push(vec![status.to_string(), count.to_string(), format!("{:.1}%", share)]);
        }
        rows.push(Vec::new());

        rows.push(cells(&["TOP GYMS"]));
        rows.push(cells(&["Gym", "Ordenes"]));
        for (gym, count) in &self.top_gyms {
            rows.push(vec![gym.clone(), count.to_string()]);
        }
        rows.push(Vec::new());

        rows.push(cells(&["DETALLE DE ORDENES"]));
        rows.push(cells(&["Gym", "Fecha", "Estado", "Producto", "Cantidad", "Precio", "Notas"]));
        for row in &self.details {
            rows.push(vec![
                row.gym.clone(),
                row.date.clone(),
                row.status.to_string(),
                row.product.to_string(),
                row.quantity.to_string(),
                row.price.map(|p| format!("{:.2}", p)).unwrap_or_default(),
                row.notes.clone(),
            ]);
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::filter_window;
    use crate::domain::Product;
    use chrono::{TimeDelta, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 15, 0, 0).unwrap()
    }

    fn fixture() -> Vec<Order> {
        vec![
            Order::new("1", "Zeta Gym", vec![Product::new(ProductType::A, 3)], OrderStatus::Delivered, now() - TimeDelta::days(2)),
            Order::new(
                "2",
                "Body Works",
                vec![Product::new(ProductType::GNY, 1), Product::new(ProductType::K, 4)],
                OrderStatus::DeliveredPaid,
                now() - TimeDelta::hours(1),
            )
            .with_price(40.0)
            .with_notes("caja"),
            Order::new("3", "Alpha Gym", vec![Product::new(ProductType::C, 2)], OrderStatus::DeliveredTransfer, now() - TimeDelta::hours(1)),
        ]
    }

    fn report(window: TimeWindow) -> AnalyticsReport {
        let orders = fixture();
        let filtered = filter_window(&orders, window, &now());
        let summary = Summary::compute(&filtered, window);
        AnalyticsReport::build(&filtered, &summary, &now())
    }

    #[test]
    fn details_are_newest_first_then_by_gym() {
        let report = report(TimeWindow::Week);
        let gyms: Vec<&str> = report.details.iter().map(|r| r.gym.as_str()).collect();
        assert_eq!(gyms, vec!["Alpha Gym", "Body Works", "Body Works", "Zeta Gym"]);

        let body_works = &report.details[1];
        assert_eq!(body_works.product, "Galletas");
        assert_eq!(body_works.price, Some(40.0));
        assert_eq!(body_works.notes, "caja");
        assert_eq!(body_works.date, "18/10/2026");
    }

    #[test]
    fn summary_block_matches_the_window() {
        let report = report(TimeWindow::Week);
        assert_eq!(report.period, "11/10/2026 - 18/10/2026");
        assert_eq!(report.total_orders, 3);
        assert_eq!(report.total_units, 10);
        assert_eq!(report.products.len(), 4);

        let statuses: Vec<&str> = report.statuses.iter().map(|(s, ..)| s.as_str()).collect();
        assert_eq!(statuses, vec!["Entregado", "Entregado + P", "Entregado + TRF"]);
    }

    #[test]
    fn status_block_carries_percentages_and_top_gyms() {
        let report = report(TimeWindow::Day);
        let rows = report.to_rows();
        assert!(rows.contains(&vec!["Entregado + P".to_string(), "1".to_string(), "50.0%".to_string()]));
        assert_eq!(report.top_gyms, vec![("Alpha Gym".to_string(), 1), ("Body Works".to_string(), 1)]);

        let top = rows.iter().position(|r| r.first().map(String::as_str) == Some("TOP GYMS")).unwrap();
        assert_eq!(rows[top + 2], vec!["Alpha Gym".to_string(), "1".to_string()]);
    }

    #[test]
    fn rows_include_each_block() {
        let rows = report(TimeWindow::Day).to_rows();
        assert_eq!(rows[0], vec!["REPORTE DE ANÁLISIS".to_string()]);
        assert_eq!(rows[1], vec!["Fecha:".to_string(), "18/10/2026".to_string()]);
        assert!(rows.contains(&vec!["Total Cobrado:".to_string(), "40.00".to_string()]));
        // Two orders today, three product lines.
        let header = rows.iter().rposition(|r| r.first().map(String::as_str) == Some("Gym")).unwrap();
        assert_eq!(rows.len() - header - 1, 3);
    }
}
