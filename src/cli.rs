use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, ensure, Context};
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::analytics::{filter_window, AnalyticsReport, Summary, TimeWindow};
use crate::clients::OrderClient;
use crate::clock::{Clock, SystemClock};
use crate::domain::{Order, OrderPatch, OrderQuery, OrderStatus, Product, ProductType};

const TOP_GYMS: usize = 5;

#[derive(Parser, Debug)]
#[command(name = "order_tracker")]
#[command(about = "Track product deliveries to gyms", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./order-tracker.toml, then built-in defaults)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List orders, newest first
    List {
        /// Case-insensitive substring of the gym name
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short, long)]
        gym: Option<String>,
        /// A, GNY, C, K or the product name
        #[arg(short, long)]
        product: Option<ProductType>,
        /// Entregado, "Entregado + P" or "Entregado + TRF" (also: delivered, paid, transfer)
        #[arg(long)]
        status: Option<OrderStatus>,
    },

    /// Print one order as JSON
    Show { id: String },

    /// Record a delivery
    Add {
        /// Defaults to the current time in epoch milliseconds
        #[arg(long)]
        id: Option<String>,
        #[arg(short, long)]
        gym: String,
        /// Line item as TYPE=QUANTITY; repeat for several
        #[arg(short, long = "product")]
        products: Vec<Product>,
        #[arg(long, default_value = "Entregado")]
        status: OrderStatus,
        #[arg(short, long)]
        notes: Option<String>,
        #[arg(long)]
        price: Option<f64>,
    },

    /// Change fields of an existing order
    Update {
        id: String,
        #[arg(short, long)]
        gym: Option<String>,
        /// Replaces all line items when given
        #[arg(short, long = "product")]
        products: Vec<Product>,
        #[arg(long)]
        status: Option<OrderStatus>,
        #[arg(short, long, conflicts_with = "clear_notes")]
        notes: Option<String>,
        #[arg(long)]
        clear_notes: bool,
        #[arg(long, conflicts_with = "clear_price")]
        price: Option<f64>,
        #[arg(long)]
        clear_price: bool,
    },

    /// Remove one order
    Delete { id: String },

    /// Remove every order
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Replace every order with the JSON array in FILE ("-" reads stdin)
    Import {
        file: PathBuf,
        /// Confirm that existing orders will be discarded
        #[arg(long)]
        yes: bool,
    },

    /// Write the orders to a new file and hand it to the share target
    Export,

    /// Print all orders as a JSON array
    Dump,

    /// Aggregate orders for a day, week or month
    Analytics {
        #[arg(short, long, default_value = "day")]
        window: TimeWindow,
        /// Print the tabular report instead of the summary
        #[arg(long)]
        report: bool,
    },

    /// Distinct gym names, in first-seen order
    Gyms,
}

pub async fn run(command: Command, client: &OrderClient) -> anyhow::Result<()> {
    match command {
        Command::List { search, gym, product, status } => {
            let query = OrderQuery { search, gym, product, status };
            let mut orders = client.query(&query);
            orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            for order in &orders {
                println!("{}", order_line(order));
            }
            info!(shown = orders.len(), "Listed orders");
        }

        Command::Show { id } => match client.get_order(id.clone()).await? {
            Some(order) => println!("{}", serde_json::to_string_pretty(&order)?),
            None => bail!("No order with id {}", id),
        },

        Command::Add { id, gym, products, status, notes, price } => {
            let gym = gym.trim();
            ensure!(!gym.is_empty(), "Gym name must not be empty");
            ensure!(!products.is_empty(), "An order needs at least one product");
            check_price(status, price)?;
            let now = SystemClock.now();
            let id = id.unwrap_or_else(|| now.timestamp_millis().to_string());
            ensure!(
                client.get_order(id.clone()).await?.is_none(),
                "An order with id {} already exists",
                id
            );

            let mut order = Order::new(id, gym, products, status, now);
            if let Some(notes) = notes {
                order = order.with_notes(notes);
            }
            if let Some(price) = price {
                order = order.with_price(price);
            }
            let line = order_line(&order);
            client.add_order(order).await?;
            println!("{}", line);
        }

        Command::Update { id, gym, products, status, notes, clear_notes, price, clear_price } => {
            let Some(current) = client.get_order(id.clone()).await? else {
                bail!("No order with id {}", id);
            };
            check_price(status.unwrap_or(current.status), price)?;

            let mut patch = OrderPatch::default();
            if let Some(gym) = gym {
                let gym = gym.trim();
                ensure!(!gym.is_empty(), "Gym name must not be empty");
                patch = patch.gym_name(gym);
            }
            if !products.is_empty() {
                patch = patch.products(products);
            }
            if let Some(status) = status {
                patch = patch.status(status);
                // Only paid orders keep a price.
                if status != OrderStatus::DeliveredPaid {
                    patch = patch.price(None);
                }
            }
            if clear_notes || notes.is_some() {
                patch = patch.notes(notes);
            }
            if clear_price || price.is_some() {
                patch = patch.price(price);
            }
            ensure!(!patch.is_empty(), "Nothing to update");

            match client.update_order(id.clone(), patch).await? {
                Some(order) => println!("{}", order_line(&order)),
                None => bail!("No order with id {}", id),
            }
        }

        Command::Delete { id } => {
            ensure!(client.delete_order(id.clone()).await?, "No order with id {}", id);
            println!("Deleted {}", id);
        }

        Command::Clear { yes } => {
            ensure!(yes, "Refusing to delete every order without --yes");
            let removed = client.clear_orders().await?;
            println!("Removed {} orders", removed);
        }

        Command::Import { file, yes } => {
            ensure!(yes, "Import replaces every existing order; pass --yes to continue");
            let text = read_input(&file)?;
            let report = client.import_from_text(&text).await;
            println!("{}", report);
            ensure!(report.success, "Import failed");
        }

        Command::Export => {
            let report = client.export_to_sharable_file().await;
            println!("{}", report);
            ensure!(report.success, "Export failed");
        }

        Command::Dump => println!("{}", client.serialize()?),

        Command::Analytics { window, report } => {
            let now = Local::now();
            if report {
                let orders = client.orders();
                let in_window = filter_window(&orders, window, &now);
                let summary = Summary::compute(&in_window, window);
                for row in AnalyticsReport::build(&in_window, &summary, &now).to_rows() {
                    println!("{}", row.join("\t"));
                }
            } else {
                print_summary(&client.summary(window, &now));
            }
        }

        Command::Gyms => {
            for name in client.gym_names() {
                println!("{}", name);
            }
        }
    }
    Ok(())
}

/// A price belongs to paid orders only and is never negative.
fn check_price(status: OrderStatus, price: Option<f64>) -> anyhow::Result<()> {
    let Some(price) = price else {
        return Ok(());
    };
    ensure!(
        status == OrderStatus::DeliveredPaid,
        "A price can only be recorded for \"{}\" orders",
        OrderStatus::DeliveredPaid
    );
    ensure!(price.is_finite() && price >= 0.0, "Price must be a non-negative amount");
    Ok(())
}

fn read_input(file: &Path) -> anyhow::Result<String> {
    if file.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text).context("reading stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))
}

fn order_line(order: &Order) -> String {
    let products: Vec<String> = order
        .products
        .iter()
        .map(|p| format!("{}={}", p.product_type, p.quantity))
        .collect();
    let mut line = format!(
        "{}  {}  {}  [{}]  {}",
        order.id,
        order.created_at.with_timezone(&Local).format("%d/%m/%Y %H:%M"),
        order.gym_name,
        order.status,
        products.join(" ")
    );
    if let Some(price) = order.price {
        line.push_str(&format!("  ${:.2}", price));
    }
    if let Some(notes) = &order.notes {
        line.push_str(&format!("  ({})", notes));
    }
    line
}

fn print_summary(summary: &Summary) {
    println!("Periodo: {}", summary.window.label());
    println!("Total Pedidos: {}", summary.total_orders);
    println!("Total Gimnasios: {}", summary.total_gyms());
    println!("Total Unidades: {}", summary.total_units());
    println!("Total Cobrado: ${:.2}", summary.total_paid);

    println!("Productos:");
    for (product, units) in &summary.products_by_type {
        println!("  {}: {}", product.label(), units);
    }
    println!("Estados:");
    for (status, count) in &summary.orders_by_status {
        println!("  {}: {} ({:.1}%)", status, count, summary.status_share(*status));
    }
    println!("Top Gimnasios:");
    for (gym, count) in summary.top_gyms(TOP_GYMS) {
        println!("  {}: {}", gym, count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use crate::app_system::OrderSystem;
    use crate::clock::ManualClock;
    use crate::config::{ActorConfig, Config, ExportConfig, ShareKind, StorageConfig};
    use crate::export::DisabledShare;
    use crate::persistence::MemoryStorage;

    async fn start_system() -> OrderSystem {
        let config = Config {
            storage: StorageConfig { data_dir: PathBuf::from("unused"), key: "orders-storage".to_string() },
            export: ExportConfig {
                dir: PathBuf::from("unused"),
                prefix: "orders-export".to_string(),
                share: ShareKind::Disabled,
            },
            actor: ActorConfig::default(),
        };
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 18, 10, 0, 0).unwrap());
        OrderSystem::with_parts(&config, Arc::new(MemoryStorage::new()), Arc::new(DisabledShare), Arc::new(clock))
            .await
            .unwrap()
    }

    fn add(products: Vec<Product>, status: OrderStatus, price: Option<f64>) -> Command {
        Command::Add {
            id: Some("1".to_string()),
            gym: " Gym A ".to_string(),
            products,
            status,
            notes: None,
            price,
        }
    }

    fn set_status(status: OrderStatus, price: Option<f64>) -> Command {
        Command::Update {
            id: "1".to_string(),
            gym: None,
            products: Vec::new(),
            status: Some(status),
            notes: None,
            clear_notes: false,
            price,
            clear_price: false,
        }
    }

    #[tokio::test]
    async fn add_enforces_the_order_form_rules() {
        let system = start_system().await;
        let client = &system.order_client;
        let line = || vec![Product::new(ProductType::A, 3)];

        assert!(run(add(Vec::new(), OrderStatus::Delivered, None), client).await.is_err());
        assert!(run(add(line(), OrderStatus::Delivered, Some(5.0)), client).await.is_err());
        assert!(run(add(line(), OrderStatus::DeliveredPaid, Some(-5.0)), client).await.is_err());
        assert!(client.orders().is_empty());

        run(add(line(), OrderStatus::DeliveredPaid, Some(9.0)), client).await.unwrap();
        let order = client.get_order("1".to_string()).await.unwrap().unwrap();
        assert_eq!(order.gym_name, "Gym A");
        assert_eq!(order.price, Some(9.0));
    }

    #[tokio::test]
    async fn leaving_the_paid_status_drops_the_price() {
        let system = start_system().await;
        let client = &system.order_client;
        run(add(vec![Product::new(ProductType::K, 1)], OrderStatus::DeliveredPaid, Some(9.0)), client)
            .await
            .unwrap();

        assert!(run(set_status(OrderStatus::DeliveredTransfer, Some(4.0)), client).await.is_err());
        assert_eq!(client.get_order("1".to_string()).await.unwrap().unwrap().price, Some(9.0));

        run(set_status(OrderStatus::Delivered, None), client).await.unwrap();
        let order = client.get_order("1".to_string()).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
        assert_eq!(order.price, None);
    }

    #[test]
    fn parses_add_with_repeated_products() {
        let cli = Cli::try_parse_from([
            "order_tracker", "add", "--gym", "Gym A", "-p", "A=3", "-p", "gny=2", "--status", "paid", "--price", "12.5",
        ])
        .unwrap();
        match cli.command {
            Command::Add { gym, products, status, price, id, .. } => {
                assert_eq!(gym, "Gym A");
                assert_eq!(products, vec![Product::new(ProductType::A, 3), Product::new(ProductType::GNY, 2)]);
                assert_eq!(status, OrderStatus::DeliveredPaid);
                assert_eq!(price, Some(12.5));
                assert!(id.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn update_rejects_conflicting_flags() {
        assert!(Cli::try_parse_from(["order_tracker", "update", "1", "--notes", "x", "--clear-notes"]).is_err());
    }

    #[test]
    fn analytics_defaults_to_day() {
        let cli = Cli::try_parse_from(["order_tracker", "--config", "x.toml", "analytics"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(cli.command, Command::Analytics { window: TimeWindow::Day, report: false }));
    }
}
