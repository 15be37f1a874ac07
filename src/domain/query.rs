use super::{Order, OrderStatus, ProductType};

/// Search and filter criteria for the order list.
///
/// Every criterion that is set must match; an empty query matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderQuery {
    /// Case-insensitive substring of the gym name.
    pub search: Option<String>,
    /// Exact gym name.
    pub gym: Option<String>,
    /// Orders containing at least one line of this type.
    pub product: Option<ProductType>,
    pub status: Option<OrderStatus>,
}

impl OrderQuery {
    pub fn matches(&self, order: &Order) -> bool {
        let matches_search = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => order.gym_name.to_lowercase().contains(&needle.to_lowercase()),
        };
        let matches_gym = self.gym.as_ref().map_or(true, |gym| &order.gym_name == gym);
        let matches_product = self
            .product
            .map_or(true, |kind| order.products.iter().any(|p| p.product_type == kind));
        let matches_status = self.status.map_or(true, |status| order.status == status);

        matches_search && matches_gym && matches_product && matches_status
    }

    pub fn apply<'a>(&self, orders: &'a [Order]) -> Vec<&'a Order> {
        orders.iter().filter(|order| self.matches(order)).collect()
    }
}

/// Distinct gym names in the order they first appear.
pub fn gym_names(orders: &[Order]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for order in orders {
        if !names.contains(&order.gym_name) {
            names.push(order.gym_name.clone());
        }
    }
    names
}
