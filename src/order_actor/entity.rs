use chrono::{DateTime, Utc};

use crate::actor_framework::Entity;
use crate::domain::{Order, OrderPatch};

impl Entity for Order {
    type Id = String;
    type Patch = OrderPatch;

    fn id(&self) -> &String {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Merges the fields present in `patch` and refreshes `updated_at`.
    ///
    /// The id and `created_at` are never touched. Price is stored whatever the
    /// status is.
    fn on_update(&mut self, patch: OrderPatch, stamp: DateTime<Utc>) -> Result<(), String> {
        if let Some(gym_name) = patch.gym_name {
            self.gym_name = gym_name;
        }
        if let Some(products) = patch.products {
            self.products = products;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        self.updated_at = stamp;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderStatus, Product, ProductType};
    use chrono::{TimeDelta, TimeZone};

    #[test]
    fn merges_only_given_fields() {
        let created = Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0).unwrap();
        let mut order = Order::new("7", "Gym A", vec![Product::new(ProductType::K, 2)], OrderStatus::Delivered, created)
            .with_notes("front desk");
        let before = order.clone();
        let stamp = created + TimeDelta::minutes(5);

        order.on_update(OrderPatch::default().price(Some(12.5)).notes(None), stamp).unwrap();

        assert_eq!(order.price, Some(12.5));
        assert_eq!(order.notes, None);
        assert_eq!(order.gym_name, before.gym_name);
        assert_eq!(order.products, before.products);
        assert_eq!(order.status, before.status);
        assert_eq!(order.created_at, created);
        assert_eq!(order.updated_at, stamp);
    }
}
