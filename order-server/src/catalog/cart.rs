//! Shopping-cart service.
//!
//! A cart row is keyed by its (dish-or-setmeal, flavor) selection:
//! adding the same selection again bumps the quantity, a new
//! selection resolves name/image/unit-amount from the catalogue and
//! inserts a fresh row.

use std::sync::Arc;

use crate::core::{OrderError, OrderResult};
use crate::store::{CartStore, CatalogStore};
use shared::order::{CartItem, CartSelection};
use shared::util::now_millis;

pub struct CartService {
    carts: Arc<dyn CartStore>,
    catalog: Arc<dyn CatalogStore>,
}

impl CartService {
    pub fn new(carts: Arc<dyn CartStore>, catalog: Arc<dyn CatalogStore>) -> Self {
        Self { carts, catalog }
    }

    pub async fn add(&self, user_id: i64, selection: CartSelection) -> OrderResult<CartItem> {
        // Same selection already in the cart: bump the quantity.
        if let Some(mut row) = self.carts.find(user_id, &selection).await? {
            row.quantity += 1;
            self.carts.update(&row).await?;
            return Ok(row);
        }

        let (name, image, amount) = if let Some(dish_id) = selection.dish_id {
            let dish = self
                .catalog
                .dish(dish_id)
                .await?
                .ok_or_else(|| OrderError::NotFound(format!("dish {}", dish_id)))?;
            (dish.name, dish.image, dish.price)
        } else if let Some(setmeal_id) = selection.setmeal_id {
            let setmeal = self
                .catalog
                .setmeal(setmeal_id)
                .await?
                .ok_or_else(|| OrderError::NotFound(format!("set meal {}", setmeal_id)))?;
            (setmeal.name, setmeal.image, setmeal.price)
        } else {
            return Err(OrderError::NotFound(
                "cart selection names neither dish nor set meal".to_string(),
            ));
        };

        let row = CartItem {
            id: 0, // assigned by the store
            user_id,
            name,
            image,
            dish_id: selection.dish_id,
            setmeal_id: selection.setmeal_id,
            dish_flavor: selection.dish_flavor,
            quantity: 1,
            amount,
            create_time: now_millis(),
        };
        Ok(self.carts.insert(row).await?)
    }

    /// Remove one unit of a selection: quantities above one are
    /// decremented, the last unit deletes the row.
    pub async fn sub(&self, user_id: i64, selection: CartSelection) -> OrderResult<()> {
        let row = self
            .carts
            .find(user_id, &selection)
            .await?
            .ok_or_else(|| OrderError::NotFound("cart row for selection".to_string()))?;

        if row.quantity > 1 {
            let mut next = row;
            next.quantity -= 1;
            self.carts.update(&next).await?;
        } else {
            self.carts.delete(user_id, row.id).await?;
        }
        Ok(())
    }

    pub async fn show(&self, user_id: i64) -> OrderResult<Vec<CartItem>> {
        Ok(self.carts.list_by_user(user_id).await?)
    }

    pub async fn clean(&self, user_id: i64) -> OrderResult<()> {
        self.carts.delete_by_user(user_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use rust_decimal::Decimal;
    use shared::catalog::{Dish, Setmeal};

    fn service() -> (Arc<MemoryStore>, CartService) {
        let store = Arc::new(MemoryStore::new());
        store.seed_dish(
            Dish {
                id: 11,
                category_id: 1,
                name: "Mapo Tofu".to_string(),
                price: Decimal::new(1250, 2),
                image: Some("mapo.png".to_string()),
                description: None,
                enabled: true,
            },
            Vec::new(),
        );
        store.seed_setmeal(Setmeal {
            id: 21,
            category_id: 2,
            name: "Family Combo".to_string(),
            price: Decimal::new(4500, 2),
            image: None,
            description: None,
            enabled: true,
        });

        let service = CartService::new(store.clone(), store.clone());
        (store, service)
    }

    fn dish_selection(flavor: Option<&str>) -> CartSelection {
        CartSelection {
            dish_id: Some(11),
            setmeal_id: None,
            dish_flavor: flavor.map(|f| f.to_string()),
        }
    }

    #[tokio::test]
    async fn test_add_resolves_dish_from_catalogue() {
        let (_, service) = service();
        let row = service.add(7, dish_selection(Some("hot"))).await.unwrap();

        assert_eq!(row.name, "Mapo Tofu");
        assert_eq!(row.image.as_deref(), Some("mapo.png"));
        assert_eq!(row.amount, Decimal::new(1250, 2));
        assert_eq!(row.quantity, 1);
        assert!(row.id > 0);
    }

    #[tokio::test]
    async fn test_adding_same_selection_bumps_quantity() {
        let (_, service) = service();
        service.add(7, dish_selection(Some("hot"))).await.unwrap();
        let row = service.add(7, dish_selection(Some("hot"))).await.unwrap();

        assert_eq!(row.quantity, 2);
        let cart = service.show(7).await.unwrap();
        assert_eq!(cart.len(), 1);
    }

    #[tokio::test]
    async fn test_different_flavor_is_a_new_row() {
        let (_, service) = service();
        service.add(7, dish_selection(Some("hot"))).await.unwrap();
        service.add(7, dish_selection(Some("mild"))).await.unwrap();

        assert_eq!(service.show(7).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_add_setmeal() {
        let (_, service) = service();
        let row = service
            .add(
                7,
                CartSelection {
                    dish_id: None,
                    setmeal_id: Some(21),
                    dish_flavor: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(row.name, "Family Combo");
        assert_eq!(row.amount, Decimal::new(4500, 2));
    }

    #[tokio::test]
    async fn test_add_unknown_dish_fails() {
        let (_, service) = service();
        let result = service
            .add(
                7,
                CartSelection {
                    dish_id: Some(999),
                    setmeal_id: None,
                    dish_flavor: None,
                },
            )
            .await;
        assert!(matches!(result, Err(OrderError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_sub_decrements_then_deletes() {
        let (_, service) = service();
        service.add(7, dish_selection(None)).await.unwrap();
        service.add(7, dish_selection(None)).await.unwrap();

        service.sub(7, dish_selection(None)).await.unwrap();
        let cart = service.show(7).await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].quantity, 1);

        service.sub(7, dish_selection(None)).await.unwrap();
        assert!(service.show(7).await.unwrap().is_empty());

        let result = service.sub(7, dish_selection(None)).await;
        assert!(matches!(result, Err(OrderError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_clean_empties_the_cart() {
        let (_, service) = service();
        service.add(7, dish_selection(None)).await.unwrap();
        service.clean(7).await.unwrap();
        assert!(service.show(7).await.unwrap().is_empty());
    }
}
