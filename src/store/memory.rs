//! In-memory backend. One lock guards all tables, so every call is atomic.

use super::Store;
use crate::error::StoreError;
use crate::models::{Entity, Order, OrderInput, Product, ProductInput, User, UserInput};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    products: BTreeMap<i32, Product>,
    orders: BTreeMap<i32, Order>,
    /// (order_id, product_id) in insertion order.
    order_products: Vec<(i32, i32)>,
    last_user_id: i32,
    last_product_id: i32,
    last_order_id: i32,
}

impl Tables {
    fn require_order_and_product(&self, order_id: i32, product_id: i32) -> Result<(), StoreError> {
        if !self.orders.contains_key(&order_id) {
            return Err(StoreError::MissingReference {
                entity: Entity::Order,
                id: order_id,
            });
        }
        if !self.products.contains_key(&product_id) {
            return Err(StoreError::MissingReference {
                entity: Entity::Product,
                id: product_id,
            });
        }
        Ok(())
    }
}

fn next_id(last: &mut i32) -> i32 {
    *last += 1;
    *last
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_user(&self, input: &UserInput) -> Result<User, StoreError> {
        let mut t = self.tables.write().await;
        let id = next_id(&mut t.last_user_id);
        let user = input.clone().into_user(id);
        t.users.insert(id, user.clone());
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn get_user(&self, id: i32) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn update_user(&self, id: i32, input: &UserInput) -> Result<Option<User>, StoreError> {
        let mut t = self.tables.write().await;
        Ok(t.users.get_mut(&id).map(|user| {
            *user = input.clone().into_user(id);
            user.clone()
        }))
    }

    async fn delete_user(&self, id: i32) -> Result<bool, StoreError> {
        let mut t = self.tables.write().await;
        if t.orders.values().any(|o| o.user_id == id) {
            return Err(StoreError::UserHasOrders(id));
        }
        Ok(t.users.remove(&id).is_some())
    }

    async fn create_product(&self, input: &ProductInput) -> Result<Product, StoreError> {
        let mut t = self.tables.write().await;
        let id = next_id(&mut t.last_product_id);
        let product = input.clone().into_product(id);
        t.products.insert(id, product.clone());
        Ok(product)
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.tables.read().await.products.values().cloned().collect())
    }

    async fn get_product(&self, id: i32) -> Result<Option<Product>, StoreError> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn update_product(&self, id: i32, input: &ProductInput) -> Result<Option<Product>, StoreError> {
        let mut t = self.tables.write().await;
        Ok(t.products.get_mut(&id).map(|product| {
            *product = input.clone().into_product(id);
            product.clone()
        }))
    }

    async fn delete_product(&self, id: i32) -> Result<bool, StoreError> {
        let mut t = self.tables.write().await;
        let removed = t.products.remove(&id).is_some();
        t.order_products.retain(|&(_, p)| p != id);
        Ok(removed)
    }

    async fn create_order(&self, input: &OrderInput) -> Result<Order, StoreError> {
        let mut t = self.tables.write().await;
        if !t.users.contains_key(&input.user_id) {
            return Err(StoreError::MissingReference {
                entity: Entity::User,
                id: input.user_id,
            });
        }
        let id = next_id(&mut t.last_order_id);
        let order = Order {
            id,
            order_date: input.order_date.unwrap_or_else(Utc::now),
            user_id: input.user_id,
        };
        t.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        Ok(self.tables.read().await.orders.values().cloned().collect())
    }

    async fn get_order(&self, id: i32) -> Result<Option<Order>, StoreError> {
        Ok(self.tables.read().await.orders.get(&id).cloned())
    }

    async fn delete_order(&self, id: i32) -> Result<bool, StoreError> {
        let mut t = self.tables.write().await;
        let removed = t.orders.remove(&id).is_some();
        t.order_products.retain(|&(o, _)| o != id);
        Ok(removed)
    }

    async fn orders_for_user(&self, user_id: i32) -> Result<Vec<Order>, StoreError> {
        let t = self.tables.read().await;
        Ok(t.orders.values().filter(|o| o.user_id == user_id).cloned().collect())
    }

    async fn products_for_order(&self, order_id: i32) -> Result<Vec<Product>, StoreError> {
        let t = self.tables.read().await;
        let mut products: Vec<Product> = t
            .order_products
            .iter()
            .filter(|&&(o, _)| o == order_id)
            .filter_map(|(_, p)| t.products.get(p).cloned())
            .collect();
        products.sort_by_key(|p| p.id);
        products.dedup_by_key(|p| p.id);
        Ok(products)
    }

    async fn add_product_to_order(&self, order_id: i32, product_id: i32) -> Result<bool, StoreError> {
        let mut t = self.tables.write().await;
        t.require_order_and_product(order_id, product_id)?;
        if t.order_products.contains(&(order_id, product_id)) {
            return Ok(false);
        }
        t.order_products.push((order_id, product_id));
        Ok(true)
    }

    async fn remove_product_from_order(&self, order_id: i32, product_id: i32) -> Result<bool, StoreError> {
        let mut t = self.tables.write().await;
        t.require_order_and_product(order_id, product_id)?;
        let before = t.order_products.len();
        t.order_products.retain(|&pair| pair != (order_id, product_id));
        Ok(t.order_products.len() != before)
    }
}
