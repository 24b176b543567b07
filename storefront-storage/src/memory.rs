//! In-memory record store.
//!
//! Rows are kept normalized (ids only on the link side) in `DashMap` tables
//! and the nested response views are assembled on read, so a customer always
//! reflects the orders linked to it at the time of the read.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use storefront_core::{
    Customer, CustomerOrder, EntityId, EntityType, NameFilter, NewCustomer, NewOrder, NewProduct,
    Order, OrderCustomer, OrderProduct, Product, StoreError, StoreResult,
};

use crate::repository::RecordStore;

#[derive(Debug, Clone)]
struct CustomerRow {
    name: String,
    order_ids: Vec<EntityId>,
}

#[derive(Debug, Clone)]
struct OrderRow {
    description: Option<String>,
    customer_id: EntityId,
    product_ids: Vec<EntityId>,
}

#[derive(Debug, Clone)]
struct ProductRow {
    description: String,
    order_ids: Vec<EntityId>,
}

/// Identity sequence, one per table.
#[derive(Debug)]
struct Sequence(AtomicI64);

impl Default for Sequence {
    fn default() -> Self {
        Self(AtomicI64::new(1))
    }
}

impl Sequence {
    fn next(&self) -> EntityId {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

/// In-memory [`RecordStore`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    customers: DashMap<EntityId, CustomerRow>,
    orders: DashMap<EntityId, OrderRow>,
    products: DashMap<EntityId, ProductRow>,
    customer_seq: Sequence,
    order_seq: Sequence,
    product_seq: Sequence,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    /// Remove every row. Sequences keep counting.
    pub fn clear(&self) {
        self.orders.clear();
        self.customers.clear();
        self.products.clear();
    }

    fn customer_view(&self, id: EntityId, row: &CustomerRow) -> Customer {
        let orders = row
            .order_ids
            .iter()
            .filter_map(|order_id| {
                self.orders.get(order_id).map(|o| CustomerOrder {
                    id: *order_id,
                    description: o.description.clone(),
                })
            })
            .collect();
        Customer {
            id,
            name: row.name.clone(),
            orders,
        }
    }

    fn order_view(&self, id: EntityId, row: &OrderRow) -> Option<Order> {
        let customer = self.customers.get(&row.customer_id).map(|c| OrderCustomer {
            id: row.customer_id,
            name: c.name.clone(),
        })?;
        let products = row
            .product_ids
            .iter()
            .filter_map(|product_id| {
                self.products.get(product_id).map(|p| OrderProduct {
                    id: *product_id,
                    description: p.description.clone(),
                })
            })
            .collect();
        Some(Order {
            id,
            description: row.description.clone(),
            customer,
            products,
        })
    }

    fn product_view(id: EntityId, row: &ProductRow) -> Product {
        Product {
            id,
            description: row.description.clone(),
            orders: row.order_ids.clone(),
        }
    }
}

fn sorted_by_id<T>(mut items: Vec<(EntityId, T)>) -> Vec<T> {
    items.sort_by_key(|(id, _)| *id);
    items.into_iter().map(|(_, item)| item).collect()
}

#[async_trait]
impl RecordStore for InMemoryStore {
    // === Customer Operations ===

    async fn customer_get(&self, id: EntityId) -> StoreResult<Option<Customer>> {
        let row = self.customers.get(&id).map(|r| r.value().clone());
        Ok(row.map(|row| self.customer_view(id, &row)))
    }

    async fn customer_list(&self) -> StoreResult<Vec<Customer>> {
        let rows: Vec<(EntityId, CustomerRow)> = self
            .customers
            .iter()
            .map(|r| (*r.key(), r.value().clone()))
            .collect();
        let views = rows
            .into_iter()
            .map(|(id, row)| (id, self.customer_view(id, &row)))
            .collect();
        Ok(sorted_by_id(views))
    }

    async fn customer_search(&self, filter: &NameFilter) -> StoreResult<Vec<Customer>> {
        let rows: Vec<(EntityId, CustomerRow)> = self
            .customers
            .iter()
            .filter(|r| filter.matches(&r.value().name))
            .map(|r| (*r.key(), r.value().clone()))
            .collect();
        let views = rows
            .into_iter()
            .map(|(id, row)| (id, self.customer_view(id, &row)))
            .collect();
        Ok(sorted_by_id(views))
    }

    async fn customer_create(&self, new: &NewCustomer) -> StoreResult<Customer> {
        let id = self.customer_seq.next();
        self.customers.insert(
            id,
            CustomerRow {
                name: new.name.clone(),
                order_ids: Vec::new(),
            },
        );
        Ok(Customer {
            id,
            name: new.name.clone(),
            orders: Vec::new(),
        })
    }

    // === Order Operations ===

    async fn order_get(&self, id: EntityId) -> StoreResult<Option<Order>> {
        let row = self.orders.get(&id).map(|r| r.value().clone());
        Ok(row.and_then(|row| self.order_view(id, &row)))
    }

    async fn order_list(&self) -> StoreResult<Vec<Order>> {
        let rows: Vec<(EntityId, OrderRow)> = self
            .orders
            .iter()
            .map(|r| (*r.key(), r.value().clone()))
            .collect();
        let views = rows
            .into_iter()
            .filter_map(|(id, row)| self.order_view(id, &row).map(|o| (id, o)))
            .collect();
        Ok(sorted_by_id(views))
    }

    async fn order_create(&self, new: &NewOrder) -> StoreResult<Order> {
        let customer_name = self
            .customers
            .get(&new.customer_id)
            .map(|c| c.name.clone())
            .ok_or_else(|| StoreError::not_found(EntityType::Customer, new.customer_id))?;

        let mut product_ids: Vec<EntityId> = Vec::with_capacity(new.product_ids.len());
        let mut products = Vec::with_capacity(new.product_ids.len());
        for product_id in &new.product_ids {
            if product_ids.contains(product_id) {
                continue;
            }
            let description = self
                .products
                .get(product_id)
                .map(|p| p.description.clone())
                .ok_or_else(|| StoreError::not_found(EntityType::Product, *product_id))?;
            product_ids.push(*product_id);
            products.push(OrderProduct {
                id: *product_id,
                description,
            });
        }

        let id = self.order_seq.next();
        match self.customers.get_mut(&new.customer_id) {
            Some(mut customer) => customer.order_ids.push(id),
            None => return Err(StoreError::not_found(EntityType::Customer, new.customer_id)),
        }
        for product_id in &product_ids {
            if let Some(mut product) = self.products.get_mut(product_id) {
                product.order_ids.push(id);
            }
        }
        // Inserted last: views skip links to orders that are not yet present.
        self.orders.insert(
            id,
            OrderRow {
                description: new.description.clone(),
                customer_id: new.customer_id,
                product_ids,
            },
        );

        Ok(Order {
            id,
            description: new.description.clone(),
            customer: OrderCustomer {
                id: new.customer_id,
                name: customer_name,
            },
            products,
        })
    }

    // === Product Operations ===

    async fn product_get(&self, id: EntityId) -> StoreResult<Option<Product>> {
        Ok(self.products.get(&id).map(|r| Self::product_view(id, r.value())))
    }

    async fn product_list(&self) -> StoreResult<Vec<Product>> {
        let views = self
            .products
            .iter()
            .map(|r| (*r.key(), Self::product_view(*r.key(), r.value())))
            .collect();
        Ok(sorted_by_id(views))
    }

    async fn product_find_by_description(
        &self,
        description: &str,
    ) -> StoreResult<Option<Product>> {
        let wanted = description.trim().to_lowercase();
        let mut found: Vec<(EntityId, Product)> = self
            .products
            .iter()
            .filter(|r| r.value().description.trim().to_lowercase() == wanted)
            .map(|r| (*r.key(), Self::product_view(*r.key(), r.value())))
            .collect();
        found.sort_by_key(|(id, _)| *id);
        Ok(found.into_iter().next().map(|(_, p)| p))
    }

    async fn product_create(&self, new: &NewProduct) -> StoreResult<Product> {
        let id = self.product_seq.next();
        let row = ProductRow {
            description: new.description.clone(),
            order_ids: Vec::new(),
        };
        let view = Self::product_view(id, &row);
        self.products.insert(id, row);
        Ok(view)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::{PredicateBuilder, StorageError};

    async fn seeded() -> StoreResult<InMemoryStore> {
        let store = InMemoryStore::new();
        for name in ["John Smith", "Jack Mitheral", "Bob Jones"] {
            store
                .customer_create(&NewCustomer {
                    name: name.to_string(),
                })
                .await?;
        }
        store
            .product_create(&NewProduct {
                description: "Desk Lamp".to_string(),
            })
            .await?;
        Ok(store)
    }

    #[tokio::test]
    async fn test_ids_are_assigned_in_sequence() -> StoreResult<()> {
        let store = seeded().await?;
        let ids: Vec<EntityId> = store.customer_list().await?.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(store.product_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_search_uses_filter() -> StoreResult<()> {
        let store = seeded().await?;
        let filter = PredicateBuilder::default().build_name_filter("John Mith");
        let names: Vec<String> = store
            .customer_search(&filter)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["John Smith", "Jack Mitheral"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_order_create_links_customer_and_products() -> StoreResult<()> {
        let store = seeded().await?;
        let order = store
            .order_create(&NewOrder {
                description: Some("First".to_string()),
                customer_id: 1,
                product_ids: vec![1, 1],
            })
            .await?;
        assert_eq!(order.customer.name, "John Smith");
        assert_eq!(order.products.len(), 1);

        let customer = store.customer_get(1).await?;
        assert_eq!(customer.map(|c| c.orders.len()), Some(1));

        let product = store.product_get(1).await?;
        assert_eq!(product.map(|p| p.orders), Some(vec![order.id]));

        assert_eq!(store.order_get(order.id).await?, Some(order));
        Ok(())
    }

    #[tokio::test]
    async fn test_order_create_missing_references() -> StoreResult<()> {
        let store = seeded().await?;
        let err = store
            .order_create(&NewOrder {
                description: None,
                customer_id: 99,
                product_ids: vec![1],
            })
            .await;
        assert!(matches!(
            err,
            Err(StoreError::Storage(StorageError::NotFound {
                entity_type: EntityType::Customer,
                id: 99
            }))
        ));

        let err = store
            .order_create(&NewOrder {
                description: None,
                customer_id: 1,
                product_ids: vec![1, 42],
            })
            .await;
        assert!(matches!(
            err,
            Err(StoreError::Storage(StorageError::NotFound {
                entity_type: EntityType::Product,
                id: 42
            }))
        ));
        assert_eq!(store.order_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_find_by_description_ignores_case_and_padding() -> StoreResult<()> {
        let store = seeded().await?;
        let found = store.product_find_by_description("  desk LAMP ").await?;
        assert_eq!(found.map(|p| p.id), Some(1));
        assert!(store.product_find_by_description("Lamp").await?.is_none());
        Ok(())
    }
}
