//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling using deadpool-postgres, and the
//! PostgreSQL implementation of [`RecordStore`]. The schema lives in
//! `sql/schema.sql` and is applied by [`DbClient::migrate`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use storefront_core::{
    Customer, CustomerOrder, EntityId, EntityType, NameFilter, NewCustomer, NewOrder, NewProduct,
    Order, OrderCustomer, OrderProduct, Product, StorageError, StoreError, StoreResult,
};
use storefront_storage::RecordStore;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tokio_postgres::{GenericClient, NoTls, Row};

use crate::error::{ApiError, ApiResult};

pub const SCHEMA_SQL: &str = include_str!("../sql/schema.sql");

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Wait/create timeout for pooled connections
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "storefront".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("STOREFRONT_DB_HOST").unwrap_or(defaults.host),
            port: std::env::var("STOREFRONT_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            dbname: std::env::var("STOREFRONT_DB_NAME").unwrap_or(defaults.dbname),
            user: std::env::var("STOREFRONT_DB_USER").unwrap_or(defaults.user),
            password: std::env::var("STOREFRONT_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("STOREFRONT_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_size),
            timeout: std::env::var("STOREFRONT_DB_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_cfg = deadpool_postgres::PoolConfig::new(self.max_size);
        pool_cfg.timeouts.wait = Some(self.timeout);
        pool_cfg.timeouts.create = Some(self.timeout);
        cfg.pool = Some(pool_cfg);

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::internal(format!("Failed to create pool: {}", e)))
    }
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

/// Pooled PostgreSQL record store.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Apply `sql/schema.sql`. Every statement is idempotent.
    pub async fn migrate(&self) -> ApiResult<()> {
        let conn = self.pool.get().await?;
        conn.batch_execute(SCHEMA_SQL).await?;
        tracing::info!("Database schema applied");
        Ok(())
    }

    pub async fn health_check(&self) -> ApiResult<()> {
        let conn = self.pool.get().await?;
        conn.query_one("SELECT 1", &[]).await?;
        Ok(())
    }

    async fn get_conn(&self) -> StoreResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| {
            tracing::error!("Connection pool error: {:?}", e);
            StoreError::backend(format!("Failed to acquire database connection: {}", e))
        })
    }
}

/// Map a driver error, logging the full cause.
fn pg_error(entity_type: EntityType) -> impl Fn(tokio_postgres::Error) -> StoreError {
    move |err| {
        if err.code() == Some(&SqlState::UNIQUE_VIOLATION) {
            let value = err
                .as_db_error()
                .and_then(|db| db.detail())
                .unwrap_or("unique constraint")
                .to_string();
            return StorageError::Duplicate { entity_type, value }.into();
        }
        tracing::error!(entity = %entity_type, "Database error: {:?}", err);
        StoreError::backend(format!("Database operation failed: {}", err))
    }
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn customer_from_row(row: &Row) -> Customer {
    Customer {
        id: row.get("id"),
        name: row.get("name"),
        orders: Vec::new(),
    }
}

fn order_from_row(row: &Row) -> Order {
    Order {
        id: row.get("id"),
        description: row.get("description"),
        customer: OrderCustomer {
            id: row.get("customer_id"),
            name: row.get("customer_name"),
        },
        products: Vec::new(),
    }
}

fn product_from_row(row: &Row) -> Product {
    Product {
        id: row.get("id"),
        description: row.get("description"),
        orders: Vec::new(),
    }
}

const ORDER_SELECT: &str = r#"
    SELECT o.id, o.description, c.id AS customer_id, c.name AS customer_name
    FROM "order" o
    JOIN customer c ON c.id = o.customer_id
"#;

/// Fill in each customer's order summaries.
async fn attach_customer_orders<C: GenericClient + Sync>(
    conn: &C,
    customers: &mut [Customer],
) -> StoreResult<()> {
    if customers.is_empty() {
        return Ok(());
    }
    let ids: Vec<EntityId> = customers.iter().map(|c| c.id).collect();
    let rows = conn
        .query(
            r#"SELECT id, description, customer_id FROM "order"
               WHERE customer_id = ANY($1) ORDER BY id"#,
            &[&ids],
        )
        .await
        .map_err(pg_error(EntityType::Order))?;

    let mut by_customer: HashMap<EntityId, Vec<CustomerOrder>> = HashMap::new();
    for row in &rows {
        by_customer
            .entry(row.get("customer_id"))
            .or_default()
            .push(CustomerOrder {
                id: row.get("id"),
                description: row.get("description"),
            });
    }
    for customer in customers.iter_mut() {
        customer.orders = by_customer.remove(&customer.id).unwrap_or_default();
    }
    Ok(())
}

/// Fill in each order's product summaries, in the order they were given.
async fn attach_order_products<C: GenericClient + Sync>(
    conn: &C,
    orders: &mut [Order],
) -> StoreResult<()> {
    if orders.is_empty() {
        return Ok(());
    }
    let ids: Vec<EntityId> = orders.iter().map(|o| o.id).collect();
    let rows = conn
        .query(
            "SELECT op.order_id, p.id, p.description
             FROM order_product op
             JOIN product p ON p.id = op.product_id
             WHERE op.order_id = ANY($1)
             ORDER BY op.order_id, op.position",
            &[&ids],
        )
        .await
        .map_err(pg_error(EntityType::Product))?;

    let mut by_order: HashMap<EntityId, Vec<OrderProduct>> = HashMap::new();
    for row in &rows {
        by_order
            .entry(row.get("order_id"))
            .or_default()
            .push(OrderProduct {
                id: row.get("id"),
                description: row.get("description"),
            });
    }
    for order in orders.iter_mut() {
        order.products = by_order.remove(&order.id).unwrap_or_default();
    }
    Ok(())
}

async fn attach_product_orders<C: GenericClient + Sync>(
    conn: &C,
    products: &mut [Product],
) -> StoreResult<()> {
    if products.is_empty() {
        return Ok(());
    }
    let ids: Vec<EntityId> = products.iter().map(|p| p.id).collect();
    let rows = conn
        .query(
            "SELECT product_id, order_id FROM order_product
             WHERE product_id = ANY($1) ORDER BY order_id",
            &[&ids],
        )
        .await
        .map_err(pg_error(EntityType::Order))?;

    let mut by_product: HashMap<EntityId, Vec<EntityId>> = HashMap::new();
    for row in &rows {
        by_product
            .entry(row.get("product_id"))
            .or_default()
            .push(row.get("order_id"));
    }
    for product in products.iter_mut() {
        product.orders = by_product.remove(&product.id).unwrap_or_default();
    }
    Ok(())
}

// ============================================================================
// RECORD STORE IMPLEMENTATION
// ============================================================================

#[async_trait]
impl RecordStore for DbClient {
    async fn customer_get(&self, id: EntityId) -> StoreResult<Option<Customer>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt("SELECT id, name FROM customer WHERE id = $1", &[&id])
            .await
            .map_err(pg_error(EntityType::Customer))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut customers = [customer_from_row(&row)];
        attach_customer_orders(&**conn, &mut customers).await?;
        let [customer] = customers;
        Ok(Some(customer))
    }

    async fn customer_list(&self) -> StoreResult<Vec<Customer>> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query("SELECT id, name FROM customer ORDER BY id", &[])
            .await
            .map_err(pg_error(EntityType::Customer))?;
        let mut customers: Vec<Customer> = rows.iter().map(customer_from_row).collect();
        attach_customer_orders(&**conn, &mut customers).await?;
        Ok(customers)
    }

    async fn customer_search(&self, filter: &NameFilter) -> StoreResult<Vec<Customer>> {
        let condition = filter.to_sql("name", 1);
        let sql = format!(
            "SELECT id, name FROM customer WHERE {} ORDER BY id",
            condition.clause
        );
        let params: Vec<&(dyn ToSql + Sync)> = condition
            .params
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect();

        let conn = self.get_conn().await?;
        let rows = conn
            .query(sql.as_str(), &params)
            .await
            .map_err(pg_error(EntityType::Customer))?;
        let mut customers: Vec<Customer> = rows.iter().map(customer_from_row).collect();
        attach_customer_orders(&**conn, &mut customers).await?;
        Ok(customers)
    }

    async fn customer_create(&self, new: &NewCustomer) -> StoreResult<Customer> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_one(
                "INSERT INTO customer (name) VALUES ($1) RETURNING id, name",
                &[&new.name],
            )
            .await
            .map_err(pg_error(EntityType::Customer))?;
        Ok(customer_from_row(&row))
    }

    async fn order_get(&self, id: EntityId) -> StoreResult<Option<Order>> {
        let conn = self.get_conn().await?;
        let sql = format!("{} WHERE o.id = $1", ORDER_SELECT);
        let row = conn
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(pg_error(EntityType::Order))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut orders = [order_from_row(&row)];
        attach_order_products(&**conn, &mut orders).await?;
        let [order] = orders;
        Ok(Some(order))
    }

    async fn order_list(&self) -> StoreResult<Vec<Order>> {
        let conn = self.get_conn().await?;
        let sql = format!("{} ORDER BY o.id", ORDER_SELECT);
        let rows = conn
            .query(sql.as_str(), &[])
            .await
            .map_err(pg_error(EntityType::Order))?;
        let mut orders: Vec<Order> = rows.iter().map(order_from_row).collect();
        attach_order_products(&**conn, &mut orders).await?;
        Ok(orders)
    }

    async fn order_create(&self, new: &NewOrder) -> StoreResult<Order> {
        let mut conn = self.get_conn().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(pg_error(EntityType::Order))?;

        let customer = tx
            .query_opt(
                "SELECT id, name FROM customer WHERE id = $1",
                &[&new.customer_id],
            )
            .await
            .map_err(pg_error(EntityType::Customer))?
            .ok_or_else(|| StoreError::not_found(EntityType::Customer, new.customer_id))?;

        let mut product_ids: Vec<EntityId> = Vec::with_capacity(new.product_ids.len());
        for id in &new.product_ids {
            if !product_ids.contains(id) {
                product_ids.push(*id);
            }
        }
        let found: Vec<EntityId> = tx
            .query("SELECT id FROM product WHERE id = ANY($1)", &[&product_ids])
            .await
            .map_err(pg_error(EntityType::Product))?
            .iter()
            .map(|row| row.get("id"))
            .collect();
        if let Some(missing) = product_ids.iter().find(|id| !found.contains(id)) {
            return Err(StoreError::not_found(EntityType::Product, *missing));
        }

        let order_id: EntityId = tx
            .query_one(
                r#"INSERT INTO "order" (description, customer_id) VALUES ($1, $2) RETURNING id"#,
                &[&new.description, &new.customer_id],
            )
            .await
            .map_err(pg_error(EntityType::Order))?
            .get(0);

        for (position, product_id) in product_ids.iter().enumerate() {
            let position = position as i32;
            tx.execute(
                "INSERT INTO order_product (order_id, product_id, position) VALUES ($1, $2, $3)",
                &[&order_id, product_id, &position],
            )
            .await
            .map_err(pg_error(EntityType::Order))?;
        }

        let mut orders = [Order {
            id: order_id,
            description: new.description.clone(),
            customer: OrderCustomer {
                id: customer.get("id"),
                name: customer.get("name"),
            },
            products: Vec::new(),
        }];
        attach_order_products(&*tx, &mut orders).await?;
        tx.commit().await.map_err(pg_error(EntityType::Order))?;

        let [order] = orders;
        Ok(order)
    }

    async fn product_get(&self, id: EntityId) -> StoreResult<Option<Product>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt("SELECT id, description FROM product WHERE id = $1", &[&id])
            .await
            .map_err(pg_error(EntityType::Product))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut products = [product_from_row(&row)];
        attach_product_orders(&**conn, &mut products).await?;
        let [product] = products;
        Ok(Some(product))
    }

    async fn product_list(&self) -> StoreResult<Vec<Product>> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query("SELECT id, description FROM product ORDER BY id", &[])
            .await
            .map_err(pg_error(EntityType::Product))?;
        let mut products: Vec<Product> = rows.iter().map(product_from_row).collect();
        attach_product_orders(&**conn, &mut products).await?;
        Ok(products)
    }

    async fn product_find_by_description(
        &self,
        description: &str,
    ) -> StoreResult<Option<Product>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                "SELECT id, description FROM product
                 WHERE lower(btrim(description)) = lower(btrim($1))
                 ORDER BY id LIMIT 1",
                &[&description],
            )
            .await
            .map_err(pg_error(EntityType::Product))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut products = [product_from_row(&row)];
        attach_product_orders(&**conn, &mut products).await?;
        let [product] = products;
        Ok(Some(product))
    }

    async fn product_create(&self, new: &NewProduct) -> StoreResult<Product> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_one(
                "INSERT INTO product (description) VALUES ($1) RETURNING id, description",
                &[&new.description],
            )
            .await
            .map_err(pg_error(EntityType::Product))?;
        Ok(product_from_row(&row))
    }

    async fn ping(&self) -> StoreResult<()> {
        let conn = self.get_conn().await?;
        conn.query_one("SELECT 1", &[])
            .await
            .map_err(|e| StoreError::backend(format!("Ping failed: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_config_default() {
        let config = DbConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.dbname, "storefront");
        assert_eq!(config.max_size, 16);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_schema_declares_every_table() {
        for table in ["customer", "\"order\"", "product", "order_product"] {
            assert!(
                SCHEMA_SQL.contains(&format!("CREATE TABLE IF NOT EXISTS {}", table)),
                "missing table {}",
                table
            );
        }
    }

    #[tokio::test]
    async fn test_create_pool_is_lazy() -> ApiResult<()> {
        // deadpool connects on first checkout, so building the pool needs no server.
        let client = DbClient::from_config(&DbConfig::default())?;
        assert_eq!(client.pool_size(), 0);
        Ok(())
    }
}
