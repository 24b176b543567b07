//! Core entity structures
//!
//! These are the shapes returned to API clients and stored in the cache
//! regions. Nested references are flattened to `{ id, description }` /
//! `{ id, name }` pairs so an entity serializes without cycles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Database-assigned identity. Always positive once persisted.
pub type EntityId = i64;

/// Entity type discriminator used in not-found errors and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EntityType {
    Customer,
    Order,
    Product,
}

impl EntityType {
    /// Resource name as shown to API clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Customer => "Customer",
            EntityType::Order => "Order",
            EntityType::Product => "Product",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// CUSTOMER
// ============================================================================

/// A customer together with a summary of every order placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Customer {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub orders: Vec<CustomerOrder>,
}

/// Order summary embedded in a [`Customer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CustomerOrder {
    pub id: EntityId,
    pub description: Option<String>,
}

/// Payload for creating a customer. Identity is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewCustomer {
    pub name: String,
}

// ============================================================================
// ORDER
// ============================================================================

/// An order with its owning customer and the products it contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Order {
    pub id: EntityId,
    pub description: Option<String>,
    pub customer: OrderCustomer,
    #[serde(default)]
    pub products: Vec<OrderProduct>,
}

/// Customer reference embedded in an [`Order`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct OrderCustomer {
    pub id: EntityId,
    pub name: String,
}

/// Product reference embedded in an [`Order`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct OrderProduct {
    pub id: EntityId,
    pub description: String,
}

/// Payload for creating an order.
///
/// The customer and every product must already exist; the store resolves
/// them into the full [`Order`] view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewOrder {
    pub description: Option<String>,
    pub customer_id: EntityId,
    pub product_ids: Vec<EntityId>,
}

// ============================================================================
// PRODUCT
// ============================================================================

/// Product summary: the product and the ids of the orders containing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Product {
    pub id: EntityId,
    pub description: String,
    #[serde(default)]
    pub orders: Vec<EntityId>,
}

/// Payload for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewProduct {
    pub description: String,
}

impl Order {
    /// Summary of this order as it appears inside its customer.
    pub fn as_customer_order(&self) -> CustomerOrder {
        CustomerOrder {
            id: self.id,
            description: self.description.clone(),
        }
    }
}

impl Product {
    /// Reference to this product as it appears inside an order.
    pub fn as_order_product(&self) -> OrderProduct {
        OrderProduct {
            id: self.id,
            description: self.description.clone(),
        }
    }
}

impl Customer {
    /// Reference to this customer as it appears inside an order.
    pub fn as_order_customer(&self) -> OrderCustomer {
        OrderCustomer {
            id: self.id,
            name: self.name.clone(),
        }
    }
}
