//! OpenAPI Specification for the Storefront API
//!
//! Generated with utoipa from the route annotations and schema derives.

use utoipa::OpenApi;

use crate::error::{FieldFailures, ProblemDetail};
use crate::routes::health::{ComponentHealth, HealthDetails, HealthResponse, HealthStatus};
use crate::routes::{customer, health, order, product};
use crate::telemetry::metrics;
use crate::types::CustomerSearchRequest;

use storefront_core::{
    Customer, CustomerOrder, NewCustomer, NewOrder, NewProduct, Order, OrderCustomer,
    OrderProduct, Product,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = "0.1.0",
        description = "Customers, orders and products, with cached reads and multi-term customer search",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Customers", description = "Customer records and name search"),
        (name = "Orders", description = "Orders placed by customers"),
        (name = "Products", description = "Product catalog"),
        (name = "Health", description = "Liveness and readiness checks"),
        (name = "Observability", description = "Prometheus metrics")
    ),
    paths(
        customer::list_customers,
        customer::get_customer,
        customer::create_customer,
        customer::search_customers,
        order::list_orders,
        order::get_order,
        order::create_order,
        product::list_products,
        product::get_product,
        product::create_product,
        health::ping,
        health::liveness,
        health::readiness,
        metrics::metrics_handler,
    ),
    components(
        schemas(
            ProblemDetail, FieldFailures,
            Customer, CustomerOrder, NewCustomer, CustomerSearchRequest,
            Order, OrderCustomer, OrderProduct, NewOrder,
            Product, NewProduct,
            HealthResponse, HealthStatus, HealthDetails, ComponentHealth,
        )
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }
}
