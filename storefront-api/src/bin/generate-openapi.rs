//! OpenAPI Specification Generator Binary
//!
//! Prints the storefront OpenAPI document as JSON to stdout.
//!
//! Usage:
//!   cargo run -p storefront-api --bin generate-openapi > openapi.json

use storefront_api::ApiDoc;

fn main() {
    match ApiDoc::to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize OpenAPI spec: {}", e);
            std::process::exit(1);
        }
    }
}
