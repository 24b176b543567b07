//! Localized Message Catalog
//!
//! Problem details are rendered from message keys such as
//! `api.resource.not.found`. Templates use positional `{0}`, `{1}`
//! placeholders. An English bundle is always present; further locales can
//! be loaded from a TOML file of the form:
//!
//! ```toml
//! [fr]
//! "api.invalid.input" = "Entrée invalide"
//! ```

use std::collections::HashMap;
use std::path::Path;

use crate::error::{ApiError, ApiResult};

pub const RESOURCE_NOT_FOUND: &str = "api.resource.not.found";
pub const INTERNAL_SERVER_ERROR: &str = "api.internal.server.error";
pub const INVALID_DATA: &str = "api.invalid.data";
pub const INVALID_INPUT: &str = "api.invalid.input";
pub const DUPLICATE_ENTITY: &str = "duplicate.entity";
pub const ORDER_PRODUCT_SIZE: &str = "order.product.size";
pub const CUSTOMER_SEARCH_INPUT: &str = "customer.search.input";
pub const PRODUCT_DESCRIPTION_INPUT: &str = "product.description.input";
pub const CUSTOMER_NAME_INPUT: &str = "customer.name.input";
pub const CUSTOMER_NAME_SIZE: &str = "customer.name.size";
pub const EMPTY_SEARCH_QUERY: &str = "customer.search.empty";

pub const DEFAULT_LOCALE: &str = "en";

const ENGLISH: &[(&str, &str)] = &[
    (
        RESOURCE_NOT_FOUND,
        "The requested resource of type {0} was not found for ID {1}",
    ),
    (
        INTERNAL_SERVER_ERROR,
        "An error has occurred - Please try again in a few minutes",
    ),
    (INVALID_DATA, "Invalid data was supplied"),
    (INVALID_INPUT, "Invalid input"),
    (
        DUPLICATE_ENTITY,
        "The operation would create a duplicate entity",
    ),
    (ORDER_PRODUCT_SIZE, "At least one product is required"),
    (
        CUSTOMER_SEARCH_INPUT,
        "The name must be between {0} and {1} characters",
    ),
    (
        PRODUCT_DESCRIPTION_INPUT,
        "The description must be between {0} and {1} characters",
    ),
    (CUSTOMER_NAME_INPUT, "The name must not be blank"),
    (CUSTOMER_NAME_SIZE, "The name must be at most {0} characters"),
    (EMPTY_SEARCH_QUERY, "The search query contains no search terms"),
];

/// Resolves message keys to localized text.
pub trait MessageResolver: Send + Sync {
    /// Look up `key` for `locale` and substitute `args`. `None` when no
    /// bundle knows the key.
    fn resolve(&self, key: &str, args: &[String], locale: &str) -> Option<String>;
}

/// Bundles keyed by locale, then by message key.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    bundles: HashMap<String, HashMap<String, String>>,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        let english = ENGLISH
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut bundles = HashMap::new();
        bundles.insert(DEFAULT_LOCALE.to_string(), english);
        Self { bundles }
    }
}

impl MessageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge bundles from TOML text over the defaults.
    pub fn with_toml(mut self, source: &str) -> ApiResult<Self> {
        let parsed: HashMap<String, HashMap<String, String>> = toml::from_str(source)
            .map_err(|e| ApiError::internal(format!("Invalid message bundle: {}", e)))?;
        for (locale, messages) in parsed {
            self.bundles
                .entry(normalize_locale(&locale))
                .or_default()
                .extend(messages);
        }
        Ok(self)
    }

    /// Load additional bundles from a TOML file.
    pub fn with_file(self, path: impl AsRef<Path>) -> ApiResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            ApiError::internal(format!(
                "Failed to read message bundle {}: {}",
                path.display(),
                e
            ))
        })?;
        self.with_toml(&source)
    }

    pub fn locales(&self) -> Vec<&str> {
        let mut locales: Vec<&str> = self.bundles.keys().map(String::as_str).collect();
        locales.sort_unstable();
        locales
    }

    fn template(&self, key: &str, locale: &str) -> Option<&str> {
        let locale = normalize_locale(locale);
        let language = locale.split('-').next().unwrap_or(DEFAULT_LOCALE);
        [locale.as_str(), language, DEFAULT_LOCALE]
            .iter()
            .find_map(|candidate| self.bundles.get(*candidate)?.get(key))
            .map(String::as_str)
    }
}

impl MessageResolver for MessageCatalog {
    fn resolve(&self, key: &str, args: &[String], locale: &str) -> Option<String> {
        self.template(key, locale)
            .map(|template| format_positional(template, args))
    }
}

/// `en_GB`, `EN-gb` and `en-GB` all map to `en-gb`.
fn normalize_locale(locale: &str) -> String {
    locale.trim().replace('_', "-").to_lowercase()
}

/// Render a key from the built-in English bundle. Unknown keys render as
/// the key itself.
pub fn english(key: &str, args: &[String]) -> String {
    ENGLISH
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, template)| format_positional(template, args))
        .unwrap_or_else(|| key.to_string())
}

/// Substitute `{n}` placeholders. Placeholders without a matching argument
/// are left as written.
pub fn format_positional(template: &str, args: &[String]) -> String {
    let mut out = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        out = out.replace(&format!("{{{}}}", i), arg);
    }
    out
}
