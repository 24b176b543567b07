//! Cache region names and keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use storefront_core::EntityId;

/// One of the four named cache regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheRegion {
    Customers,
    AllCustomers,
    Orders,
    AllOrders,
}

impl CacheRegion {
    pub const ALL: [CacheRegion; 4] = [
        CacheRegion::Customers,
        CacheRegion::AllCustomers,
        CacheRegion::Orders,
        CacheRegion::AllOrders,
    ];

    /// Stable region name, also used as a metrics label.
    pub fn name(&self) -> &'static str {
        match self {
            CacheRegion::Customers => "customers",
            CacheRegion::AllCustomers => "all_customers",
            CacheRegion::Orders => "orders",
            CacheRegion::AllOrders => "all_orders",
        }
    }

    /// Position in [`CacheRegion::ALL`].
    pub fn index(&self) -> usize {
        match self {
            CacheRegion::Customers => 0,
            CacheRegion::AllCustomers => 1,
            CacheRegion::Orders => 2,
            CacheRegion::AllOrders => 3,
        }
    }

    /// List regions hold a single entry under [`CacheKey::All`].
    pub fn is_collection(&self) -> bool {
        matches!(self, CacheRegion::AllCustomers | CacheRegion::AllOrders)
    }
}

impl fmt::Display for CacheRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Key within a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheKey {
    /// Single entity by id.
    Id(EntityId),
    /// The whole collection.
    All,
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Id(id) => write!(f, "{}", id),
            CacheKey::All => f.write_str("*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_names() {
        let names: Vec<&str> = CacheRegion::ALL.iter().map(CacheRegion::name).collect();
        assert_eq!(names, vec!["customers", "all_customers", "orders", "all_orders"]);
    }

    #[test]
    fn test_index_matches_position() {
        for (i, region) in CacheRegion::ALL.iter().enumerate() {
            assert_eq!(region.index(), i);
        }
    }

    #[test]
    fn test_key_display() {
        assert_eq!(CacheKey::Id(12).to_string(), "12");
        assert_eq!(CacheKey::All.to_string(), "*");
    }
}
