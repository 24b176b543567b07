//! Cache errors. These stay inside the storage crate; the coordinator turns
//! them into side-effect reports rather than request failures.

use super::region::CacheRegion;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache region {region} unavailable: {reason}")]
    Unavailable { region: CacheRegion, reason: String },

    #[error("Cache serialization failed in region {region}: {reason}")]
    Serialization { region: CacheRegion, reason: String },
}

impl CacheError {
    pub fn region(&self) -> CacheRegion {
        match self {
            CacheError::Unavailable { region, .. } | CacheError::Serialization { region, .. } => {
                *region
            }
        }
    }

    pub(crate) fn poisoned(region: CacheRegion) -> Self {
        CacheError::Unavailable {
            region,
            reason: "region lock poisoned".to_string(),
        }
    }
}

pub type CacheResult<T> = Result<T, CacheError>;
