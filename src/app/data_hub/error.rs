//! Error types reported by the data hub.
//!
//! Only structurally invalid requests are errors. A lookup that misses is a
//! normal outcome and is returned as `None` or `false` by the hub.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::category::Category;

/// Errors reported by [`DataHub`](super::DataHub) operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HubError {
    /// The category name is not one of the fixed hub categories
    UnknownCategory(String),
    /// The payload variant does not belong to the requested category
    PayloadMismatch {
        category: Category,
        payload: Category,
    },
    /// The payload contains NaN or an infinite number
    NonFiniteValue(Category),
}

impl HubError {
    /// Short machine-readable code, used as the notification error code
    pub fn code(&self) -> &'static str {
        match self {
            HubError::UnknownCategory(_) => "UnknownCategory",
            HubError::PayloadMismatch { .. } => "PayloadMismatch",
            HubError::NonFiniteValue(_) => "NonFiniteValue",
        }
    }
}

impl fmt::Display for HubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HubError::UnknownCategory(name) => {
                write!(f, "Unknown data category '{}'", name)
            }
            HubError::PayloadMismatch { category, payload } => write!(
                f,
                "Cannot store {} data in the '{}' category",
                payload.singular(),
                category
            ),
            HubError::NonFiniteValue(category) => write!(
                f,
                "Cannot store {} data containing NaN or infinite values",
                category.singular()
            ),
        }
    }
}

impl std::error::Error for HubError {}
