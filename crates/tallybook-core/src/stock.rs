//! # Stock Module
//!
//! The two kinds of contended stock rows and the availability check every
//! processor runs before it mutates the ledger.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::quantity::Quantity;

/// Which stock counter a ledger operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockKind {
    /// Raw material (increased by purchases, consumed by production).
    Material,
    /// Finished product (increased by production, decreased by sales).
    Product,
}

impl StockKind {
    pub const fn label(&self) -> &'static str {
        match self {
            StockKind::Material => "material",
            StockKind::Product => "product",
        }
    }
}

impl fmt::Display for StockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fails with [`CoreError::InsufficientStock`] when `available < requested`.
///
/// ```rust
/// use tallybook_core::{stock::ensure_available, Quantity, StockKind};
///
/// let ok = ensure_available(StockKind::Product, "p-1", "Mug",
///     Quantity::from_units(5), Quantity::from_units(5));
/// assert!(ok.is_ok());
///
/// let short = ensure_available(StockKind::Product, "p-1", "Mug",
///     Quantity::from_units(5), Quantity::from_units(6));
/// assert!(short.is_err());
/// ```
pub fn ensure_available(
    kind: StockKind,
    id: &str,
    name: &str,
    available: Quantity,
    requested: Quantity,
) -> CoreResult<()> {
    if available < requested {
        return Err(CoreError::InsufficientStock {
            kind,
            id: id.to_string(),
            name: name.to_string(),
            available,
            requested,
        });
    }
    Ok(())
}
