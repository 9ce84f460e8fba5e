//! # tallybook-core: Pure Business Logic for Tallybook
//!
//! This crate holds every business rule of the back-office engine as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tallybook Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │             Request layer (HTTP, auth) - outside workspace      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ NewSale / NewPurchase / NewProduction  │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          tallybook-db: processors + repositories + ledger       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ tallybook-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   money · quantity · types · proration · settlement · costing  │   │
//! │  │   stock · validation · error                                   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - `Money` (integer cents) and `Rate` (basis points)
//! - [`quantity`] - `Quantity` (integer thousandths of a unit)
//! - [`types`] - Domain entities (Material, Product, Sale, ...)
//! - [`input`] - Validated-at-the-edge input payloads
//! - [`proration`] - Freight allocation across purchase lines
//! - [`settlement`] - Fee deduction, due date and status of sale revenue
//! - [`costing`] - Product cost sheet from the bill of materials
//! - [`stock`] - Stock availability checks
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use tallybook_core::{Money, Quantity, Rate};
//!
//! let unit_price = Money::from_cents(2000); // 20.00
//! let total = unit_price.checked_times(Quantity::from_units(2)).unwrap();
//! assert_eq!(total.cents(), 4000);
//!
//! let fee = total.checked_percentage(Rate::from_bps(500)).unwrap(); // 5%
//! assert_eq!(fee.cents(), 200);
//! ```

pub mod costing;
pub mod error;
pub mod input;
pub mod money;
pub mod proration;
pub mod quantity;
pub mod settlement;
pub mod stock;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ValidationError};
pub use input::*;
pub use money::{Money, Rate};
pub use quantity::Quantity;
pub use settlement::{Settlement, SettlementPolicy};
pub use stock::StockKind;
pub use types::*;

/// Maximum number of lines accepted on a single sale or purchase.
///
/// Guards against runaway payloads; a workshop invoice rarely has more
/// than a few dozen lines.
pub const MAX_LINE_ITEMS: usize = 100;

/// Description used on revenue entries when the sale has no customer name.
pub const WALK_IN_CUSTOMER: &str = "Walk-in customer";
