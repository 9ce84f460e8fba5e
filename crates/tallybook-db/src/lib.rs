//! # tallybook-db: Database Layer for Tallybook
//!
//! This crate owns every query: connection pool, migrations, catalog
//! repositories, the stock ledger and the three processors that move stock.
//! It uses SQLite through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tallybook Data Flow                              │
//! │                                                                         │
//! │  Request layer: create_sale(NewSale)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  tallybook-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌───────────────┐    │   │
//! │  │   │  Processors   │   │ Repositories  │   │  Migrations   │    │   │
//! │  │   │ sale          │   │ catalog       │   │  (embedded)   │    │   │
//! │  │   │ purchase      │   │ purchases     │   │               │    │   │
//! │  │   │ production    │   │ sales/finance │   │ 0001_initial  │    │   │
//! │  │   └───────┬───────┘   └───────┬───────┘   └───────────────┘    │   │
//! │  │           │ ledger::lock_and_read / adjust                      │   │
//! │  │           ▼                   ▼                                 │   │
//! │  │   ┌─────────────────────────────────────┐                       │   │
//! │  │   │   Database (pool.rs): SqlitePool    │                       │   │
//! │  │   └─────────────────────────────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - Environment configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`ledger`] - Locked stock reads and relative stock updates
//! - [`processor`] - Sale, purchase and production units of work
//! - [`repository`] - Catalog, purchase, sale, cash-book and settings access
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tallybook_db::{AppConfig, Database};
//!
//! let config = AppConfig::from_env()?;
//! let db = Database::from_config(&config).await?;
//!
//! let receipt = db.sale_processor().create_sale(&new_sale).await?;
//! println!("net revenue {}", receipt.transaction.amount());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod processor;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{AppConfig, ConfigError};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use processor::production::{MaterialConsumption, ProductionProcessor, ProductionReport};
pub use processor::purchase::PurchaseProcessor;
pub use processor::sale::{SaleProcessor, SaleReceipt};
pub use processor::{ErrorCode, ProcessError, ProcessResult};

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::finance::FinanceRepository;
pub use repository::material::MaterialRepository;
pub use repository::payment_method::PaymentMethodRepository;
pub use repository::product::{ProductRepository, ProductWithComposition};
pub use repository::purchase::{PurchaseRecord, PurchaseRepository};
pub use repository::sale::{SaleRepository, SaleWithItems};
pub use repository::settings::SettingsRepository;
