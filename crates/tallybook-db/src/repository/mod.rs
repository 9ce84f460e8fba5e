//! # Repository Module
//!
//! Database repository implementations for Tallybook.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Request layer                                                          │
//! │       │                                                                 │
//! │       │  db.materials().update(id, &details)                            │
//! │       ▼                                                                 │
//! │  MaterialRepository                                                     │
//! │  ├── create(&self, new)          validate → INSERT                      │
//! │  ├── get(&self, id)                                                     │
//! │  ├── list(&self)                                                        │
//! │  ├── update(&self, id, details)  stock is never written here            │
//! │  └── delete(&self, id)           refused while referenced               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! │  Functions ending in `_in` take a `&mut SqliteConnection` so the        │
//! │  processors can run them inside their own transaction.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`category::CategoryRepository`] - Product categories
//! - [`material::MaterialRepository`] - Raw materials
//! - [`product::ProductRepository`] - Products, compositions, cost sheet
//! - [`payment_method::PaymentMethodRepository`] - Payment methods and fees
//! - [`purchase::PurchaseRepository`] - Purchase history
//! - [`sale::SaleRepository`] - Sale history
//! - [`finance::FinanceRepository`] - Cash-book entries
//! - [`settings::SettingsRepository`] - Workshop settings

pub mod category;
pub mod finance;
pub mod material;
pub mod payment_method;
pub mod product;
pub mod purchase;
pub mod sale;
pub mod settings;
