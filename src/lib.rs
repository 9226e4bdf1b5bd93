//! In-memory ledger of monetary accounts with atomic, deadlock-free transfers.
//!
//! Accounts live in a sharded [`engine::directory::Directory`]; each one guards its balance with
//! its own lock, and [`engine::ledger::Ledger::transfer`] takes the two locks of a transfer in a
//! fixed order. The [`api`] module exposes the ledger over HTTP.

pub mod api;
pub mod config;
pub mod engine;
pub mod model;

pub use config::{ServerConfig, DEFAULT_PORT};
pub use engine::ledger::{Error as LedgerError, Ledger};
pub use model::account::{Account, Iban};
pub use model::amount::Amount;
pub use model::record::{AccountRecord, BalanceUpdate, NewAccount, TransferReceipt};
pub use model::validator::{BalanceValidator, NonNegative, Rejection};
