use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use crate::model::account::{Account, Iban};
use crate::model::amount::Amount;
use crate::model::record::AccountRecord;

/// Error conditions that may arise when registering accounts.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// An account with this iban is already registered.
    #[error("Account with iban {0} already exists")]
    AlreadyExists(Iban),
    /// The iban is empty or contains control characters, so no URL path can name it.
    #[error("Invalid iban {0:?}")]
    InvalidIban(Iban),
}

/// Result of directory operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Sharded registry of accounts keyed by iban.
///
/// The map only guards its own structure. Balances are protected by each account's lock, so
/// lookups hand out `Arc` handles and never keep a shard guard while an account is mutated.
#[derive(Debug, Default)]
pub struct Directory {
    accounts: DashMap<Iban, Arc<Account>>,
}

impl Directory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty directory sized for `capacity` accounts.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            accounts: DashMap::with_capacity(capacity),
        }
    }

    /// Registers a new account. Of several concurrent calls for the same iban exactly one wins.
    ///
    /// Any other non-empty string is accepted, reserved URL characters included; clients
    /// percent-encode the iban when it appears in a path.
    pub fn create(&self, iban: Iban, balance: Amount) -> Result<Arc<Account>> {
        if iban.is_empty() || iban.chars().any(char::is_control) {
            return Err(Error::InvalidIban(iban));
        }

        match self.accounts.entry(iban) {
            Entry::Occupied(e) => Err(Error::AlreadyExists(e.key().clone())),
            Entry::Vacant(e) => {
                let account = Arc::new(Account::new(e.key().clone(), balance));
                e.insert(Arc::clone(&account));

                Ok(account)
            }
        }
    }

    /// Handle to the account registered under `iban`, if any.
    pub fn get(&self, iban: &str) -> Option<Arc<Account>> {
        self.accounts.get(iban).map(|r| Arc::clone(r.value()))
    }

    /// Unregisters and closes the account. Returns false if there was nothing to remove.
    ///
    /// Handles obtained earlier stay valid for reading, but any mutation attempted through them
    /// after this returns fails with `Closed`.
    pub fn remove(&self, iban: &str) -> bool {
        match self.accounts.remove(iban) {
            Some((_, account)) => {
                account.close();
                true
            }
            None => false,
        }
    }

    /// Snapshot of every account, sorted by iban.
    ///
    /// Each record is consistent on its own; records are not taken at a single instant.
    pub fn list(&self) -> Vec<AccountRecord> {
        let mut records: Vec<AccountRecord> =
            self.accounts.iter().map(|r| r.value().snapshot()).collect();
        records.sort_by(|a, b| a.iban.cmp(&b.iban));
        records
    }

    /// Number of registered accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// True when no account is registered.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
