//! A single balance cell and the primitives that mutate it atomically.
#![deny(missing_docs)]
#![deny(warnings)]

use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::model::amount::Amount;
use crate::model::record::AccountRecord;
use crate::model::validator::{BalanceValidator, Rejection};

/// Error conditions that may arise when mutating an `Account`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// The resulting balance does not fit an `Amount`.
    #[error("Account balance overflow")]
    Overflow,
    /// The validator refused the resulting balance.
    #[error("Account balance rejected: {0}")]
    Rejected(#[from] Rejection),
    /// The account was removed from its directory.
    #[error("Account {0} is closed")]
    Closed(Iban),
    /// Transfers move a non-negative amount from source to destination.
    #[error("Cannot transfer a negative amount ({0})")]
    NegativeAmount(Amount),
}

/// Result of account operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Account identifier.
pub type Iban = String;

struct State {
    balance: Amount,
    last_modified: DateTime<Utc>,
    closed: bool,
}

impl State {
    fn ensure_open(&self, iban: &str) -> Result<()> {
        if self.closed {
            return Err(Error::Closed(iban.to_owned()));
        }

        Ok(())
    }

    fn commit(&mut self, balance: Amount) {
        self.balance = balance;
        self.last_modified = Utc::now();
    }
}

/// A monetary account.
///
/// Balance and modification time sit behind a per-account mutex, so every read observes a fully
/// applied mutation and concurrent deltas never overwrite each other. Mutations compute the
/// prospective balance first, hand it to the validator and only write it back once accepted: a
/// rejected operation leaves the account exactly as it was.
pub struct Account {
    iban: Iban,
    state: Mutex<State>,
}

impl Account {
    /// Creates an open account holding `balance`.
    pub fn new(iban: impl Into<Iban>, balance: Amount) -> Self {
        Self {
            iban: iban.into(),
            state: Mutex::new(State {
                balance,
                last_modified: Utc::now(),
                closed: false,
            }),
        }
    }

    /// Account identifier.
    pub fn iban(&self) -> &str {
        &self.iban
    }

    /// Current balance.
    pub fn balance(&self) -> Amount {
        self.lock().balance
    }

    /// When the balance was last written.
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.lock().last_modified
    }

    /// Whether the account was closed.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Balance and modification time, read together.
    pub fn snapshot(&self) -> AccountRecord {
        self.record(&self.lock())
    }

    /// Overwrites the balance without consulting any validator.
    pub fn set_balance(&self, balance: Amount) -> Result<AccountRecord> {
        let mut state = self.lock();
        state.ensure_open(&self.iban)?;
        state.commit(balance);

        Ok(self.record(&state))
    }

    /// Adds `amount` to the balance if `validator` accepts the result.
    ///
    /// Returns the new balance.
    pub fn increment(&self, amount: Amount, validator: &dyn BalanceValidator) -> Result<Amount> {
        let mut state = self.lock();
        state.ensure_open(&self.iban)?;
        let balance = state.balance.checked_add(amount).ok_or(Error::Overflow)?;
        validator.validate(balance)?;
        state.commit(balance);

        Ok(balance)
    }

    /// Subtracts `amount` from the balance if `validator` accepts the result.
    ///
    /// Returns the new balance.
    pub fn decrement(&self, amount: Amount, validator: &dyn BalanceValidator) -> Result<Amount> {
        let mut state = self.lock();
        state.ensure_open(&self.iban)?;
        let balance = state.balance.checked_sub(amount).ok_or(Error::Overflow)?;
        validator.validate(balance)?;
        state.commit(balance);

        Ok(balance)
    }

    /// Moves `amount` from this account to `other` as one atomic step.
    ///
    /// Only the balance left on this account goes through `validator`; the credited side is
    /// checked for overflow alone. Nothing is written unless both legs can be applied. A negative
    /// `amount` is refused before any lock is taken. Returns the state of the source and of the
    /// destination right after the transfer.
    pub fn transfer_to(
        &self,
        other: &Account,
        amount: Amount,
        validator: &dyn BalanceValidator,
    ) -> Result<(AccountRecord, AccountRecord)> {
        if amount.is_negative() {
            return Err(Error::NegativeAmount(amount));
        }

        if std::ptr::eq(self, other) {
            let mut state = self.lock();
            state.ensure_open(&self.iban)?;
            let debited = state.balance.checked_sub(amount).ok_or(Error::Overflow)?;
            validator.validate(debited)?;
            let balance = state.balance;
            state.commit(balance);
            let record = self.record(&state);

            return Ok((record.clone(), record));
        }

        let (mut source, mut destination) = self.lock_pair(other);
        source.ensure_open(&self.iban)?;
        destination.ensure_open(&other.iban)?;

        let debited = source.balance.checked_sub(amount).ok_or(Error::Overflow)?;
        validator.validate(debited)?;
        let credited = destination
            .balance
            .checked_add(amount)
            .ok_or(Error::Overflow)?;

        source.commit(debited);
        destination.commit(credited);

        Ok((self.record(&source), other.record(&destination)))
    }

    /// Marks the account closed; every later mutation fails with `Error::Closed`.
    ///
    /// Waits for any in-flight operation holding the account lock to finish.
    pub fn close(&self) {
        self.lock().closed = true;
    }

    fn record(&self, state: &State) -> AccountRecord {
        AccountRecord {
            iban: self.iban.clone(),
            balance: state.balance,
            last_modified: state.last_modified,
        }
    }

    // State is only written after validation, so a poisoned lock still guards a consistent cell.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_key(&self) -> (&str, usize) {
        (self.iban.as_str(), self as *const Account as usize)
    }

    // Locks are always taken in ascending (iban, address) order, whichever side is the source.
    fn lock_pair<'a>(
        &'a self,
        other: &'a Account,
    ) -> (MutexGuard<'a, State>, MutexGuard<'a, State>) {
        if self.lock_key() < other.lock_key() {
            let first = self.lock();
            let second = other.lock();
            (first, second)
        } else {
            let first = other.lock();
            let second = self.lock();
            (second, first)
        }
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("Account")
            .field("iban", &self.iban)
            .field("balance", &state.balance)
            .field("last_modified", &state.last_modified)
            .field("closed", &state.closed)
            .finish()
    }
}
