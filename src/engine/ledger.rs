#![deny(missing_docs)]
#![deny(warnings)]

use std::sync::Arc;

use crate::engine::directory::{self, Directory};
use crate::model::account::{self, Account, Iban};
use crate::model::amount::Amount;
use crate::model::record::{AccountRecord, NewAccount, TransferReceipt};
use crate::model::validator::{BalanceValidator, Rejection};

/// Error conditions surfaced to ledger callers.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// No account is registered under this iban.
    #[error("Could not find an account with iban {0}")]
    NotFound(Iban),
    /// An account with this iban is already registered.
    #[error("Account with iban {0} already exists")]
    AlreadyExists(Iban),
    /// The iban cannot be used to address an account.
    #[error("Invalid iban {0:?}")]
    InvalidIban(Iban),
    /// Transfers of negative amounts are refused.
    #[error("Cannot transfer a negative amount ({0})")]
    InvalidAmount(Amount),
    /// The balance validator refused the resulting balance.
    #[error("Validation failed: {0}")]
    ValidationFailed(Rejection),
    /// A balance would leave the representable range.
    #[error("Account balance overflow")]
    Overflow,
}

/// Result of ledger operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<account::Error> for Error {
    fn from(e: account::Error) -> Self {
        match e {
            account::Error::Overflow => Error::Overflow,
            account::Error::Rejected(rejection) => Error::ValidationFailed(rejection),
            account::Error::Closed(iban) => Error::NotFound(iban),
            account::Error::NegativeAmount(amount) => Error::InvalidAmount(amount),
        }
    }
}

impl From<directory::Error> for Error {
    fn from(e: directory::Error) -> Self {
        match e {
            directory::Error::AlreadyExists(iban) => Error::AlreadyExists(iban),
            directory::Error::InvalidIban(iban) => Error::InvalidIban(iban),
        }
    }
}

/// Set of accounts plus the balance policy applied to transfers.
///
/// Every instance is independent; the server builds one at start-up and shares it behind an
/// `Arc`.
pub struct Ledger {
    directory: Directory,
    validator: Arc<dyn BalanceValidator>,
}

impl Ledger {
    /// Creates an empty ledger validating transfers with `validator`.
    pub fn new(validator: Arc<dyn BalanceValidator>) -> Self {
        Self {
            directory: Directory::new(),
            validator,
        }
    }

    /// Like `new`, pre-sizing the directory for `capacity` accounts.
    pub fn with_capacity(capacity: usize, validator: Arc<dyn BalanceValidator>) -> Self {
        Self {
            directory: Directory::with_capacity(capacity),
            validator,
        }
    }

    /// Underlying account directory.
    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Opens an account.
    #[tracing::instrument(name = "Ledger::create", skip_all, fields(iban = %new.iban))]
    pub fn create(&self, new: NewAccount) -> Result<AccountRecord> {
        let account = self
            .directory
            .create(new.iban, new.balance)
            .map_err(|e| {
                tracing::warn!(%e, "account not created");
                Error::from(e)
            })?;
        tracing::debug!(balance = %new.balance, "account created");

        Ok(account.snapshot())
    }

    /// Current state of an account.
    pub fn account(&self, iban: &str) -> Result<AccountRecord> {
        Ok(self.resolve(iban)?.snapshot())
    }

    /// Overwrites the balance of an account.
    #[tracing::instrument(name = "Ledger::update", skip(self))]
    pub fn update(&self, iban: &str, balance: Amount) -> Result<AccountRecord> {
        let record = self.resolve(iban)?.set_balance(balance)?;
        tracing::debug!("balance overwritten");

        Ok(record)
    }

    /// Removes an account. Removing an unknown iban is not an error.
    #[tracing::instrument(name = "Ledger::remove", skip(self))]
    pub fn remove(&self, iban: &str) {
        if self.directory.remove(iban) {
            tracing::debug!("account removed");
        }
    }

    /// Snapshot of all accounts, sorted by iban.
    pub fn list(&self) -> Vec<AccountRecord> {
        self.directory.list()
    }

    /// Moves `amount` from `from` to `to` atomically.
    ///
    /// The ledger's validator decides whether the source may end up with its new balance; on
    /// any failure neither account changes.
    #[tracing::instrument(name = "Ledger::transfer", skip(self))]
    pub fn transfer(&self, from: &str, to: &str, amount: Amount) -> Result<TransferReceipt> {
        if amount.is_negative() {
            tracing::warn!("negative transfer amount");
            return Err(Error::InvalidAmount(amount));
        }
        let source = self.resolve(from)?;
        let destination = self.resolve(to)?;

        match source.transfer_to(&destination, amount, self.validator.as_ref()) {
            Ok((from, to)) => {
                let receipt = TransferReceipt { amount, from, to };
                tracing::debug!(%receipt, "success");

                Ok(receipt)
            }
            Err(e) => {
                tracing::warn!(%e, "failure");

                Err(e.into())
            }
        }
    }

    fn resolve(&self, iban: &str) -> Result<Arc<Account>> {
        self.directory
            .get(iban)
            .ok_or_else(|| Error::NotFound(iban.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::validator::{CreditLimit, NonNegative};
    use proptest::prelude::*;
    use std::thread;

    fn ledger() -> Ledger {
        Ledger::new(Arc::new(NonNegative))
    }

    fn open(ledger: &Ledger, iban: &str, balance: i64) {
        ledger
            .create(NewAccount {
                iban: iban.to_owned(),
                balance: Amount::new(balance),
            })
            .unwrap();
    }

    fn balance(ledger: &Ledger, iban: &str) -> i64 {
        ledger.account(iban).unwrap().balance.minor_units()
    }

    #[test]
    fn test_transfer_whole_balance() {
        let ledger = ledger();
        open(&ledger, "A", 75);
        open(&ledger, "B", 75);

        let receipt = ledger.transfer("A", "B", Amount::new(75)).unwrap();

        assert_eq!(receipt.amount, Amount::new(75));
        assert_eq!(receipt.from.balance, Amount::ZERO);
        assert_eq!(receipt.to.balance, Amount::new(150));
        assert_eq!(balance(&ledger, "A"), 0);
        assert_eq!(balance(&ledger, "B"), 150);
    }

    #[test]
    fn test_transfer_insufficient_funds() {
        let ledger = ledger();
        open(&ledger, "A", 75);
        open(&ledger, "B", 75);

        let err = ledger.transfer("A", "B", Amount::new(150)).unwrap_err();

        assert!(matches!(err, Error::ValidationFailed(_)));
        assert_eq!(balance(&ledger, "A"), 75);
        assert_eq!(balance(&ledger, "B"), 75);
    }

    #[test]
    fn test_transfer_with_credit_limit() {
        let ledger = Ledger::new(Arc::new(CreditLimit(Amount::new(100))));
        open(&ledger, "A", 75);
        open(&ledger, "B", 75);

        ledger.transfer("A", "B", Amount::new(150)).unwrap();
        assert_eq!(balance(&ledger, "A"), -75);
        assert!(ledger.transfer("A", "B", Amount::new(26)).is_err());
    }

    #[test]
    fn test_transfer_invalid_amount() {
        let ledger = ledger();
        open(&ledger, "A", 75);
        open(&ledger, "B", 75);

        assert_eq!(
            ledger.transfer("A", "B", Amount::new(-1)).unwrap_err(),
            Error::InvalidAmount(Amount::new(-1))
        );
        // Checked before the accounts are resolved.
        assert_eq!(
            ledger.transfer("X", "Y", Amount::new(-1)).unwrap_err(),
            Error::InvalidAmount(Amount::new(-1))
        );
        assert!(ledger.transfer("A", "B", Amount::ZERO).is_ok());
    }

    #[test]
    fn test_transfer_unknown_account() {
        let ledger = ledger();
        open(&ledger, "A", 75);

        assert_eq!(
            ledger.transfer("A", "B", Amount::new(1)).unwrap_err(),
            Error::NotFound("B".to_owned())
        );
        assert_eq!(
            ledger.transfer("B", "A", Amount::new(1)).unwrap_err(),
            Error::NotFound("B".to_owned())
        );
        assert_eq!(balance(&ledger, "A"), 75);
    }

    #[test]
    fn test_transfer_overflow() {
        let ledger = ledger();
        open(&ledger, "A", 10);
        open(&ledger, "B", i64::MAX);

        assert_eq!(
            ledger.transfer("A", "B", Amount::new(1)).unwrap_err(),
            Error::Overflow
        );
    }

    #[test]
    fn test_crud() {
        let ledger = ledger();
        open(&ledger, "A", 75);

        assert_eq!(
            ledger
                .create(NewAccount {
                    iban: "A".to_owned(),
                    balance: Amount::ZERO
                })
                .unwrap_err(),
            Error::AlreadyExists("A".to_owned())
        );

        assert_eq!(
            ledger.update("A", Amount::new(10)).unwrap().balance,
            Amount::new(10)
        );
        assert_eq!(
            ledger.update("B", Amount::new(10)).unwrap_err(),
            Error::NotFound("B".to_owned())
        );

        ledger.remove("A");
        ledger.remove("A");
        assert_eq!(
            ledger.account("A").unwrap_err(),
            Error::NotFound("A".to_owned())
        );
        assert!(ledger.list().is_empty());
    }

    #[test]
    fn test_create_with_empty_iban() {
        let ledger = ledger();

        assert_eq!(
            ledger
                .create(NewAccount {
                    iban: String::new(),
                    balance: Amount::ZERO
                })
                .unwrap_err(),
            Error::InvalidIban(String::new())
        );
        assert!(ledger.list().is_empty());
    }

    #[test]
    fn test_negative_amount_through_account_handles() {
        let ledger = ledger();
        open(&ledger, "A", 0);
        open(&ledger, "B", 0);
        let a = ledger.directory().get("A").unwrap();
        let b = ledger.directory().get("B").unwrap();

        assert_eq!(
            Error::from(a.transfer_to(&b, Amount::new(-100), &NonNegative).unwrap_err()),
            Error::InvalidAmount(Amount::new(-100))
        );
        assert_eq!(balance(&ledger, "B"), 0);
    }

    #[test]
    fn test_removed_account_cannot_take_part_in_transfers() {
        let ledger = ledger();
        open(&ledger, "A", 75);
        open(&ledger, "B", 75);
        let stale = ledger.directory().get("A").unwrap();

        ledger.remove("A");

        let other = ledger.directory().get("B").unwrap();
        assert_eq!(
            Error::from(
                stale
                    .transfer_to(&other, Amount::new(1), &NonNegative)
                    .unwrap_err()
            ),
            Error::NotFound("A".to_owned())
        );
        assert_eq!(balance(&ledger, "B"), 75);
    }

    #[test]
    fn test_remove_racing_transfers() {
        let ledger = ledger();
        open(&ledger, "A", 1_000_000);
        open(&ledger, "B", 0);
        let a = ledger.directory().get("A").unwrap();

        thread::scope(|s| {
            s.spawn(|| {
                for _ in 0..10_000 {
                    match ledger.transfer("A", "B", Amount::new(1)) {
                        Ok(_) | Err(Error::NotFound(_)) => {}
                        Err(e) => panic!("unexpected error {e}"),
                    }
                }
            });
            s.spawn(|| {
                thread::yield_now();
                ledger.remove("A");
            });
        });

        // Whatever interleaving happened, every unit that left A arrived on B.
        assert_eq!(
            a.balance().minor_units() + balance(&ledger, "B"),
            1_000_000
        );
    }

    #[test]
    fn test_concurrent_transfers_conserve_total() {
        let ledger = ledger();
        let ibans: Vec<String> = (0..6).map(|i| format!("ACC{i}")).collect();
        for iban in &ibans {
            open(&ledger, iban, 1_000);
        }

        thread::scope(|s| {
            for t in 0..8usize {
                let (ledger, ibans) = (&ledger, &ibans);
                s.spawn(move || {
                    for i in 0..5_000usize {
                        let from = &ibans[(t + i) % ibans.len()];
                        let to = &ibans[(t * 7 + i * 3 + 1) % ibans.len()];
                        let amount = Amount::new(((t + i) % 50) as i64);
                        match ledger.transfer(from, to, amount) {
                            Ok(_) | Err(Error::ValidationFailed(_)) => {}
                            Err(e) => panic!("unexpected error {e}"),
                        }
                    }
                });
            }
        });

        let records = ledger.list();
        assert!(records.iter().all(|r| !r.balance.is_negative()));
        assert_eq!(
            records
                .iter()
                .map(|r| r.balance.minor_units())
                .sum::<i64>(),
            6_000
        );
    }

    proptest! {
        #[test]
        fn prop_transfer_conserves_total(
            a in 0i64..1_000_000,
            b in 0i64..1_000_000,
            amount in 0i64..2_000_000,
        ) {
            let ledger = ledger();
            open(&ledger, "A", a);
            open(&ledger, "B", b);

            let result = ledger.transfer("A", "B", Amount::new(amount));

            if amount <= a {
                prop_assert!(result.is_ok());
                prop_assert_eq!(balance(&ledger, "A"), a - amount);
                prop_assert_eq!(balance(&ledger, "B"), b + amount);
            } else {
                let rejected = matches!(result, Err(Error::ValidationFailed(_)));
                prop_assert!(rejected);
                prop_assert_eq!(balance(&ledger, "A"), a);
                prop_assert_eq!(balance(&ledger, "B"), b);
            }
            prop_assert_eq!(balance(&ledger, "A") + balance(&ledger, "B"), a + b);
        }
    }
}
