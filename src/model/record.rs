#![deny(missing_docs)]
#![deny(warnings)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::account::Iban;
use crate::model::amount::Amount;

/// Point-in-time view of an account, as returned to API clients.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountRecord {
    /// Account identifier.
    pub iban: Iban,
    /// Balance in minor units.
    pub balance: Amount,
    /// When the balance was last written.
    #[serde(rename = "lastModified")]
    pub last_modified: DateTime<Utc>,
}

/// Payload used to open an account.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewAccount {
    /// Identifier of the account to open.
    pub iban: Iban,
    /// Opening balance.
    pub balance: Amount,
}

/// Payload used to overwrite the balance of an existing account.
///
/// Clients usually send the full `{iban, balance}` document; the account is taken from the path
/// and any `iban` field in the body is ignored.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceUpdate {
    /// New balance.
    pub balance: Amount,
}

/// Outcome of a successful transfer.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferReceipt {
    /// Amount moved.
    pub amount: Amount,
    /// Source account right after the debit.
    pub from: AccountRecord,
    /// Destination account right after the credit.
    pub to: AccountRecord,
}

impl std::fmt::Display for TransferReceipt {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Transfer amount {} from {} ({}) to {} ({})",
            self.amount, self.from.iban, self.from.balance, self.to.iban, self.to.balance
        )
    }
}
