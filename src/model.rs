/// Balance cells and their atomic operations.
pub mod account;
/// Minor-unit amounts.
pub mod amount;
/// Module for representing data structures used for I/O of the ledger.
/// They are equivalent to API payload definitions.
pub mod record;
/// Balance validation policies.
pub mod validator;
