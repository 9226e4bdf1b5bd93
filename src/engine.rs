/// Concurrent iban to account registry.
pub mod directory;
/// Account operations and atomic transfers over a directory.
pub mod ledger;
