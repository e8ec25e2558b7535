//! Session ledger: the open/close timing intervals behind accumulated time.

pub mod ledger;
pub mod ports;

pub use ledger::SessionLedger;
