// Application layer - the operations exposed to clients, sequenced over
// access control, the catalog store and the account ledger.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
