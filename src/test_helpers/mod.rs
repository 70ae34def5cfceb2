//! A set of builders for constructing test fixtures.

mod block;
mod receipt;
mod transaction;

pub use block::BlockBuilder;
pub use receipt::ReceiptBuilder;
pub use transaction::TransactionBuilder;
