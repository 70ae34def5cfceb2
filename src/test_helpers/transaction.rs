//! A builder for creating `Transaction` instances for testing.

use alloy::primitives::{Address, B256, Bytes, U256};

use crate::models::{Log, Transaction, TxStatus};

/// A builder for creating `Transaction` instances for testing.
///
/// Defaults mimic a plain value transfer: 21,000 gas, 1 Gwei gas price,
/// status not yet fetched.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    tx: Transaction,
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self {
            tx: Transaction {
                gas: 21_000,
                gas_price: 1_000_000_000,
                ..Transaction::default()
            },
        }
    }
}

impl TransactionBuilder {
    /// Creates a new `TransactionBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the transaction hash.
    pub fn hash(mut self, hash: B256) -> Self {
        self.tx.hash = hash;
        self
    }

    /// Sets the sender address.
    pub fn from(mut self, from: Address) -> Self {
        self.tx.from = Some(from);
        self
    }

    /// Sets the recipient address.
    pub fn to(mut self, to: Address) -> Self {
        self.tx.to = Some(to);
        self
    }

    /// Sets the transferred value in wei.
    pub fn value(mut self, value: U256) -> Self {
        self.tx.value = value;
        self
    }

    /// Sets the nonce.
    pub fn nonce(mut self, nonce: u64) -> Self {
        self.tx.nonce = nonce;
        self
    }

    /// Sets the input data.
    pub fn input(mut self, input: Bytes) -> Self {
        self.tx.input = input;
        self
    }

    /// Sets the receipt-derived status.
    pub fn status(mut self, status: TxStatus) -> Self {
        self.tx.status = status;
        self
    }

    /// Attaches `count` empty logs.
    pub fn logs(mut self, count: usize) -> Self {
        self.tx.logs = Some(vec![Log::default(); count]);
        self
    }

    /// Builds the `Transaction` with the provided values.
    pub fn build(self) -> Transaction {
        self.tx
    }
}
