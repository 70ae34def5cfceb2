//! Chain data access: the `ChainDataSource` trait, its EVM RPC
//! implementation, and the decoding helpers behind it.

pub mod decode;
pub mod rate_limit;
pub mod rpc;
pub mod traits;

#[cfg(test)]
pub use traits::MockChainDataSource;
pub use traits::{ChainDataSource, RpcClientError};
