//! Block ingestion: receipt enrichment and the concurrent range fetcher.

pub mod normalizer;
pub mod range_fetcher;

pub use normalizer::BlockNormalizer;
pub use range_fetcher::RangeFetcher;
