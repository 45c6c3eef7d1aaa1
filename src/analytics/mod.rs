/// Feature engineering over normalized wallet events

pub mod aggregator;
pub mod features;

pub use aggregator::WalletAggregator;
pub use features::{FeatureTable, WalletFeatures};
