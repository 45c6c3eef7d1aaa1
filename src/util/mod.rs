/// Output helpers: CSV export and terminal reports

pub mod export;
pub mod report;

pub use export::{read_scores, save_features, save_scores, write_scores};
pub use report::{bucket_summary, print_bucket_summary, print_feature_importances, print_wallet_examples, wallet_examples};
