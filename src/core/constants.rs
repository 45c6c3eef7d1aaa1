/// Shared constants for the scoring pipeline

/// Wire names of the lending actions kept by the normalizer
pub const ALLOWED_ACTIONS: [&str; 5] = [
    "deposit",
    "borrow",
    "repay",
    "redeemunderlying",
    "liquidationcall",
];

pub const SECONDS_PER_DAY: f64 = 86_400.0;

pub const DEFAULT_SCORE_MIN: f64 = 0.0;
pub const DEFAULT_SCORE_MAX: f64 = 1000.0;

/// Upper clip applied to repay/borrow ratios before they enter formulas
pub const RATIO_CLIP_MAX: f64 = 5.0;

pub const DEFAULT_MODEL_PATH: &str = "model.bin";
pub const DEFAULT_FOREST_SEED: u64 = 42;
pub const DEFAULT_FOREST_TREES: usize = 100;
