/// Wallet scoring: range scaling, scoring policies, heuristic and learned scorers

pub mod heuristic;
pub mod learned;
pub mod policy;
pub mod scaler;

pub use heuristic::{rank, HeuristicVariant, WalletScorer};
pub use learned::{LearnedScorer, TrainedModel};
pub use policy::{FeatureColumn, LabelTerm, ScoringPolicy, Transform};
pub use scaler::{scale, scale_by_max, ScoreRange};
