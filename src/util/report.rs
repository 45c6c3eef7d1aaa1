/// Score distribution summaries for terminal output

use colored::Colorize;

use crate::analytics::{FeatureTable, WalletFeatures};
use crate::core::ScoreRecord;
use crate::scoring::ScoreRange;

/// Count of scores in one right-closed bucket `(lower, upper]`
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub lower: u32,
    pub upper: u32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BucketSummary {
    pub buckets: Vec<Bucket>,
    /// Scores equal to the range minimum, which no right-closed bucket holds
    pub at_floor: usize,
}

/// Bucket scores into right-closed bins of `width` across the range
pub fn bucket_summary(scores: &[ScoreRecord], range: ScoreRange, width: u32) -> BucketSummary {
    let floor = range.min.max(0.0) as u32;
    let ceiling = range.max.max(0.0) as u32;
    let width = width.max(1);

    let mut buckets = Vec::new();
    let mut lower = floor;
    while lower < ceiling {
        let upper = lower.saturating_add(width).min(ceiling);
        let count = scores
            .iter()
            .filter(|s| s.credit_score > lower && s.credit_score <= upper)
            .count();
        buckets.push(Bucket { lower, upper, count });
        lower = upper;
    }

    BucketSummary {
        buckets,
        at_floor: scores.iter().filter(|s| s.credit_score <= floor).count(),
    }
}

/// Scored wallet joined with the features used to explain it
#[derive(Debug, Clone)]
pub struct WalletExample<'a> {
    pub score: &'a ScoreRecord,
    pub features: Option<&'a WalletFeatures>,
}

#[derive(Debug, Clone)]
pub struct WalletExamples<'a> {
    pub lowest: Vec<WalletExample<'a>>,
    pub median: Vec<WalletExample<'a>>,
    pub highest: Vec<WalletExample<'a>>,
}

/// Lowest, median-closest and highest `top_n` wallets by score
pub fn wallet_examples<'a>(scores: &'a [ScoreRecord], features: &'a FeatureTable, top_n: usize) -> WalletExamples<'a> {
    let mut sorted: Vec<&ScoreRecord> = scores.iter().collect();
    sorted.sort_by(|a, b| {
        a.credit_score
            .cmp(&b.credit_score)
            .then_with(|| a.wallet_address.cmp(&b.wallet_address))
    });

    let example = move |score: &'a ScoreRecord| WalletExample {
        score,
        features: features.get(&score.wallet_address),
    };

    let median = median_score(&sorted);
    let mut by_distance = sorted.clone();
    by_distance.sort_by(|a, b| {
        (a.credit_score as f64 - median)
            .abs()
            .total_cmp(&(b.credit_score as f64 - median).abs())
    });

    let highest_start = sorted.len().saturating_sub(top_n);
    WalletExamples {
        lowest: sorted.iter().take(top_n).map(|s| example(*s)).collect(),
        median: by_distance.iter().take(top_n).map(|s| example(*s)).collect(),
        highest: sorted[highest_start..].iter().map(|s| example(*s)).collect(),
    }
}

fn median_score(sorted: &[&ScoreRecord]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2].credit_score as f64
    } else {
        (sorted[n / 2 - 1].credit_score as f64 + sorted[n / 2].credit_score as f64) / 2.0
    }
}

pub fn print_bucket_summary(summary: &BucketSummary) {
    println!("\n{}", "✅ Credit Score Buckets:".bold());
    if summary.at_floor > 0 {
        println!("   {:>12}  {}", "at floor", summary.at_floor);
    }
    for bucket in &summary.buckets {
        println!(
            "   {:>12}  {}",
            format!("({}, {}]", bucket.lower, bucket.upper),
            bucket.count
        );
    }
}

fn print_examples(title: colored::ColoredString, examples: &[WalletExample]) {
    println!("\n{}", title);
    println!(
        "   {:<44} {:>6} {:>9} {:>10} {:>16} {:>10}",
        "wallet", "score", "deposits", "repay/brw", "total_usd", "days"
    );
    for example in examples {
        match example.features {
            Some(f) => println!(
                "   {:<44} {:>6} {:>9} {:>10.3} {:>16.2} {:>10.2}",
                example.score.wallet_address,
                example.score.credit_score,
                f.num_deposits,
                f.repay_borrow_ratio,
                f.total_usd,
                f.activity_duration_days
            ),
            None => println!(
                "   {:<44} {:>6}",
                example.score.wallet_address, example.score.credit_score
            ),
        }
    }
}

pub fn print_wallet_examples(examples: &WalletExamples) {
    print_examples("🔴 Lowest Scoring Wallets".red().bold(), &examples.lowest);
    print_examples("🟡 Median Scoring Wallets".yellow().bold(), &examples.median);
    print_examples("🟢 Highest Scoring Wallets".green().bold(), &examples.highest);
}

/// Feature importances of a trained model, highest first
pub fn print_feature_importances(ranking: &[(String, f64)]) {
    println!("\n{}", "🌲 Feature Importances:".bold());
    for (name, importance) in ranking {
        println!("   {:<24} {:.4}", name, importance);
    }
}
