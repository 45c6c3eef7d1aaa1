/// CSV export of score and feature tables

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{info, instrument};

use crate::analytics::FeatureTable;
use crate::core::{ScoreRecord, ScoringError};

/// Write `wallet_address,credit_score` rows with a header
pub fn write_scores<W: Write>(writer: W, scores: &[ScoreRecord]) -> Result<(), ScoringError> {
    let mut writer = csv::Writer::from_writer(writer);
    for score in scores {
        writer.serialize(score)?;
    }
    writer.flush()?;
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>, ScoringError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}

#[instrument(skip(scores), fields(rows = scores.len()))]
pub fn save_scores(path: &Path, scores: &[ScoreRecord]) -> Result<(), ScoringError> {
    write_scores(create(path)?, scores)?;
    info!("💾 Credit scores saved to {}", path.display());
    Ok(())
}

#[instrument(skip(table), fields(rows = table.len()))]
pub fn save_features(path: &Path, table: &FeatureTable) -> Result<(), ScoringError> {
    table.write_csv(create(path)?)?;
    info!("💾 Wallet features saved to {}", path.display());
    Ok(())
}

/// Read back a score table written by [`write_scores`]
pub fn read_scores(path: &Path) -> Result<Vec<ScoreRecord>, ScoringError> {
    let mut reader = csv::Reader::from_path(path)?;
    let scores = reader.deserialize().collect::<Result<Vec<ScoreRecord>, csv::Error>>()?;
    Ok(scores)
}
