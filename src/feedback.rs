//! `feedback` command: persist a rating for an answer.
//!
//! Each record is written as pretty JSON to
//! `<data_dir>/feedback/feedback_<unix-ts>.json`.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    /// RFC 3339 creation time.
    pub timestamp: String,
    pub query: String,
    pub answer: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

/// Write `record` under `dir/feedback/`. Returns the file path.
pub async fn save_feedback(dir: &Path, record: &FeedbackRecord) -> Result<PathBuf> {
    if !(1..=5).contains(&record.rating) {
        bail!("rating must be between 1 and 5, got {}", record.rating);
    }

    let feedback_dir = dir.join("feedback");
    tokio::fs::create_dir_all(&feedback_dir)
        .await
        .with_context(|| format!("Failed to create {}", feedback_dir.display()))?;

    // Millisecond suffix keeps two submissions within one second apart.
    let now = Utc::now();
    let mut path = feedback_dir.join(format!("feedback_{}.json", now.timestamp()));
    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        path = feedback_dir.join(format!(
            "feedback_{}_{}.json",
            now.timestamp(),
            now.timestamp_subsec_millis()
        ));
    }

    let json = serde_json::to_string_pretty(record)?;
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

pub async fn run_feedback(
    config: &Config,
    query: String,
    answer: String,
    rating: u8,
    comment: Option<String>,
) -> Result<()> {
    let record = FeedbackRecord {
        timestamp: Utc::now().to_rfc3339(),
        query,
        answer,
        rating,
        comment: comment.unwrap_or_default(),
    };
    let path = save_feedback(&config.db.data_dir(), &record).await?;
    tracing::info!(path = %path.display(), rating, "feedback stored");
    println!("Feedback saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(rating: u8) -> FeedbackRecord {
        FeedbackRecord {
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            query: "How do I reset?".to_string(),
            answer: "Hold the key.".to_string(),
            rating,
            comment: String::new(),
        }
    }

    #[tokio::test]
    async fn test_save_feedback_writes_json() {
        let tmp = TempDir::new().unwrap();
        let path = save_feedback(tmp.path(), &record(4)).await.unwrap();
        assert!(path.starts_with(tmp.path().join("feedback")));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("feedback_") && name.ends_with(".json"));

        let back: FeedbackRecord =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, record(4));
    }

    #[tokio::test]
    async fn test_rating_out_of_range_rejected() {
        let tmp = TempDir::new().unwrap();
        assert!(save_feedback(tmp.path(), &record(0)).await.is_err());
        assert!(save_feedback(tmp.path(), &record(6)).await.is_err());
    }
}
