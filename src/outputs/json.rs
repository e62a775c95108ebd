//! JSON output of scraping results.
//!
//! Results are wrapped in an [`ApiResponse`] envelope and either printed or
//! written under a date-based directory:
//!
//! ```text
//! output_dir/
//! └── 2025-05-06/
//!     ├── yonhap_081500.json
//!     └── all_120000.json
//! ```

use crate::error::ScrapeError;
use crate::models::ApiResponse;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Where a result named `name` produced at `at` is written.
pub fn output_path(output_dir: &Path, name: &str, at: DateTime<Local>) -> PathBuf {
    output_dir
        .join(at.format("%Y-%m-%d").to_string())
        .join(format!("{}_{}.json", name, at.format("%H%M%S")))
}

pub fn to_pretty_json<T: Serialize>(envelope: &ApiResponse<T>) -> Result<String, ScrapeError> {
    Ok(serde_json::to_string_pretty(envelope)?)
}

/// Write `envelope` under `output_dir`, creating the date directory.
///
/// # Arguments
///
/// * `envelope` - The response to serialize as pretty JSON
/// * `output_dir` - Base directory for JSON output
/// * `name` - Source id, or `all` for a full run
///
/// # Returns
///
/// The path written, or an error if directory creation or file writing fails.
///
/// # Output Path
///
/// The file is written to: `{output_dir}/{YYYY-MM-DD}/{name}_{HHMMSS}.json`
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display(), %name))]
pub async fn write_envelope<T: Serialize>(
    envelope: &ApiResponse<T>,
    output_dir: &Path,
    name: &str,
) -> Result<PathBuf, ScrapeError> {
    let json = to_pretty_json(envelope)?;
    let path = output_path(output_dir, name, Local::now());

    if let Some(dir) = path.parent() {
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create output dir");
            return Err(e.into());
        }
    }

    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote result JSON");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_output_path_layout() {
        let at = Local.with_ymd_and_hms(2025, 5, 6, 8, 15, 0).unwrap();
        let path = output_path(Path::new("/tmp/out"), "yonhap", at);
        assert_eq!(path, PathBuf::from("/tmp/out/2025-05-06/yonhap_081500.json"));
    }

    #[tokio::test]
    async fn test_write_envelope() {
        let dir = std::env::temp_dir().join(format!("news_scrape_test_{}", uuid::Uuid::new_v4()));
        let envelope = ApiResponse::ok(vec![1, 2, 3], "scraped");
        let path = write_envelope(&envelope, &dir, "test").await.unwrap();

        let text = tokio::fs::read_to_string(&path).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"], serde_json::json!([1, 2, 3]));
        assert_eq!(value["message"], "scraped");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
