//! JSON copy of the assembled [`NewsDocument`].
//!
//! Written to `{json_output_dir}/xwlb_YYYYMMDD.json`, or `latest_xwlb.json`
//! when the broadcast date could not be resolved.

use crate::models::NewsDocument;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_document(
    document: &NewsDocument,
    json_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(document)?;

    if let Err(e) = fs::create_dir_all(json_output_dir).await {
        error!(%json_output_dir, error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = Path::new(json_output_dir).join(format!("{}.json", document.file_stem()));
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote JSON document");
    Ok(path)
}
