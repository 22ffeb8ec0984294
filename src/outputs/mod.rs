//! Output generation for the assembled digest.
//!
//! - [`markdown`]: assembles the [`NewsDocument`] and renders its Markdown
//! - [`json`]: writes a JSON copy of the document
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! └── xwlb_20251226.md      # or latest_xwlb.md without a date
//!
//! json_output_dir/
//! └── xwlb_20251226.json
//! ```

pub mod json;
pub mod markdown;

use crate::models::NewsDocument;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Write the rendered Markdown into `output_dir`, named after the broadcast date.
#[instrument(level = "info", skip_all, fields(%output_dir))]
pub async fn write_markdown(
    document: &NewsDocument,
    output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let path = Path::new(output_dir).join(format!("{}.md", document.file_stem()));
    fs::write(&path, &document.markdown).await?;
    info!(path = %path.display(), bytes = document.markdown.len(), "Wrote Markdown");
    Ok(path)
}
