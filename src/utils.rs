//! Small helpers for logging and file system checks.

use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument, warn};

/// Truncate a string for logging purposes.
///
/// # Arguments
///
/// * `s` - The text to shorten, typically extracted page content
/// * `max` - Maximum number of characters to keep
///
/// # Returns
///
/// `s` unchanged when it has at most `max` characters, otherwise its first
/// `max` characters followed by `"…(+N chars)"`. Cuts always fall on a
/// character boundary, so CJK text is safe.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"新".repeat(12), 10), "新新新新新新新新新新…(+2 chars)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let total = s.chars().count();
    if total <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{}…(+{} chars)", head, total - max)
    }
}

/// Create `path` if needed and confirm files can be written into it.
///
/// Called before any page is fetched so a bad output directory fails the run
/// immediately.
///
/// # Arguments
///
/// * `path` - Output directory for the Markdown or JSON file
///
/// # Errors
///
/// Returns an error if the directory cannot be created or a probe file
/// cannot be written into it. Failing to remove the probe is only logged.
#[instrument(level = "info", skip_all, fields(%path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe = Path::new(path).join(".xwlb_write_probe");
    fs::write(&probe, b"").await?;
    if let Err(e) = fs::remove_file(&probe).await {
        warn!(probe = %probe.display(), error = %e, "Could not remove write probe");
    }
    debug!("Output directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_multibyte() {
        let s = "新闻联播".repeat(30);
        let result = truncate_for_log(&s, 10);
        assert!(result.starts_with("新闻联播新闻联播新闻"));
        assert!(result.ends_with("…(+110 chars)"));
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_directory() {
        let dir = std::env::temp_dir().join(format!("xwlb_outdir_{}", std::process::id()));
        let path = dir.to_str().unwrap().to_string();
        ensure_writable_dir(&path).await.unwrap();
        assert!(dir.is_dir());
        assert!(!dir.join(".xwlb_write_probe").exists());
        let _ = std::fs::remove_dir_all(dir);
    }
}
