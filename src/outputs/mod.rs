//! Output generation: render the digest to HTML and write it to disk.
//!
//! - [`html`]: turns a [`Digest`](crate::models::Digest) into a complete themed page
//! - [`write_document`]: writes the page, creating missing parent directories
//!
//! # Output Structure
//!
//! ```text
//! daily_news.html        # output_file, overwritten on every run
//! images/
//! └── 2025-05-06/        # pixiv.image_dir, one directory per day
//!     ├── 123456.jpg
//!     └── 123457.jpg
//! ```

pub mod html;

use crate::utils::ensure_parent_dir;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write a rendered document to `path`, replacing any previous file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_document(document: &str, path: &Path) -> Result<(), Box<dyn Error>> {
    if let Err(e) = ensure_parent_dir(path).await {
        error!(error = %e, "Failed to create output directory");
        return Err(e);
    }
    fs::write(path, document).await?;
    info!(bytes = document.len(), "Wrote HTML digest");
    Ok(())
}
