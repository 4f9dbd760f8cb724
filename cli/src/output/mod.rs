//! Where the rendered document goes

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::info;

/// Output destination of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    pub fn from_path(path: Option<PathBuf>) -> Self {
        path.map_or(Self::Stdout, Self::File)
    }

    /// Write the whole document
    pub async fn write(&self, text: &str) -> Result<()> {
        match self {
            Self::Stdout => {
                let mut stdout = tokio::io::stdout();
                stdout
                    .write_all(text.as_bytes())
                    .await
                    .context("Failed to write to stdout")?;
                stdout.flush().await.context("Failed to write to stdout")
            }
            Self::File(path) => {
                info!("write to: {}", path.display());
                tokio::fs::write(path, text)
                    .await
                    .with_context(|| format!("Failed to write output file: {}", path.display()))
            }
        }
    }
}
