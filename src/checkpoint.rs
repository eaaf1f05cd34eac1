//! JSON files for partial and final results.
//!
//! Checkpoints and the final output share one schema: a pretty-printed array
//! of [`JobRecord`]s. A checkpoint can therefore be fed back in with
//! `--resume` to continue a crashed run.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::{utils, CollectorError, JobRecord, Storage};

pub struct JsonFiles {
    checkpoint_dir: PathBuf,
    output: PathBuf,
}

impl JsonFiles {
    pub fn new<C: Into<PathBuf>, O: Into<PathBuf>>(checkpoint_dir: C, output: O) -> Self {
        JsonFiles {
            checkpoint_dir: checkpoint_dir.into(),
            output: output.into(),
        }
    }

    pub fn checkpoint_path(&self, page: u32) -> PathBuf {
        self.checkpoint_dir
            .join(format!("linkedin_jobs_partial_page_{}.json", page))
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }
}

#[async_trait::async_trait]
impl Storage for JsonFiles {
    async fn checkpoint(&self, page: u32, jobs: &[JobRecord]) -> Result<(), CollectorError> {
        let path = self.checkpoint_path(page);
        write_jobs(&path, jobs).await?;
        info!("Saved partial data ({} jobs) to {}", jobs.len(), path.display());
        Ok(())
    }

    async fn finish(&self, jobs: &[JobRecord]) -> Result<(), CollectorError> {
        write_jobs(&self.output, jobs).await?;
        info!("Saved {} jobs to {}", jobs.len(), self.output.display());
        Ok(())
    }
}

pub async fn write_jobs(path: &Path, jobs: &[JobRecord]) -> Result<(), CollectorError> {
    let json = serde_json::to_vec_pretty(jobs)?;
    utils::write_atomic(path, &json).await?;
    Ok(())
}

pub async fn load_jobs<P: AsRef<Path>>(path: P) -> Result<Vec<JobRecord>, CollectorError> {
    let raw = tokio::fs::read(path.as_ref()).await?;
    Ok(serde_json::from_slice(&raw)?)
}
