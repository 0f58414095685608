//! Fetching the consolidated dataset and its schema.
//!
//! Files are streamed to disk in one blocking request each. There is no
//! retry: any failure aborts the download.

use reqwest::blocking::Client;
use std::fs::{self, File};
use std::path::Path;
use tracing::info;

use crate::config::AuditConfig;
use crate::error::{AuditError, Result, ResultExt};

/// Download the dataset and the schema to their configured local paths.
pub fn run(config: &AuditConfig) -> Result<()> {
    let dataset_url = required_url(config.download.dataset_url.as_deref(), "dataset_url")?;
    let schema_url = required_url(config.download.schema_url.as_deref(), "schema_url")?;

    let client = Client::new();

    info!("Downloading consolidated dataset...");
    download_to_file(&client, dataset_url, &config.paths.dataset)?;

    info!("Downloading data schema...");
    download_to_file(&client, schema_url, &config.paths.schema)?;

    Ok(())
}

/// Stream the body of `url` into `path`, creating parent directories.
pub fn download_to_file(client: &Client, url: &str, path: &Path) -> Result<u64> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context(format!("Creating directory {}", parent.display()))?;
    }

    let mut response = client.get(url).send()?.error_for_status()?;
    let mut file = File::create(path).context(format!("Creating {}", path.display()))?;
    let written = response.copy_to(&mut file)?;

    info!("{} bytes written to {}", written, path.display());
    Ok(written)
}

fn required_url<'a>(url: Option<&'a str>, key: &str) -> Result<&'a str> {
    url.filter(|u| !u.trim().is_empty()).ok_or_else(|| {
        AuditError::Configuration(format!("download.{} is not configured", key))
    })
}
