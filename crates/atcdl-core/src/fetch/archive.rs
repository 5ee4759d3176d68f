//! LiveATC archive client: resolve the archive identifier, then download the
//! recording into a staging directory with bounded retry.

use std::path::{Path, PathBuf};

use crate::config::AtcConfig;
use crate::retry::{classify, run_with_retry, RetryPolicy, TransferError};

use super::naming::{airport_code, archive_file_name, derive_archive_identifier, selected_option_value};
use super::transfer::{download_to_file, get_page, HttpOptions};
use super::{truncate_reason, FetchClient, FetchError};

/// Blocking curl-backed `FetchClient` for `archive.liveatc.net`.
#[derive(Debug, Clone)]
pub struct ArchiveFetchClient {
    search_base_url: String,
    archive_base_url: String,
    staging_dir: PathBuf,
    http: HttpOptions,
    retry: RetryPolicy,
    max_error_len: usize,
}

impl ArchiveFetchClient {
    /// Client configured from `cfg`, staging downloads in the system temp directory.
    pub fn from_config(cfg: &AtcConfig) -> Self {
        Self {
            search_base_url: cfg.search_base_url.trim_end_matches('/').to_string(),
            archive_base_url: cfg.archive_base_url.trim_end_matches('/').to_string(),
            staging_dir: std::env::temp_dir(),
            http: HttpOptions::from(cfg),
            retry: RetryPolicy::from(&cfg.retry_or_default()),
            max_error_len: cfg.max_error_len,
        }
    }

    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Archive identifier as published on the station's archive page, or the
    /// derived fallback when the page has none.
    pub fn resolve_archive_identifier(&self, station: &str) -> String {
        let url = match url::Url::parse_with_params(
            &format!("{}/archive.php", self.search_base_url),
            &[("m", station)],
        ) {
            Ok(u) => u,
            Err(e) => {
                tracing::warn!(station, "bad archive page url: {}", e);
                return derive_archive_identifier(station);
            }
        };
        match get_page(url.as_str(), &self.http) {
            Ok(html) => {
                if let Some(id) = selected_option_value(&html) {
                    return id;
                }
                tracing::warn!(station, "no archive identifier on page, using fallback conversion");
            }
            Err(e) => {
                tracing::warn!(station, "archive page unavailable ({}), using fallback conversion", e);
            }
        }
        derive_archive_identifier(station)
    }

    /// Archive URL for a given identifier and tokens.
    pub fn recording_url(&self, station: &str, file_name: &str) -> String {
        format!("{}/{}/{}", self.archive_base_url, airport_code(station), file_name)
    }

    fn to_fetch_error(&self, e: &TransferError, attempts: u32) -> FetchError {
        let kind = classify(e);
        let message = if kind.is_retryable() {
            format!("failed after {} attempt(s): {}", attempts, e)
        } else {
            e.to_string()
        };
        let message = truncate_reason(&message, self.max_error_len);
        if kind.is_retryable() {
            FetchError::retryable(message)
        } else {
            FetchError::terminal(message)
        }
    }
}

impl FetchClient for ArchiveFetchClient {
    fn fetch(&self, station: &str, date_token: &str, time_token: &str) -> Result<PathBuf, FetchError> {
        let identifier = self.resolve_archive_identifier(station);
        let file_name = archive_file_name(&identifier, date_token, time_token);
        let url = self.recording_url(station, &file_name);
        let staged = self.staging_dir.join(&file_name);
        let part = self.staging_dir.join(format!("{}.part", file_name));

        let mut attempts = 0u32;
        let result = run_with_retry(&self.retry, |attempt| {
            attempts = attempt;
            tracing::debug!(%url, attempt, "downloading recording");
            download_to_file(&url, &part, &self.http)
        });
        match result {
            Ok(bytes) => {
                std::fs::rename(&part, &staged).map_err(|e| {
                    let _ = std::fs::remove_file(&part);
                    FetchError::terminal(truncate_reason(
                        &format!("staging {}: {}", staged.display(), e),
                        self.max_error_len,
                    ))
                })?;
                tracing::debug!(%url, bytes, path = %staged.display(), "recording staged");
                Ok(staged)
            }
            Err(e) => Err(self.to_fetch_error(&e, attempts)),
        }
    }
}
