//! Blocking curl transfers: fetch a page into memory, stream a recording to disk.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::AtcConfig;
use crate::retry::TransferError;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const DEFAULT_HEADERS: &[&str] = &[
    "Accept: text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    "Accept-Language: en-US,en;q=0.9",
];

/// Timeouts and TLS behaviour shared by every request.
#[derive(Debug, Clone, Copy)]
pub struct HttpOptions {
    pub connect_timeout: Duration,
    pub page_timeout: Duration,
    pub archive_timeout: Duration,
    /// Retry a page or recording request once without TLS peer verification on
    /// TLS/connect failure.
    pub insecure_tls_fallback: bool,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self::from(&AtcConfig::default())
    }
}

impl From<&AtcConfig> for HttpOptions {
    fn from(cfg: &AtcConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            page_timeout: Duration::from_secs(cfg.page_timeout_secs),
            archive_timeout: Duration::from_secs(cfg.archive_timeout_secs),
            insecure_tls_fallback: cfg.insecure_tls_fallback,
        }
    }
}

fn new_easy(url: &str, connect: Duration, total: Duration) -> Result<curl::easy::Easy, TransferError> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.useragent(USER_AGENT)?;
    easy.connect_timeout(connect)?;
    easy.timeout(total)?;
    let mut list = curl::easy::List::new();
    for h in DEFAULT_HEADERS {
        list.append(h)?;
    }
    easy.http_headers(list)?;
    Ok(easy)
}

fn check_status(easy: &mut curl::easy::Easy) -> Result<(), TransferError> {
    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(TransferError::Http(code));
    }
    Ok(())
}

fn get_page_once(url: &str, opts: &HttpOptions, verify: bool) -> Result<String, TransferError> {
    let mut easy = new_easy(url, opts.connect_timeout, opts.page_timeout)?;
    if !verify {
        easy.ssl_verify_peer(false)?;
        easy.ssl_verify_host(false)?;
    }
    let mut body = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }
    check_status(&mut easy)?;
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Whether a failed request should be repeated once without TLS peer verification.
fn wants_insecure_retry(err: &TransferError, opts: &HttpOptions) -> bool {
    match err {
        TransferError::Curl(e) => {
            opts.insecure_tls_fallback
                && (e.is_ssl_connect_error()
                    || e.is_peer_failed_verification()
                    || e.is_couldnt_connect()
                    || e.is_operation_timedout())
        }
        _ => false,
    }
}

/// GETs a page and returns its body as text (lossy UTF-8).
pub(crate) fn get_page(url: &str, opts: &HttpOptions) -> Result<String, TransferError> {
    match get_page_once(url, opts, true) {
        Err(e) if wants_insecure_retry(&e, opts) => {
            tracing::warn!(url, "page request failed ({}), retrying without TLS verification", e);
            get_page_once(url, opts, false)
        }
        other => other,
    }
}

/// Streams `url` into `dest`, replacing any existing file. Returns bytes written.
/// On any failure the partial file is removed.
pub(crate) fn download_to_file(url: &str, dest: &Path, opts: &HttpOptions) -> Result<u64, TransferError> {
    let result = match download_inner(url, dest, opts, true) {
        Err(e) if wants_insecure_retry(&e, opts) => {
            tracing::warn!(url, "download failed ({}), retrying without TLS verification", e);
            download_inner(url, dest, opts, false)
        }
        other => other,
    };
    if result.is_err() {
        let _ = fs::remove_file(dest);
    }
    result
}

fn download_inner(
    url: &str,
    dest: &Path,
    opts: &HttpOptions,
    verify: bool,
) -> Result<u64, TransferError> {
    let file = fs::File::create(dest).map_err(TransferError::Storage)?;
    let mut writer = std::io::BufWriter::new(file);
    let storage_error: Arc<Mutex<Option<std::io::Error>>> = Arc::new(Mutex::new(None));
    let storage_error_cb = Arc::clone(&storage_error);
    let mut written = 0u64;

    let mut easy = new_easy(url, opts.connect_timeout, opts.archive_timeout)?;
    if !verify {
        easy.ssl_verify_peer(false)?;
        easy.ssl_verify_host(false)?;
    }
    // Refuse to write an error page body as if it were audio.
    easy.fail_on_error(true)?;
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| match writer.write_all(data) {
            Ok(()) => {
                written += data.len() as u64;
                Ok(data.len())
            }
            Err(e) => {
                let _ = storage_error_cb
                    .lock()
                    .unwrap_or_else(|p| p.into_inner())
                    .replace(e);
                Ok(0)
            }
        })?;
        if let Err(e) = transfer.perform() {
            if e.is_write_error() {
                if let Some(io_err) = storage_error.lock().unwrap_or_else(|p| p.into_inner()).take() {
                    return Err(TransferError::Storage(io_err));
                }
            }
            if e.is_http_returned_error() {
                drop(transfer);
                check_status(&mut easy)?;
            }
            return Err(TransferError::Curl(e));
        }
    }
    check_status(&mut easy)?;
    writer.flush().map_err(TransferError::Storage)?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(fallback: bool) -> HttpOptions {
        HttpOptions {
            insecure_tls_fallback: fallback,
            ..HttpOptions::default()
        }
    }

    #[test]
    fn insecure_retry_only_for_tls_and_connect_failures() {
        for code in [7, 28, 35, 60] {
            let err = TransferError::Curl(curl::Error::new(code));
            assert!(wants_insecure_retry(&err, &opts(true)), "curl code {}", code);
            assert!(!wants_insecure_retry(&err, &opts(false)), "curl code {}", code);
        }
        assert!(!wants_insecure_retry(&TransferError::Http(404), &opts(true)));
        assert!(!wants_insecure_retry(
            &TransferError::Curl(curl::Error::new(22)),
            &opts(true)
        ));
    }

    #[test]
    fn failed_download_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("rec.mp3.part");
        // Nothing listens on port 1; with the fallback on, both attempts fail.
        let err = download_to_file("http://127.0.0.1:1/rec.mp3", &dest, &opts(true)).unwrap_err();
        assert!(matches!(err, TransferError::Curl(_)), "{:?}", err);
        assert!(!dest.exists());
    }
}
