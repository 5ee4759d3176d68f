//! Station lookup: search the LiveATC site for an airport's feeds.
//!
//! The result is a lazy, finite sequence of `StationRecord`s that can be
//! consumed once.

mod parse;

pub use parse::parse_search_page;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AtcConfig;
use crate::fetch::HttpOptions;
use crate::retry::TransferError;

/// One frequency listed for a station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frequency {
    pub title: String,
    pub frequency: String,
}

/// A searchable feed with an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationRecord {
    /// Archive id used by fetches, e.g. `kpdx_zse`.
    pub identifier: String,
    pub title: String,
    /// Whether the feed is currently up.
    pub up: bool,
    pub frequencies: Vec<Frequency>,
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("invalid search url: {0}")]
    Url(#[from] url::ParseError),
    #[error("station search request failed: {0}")]
    Request(#[from] TransferError),
}

/// Consume-once iterator over parsed station records.
///
/// Table fragments are located up front; each record is parsed when it is pulled.
pub struct Stations {
    pairs: std::vec::IntoIter<(String, String)>,
}

impl Stations {
    pub(crate) fn new(pairs: Vec<(String, String)>) -> Self {
        Self {
            pairs: pairs.into_iter(),
        }
    }
}

impl Iterator for Stations {
    type Item = StationRecord;

    fn next(&mut self) -> Option<StationRecord> {
        for (station, freqs) in self.pairs.by_ref() {
            match parse::parse_station(&station, &freqs) {
                Some(record) => return Some(record),
                None => tracing::debug!("skipping station table without archive link"),
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.pairs.len()))
    }
}

/// Source of station records for a search query (ICAO code).
pub trait StationLookup {
    fn search(&self, query: &str) -> Result<Stations, LookupError>;
}

/// Lookup against the LiveATC search page.
#[derive(Debug, Clone)]
pub struct LiveAtcLookup {
    search_base_url: String,
    http: HttpOptions,
}

impl LiveAtcLookup {
    pub fn from_config(cfg: &AtcConfig) -> Self {
        Self {
            search_base_url: cfg.search_base_url.trim_end_matches('/').to_string(),
            http: HttpOptions::from(cfg),
        }
    }
}

impl StationLookup for LiveAtcLookup {
    /// Blocking: performs the HTTP request on the calling thread.
    fn search(&self, query: &str) -> Result<Stations, LookupError> {
        let url = url::Url::parse_with_params(
            &format!("{}/search/", self.search_base_url),
            &[("icao", query.trim())],
        )?;
        tracing::debug!(%url, "searching stations");
        let page = crate::fetch::get_page(url.as_str(), &self.http)?;
        Ok(parse_search_page(&page))
    }
}
