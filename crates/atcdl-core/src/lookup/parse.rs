//! Search page scraping.
//!
//! Each station is a `table.body` (border 0, padding not 0) holding the title
//! in `<strong>`, the status in `<font>` and an `/archive.php?m=<id>` link; the
//! matching `table.freqTable` that follows lists its frequencies.

use scraper::{ElementRef, Html, Selector};

use super::{Frequency, StationRecord, Stations};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

/// Splits a search page into station/frequency table pairs.
///
/// Pairs hold the outer HTML of both tables; `Stations` parses them lazily.
pub fn parse_search_page(page: &str) -> Stations {
    let document = Html::parse_document(page);
    let station_sel = selector(r#"table.body[border="0"]"#);
    let freq_sel = selector("table.freqTable");

    let stations: Vec<String> = document
        .select(&station_sel)
        .filter(|table| table.value().attr("padding") != Some("0"))
        .map(|table| table.html())
        .collect();
    let freqs: Vec<String> = document.select(&freq_sel).map(|table| table.html()).collect();
    Stations::new(stations.into_iter().zip(freqs).collect())
}

fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// `/archive.php?m=kpdx_zse` -> `kpdx_zse`.
fn archive_identifier(href: &str) -> Option<String> {
    let query = href.strip_prefix("/archive.php?")?;
    let id: String = query
        .split('&')
        .find_map(|pair| pair.strip_prefix("m="))?
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    (!id.is_empty()).then_some(id)
}

/// Parses one station table plus its frequency table. `None` without an archive link.
pub(super) fn parse_station(station: &str, freqs: &str) -> Option<StationRecord> {
    let station = Html::parse_fragment(station);
    let identifier = station
        .select(&selector(r#"a[href^="/archive.php"]"#))
        .filter_map(|a| a.value().attr("href"))
        .find_map(archive_identifier)?;
    let title = station
        .select(&selector("strong"))
        .next()
        .map(text_of)
        .unwrap_or_default();
    let up = station
        .select(&selector("font"))
        .next()
        .map(|font| text_of(font) == "UP")
        .unwrap_or(false);

    let freqs = Html::parse_fragment(freqs);
    let td_sel = selector("td");
    let frequencies = freqs
        .select(&selector("tr"))
        .skip(1)
        .filter_map(|row| {
            let mut cols = row.select(&td_sel).map(text_of);
            let title = cols.next()?;
            let frequency = cols.next()?;
            Some(Frequency { title, frequency })
        })
        .collect();

    Some(StationRecord {
        identifier,
        title,
        up,
        frequencies,
    })
}
