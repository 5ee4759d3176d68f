//! Archive naming: identifier resolution, airport code and file name.

use scraper::{Html, Selector};

/// Derives the archive identifier when the archive page cannot be scraped.
///
/// Stations usually follow `kxyz1_app` -> `KXYZ1-App`: first part upper-cased,
/// the rest capitalized, joined with `-`.
pub fn derive_archive_identifier(station: &str) -> String {
    station
        .split('_')
        .enumerate()
        .map(|(i, part)| if i == 0 { part.to_uppercase() } else { capitalize(part) })
        .collect::<Vec<_>>()
        .join("-")
}

fn capitalize(part: &str) -> String {
    let lower = part.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Airport code from a station id: first `_` part, trailing digits stripped,
/// lower-cased (`kcho3_zdc_121675` -> `kcho`).
pub fn airport_code(station: &str) -> String {
    let prefix = station.split('_').next().unwrap_or(station);
    prefix
        .trim_end_matches(|c: char| c.is_ascii_digit())
        .to_lowercase()
}

/// Recording file name, e.g. `KPDX-App-Dep-Oct-01-2021-0000Z.mp3`.
pub fn archive_file_name(archive_identifier: &str, date_token: &str, time_token: &str) -> String {
    format!("{}-{}-{}.mp3", archive_identifier, date_token, time_token)
}

/// Value of the first `<option ... selected ...>` element of an archive page.
pub fn selected_option_value(page: &str) -> Option<String> {
    let document = Html::parse_document(page);
    let option_sel = Selector::parse("option[selected]").expect("valid selector");
    let option = document.select(&option_sel).next()?;
    option
        .value()
        .attr("value")
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_identifier_capitalizes_parts() {
        assert_eq!(derive_archive_identifier("kpdx_zse"), "KPDX-Zse");
        assert_eq!(derive_archive_identifier("kxyz1_app"), "KXYZ1-App");
        assert_eq!(derive_archive_identifier("kjfk_twr_NORTH"), "KJFK-Twr-North");
        assert_eq!(derive_archive_identifier("egll"), "EGLL");
    }

    #[test]
    fn airport_code_strips_digits() {
        assert_eq!(airport_code("kcho3_zdc_121675"), "kcho");
        assert_eq!(airport_code("KPDX_zse"), "kpdx");
        assert_eq!(airport_code("kbos"), "kbos");
    }

    #[test]
    fn file_name_layout() {
        assert_eq!(
            archive_file_name("KPDX-App-Dep", "Oct-01-2021", "0000Z"),
            "KPDX-App-Dep-Oct-01-2021-0000Z.mp3"
        );
    }

    #[test]
    fn selected_option_found() {
        let html = r#"
            <select name="m">
              <option value="KPDX-Gnd">Ground</option>
              <option selected value="KPDX-App-Dep">Approach</option>
            </select>"#;
        assert_eq!(selected_option_value(html).as_deref(), Some("KPDX-App-Dep"));
    }

    #[test]
    fn selected_option_attribute_forms() {
        let html = r#"<option value='A'>a</option><option value=B selected="selected">b</option>"#;
        assert_eq!(selected_option_value(html).as_deref(), Some("B"));
    }

    #[test]
    fn no_selected_option() {
        assert_eq!(selected_option_value("<option value=\"x\">x</option>"), None);
        assert_eq!(selected_option_value("<option selected>x</option>"), None);
        assert_eq!(selected_option_value(""), None);
    }
}
