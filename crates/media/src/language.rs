// Language code resolution for captions and track titles

use isocountry::CountryCode;
use isolang::Language;
use tracing::debug;

/// Short names used in track titles written by the metadata command
const TITLE_LANGUAGES: &[(&str, &str)] = &[
    ("eng", "English"),
    ("tam", "Tamil"),
    ("tel", "Telugu"),
    ("hin", "Hindi"),
    ("mal", "Malayalam"),
    ("kan", "Kannada"),
    ("urd", "Urdu"),
    ("ben", "Bengali"),
    ("mar", "Marathi"),
];

/// ISO 639-2/B codes that differ from their ISO 639-3 counterparts.
/// Container tags written by ffmpeg frequently use the bibliographic form.
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("dut", "nld"),
    ("fre", "fra"),
    ("geo", "kat"),
    ("ger", "deu"),
    ("gre", "ell"),
    ("ice", "isl"),
    ("mac", "mkd"),
    ("mao", "mri"),
    ("may", "msa"),
    ("per", "fas"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("tib", "bod"),
    ("wel", "cym"),
];

/// Region names that read better than the ISO 3166 official ones
const REGION_NAMES: &[(&str, &str)] = &[
    ("US", "United States"),
    ("GB", "United Kingdom"),
    ("KR", "South Korea"),
    ("KP", "North Korea"),
    ("RU", "Russia"),
    ("TW", "Taiwan"),
    ("IR", "Iran"),
    ("VN", "Vietnam"),
    ("BO", "Bolivia"),
    ("VE", "Venezuela"),
    ("419", "Latin America"),
];

/// Resolve a language code to its English display name.
///
/// Accepts two-letter (`en`), three-letter (`eng`, `fre`) and tagged
/// (`en-US`, `pt_BR`) forms. A region subtag is rendered in parentheses,
/// e.g. `pt-BR` becomes `Portuguese (Brazil)`; an unknown region is dropped.
/// Returns `None` when the language itself is unrecognised.
pub fn display_name(code: &str) -> Option<String> {
    let mut subtags = code.trim().split(['-', '_']);
    let primary = subtags.next().unwrap_or_default().to_ascii_lowercase();

    let language = match primary.len() {
        2 => Language::from_639_1(&primary),
        3 => {
            let terminology = BIBLIOGRAPHIC_CODES
                .iter()
                .find(|(b, _)| *b == primary)
                .map(|(_, t)| *t)
                .unwrap_or(primary.as_str());
            Language::from_639_3(terminology)
        }
        _ => None,
    };

    let Some(language) = language else {
        debug!("Unrecognised language code: {:?}", code);
        return None;
    };

    // Script subtags (`Hant`) are four letters and skipped
    let region = subtags
        .find(|s| {
            (s.len() == 2 && s.chars().all(|c| c.is_ascii_alphabetic()))
                || (s.len() == 3 && s.chars().all(|c| c.is_ascii_digit()))
        })
        .and_then(region_name);

    Some(match region {
        Some(region) => format!("{} ({})", language.to_name(), region),
        None => language.to_name().to_string(),
    })
}

fn region_name(subtag: &str) -> Option<String> {
    let subtag = subtag.to_ascii_uppercase();
    if let Some((_, name)) = REGION_NAMES.iter().find(|(c, _)| *c == subtag) {
        return Some(name.to_string());
    }
    match CountryCode::for_alpha2(&subtag) {
        Ok(country) => Some(country.name().to_string()),
        Err(_) => {
            debug!("Unrecognised region subtag: {:?}", subtag);
            None
        }
    }
}

/// Resolve every code to a display name, dropping unknown codes and
/// duplicate names while keeping first-seen order. `en-US` and `en-GB`
/// stay distinct.
pub fn join_display_names<'a, I>(codes: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut names: Vec<String> = Vec::new();
    for code in codes {
        if let Some(name) = display_name(code) {
            if !names.contains(&name) {
                debug!("Parsed language: {}", name);
                names.push(name);
            }
        }
    }
    names.join(", ")
}

/// Language label used in audio track titles, e.g. `Tamil-<key>`.
///
/// Known codes map through a short table; anything else is used as-is.
/// The result is capitalised.
pub fn title_language(code: &str) -> String {
    let name = TITLE_LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .unwrap_or(code);
    capitalize(name)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_name_prefers_short_form() {
        assert_eq!(region_name("us").as_deref(), Some("United States"));
        assert_eq!(region_name("BR").as_deref(), Some("Brazil"));
        assert_eq!(region_name("ZZ"), None);
    }

    #[test]
    fn capitalize_lowers_the_tail() {
        assert_eq!(capitalize("jPN"), "Jpn");
        assert_eq!(capitalize(""), "");
    }
}
