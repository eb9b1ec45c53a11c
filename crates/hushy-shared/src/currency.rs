//! Currency detection from the device's country and locale.
//!
//! The country (from reverse geocoding) wins whenever it is known; the
//! locale's region subtag is only consulted without one. Anything
//! unrecognised falls back to euro.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    #[default]
    Eur,
}

impl Currency {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Usd => "$",
            Self::Eur => "€",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "USD" => Some(Self::Usd),
            "EUR" => Some(Self::Eur),
            _ => None,
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Country names (lowercase) whose official currency is the US dollar.
const USD_COUNTRY_NAMES: &[&str] = &[
    "united states",
    "united states of america",
    "usa",
    "us",
    "u.s.",
    "u.s.a.",
    "america",
    "puerto rico",
    "guam",
    "american samoa",
    "northern mariana islands",
    "u.s. virgin islands",
    "united states virgin islands",
    "british virgin islands",
    "turks and caicos islands",
    "ecuador",
    "el salvador",
    "panama",
    "marshall islands",
    "micronesia",
    "palau",
    "timor-leste",
    "east timor",
    "bonaire",
];

/// ISO 3166 region codes whose currency is the US dollar.
const USD_REGION_CODES: &[&str] = &[
    "US", "PR", "GU", "AS", "MP", "VI", "VG", "TC", "EC", "SV", "PA", "MH", "FM", "PW", "TL",
    "BQ", "UM",
];

pub fn from_country(name: &str) -> Currency {
    let normalized = name.trim().to_lowercase();
    if USD_COUNTRY_NAMES.contains(&normalized.as_str()) {
        Currency::Usd
    } else {
        Currency::Eur
    }
}

/// Currency implied by a locale tag such as `en-US`, `en_US` or
/// `zh-Hans-US`. `None` when the tag carries no region.
pub fn from_locale(tag: &str) -> Option<Currency> {
    let region = region_subtag(tag)?;
    if USD_REGION_CODES.contains(&region.as_str()) {
        Some(Currency::Usd)
    } else {
        Some(Currency::Eur)
    }
}

fn region_subtag(tag: &str) -> Option<String> {
    tag.split(['-', '_'])
        .skip(1)
        .find(|part| part.len() == 2 && part.chars().all(|c| c.is_ascii_alphabetic()))
        .map(|part| part.to_ascii_uppercase())
}

pub fn detect_currency(country: Option<&str>, locale: Option<&str>) -> Currency {
    if let Some(country) = country.filter(|c| !c.trim().is_empty()) {
        return from_country(country);
    }

    locale
        .and_then(from_locale)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usd_country_names() {
        for name in ["United States", "USA", "  puerto rico ", "Ecuador", "El Salvador"] {
            assert_eq!(detect_currency(Some(name), None).symbol(), "$", "{name}");
        }
    }

    #[test]
    fn euro_is_the_fallback() {
        assert_eq!(detect_currency(None, None).symbol(), "€");
        assert_eq!(detect_currency(Some("France"), None).symbol(), "€");
        assert_eq!(detect_currency(None, Some("fr")).symbol(), "€");
        assert_eq!(detect_currency(Some(""), Some("de")).symbol(), "€");
    }

    #[test]
    fn country_wins_over_language() {
        assert_eq!(detect_currency(Some("Germany"), Some("en-US")), Currency::Eur);
        assert_eq!(detect_currency(Some("United States"), Some("fr-FR")), Currency::Usd);
    }

    #[test]
    fn language_region_used_without_country() {
        assert_eq!(detect_currency(None, Some("en-US")), Currency::Usd);
        assert_eq!(detect_currency(None, Some("es_PR")), Currency::Usd);
        assert_eq!(detect_currency(None, Some("zh-Hans-US")), Currency::Usd);
        assert_eq!(detect_currency(Some("  "), Some("en-GB")), Currency::Eur);
    }

    #[test]
    fn codes() {
        assert_eq!(Currency::from_code("usd"), Some(Currency::Usd));
        assert_eq!(Currency::from_code("GBP"), None);
        assert_eq!(serde_json::to_string(&Currency::Eur).unwrap(), "\"EUR\"");
    }
}
