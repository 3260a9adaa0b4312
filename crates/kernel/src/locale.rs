//! Display locales and default-locale fallback.
//!
//! The catalog is published in a fixed set of languages. A site enables a
//! subset of them and designates one as the default; any locale token a
//! caller sends that is unknown or not enabled resolves to that default.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A supported display language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// Vietnamese.
    Vi,
    /// English.
    En,
    /// Khmer. Kept for content authored before the site dropped it.
    Km,
}

impl Locale {
    /// Every locale the catalog knows about, in display order.
    pub const ALL: [Locale; 3] = [Locale::Vi, Locale::En, Locale::Km];

    /// Language code used in query strings and localized document fields.
    pub fn code(self) -> &'static str {
        match self {
            Locale::Vi => "vi",
            Locale::En => "en",
            Locale::Km => "km",
        }
    }

    /// Parse a language code, ignoring case and surrounding whitespace.
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|locale| locale.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned when a configured locale code is not recognized.
#[derive(Debug, thiserror::Error)]
#[error("unknown locale code: {0}")]
pub struct UnknownLocale(pub String);

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownLocale(s.to_string()))
    }
}

/// Enabled locales plus the fallback used for anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleSettings {
    default: Locale,
    enabled: Vec<Locale>,
}

impl LocaleSettings {
    /// Create settings; the default locale is always enabled.
    pub fn new(default: Locale, enabled: impl IntoIterator<Item = Locale>) -> Self {
        let mut locales = vec![default];
        for locale in enabled {
            if !locales.contains(&locale) {
                locales.push(locale);
            }
        }
        Self {
            default,
            enabled: locales,
        }
    }

    /// The configured default locale.
    pub fn default_locale(&self) -> Locale {
        self.default
    }

    /// Enabled locales, default first.
    pub fn enabled(&self) -> &[Locale] {
        &self.enabled
    }

    /// Resolve a caller-supplied locale token.
    ///
    /// Absent, unknown and disabled values all resolve to the default.
    pub fn resolve(&self, requested: Option<&str>) -> Locale {
        let Some(raw) = requested else {
            return self.default;
        };

        match Locale::parse(raw) {
            Some(locale) if self.enabled.contains(&locale) => locale,
            Some(locale) => {
                tracing::debug!(locale = %locale, "locale not enabled, using default");
                self.default
            }
            None => {
                if !raw.trim().is_empty() {
                    tracing::debug!(requested = %raw, "unknown locale, using default");
                }
                self.default
            }
        }
    }
}

impl Default for LocaleSettings {
    fn default() -> Self {
        Self::new(Locale::Vi, [Locale::En])
    }
}
