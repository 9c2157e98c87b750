//! Locale identifiers.

use std::{fmt, str::FromStr};

use crate::convert::ConvertError;

/// A locale written as `language[_COUNTRY[_variant]]`.
///
/// Parsing is lenient: `_` and `-` both separate subtags, the language and
/// country are cut to two characters, the language is lowercased and the
/// country uppercased. Only an empty language is rejected. The constructors
/// apply the same rules, so a built tag survives a text round trip as long as
/// its language is not empty.
///
/// ```
/// # use cfgtree::convert::LanguageTag;
/// let tag: LanguageTag = "EN-us".parse()?;
/// assert_eq!(tag.language(), "en");
/// assert_eq!(tag.country(), Some("US"));
/// assert_eq!(tag.to_string(), "en_US");
/// # Ok::<(), cfgtree::convert::ConvertError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageTag {
    language: String,
    country: Option<String>,
    variant: Option<String>,
}

impl LanguageTag {
    pub fn new(language: impl AsRef<str>) -> Self {
        Self {
            language: subtag(language.as_ref()).to_lowercase(),
            country: None,
            variant: None,
        }
    }

    /// Sets the country; an empty country clears it.
    pub fn with_country(mut self, country: impl AsRef<str>) -> Self {
        let country = subtag(country.as_ref()).to_uppercase();
        self.country = (!country.is_empty()).then_some(country);
        self
    }

    /// Sets the variant. Separators inside it are written as `_`; an empty
    /// variant clears it.
    pub fn with_variant(mut self, variant: impl AsRef<str>) -> Self {
        let parts: Vec<&str> = variant
            .as_ref()
            .trim()
            .split(SEPARATORS)
            .filter(|part| !part.is_empty())
            .collect();
        self.variant = (!parts.is_empty()).then(|| parts.join("_"));
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }
}

const SEPARATORS: [char; 2] = ['_', '-'];

/// First subtag of `text`, cut to two characters.
fn subtag(text: &str) -> String {
    text.trim()
        .split(SEPARATORS)
        .next()
        .unwrap_or_default()
        .trim()
        .chars()
        .take(2)
        .collect()
}

impl FromStr for LanguageTag {
    type Err = ConvertError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut subtags = text.trim().split(SEPARATORS);
        let mut tag = Self::new(subtags.next().unwrap_or_default());
        if tag.language.is_empty() {
            return Err(ConvertError::conversion(
                "locale",
                format!("'{text}'"),
                "missing language subtag",
            ));
        }
        if let Some(country) = subtags.next() {
            tag = tag.with_country(country);
        }
        let rest: Vec<&str> = subtags.collect();
        Ok(tag.with_variant(rest.join("_")))
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.language)?;
        match (&self.country, &self.variant) {
            (Some(country), Some(variant)) => write!(f, "_{country}_{variant}"),
            (Some(country), None) => write!(f, "_{country}"),
            (None, Some(variant)) => write!(f, "__{variant}"),
            (None, None) => Ok(()),
        }
    }
}
