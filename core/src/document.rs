use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::Date;

/// `yyyy-mm-dd`, shared by filter parsing and `date_iso`.
const ISO_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

lazy_static! {
    static ref RESTRICTION: Regex =
        Regex::new(r"PUBLICATIONxINx((?:[A-Z]{3}x)+)ONLY").expect("valid regex");
}

/// A corpus record as stored in the media JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMediaItem {
    pub suchtext: String,
    pub bildnummer: String,
    pub fotografen: String,
    /// `dd.mm.yyyy`
    pub datum: String,
    pub hoehe: String,
    pub breite: String,
    #[serde(default)]
    pub restrictions: Option<Vec<String>>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("malformed date {value:?}: expected a valid dd.mm.yyyy date")]
    MalformedDate { value: String },
    #[error("malformed {field} {value:?}: expected an unsigned integer")]
    MalformedDimension { field: &'static str, value: String },
    #[error("date {value} cannot be written as yyyy-mm-dd")]
    UnformattableDate { value: String },
}

/// An accepted, normalized document. Immutable once loaded.
#[derive(Debug, Clone, Serialize)]
pub struct MediaDocument {
    pub id: String,
    pub search_text: String,
    pub photographer: String,
    /// Date as it appeared in the corpus.
    pub date: String,
    /// Same date as `yyyy-mm-dd`.
    pub date_iso: String,
    #[serde(skip)]
    pub day: Date,
    pub height: u32,
    pub width: u32,
    /// Countries the image may be published in. Empty means unrestricted.
    pub restrictions: BTreeSet<String>,
}

impl MediaDocument {
    pub fn from_raw(raw: RawMediaItem) -> Result<Self, DocumentError> {
        let day = parse_corpus_date(&raw.datum)?;
        let height = parse_dimension("hoehe", &raw.hoehe)?;
        let width = parse_dimension("breite", &raw.breite)?;

        let mut restrictions = extract_restrictions(&raw.suchtext);
        for code in raw.restrictions.into_iter().flatten() {
            let code = code.trim().to_uppercase();
            if !code.is_empty() {
                restrictions.insert(code);
            }
        }

        Ok(Self {
            date_iso: iso_date(day)?,
            id: raw.bildnummer,
            search_text: raw.suchtext,
            photographer: raw.fotografen,
            date: raw.datum,
            day,
            height,
            width,
            restrictions,
        })
    }
}

/// Parse a `dd.mm.yyyy` corpus date into a calendar date.
pub fn parse_corpus_date(value: &str) -> Result<Date, DocumentError> {
    let fmt = format_description!("[day].[month].[year]");
    Date::parse(value.trim(), &fmt).map_err(|_| DocumentError::MalformedDate { value: value.to_string() })
}

/// Parse a `yyyy-mm-dd` date, as used by date-range filters.
pub fn parse_iso_date(value: &str) -> Result<Date, DocumentError> {
    Date::parse(value.trim(), ISO_DATE).map_err(|_| DocumentError::MalformedDate { value: value.to_string() })
}

pub fn iso_date(day: Date) -> Result<String, DocumentError> {
    day.format(ISO_DATE).map_err(|_| DocumentError::UnformattableDate { value: day.to_string() })
}

fn parse_dimension(field: &'static str, value: &str) -> Result<u32, DocumentError> {
    value
        .trim()
        .parse()
        .map_err(|_| DocumentError::MalformedDimension { field, value: value.to_string() })
}

/// Country codes named by `PUBLICATIONxINx...xONLY` markers in the text.
pub fn extract_restrictions(text: &str) -> BTreeSet<String> {
    RESTRICTION
        .captures_iter(text)
        .flat_map(|caps| {
            caps[1]
                .split('x')
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}
