use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    error::FormatError,
    format::{FormatId, Mode},
};

/// Body of `POST /exec`.
///
/// Only the fields of the active mode are populated; everything else is
/// left `None` and omitted from the encoded JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawConversionRequest")]
pub struct ConversionRequest {
    pub from: FormatId,
    pub to: FormatId,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub express: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prettify: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hmac: Option<String>,
    #[serde(
        default,
        rename = "formatDate",
        skip_serializing_if = "Option::is_none"
    )]
    pub format_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notation: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<bool>,
}

#[derive(Deserialize)]
struct RawConversionRequest {
    from: FormatId,
    to: FormatId,
    text: String,
    #[serde(default)]
    express: Option<String>,
    #[serde(default)]
    patterns: Option<Map<String, Value>>,
    #[serde(default)]
    prettify: Option<bool>,
    #[serde(default)]
    header: Option<bool>,
    #[serde(default)]
    hmac: Option<String>,
    #[serde(default, rename = "formatDate")]
    format_date: Option<String>,
    #[serde(default)]
    notation: Option<bool>,
    #[serde(default)]
    bytes: Option<bool>,
    #[serde(default)]
    seconds: Option<bool>,
    #[serde(default)]
    date: Option<bool>,
}

impl TryFrom<RawConversionRequest> for ConversionRequest {
    type Error = FormatError;

    fn try_from(raw: RawConversionRequest) -> Result<Self, Self::Error> {
        let request = Self {
            from: raw.from,
            to: raw.to,
            text: raw.text,
            express: raw.express,
            patterns: raw.patterns,
            prettify: raw.prettify,
            header: raw.header,
            hmac: raw.hmac,
            format_date: raw.format_date,
            notation: raw.notation,
            bytes: raw.bytes,
            seconds: raw.seconds,
            date: raw.date,
        };
        request.validate()?;
        Ok(request)
    }
}

impl ConversionRequest {
    pub fn new(from: FormatId, to: FormatId, text: impl Into<String>) -> Self {
        Self {
            from,
            to,
            text: text.into(),
            express: None,
            patterns: None,
            prettify: None,
            header: None,
            hmac: None,
            format_date: None,
            notation: None,
            bytes: None,
            seconds: None,
            date: None,
        }
    }

    /// Mode selected by the request's flags, falling back to the formats
    /// themselves for the flagless hashing and container sub-schemas.
    pub fn mode(&self) -> Mode {
        if self.notation == Some(true) {
            Mode::Notation
        } else if self.bytes == Some(true) {
            Mode::Bytes
        } else if self.seconds == Some(true) {
            Mode::Seconds
        } else if self.date == Some(true) {
            Mode::Date
        } else if Mode::Hashing.has_source(self.from) || Mode::Hashing.has_target(self.to) {
            Mode::Hashing
        } else {
            Mode::Containers
        }
    }

    pub fn validate(&self) -> Result<(), FormatError> {
        let mode = self.mode();
        mode.ensure_source(self.from)?;
        mode.ensure_target(self.to)
    }
}

/// Response envelope of `POST /exec`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Converted(String),
    Rejected(String),
    Empty,
}

impl ConversionResponse {
    pub fn converted(result: impl Into<String>) -> Self {
        Self {
            result: Some(result.into()),
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            result: None,
            error: Some(error.into()),
        }
    }

    /// A non-empty `error` takes precedence over `result`; empty strings
    /// count as absent.
    pub fn into_outcome(self) -> ConversionOutcome {
        match (self.result, self.error) {
            (_, Some(error)) if !error.is_empty() => ConversionOutcome::Rejected(error),
            (Some(result), _) if !result.is_empty() => ConversionOutcome::Converted(result),
            _ => ConversionOutcome::Empty,
        }
    }
}
