use serde_json::{Map, Value};
use shared::{
    format::{FormatId, Mode},
    protocol::ConversionRequest,
};

use crate::{error::ValidationError, selector::FormatSelector};

/// Values of the auxiliary inputs next to the editors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuxiliaryControls {
    pub hmac_key: String,
    pub date_format: String,
    pub grok_expression: String,
    /// GROK pattern definitions as typed by the user; parsed as a JSON object.
    pub grok_patterns: String,
    pub prettify: bool,
    pub header: bool,
}

pub struct RequestBuilder;

impl RequestBuilder {
    /// Validates the inputs and assembles the payload for the selector's
    /// mode. Nothing here touches the network.
    pub fn build(
        selector: &FormatSelector,
        source_text: &str,
        controls: &AuxiliaryControls,
    ) -> Result<ConversionRequest, ValidationError> {
        if source_text.trim().is_empty() {
            return Err(ValidationError::EmptyInput);
        }

        let from = selector.source();
        let to = selector.target();
        let mut request = ConversionRequest::new(from, to, source_text);

        match selector.mode() {
            Mode::Containers => {
                if from == FormatId::Grok {
                    if controls.grok_expression.trim().is_empty() {
                        return Err(ValidationError::MissingExpression);
                    }
                    request.express = Some(controls.grok_expression.clone());
                    request.patterns = parse_patterns(&controls.grok_patterns)?;
                }
                if matches!(to, FormatId::Xml | FormatId::Json) {
                    request.prettify = Some(controls.prettify);
                }
                if from == FormatId::Csv || to == FormatId::Csv {
                    request.header = Some(controls.header);
                }
            }
            Mode::Hashing => {
                if to.is_digest() && !controls.hmac_key.is_empty() {
                    request.hmac = Some(controls.hmac_key.clone());
                }
            }
            Mode::Notation => request.notation = Some(true),
            Mode::Bytes => request.bytes = Some(true),
            Mode::Seconds => request.seconds = Some(true),
            Mode::Date => {
                request.date = Some(true);
                let format = controls.date_format.trim();
                if !format.is_empty() {
                    request.format_date = Some(format.to_string());
                }
            }
        }

        Ok(request)
    }
}

/// Blank input means "no custom patterns". Anything else has to be a JSON
/// object mapping pattern names to their definitions.
fn parse_patterns(raw: &str) -> Result<Option<Map<String, Value>>, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let parsed: Value = serde_json::from_str(raw)
        .map_err(|err| ValidationError::MalformedPatterns(err.to_string()))?;
    let Value::Object(patterns) = parsed else {
        return Err(ValidationError::MalformedPatterns(
            "expected a JSON object of named patterns".into(),
        ));
    };
    if let Some((name, _)) = patterns.iter().find(|(_, value)| !value.is_string()) {
        return Err(ValidationError::MalformedPatterns(format!(
            "pattern '{name}' must be a string"
        )));
    }
    Ok(Some(patterns))
}
