//! Rendering hints derived from selector state.
//!
//! Front-ends read these instead of inspecting their own widgets to learn
//! which controls are showing.

use shared::format::{FormatId, Mode};

use crate::selector::FormatSelector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Xml,
    Javascript,
    Yaml,
    Toml,
    Shell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorProfile {
    pub syntax: Syntax,
    pub line_numbers: bool,
}

impl EditorProfile {
    pub fn for_format(format: FormatId) -> Self {
        let (syntax, line_numbers) = match format {
            FormatId::Xml => (Syntax::Xml, true),
            FormatId::Json => (Syntax::Javascript, true),
            FormatId::Yaml => (Syntax::Yaml, true),
            FormatId::Ini => (Syntax::Toml, true),
            FormatId::Csv => (Syntax::Shell, true),
            _ => (Syntax::Shell, false),
        };
        Self {
            syntax,
            line_numbers,
        }
    }
}

/// Auxiliary controls the widget shows for the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlVisibility {
    pub grok_fields: bool,
    pub prettify_switch: bool,
    pub header_switch: bool,
    pub hmac_field: bool,
    pub date_format_field: bool,
}

impl ControlVisibility {
    pub fn for_selection(mode: Mode, source: FormatId, target: FormatId) -> Self {
        match mode {
            Mode::Containers => Self {
                grok_fields: source == FormatId::Grok,
                prettify_switch: matches!(target, FormatId::Xml | FormatId::Json),
                header_switch: source == FormatId::Csv || target == FormatId::Csv,
                ..Self::default()
            },
            Mode::Hashing => Self {
                hmac_field: target.is_digest(),
                ..Self::default()
            },
            Mode::Date => Self {
                date_format_field: true,
                ..Self::default()
            },
            Mode::Notation | Mode::Bytes | Mode::Seconds => Self::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presentation {
    pub source_editor: EditorProfile,
    pub result_editor: EditorProfile,
    pub controls: ControlVisibility,
}

impl Presentation {
    pub fn of(selector: &FormatSelector) -> Self {
        Self {
            source_editor: EditorProfile::for_format(selector.source()),
            result_editor: EditorProfile::for_format(selector.target()),
            controls: ControlVisibility::for_selection(
                selector.mode(),
                selector.source(),
                selector.target(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grok_source_uses_plain_shell_editor_and_shows_pattern_fields() {
        let mut selector = FormatSelector::new(Mode::Containers);
        selector.select_source(FormatId::Grok).expect("grok source");

        let presentation = Presentation::of(&selector);
        assert_eq!(
            presentation.source_editor,
            EditorProfile {
                syntax: Syntax::Shell,
                line_numbers: false
            }
        );
        assert!(presentation.controls.grok_fields);
        assert!(presentation.controls.prettify_switch);
    }

    #[test]
    fn prettify_switch_follows_structured_targets() {
        let mut selector = FormatSelector::new(Mode::Containers);
        selector.select_source(FormatId::Json).expect("json source");

        selector.select_target(FormatId::Yaml).expect("yaml target");
        assert!(!Presentation::of(&selector).controls.prettify_switch);

        selector.select_target(FormatId::Xml).expect("xml target");
        let presentation = Presentation::of(&selector);
        assert!(presentation.controls.prettify_switch);
        assert_eq!(presentation.result_editor.syntax, Syntax::Xml);
    }

    #[test]
    fn header_switch_shows_for_csv_on_either_side() {
        let visible = |source, target| {
            ControlVisibility::for_selection(Mode::Containers, source, target).header_switch
        };
        assert!(visible(FormatId::Csv, FormatId::Json));
        assert!(visible(FormatId::Json, FormatId::Csv));
        assert!(!visible(FormatId::Json, FormatId::Ini));
    }

    #[test]
    fn hmac_field_only_for_digest_targets() {
        let controls = ControlVisibility::for_selection(Mode::Hashing, FormatId::Text, FormatId::Sha1);
        assert!(controls.hmac_field);
        let controls =
            ControlVisibility::for_selection(Mode::Hashing, FormatId::Text, FormatId::Base64);
        assert!(!controls.hmac_field);
    }

    #[test]
    fn ini_renders_as_toml() {
        assert_eq!(EditorProfile::for_format(FormatId::Ini).syntax, Syntax::Toml);
        assert!(EditorProfile::for_format(FormatId::Csv).line_numbers);
        assert!(!EditorProfile::for_format(FormatId::Syslog).line_numbers);
    }
}
