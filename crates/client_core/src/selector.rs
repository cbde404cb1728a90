//! Source/target format selection.
//!
//! One [`FormatSelector`] drives every formatter widget; what differs between
//! modes is only the [`CompatibilityTable`] it is built from.

use std::collections::{BTreeSet, HashMap};

use shared::{
    error::FormatError,
    format::{FormatId, Mode, Side, MAX_RADIX, MIN_RADIX},
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("{mode} table is empty")]
    Empty { mode: Mode },
    #[error("{mode} table has no entry for source '{format}'")]
    MissingSource { mode: Mode, format: FormatId },
    #[error("{mode} table has an entry for '{format}', which is not a source of the mode")]
    UnknownSource { mode: Mode, format: FormatId },
    #[error("{mode} table lists '{target}' for '{format}', which is not a target of the mode")]
    UnknownTarget {
        mode: Mode,
        format: FormatId,
        target: FormatId,
    },
    #[error("'{format}' is listed as a target of itself")]
    SelfTarget { format: FormatId },
    #[error("source '{format}' has no compatible target")]
    NoTargets { format: FormatId },
    #[error("default target '{default}' of '{format}' is not one of its compatible targets")]
    DefaultNotCompatible { format: FormatId, default: FormatId },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("target '{0}' is disabled for the current source")]
    TargetDisabled(FormatId),
}

#[derive(Debug, Clone)]
struct Rule {
    compatible: Vec<FormatId>,
    default: FormatId,
}

/// Which targets each source may convert to, and where the active target
/// goes when the new source forbids it.
#[derive(Debug, Clone)]
pub struct CompatibilityTable {
    mode: Mode,
    sources: Vec<FormatId>,
    targets: Vec<FormatId>,
    rules: HashMap<FormatId, Rule>,
}

const CONTAINER_RULES: &[(FormatId, &[FormatId], FormatId)] = {
    use FormatId::*;
    &[
        (Xml, &[Json, Yaml, Ini, Csv], Json),
        (Json, &[Xml, Yaml, Ini, Csv, Cef, Syslog], Xml),
        (Yaml, &[Xml, Json, Ini, Csv, Cef, Syslog], Json),
        (Ini, &[Xml, Json, Yaml], Json),
        (Csv, &[Xml, Json, Yaml], Json),
        (Cef, &[Xml, Json, Yaml, Csv], Json),
        (Syslog, &[Xml, Json, Yaml, Csv], Json),
        (Grok, &[Xml, Json, Yaml], Json),
    ]
};

fn radices() -> impl Iterator<Item = FormatId> {
    (MIN_RADIX..=MAX_RADIX).map(FormatId::Radix)
}

fn notation_rule(source: FormatId) -> (Vec<FormatId>, FormatId) {
    match source {
        FormatId::Text => {
            let mut compatible = vec![FormatId::Radix(2)];
            compatible.extend(radices().filter(|radix| radix.is_custom_radix()));
            (compatible, FormatId::Radix(2))
        }
        FormatId::Roman => (radices().collect(), FormatId::Radix(10)),
        FormatId::Radix(2) => {
            let mut compatible = vec![FormatId::Text, FormatId::Roman];
            compatible.extend(radices().filter(|radix| *radix != source));
            (compatible, FormatId::Radix(10))
        }
        _ => {
            let mut compatible = vec![FormatId::Roman];
            compatible.extend(radices().filter(|radix| *radix != source));
            let default = if source == FormatId::Radix(10) {
                FormatId::Radix(2)
            } else {
                FormatId::Radix(10)
            };
            (compatible, default)
        }
    }
}

impl CompatibilityTable {
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Containers => Self::from_rules_unchecked(
                mode,
                CONTAINER_RULES
                    .iter()
                    .map(|(source, compatible, default)| (*source, compatible.to_vec(), *default)),
            ),
            Mode::Notation => Self::from_rules_unchecked(
                mode,
                mode.source_formats().into_iter().map(|source| {
                    let (compatible, default) = notation_rule(source);
                    (source, compatible, default)
                }),
            ),
            Mode::Hashing | Mode::Bytes | Mode::Seconds | Mode::Date => Self::identity(mode),
        }
    }

    /// Every target except the one identical to the source; the default is
    /// the first remaining target in display order.
    pub fn identity(mode: Mode) -> Self {
        let targets = mode.target_formats();
        let rules = mode.source_formats().into_iter().filter_map(|source| {
            let compatible: Vec<FormatId> = targets
                .iter()
                .copied()
                .filter(|target| *target != source)
                .collect();
            let default = compatible.first().copied()?;
            Some((source, compatible, default))
        });
        Self::from_rules_unchecked(mode, rules)
    }

    /// Builds a table from `(source, compatible targets, default target)`
    /// rows and checks it.
    pub fn from_rules(
        mode: Mode,
        rules: impl IntoIterator<Item = (FormatId, Vec<FormatId>, FormatId)>,
    ) -> Result<Self, TableError> {
        let mut table = Self {
            mode,
            sources: mode.source_formats(),
            targets: mode.target_formats(),
            rules: HashMap::new(),
        };
        for (source, compatible, default) in rules {
            if !table.sources.contains(&source) {
                return Err(TableError::UnknownSource {
                    mode,
                    format: source,
                });
            }
            table.rules.insert(source, Rule { compatible, default });
        }
        table.validate()?;
        table.normalize();
        Ok(table)
    }

    fn from_rules_unchecked(
        mode: Mode,
        rules: impl IntoIterator<Item = (FormatId, Vec<FormatId>, FormatId)>,
    ) -> Self {
        let mut table = Self {
            mode,
            sources: mode.source_formats(),
            targets: mode.target_formats(),
            rules: rules
                .into_iter()
                .map(|(source, compatible, default)| (source, Rule { compatible, default }))
                .collect(),
        };
        table.normalize();
        table
    }

    // Compatible targets are kept in display order whatever order the rows
    // listed them in.
    fn normalize(&mut self) {
        let targets = &self.targets;
        for rule in self.rules.values_mut() {
            rule.compatible = targets
                .iter()
                .copied()
                .filter(|target| rule.compatible.contains(target))
                .collect();
        }
    }

    pub fn validate(&self) -> Result<(), TableError> {
        if self.sources.is_empty() || self.targets.is_empty() {
            return Err(TableError::Empty { mode: self.mode });
        }
        for source in &self.sources {
            let rule = self.rules.get(source).ok_or(TableError::MissingSource {
                mode: self.mode,
                format: *source,
            })?;
            if rule.compatible.is_empty() {
                return Err(TableError::NoTargets { format: *source });
            }
            for target in &rule.compatible {
                if target == source {
                    return Err(TableError::SelfTarget { format: *source });
                }
                if !self.targets.contains(target) {
                    return Err(TableError::UnknownTarget {
                        mode: self.mode,
                        format: *source,
                        target: *target,
                    });
                }
            }
            if !rule.compatible.contains(&rule.default) {
                return Err(TableError::DefaultNotCompatible {
                    format: *source,
                    default: rule.default,
                });
            }
        }
        Ok(())
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn sources(&self) -> &[FormatId] {
        &self.sources
    }

    pub fn targets(&self) -> &[FormatId] {
        &self.targets
    }

    pub fn compatible_targets(&self, source: FormatId) -> &[FormatId] {
        self.rules
            .get(&source)
            .map(|rule| rule.compatible.as_slice())
            .unwrap_or_default()
    }

    pub fn default_target(&self, source: FormatId) -> Option<FormatId> {
        self.rules.get(&source).map(|rule| rule.default)
    }

    /// Targets of the mode that `source` may not convert to.
    pub fn disabled_targets(&self, source: FormatId) -> BTreeSet<FormatId> {
        let compatible = self.compatible_targets(source);
        self.targets
            .iter()
            .copied()
            .filter(|target| !compatible.contains(target))
            .collect()
    }
}

/// Result of a selector transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub previous_source: FormatId,
    pub previous_target: FormatId,
    pub source: FormatId,
    pub target: FormatId,
}

impl Transition {
    pub fn source_changed(&self) -> bool {
        self.previous_source != self.source
    }

    pub fn target_changed(&self) -> bool {
        self.previous_target != self.target
    }
}

#[derive(Debug, Clone)]
pub struct FormatSelector {
    table: CompatibilityTable,
    source: FormatId,
    target: FormatId,
    disabled: BTreeSet<FormatId>,
}

impl FormatSelector {
    pub fn new(mode: Mode) -> Self {
        Self::with_table(CompatibilityTable::for_mode(mode))
    }

    /// Starts on the first source; the target is the first target unless the
    /// source disables it, in which case the source's default applies.
    pub fn with_table(table: CompatibilityTable) -> Self {
        let source = table.sources.first().copied().unwrap_or(FormatId::Text);
        let first_target = table.targets.first().copied().unwrap_or(source);
        let disabled = table.disabled_targets(source);
        let target = if disabled.contains(&first_target) {
            table.default_target(source).unwrap_or(first_target)
        } else {
            first_target
        };
        Self {
            table,
            source,
            target,
            disabled,
        }
    }

    pub fn mode(&self) -> Mode {
        self.table.mode
    }

    pub fn table(&self) -> &CompatibilityTable {
        &self.table
    }

    pub fn source(&self) -> FormatId {
        self.source
    }

    pub fn target(&self) -> FormatId {
        self.target
    }

    pub fn disabled(&self) -> &BTreeSet<FormatId> {
        &self.disabled
    }

    pub fn is_enabled(&self, target: FormatId) -> bool {
        self.table.targets.contains(&target) && !self.disabled.contains(&target)
    }

    pub fn select_source(&mut self, source: FormatId) -> Result<Transition, SelectorError> {
        self.table.mode.ensure_source(source)?;
        let default = self
            .table
            .default_target(source)
            .ok_or(FormatError::NotInMode {
                format: source,
                mode: self.table.mode,
                side: Side::Source,
            })?;

        let previous_source = self.source;
        let previous_target = self.target;
        self.disabled = self.table.disabled_targets(source);
        self.source = source;
        if self.disabled.contains(&self.target) {
            self.target = default;
        }

        Ok(Transition {
            previous_source,
            previous_target,
            source: self.source,
            target: self.target,
        })
    }

    /// Re-selecting the active target is a valid transition; the caller
    /// decides whether that resubmits.
    pub fn select_target(&mut self, target: FormatId) -> Result<Transition, SelectorError> {
        self.table.mode.ensure_target(target)?;
        if self.disabled.contains(&target) {
            return Err(SelectorError::TargetDisabled(target));
        }

        let previous_target = self.target;
        self.target = target;
        Ok(Transition {
            previous_source: self.source,
            previous_target,
            source: self.source,
            target,
        })
    }
}
