use thiserror::Error;

use crate::format::{FormatId, Mode, Side};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("unknown format tag '{0}'")]
    UnknownTag(String),
    #[error("unknown conversion mode '{0}'")]
    UnknownMode(String),
    #[error("radix {0} is outside the supported range 2..=16")]
    RadixOutOfRange(u8),
    #[error("'{format}' is not a {side} format in {mode} mode")]
    NotInMode {
        format: FormatId,
        mode: Mode,
        side: Side,
    },
}
