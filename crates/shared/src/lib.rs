//! Wire contract between the conversion front-ends and the `/exec` service.

pub mod error;
pub mod format;
pub mod protocol;
