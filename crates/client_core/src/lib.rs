//! Client side of the `/exec` conversion contract: format selection, request
//! assembly, transport and the widget controller that sequences them.

pub mod config;
pub mod error;
pub mod presentation;
pub mod request;
pub mod selector;
pub mod transport;
pub mod widget;

pub use config::{load_settings, ClientSettings};
pub use error::{ConvertError, ErrorCategory, TransportError, ValidationError};
pub use request::{AuxiliaryControls, RequestBuilder};
pub use selector::{CompatibilityTable, FormatSelector, SelectorError, Transition};
pub use transport::{HttpTransport, Transport};
pub use widget::{ConverterPage, ConverterWidget, SubmitOutcome, TargetOutcome, WidgetEvent};
