//! Converter widget controller.
//!
//! A [`ConverterWidget`] is the typed state behind one formatter pane pair.
//! Front-ends call its operations and render from its accessors and
//! [`WidgetEvent`] stream; they never hold state of their own.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
};

use shared::{
    format::{FormatId, Mode},
    protocol::ConversionOutcome,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info};

use crate::{
    error::ConvertError,
    presentation::Presentation,
    request::{AuxiliaryControls, RequestBuilder},
    selector::{FormatSelector, SelectorError, Transition},
    transport::Transport,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    SelectionChanged {
        source: FormatId,
        target: FormatId,
        disabled: Vec<FormatId>,
    },
    SourceCleared,
    ResultCleared,
    ResultUpdated(String),
    Alert(ConvertError),
    LoadingChanged(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Converted(String),
    Failed(ConvertError),
    /// A newer submission, or a transition that cleared the result pane,
    /// happened while this one was in flight; its response was dropped.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOutcome {
    Submitted(SubmitOutcome),
    Cleared,
}

struct WidgetState {
    selector: FormatSelector,
    source_text: String,
    result_text: String,
    controls: AuxiliaryControls,
    last_alert: Option<ConvertError>,
}

pub struct ConverterWidget {
    transport: Arc<dyn Transport>,
    state: Mutex<WidgetState>,
    generation: AtomicU64,
    in_flight: AtomicUsize,
    events: broadcast::Sender<WidgetEvent>,
}

/// Keeps the loading indicator up while at least one request is pending.
struct LoadingGuard<'a> {
    widget: &'a ConverterWidget,
}

impl<'a> LoadingGuard<'a> {
    fn enter(widget: &'a ConverterWidget) -> Self {
        if widget.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            let _ = widget.events.send(WidgetEvent::LoadingChanged(true));
        }
        Self { widget }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.widget.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.widget.events.send(WidgetEvent::LoadingChanged(false));
        }
    }
}

impl ConverterWidget {
    pub fn new(mode: Mode, transport: Arc<dyn Transport>) -> Arc<Self> {
        Self::with_selector(FormatSelector::new(mode), transport)
    }

    pub fn with_selector(selector: FormatSelector, transport: Arc<dyn Transport>) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            transport,
            state: Mutex::new(WidgetState {
                selector,
                source_text: String::new(),
                result_text: String::new(),
                controls: AuxiliaryControls::default(),
                last_alert: None,
            }),
            generation: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<WidgetEvent> {
        self.events.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub async fn selector(&self) -> FormatSelector {
        self.state.lock().await.selector.clone()
    }

    pub async fn presentation(&self) -> Presentation {
        Presentation::of(&self.state.lock().await.selector)
    }

    pub async fn source_text(&self) -> String {
        self.state.lock().await.source_text.clone()
    }

    pub async fn result_text(&self) -> String {
        self.state.lock().await.result_text.clone()
    }

    pub async fn controls(&self) -> AuxiliaryControls {
        self.state.lock().await.controls.clone()
    }

    pub async fn last_alert(&self) -> Option<ConvertError> {
        self.state.lock().await.last_alert.clone()
    }

    pub async fn dismiss_alert(&self) {
        self.state.lock().await.last_alert = None;
    }

    pub async fn set_source_text(&self, text: impl Into<String>) {
        self.state.lock().await.source_text = text.into();
    }

    pub async fn set_controls(&self, controls: AuxiliaryControls) {
        self.state.lock().await.controls = controls;
    }

    /// Switches the source format. Both panes are emptied and nothing is
    /// submitted; a response still in flight is dropped when it lands.
    pub async fn select_source(&self, source: FormatId) -> Result<Transition, SelectorError> {
        let mut state = self.state.lock().await;
        let transition = state.selector.select_source(source)?;
        self.invalidate_pending();

        state.source_text.clear();
        state.result_text.clear();
        let _ = self.events.send(WidgetEvent::SourceCleared);
        let _ = self.events.send(WidgetEvent::ResultCleared);
        self.announce_selection(&state.selector);
        info!(
            mode = %state.selector.mode(),
            source = %transition.source,
            target = %transition.target,
            "source format selected"
        );
        Ok(transition)
    }

    /// Switches the target format. The result pane is always cleared and any
    /// pending response dropped; with source text present this then submits
    /// exactly once.
    pub async fn select_target(&self, target: FormatId) -> Result<TargetOutcome, SelectorError> {
        {
            let mut state = self.state.lock().await;
            let transition = state.selector.select_target(target)?;
            self.announce_selection(&state.selector);
            debug!(
                source = %transition.source,
                target = %transition.target,
                "target format selected"
            );

            self.invalidate_pending();
            state.result_text.clear();
            let _ = self.events.send(WidgetEvent::ResultCleared);
            if state.source_text.trim().is_empty() {
                return Ok(TargetOutcome::Cleared);
            }
        }

        Ok(TargetOutcome::Submitted(self.submit().await))
    }

    /// Validates, sends, and applies one conversion. Only the response of
    /// the most recently issued submission reaches the result pane.
    pub async fn submit(&self) -> SubmitOutcome {
        let (request, generation) = {
            let mut state = self.state.lock().await;
            match RequestBuilder::build(&state.selector, &state.source_text, &state.controls) {
                Ok(request) => {
                    let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                    (request, generation)
                }
                Err(err) => {
                    let err = ConvertError::from(err);
                    self.raise_alert(&mut state, err.clone());
                    return SubmitOutcome::Failed(err);
                }
            }
        };

        let response = {
            let _loading = LoadingGuard::enter(self);
            self.transport.submit(&request).await
        };

        let outcome = match response {
            Ok(response) => match response.into_outcome() {
                ConversionOutcome::Converted(result) => Ok(result),
                ConversionOutcome::Rejected(message) => Err(ConvertError::Server(message)),
                ConversionOutcome::Empty => Err(ConvertError::NoResult),
            },
            Err(err) => Err(ConvertError::Transport(err)),
        };

        let mut state = self.state.lock().await;
        let latest = self.generation.load(Ordering::SeqCst);
        if latest != generation {
            debug!(generation, latest, "discarding superseded conversion response");
            return SubmitOutcome::Superseded;
        }

        match outcome {
            Ok(result) => {
                state.result_text = result.clone();
                let _ = self.events.send(WidgetEvent::ResultUpdated(result.clone()));
                SubmitOutcome::Converted(result)
            }
            Err(err) => {
                self.raise_alert(&mut state, err.clone());
                SubmitOutcome::Failed(err)
            }
        }
    }

    fn invalidate_pending(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn announce_selection(&self, selector: &FormatSelector) {
        let _ = self.events.send(WidgetEvent::SelectionChanged {
            source: selector.source(),
            target: selector.target(),
            disabled: selector.disabled().iter().copied().collect(),
        });
    }

    fn raise_alert(&self, state: &mut WidgetState, err: ConvertError) {
        info!(category = ?err.category(), error = %err, "conversion alert");
        state.last_alert = Some(err.clone());
        let _ = self.events.send(WidgetEvent::Alert(err));
    }
}

/// One widget per mode, sharing a transport. Built once per mounted page.
pub struct ConverterPage {
    widgets: HashMap<Mode, Arc<ConverterWidget>>,
}

impl ConverterPage {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let widgets = Mode::ALL
            .into_iter()
            .map(|mode| (mode, ConverterWidget::new(mode, Arc::clone(&transport))))
            .collect();
        Self { widgets }
    }

    pub fn widget(&self, mode: Mode) -> Option<Arc<ConverterWidget>> {
        self.widgets.get(&mode).cloned()
    }
}

#[cfg(test)]
#[path = "tests/widget_tests.rs"]
mod tests;
