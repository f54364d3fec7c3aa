//! Lifecycle of a single embed attempt.
//!
//! An attempt belongs to one provider. It starts [`EmbedState::Idle`] until a
//! URL is submitted, fetches, and ends up succeeded or failed. When resolution
//! or classification finds a better provider for the URL, the attempt asks to
//! be replaced instead of switching in place.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use smol_str::SmolStr;

use crate::classify::{Classification, EmbedResponse, EmbedResult, classify};
use crate::error::{EmbedError, FetchError};
use crate::fetch::{EmbedCache, EmbedFetcher};
use crate::link::validate_url;
use crate::provider::{Catalog, redispatch_target};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EmbedState {
    /// No URL yet, the placeholder form is showing.
    #[default]
    Idle,
    Fetching {
        url: String,
    },
    Succeeded(EmbedResult),
    Failed(EmbedError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedEvent {
    Submit(String),
    Fetched(EmbedResponse),
    FetchFailed(FetchError),
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// State changed, nothing else to do.
    Continue,
    /// Go fetch metadata for `url`.
    Fetch { url: String },
    /// Discard this attempt and start a fresh one under `identifier`.
    Replace { identifier: SmolStr, url: String },
    /// The event doesn't apply in the current state.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedAttempt {
    identifier: SmolStr,
    state: EmbedState,
}

impl EmbedAttempt {
    pub fn new(identifier: impl Into<SmolStr>) -> Self {
        Self {
            identifier: identifier.into(),
            state: EmbedState::Idle,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn state(&self) -> &EmbedState {
        &self.state
    }

    pub fn transition(&mut self, event: EmbedEvent, catalog: &Catalog) -> Transition {
        match event {
            EmbedEvent::Reset => {
                self.state = EmbedState::Idle;
                Transition::Continue
            }
            EmbedEvent::Submit(url)
                if matches!(self.state, EmbedState::Idle | EmbedState::Failed(_)) =>
            {
                if let Err(err) = validate_url(&url) {
                    self.state = EmbedState::Failed(err);
                    return Transition::Continue;
                }
                let url = url.trim().to_owned();
                if let Some(identifier) = redispatch_target(&url, &self.identifier, catalog) {
                    tracing::debug!(%url, from = %self.identifier, to = %identifier, "handing embed to matching provider");
                    return Transition::Replace { identifier, url };
                }
                self.state = EmbedState::Fetching { url: url.clone() };
                Transition::Fetch { url }
            }
            EmbedEvent::Fetched(response) => {
                let EmbedState::Fetching { url } = &self.state else {
                    return Transition::Ignored;
                };
                let url = url.clone();
                let provider = catalog.get_or_generic(&self.identifier);
                match classify(&response, &url, provider, &self.identifier) {
                    Ok(Classification::Ready(result)) => {
                        self.state = EmbedState::Succeeded(result);
                        Transition::Continue
                    }
                    Ok(Classification::SwitchProvider { identifier }) => {
                        Transition::Replace { identifier, url }
                    }
                    Err(err) => {
                        self.state = EmbedState::Failed(err);
                        Transition::Continue
                    }
                }
            }
            EmbedEvent::FetchFailed(err) if matches!(self.state, EmbedState::Fetching { .. }) => {
                self.state = EmbedState::Failed(err.into());
                Transition::Continue
            }
            EmbedEvent::Submit(_) | EmbedEvent::FetchFailed(_) => Transition::Ignored,
        }
    }
}

/// Set when whatever owns an attempt goes away while a fetch is outstanding.
/// The request itself keeps running; its result is dropped on arrival.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Receives the outcome of an attempt.
pub trait EmbedSink {
    /// The provider that will handle the URL has been settled.
    fn on_resolved(&mut self, identifier: &str);
    fn on_classified(&mut self, result: &EmbedResult);
    fn on_error(&mut self, error: &EmbedError);
}

/// Drives an attempt for `url`, starting under `identifier`, through to
/// success or failure, following provider replacements along the way.
///
/// Returns the last attempt. If `cancel` is set while fetching, the response
/// is discarded, the sink hears nothing more, and the attempt is returned
/// still in [`EmbedState::Fetching`].
pub async fn run_attempt<F, S>(
    catalog: &Catalog,
    cache: &EmbedCache<F>,
    identifier: &str,
    url: &str,
    cancel: &CancellationFlag,
    sink: &mut S,
) -> EmbedAttempt
where
    F: EmbedFetcher,
    S: EmbedSink + ?Sized,
{
    let mut attempt = EmbedAttempt::new(identifier);
    let mut event = EmbedEvent::Submit(url.to_owned());

    loop {
        if cancel.is_cancelled() {
            tracing::debug!(url, "embed attempt cancelled");
            return attempt;
        }

        match attempt.transition(event, catalog) {
            Transition::Fetch { url } => {
                sink.on_resolved(attempt.identifier());
                let response = cache.fetch_embed(&url, attempt.identifier()).await;
                if cancel.is_cancelled() {
                    tracing::debug!(%url, "dropping embed response for cancelled attempt");
                    return attempt;
                }
                event = match response {
                    Ok(response) => EmbedEvent::Fetched(response),
                    Err(err) => EmbedEvent::FetchFailed(err),
                };
            }
            Transition::Replace { identifier, url } => {
                attempt = EmbedAttempt::new(identifier);
                event = EmbedEvent::Submit(url);
            }
            Transition::Continue => {
                match attempt.state() {
                    EmbedState::Succeeded(result) => sink.on_classified(result),
                    EmbedState::Failed(err) => sink.on_error(err),
                    EmbedState::Idle | EmbedState::Fetching { .. } => {}
                }
                return attempt;
            }
            Transition::Ignored => return attempt,
        }
    }
}
