//! Summarize screen state.


use futures_util::StreamExt;
use tokio::sync::{Mutex, MutexGuard, watch};

use crate::error::{GenerationFailure, RequestInFlight};
use crate::model_client::ModelClient;

const PROMPT_PREFIX: &str = "Summarize the following text for me: ";
const EMPTY_RESPONSE: &str = "the model returned an empty response";

/// The status of a summarization.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SummarizeUiState {
    /// Nothing has been requested yet.
    #[default]
    Initial,
    /// A request is in flight and nothing has been received yet.
    Loading,
    /// The summary, or the part of it received so far when streaming.
    Success(String),
    /// The request failed, with a human-readable reason.
    Error(String),
}

impl SummarizeUiState {
    /// Returns whether a request is still waiting for its first result.
    #[inline]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Tracks the status of summarization requests.
///
/// Every transition replaces the whole status, which is published through
/// a watch channel. Only one request can be in flight at a time.
pub struct SummarizeViewModel {
    client: ModelClient,
    in_flight: Mutex<()>,
    ui_state: watch::Sender<SummarizeUiState>,
}

impl SummarizeViewModel {
    /// Creates a view model in the [`Initial`](SummarizeUiState::Initial)
    /// state.
    pub fn new(client: ModelClient) -> Self {
        let (ui_state, _) = watch::channel(SummarizeUiState::default());
        Self {
            client,
            in_flight: Mutex::new(()),
            ui_state,
        }
    }

    /// Subscribes to the status.
    #[inline]
    pub fn ui_state(&self) -> watch::Receiver<SummarizeUiState> {
        self.ui_state.subscribe()
    }

    /// Returns the current status.
    #[inline]
    pub fn status(&self) -> SummarizeUiState {
        self.ui_state.borrow().clone()
    }

    /// Summarizes `input` and publishes the result once it's complete.
    ///
    /// # Errors
    ///
    /// Returns [`RequestInFlight`] without touching the status if another
    /// summarization is still running.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. Dropping the future aborts the request
    /// and sets an error status.
    pub async fn summarize(&self, input: &str) -> Result<(), RequestInFlight> {
        let mut request = self.begin()?;
        let status = match self.client.generate(prompt(input)).await {
            Ok(summary) if summary.is_empty() => {
                debug!("got an empty summary");
                SummarizeUiState::Error(EMPTY_RESPONSE.to_owned())
            }
            Ok(summary) => SummarizeUiState::Success(summary),
            Err(failure) => SummarizeUiState::Error(failure.to_string()),
        };
        request.finish(status);
        Ok(())
    }

    /// Summarizes `input`, publishing the summary received so far every
    /// time a new fragment arrives.
    ///
    /// A failure in the middle of the stream replaces the partial summary
    /// with an error status.
    ///
    /// # Errors
    ///
    /// Returns [`RequestInFlight`] without touching the status if another
    /// summarization is still running.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. Dropping the future aborts the request
    /// and sets an error status.
    pub async fn summarize_streaming(
        &self,
        input: &str,
    ) -> Result<(), RequestInFlight> {
        let mut request = self.begin()?;
        let mut fragments = self.client.generate_incremental(prompt(input));
        let mut summary = String::new();
        while let Some(fragment) = fragments.next().await {
            match fragment {
                Ok(fragment) => {
                    summary.push_str(&fragment);
                    request.update(SummarizeUiState::Success(summary.clone()));
                }
                Err(failure) => {
                    let status = SummarizeUiState::Error(failure.to_string());
                    request.finish(status);
                    return Ok(());
                }
            }
        }

        if summary.is_empty() {
            debug!("got an empty summary");
            request.finish(SummarizeUiState::Error(EMPTY_RESPONSE.to_owned()));
        } else {
            trace!("received {} bytes of summary", summary.len());
            request.finish(SummarizeUiState::Success(summary));
        }
        Ok(())
    }

    fn begin(&self) -> Result<InFlightRequest<'_>, RequestInFlight> {
        let Ok(guard) = self.in_flight.try_lock() else {
            warn!("a summarization is still running, rejecting the new one");
            return Err(RequestInFlight);
        };
        self.ui_state.send_replace(SummarizeUiState::Loading);
        Ok(InFlightRequest {
            ui_state: &self.ui_state,
            finished: false,
            _guard: guard,
        })
    }
}

#[inline]
fn prompt(input: &str) -> String {
    format!("{PROMPT_PREFIX}{input}")
}

/// Publishes status changes for the running request.
///
/// If it's dropped before the request finishes, the request has been
/// cancelled.
struct InFlightRequest<'a> {
    ui_state: &'a watch::Sender<SummarizeUiState>,
    finished: bool,
    _guard: MutexGuard<'a, ()>,
}

impl InFlightRequest<'_> {
    #[inline]
    fn update(&self, status: SummarizeUiState) {
        self.ui_state.send_replace(status);
    }

    fn finish(&mut self, status: SummarizeUiState) {
        self.finished = true;
        self.ui_state.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
    }
}

impl Drop for InFlightRequest<'_> {
    fn drop(&mut self) {
        if !self.finished {
            debug!("summarization was cancelled");
            self.update(SummarizeUiState::Error(
                GenerationFailure::cancelled().to_string(),
            ));
        }
    }
}
