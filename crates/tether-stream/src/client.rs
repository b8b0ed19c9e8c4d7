//! Streaming chat client.
//!
//! Sends a prompt to the session message endpoint and assembles the
//! SSE-framed response, filling an assistant placeholder entry in place
//! as fragments arrive so the timeline shows the response growing.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, warn};

use tether_core::{CredentialProvider, SessionId};
use tether_events::ChatEntry;
use tether_session::SharedView;

use crate::error::StreamError;
use crate::lines::{LineBuffer, SseLine, parse_line};

/// Assembles streaming responses into the shared session view.
pub struct StreamingClient {
    http: reqwest::Client,
    api_url: String,
    credentials: Arc<dyn CredentialProvider>,
    view: SharedView,
}

impl StreamingClient {
    /// Create a client against `api_url` (e.g. `http://localhost:8000`).
    #[must_use]
    pub fn new(
        api_url: impl Into<String>,
        credentials: Arc<dyn CredentialProvider>,
        view: SharedView,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            credentials,
            view,
        }
    }

    /// Send `message` and stream the response.
    ///
    /// Appends the user entry and an empty assistant placeholder before
    /// the request goes out, then grows the placeholder in place as
    /// fragments arrive. Every fragment is also handed to `on_chunk`
    /// verbatim. Returns the fully assembled response text.
    ///
    /// `data: [DONE]` ends the stream; end-of-body without the sentinel
    /// is also clean completion, flushing any unterminated trailing line.
    /// A 401 fires the credential provider's unauthorized hook before
    /// returning [`StreamError::Unauthorized`].
    pub async fn send_streaming<F>(
        &self,
        session_id: &SessionId,
        message: &str,
        mut on_chunk: F,
    ) -> Result<String, StreamError>
    where
        F: FnMut(&str),
    {
        let token = self
            .credentials
            .bearer_token()
            .ok_or(StreamError::MissingCredentials)?;

        let placeholder = {
            let mut view = self.view.lock();
            let _ = view.push_chat(ChatEntry::local_user(message));
            view.push_chat(ChatEntry::streaming_placeholder())
        };

        let base = self.api_url.trim_end_matches('/');
        let url = format!("{base}/api/claude/sessions/{session_id}/message");
        debug!(session = %session_id, "starting response stream");

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&serde_json::json!({ "message": message, "stream": true }))
            .send()
            .await
            .map_err(StreamError::Request)?;

        let status = response.status();
        if status.as_u16() == 401 {
            warn!("stream request unauthorized");
            self.credentials.on_unauthorized();
            return Err(StreamError::Unauthorized);
        }
        if !status.is_success() {
            return Err(StreamError::Http {
                status: status.as_u16(),
            });
        }
        if !is_event_stream(&response) {
            return Err(StreamError::Unsupported);
        }

        let mut body = response.bytes_stream();
        let mut buffer = LineBuffer::new();
        let mut assembled = String::new();

        loop {
            match body.next().await {
                Some(Ok(chunk)) => {
                    for line in buffer.push(&chunk) {
                        match parse_line(&line) {
                            SseLine::Fragment(text) => {
                                self.apply_fragment(&placeholder, &text, &mut assembled);
                                on_chunk(&text);
                            }
                            SseLine::Done => {
                                debug!(len = assembled.len(), "stream complete");
                                return Ok(assembled);
                            }
                            SseLine::Ignored => {}
                        }
                    }
                }
                Some(Err(e)) => {
                    warn!(error = %e, "stream read failed");
                    return Err(StreamError::Read(e));
                }
                None => {
                    // End of body without a sentinel: still a clean
                    // completion, but the last line may be unterminated.
                    if let Some(rest) = buffer.take_remaining() {
                        if let SseLine::Fragment(text) = parse_line(&rest) {
                            self.apply_fragment(&placeholder, &text, &mut assembled);
                            on_chunk(&text);
                        }
                    }
                    debug!(len = assembled.len(), "stream ended without sentinel");
                    return Ok(assembled);
                }
            }
        }
    }

    fn apply_fragment(
        &self,
        placeholder: &tether_core::EntryId,
        text: &str,
        assembled: &mut String,
    ) {
        assembled.push_str(text);
        if !self.view.lock().append_to_entry(placeholder, text) {
            warn!("streaming placeholder entry is gone");
        }
    }
}

fn is_event_stream(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/event-stream"))
}
