//! Streaming error taxonomy.

/// Errors from the streaming assembler.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// No bearer token was available before the request was made.
    #[error("no credentials available")]
    MissingCredentials,

    /// The server rejected the bearer token. The credential provider's
    /// unauthorized hook has already fired when this is returned.
    #[error("unauthorized")]
    Unauthorized,

    /// Non-success status other than 401.
    #[error("server returned status {status}")]
    Http {
        /// HTTP status code.
        status: u16,
    },

    /// The response is not an event stream.
    #[error("response is not an event stream")]
    Unsupported,

    /// The request could not be sent at all.
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The body stream failed mid-read.
    #[error("stream read failed: {0}")]
    Read(#[source] reqwest::Error),
}
