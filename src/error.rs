//! Crate-level error type.

use thiserror::Error;

/// Errors surfaced by the chat client and the attachment helper.
///
/// Socket closures and dial failures are absent on purpose: they are part of
/// the normal connection lifecycle and feed the reconnect loop instead of
/// propagating as errors. The same goes for bad room ids, which are logged
/// and dropped before any network call.
#[derive(Debug, Error)]
pub enum ChatError {
    /// HTTP request failure from the attachment endpoints.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote replied with a non-2xx status code.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Reading a local file (config, attachment) failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file exists but is not valid TOML.
    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// A URL could not be parsed or rewritten into a socket endpoint.
    #[error("invalid endpoint '{url}': {detail}")]
    Endpoint { url: String, detail: String },
}
