//! Client configuration: TOML file, defaults, and endpoint derivation.

use crate::error::ChatError;
use crate::wire::parse_room_id;
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

pub const DEFAULT_CHAT_URL: &str = "ws://xf.localhost/rust-chat";
pub const DEFAULT_RECONNECT_DELAY_SECS: u64 = 3;
pub const DEFAULT_FOLLOW_TICK_MS: u64 = 250;

/// Settings read from the config file, each overridable from the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Socket endpoint as configured. Its host and scheme are rewritten
    /// against `site_url` before dialing, so one config works across
    /// mirrors of the same forum.
    pub chat_url: String,
    /// Forum base URL. When set, its host wins and its scheme picks
    /// `ws` / `wss`. A `#<id>` fragment selects the initial room.
    pub site_url: Option<String>,
    /// Room joined right after connecting. Overridden by a fragment on
    /// `site_url` and by `--room`.
    pub room: Option<u32>,
    /// Delay before the single reconnect attempt after any closure.
    pub reconnect_delay_secs: u64,
    /// Interval of the tick that re-pins the viewport while following.
    pub follow_tick_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chat_url: DEFAULT_CHAT_URL.to_string(),
            site_url: None,
            room: None,
            reconnect_delay_secs: DEFAULT_RECONNECT_DELAY_SECS,
            follow_tick_ms: DEFAULT_FOLLOW_TICK_MS,
        }
    }
}

impl Config {
    /// Read a config file. The file must exist and parse.
    pub fn load(path: &Path) -> Result<Self, ChatError> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Resolve the socket endpoint to dial: the configured chat URL with
    /// host, port and scheme rewritten to match the site URL.
    pub fn endpoint(&self) -> Result<String, ChatError> {
        derive_endpoint(&self.chat_url, self.site_url.as_deref())
    }

    /// The room to join on connect. A numeric fragment on the site URL
    /// takes precedence over the `room` field, mirroring how the chat page
    /// reads its own address.
    pub fn initial_room(&self) -> Option<u32> {
        self.site_url
            .as_deref()
            .and_then(room_from_fragment)
            .or(self.room)
    }
}

/// Rewrite `chat_url` so its host/port/scheme match `site_url` (https ⇒
/// wss, anything else ⇒ ws). With no site URL the chat URL is used as-is.
pub fn derive_endpoint(chat_url: &str, site_url: Option<&str>) -> Result<String, ChatError> {
    let endpoint_err = |url: &str, detail: &str| ChatError::Endpoint {
        url: url.to_string(),
        detail: detail.to_string(),
    };

    let mut ws = Url::parse(chat_url).map_err(|e| endpoint_err(chat_url, &e.to_string()))?;

    if let Some(site) = site_url {
        let site = Url::parse(site).map_err(|e| endpoint_err(site, &e.to_string()))?;
        let scheme = match site.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        ws.set_scheme(scheme)
            .map_err(|()| endpoint_err(chat_url, "scheme rejected"))?;
        let host = site
            .host_str()
            .ok_or_else(|| endpoint_err(site.as_str(), "site URL has no host"))?;
        ws.set_host(Some(host))
            .map_err(|e| endpoint_err(chat_url, &e.to_string()))?;
        ws.set_port(site.port())
            .map_err(|()| endpoint_err(chat_url, "port rejected"))?;
    }

    Ok(ws.to_string())
}

/// Pull the initial room id out of a URL fragment (`…#3` ⇒ room 3).
pub fn room_from_fragment(url: &str) -> Option<u32> {
    let parsed = Url::parse(url).ok()?;
    parse_room_id(parsed.fragment()?)
}
