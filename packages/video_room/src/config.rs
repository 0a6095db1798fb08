use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

// =============================================================================
// Unified config (figment-deserialized from defaults / config.toml / env vars)
// =============================================================================
//
// Three equivalent ways to configure:
//
//   config.toml:     [server]
//                    port = 8080
//
//   env var:         VIDEO_ROOM_SERVER__PORT=8080   (double underscore = nesting)
//
//   CLI flag:        --port 8080                    (wins over both)

/// Top-level configuration, deserialized by figment.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RoomConfig {
    #[serde(default)]
    pub server: ServerFileConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub peer: PeerServerConfig,
}

/// Listener settings (lives under `[server]` in config.toml).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerFileConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerFileConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerFileConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

/// Capture constraints handed to the browser's `getUserMedia` (`[media]`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_true")]
    pub video: bool,
    #[serde(default = "default_true")]
    pub audio: bool,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            video: true,
            audio: true,
        }
    }
}

/// PeerJS server the browser client registers with (`[peer]`).
/// Unset fields fall back to the PeerJS cloud defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_true() -> bool {
    true
}

/// Build a figment that layers: defaults → config.toml → VIDEO_ROOM_* env vars.
///
/// Env vars use double-underscore for nesting into sections:
///   `VIDEO_ROOM_SERVER__HOST=0.0.0.0`  →  `server.host = "0.0.0.0"`
///   `VIDEO_ROOM_MEDIA__AUDIO=false`    →  `media.audio = false`
pub fn load_config(config_file: Option<&Path>) -> figment::Figment {
    use figment::{
        Figment,
        providers::{Env, Format, Serialized, Toml},
    };

    let mut figment = Figment::from(Serialized::defaults(RoomConfig::default()));
    if let Some(path) = config_file {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(Env::prefixed("VIDEO_ROOM_").split("__"))
}

impl RoomConfig {
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        load_config(config_file)
            .extract()
            .context("Failed to load configuration")
    }
}
