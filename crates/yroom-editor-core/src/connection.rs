//! Connection URL derivation.
//!
//! The socket URL is a pure function of the page host, the configured path
//! and the room name. Nothing is validated here; malformed inputs come out
//! as malformed URLs.

use std::fmt;

use smol_str::SmolStr;

use crate::settings::RoomSettings;

/// WebSocket URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    #[default]
    Ws,
    Wss,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Ws => "ws",
            Scheme::Wss => "wss",
        }
    }
}

/// Collaboration protocol spoken over the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireProtocol {
    /// y-protocols sync/awareness, one room per socket URL.
    YWebsocket,
    /// Hocuspocus framing. The room is in the URL and is also sent as the
    /// document name prefixing every message.
    Hocuspocus,
}

/// Fully derived connection endpoint for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub url: String,
    pub room: SmolStr,
    pub protocol: WireProtocol,
}

impl ConnectionTarget {
    /// Derive the target for a room page served from `host`.
    pub fn for_settings(host: &str, settings: &RoomSettings) -> Self {
        let protocol = settings.editor.protocol();
        Self {
            url: build_url(
                settings.scheme(),
                host,
                &settings.ws_path,
                &settings.room_name,
            ),
            room: settings.room_name.clone(),
            protocol,
        }
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (room {})", self.url, self.room)
    }
}

/// Concatenate scheme, host, path and room name.
pub fn build_url(scheme: Scheme, host: &str, ws_path: &str, room: &str) -> String {
    let mut url = String::with_capacity(
        scheme.as_str().len() + 3 + host.len() + ws_path.len() + room.len(),
    );
    url.push_str(scheme.as_str());
    url.push_str("://");
    url.push_str(host);
    url.push_str(ws_path);
    url.push_str(room);
    url
}
