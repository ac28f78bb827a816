//! Editor integration variants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::connection::WireProtocol;
use crate::error::EditorError;

/// Which editor integration a room page asks for.
///
/// Dispatch on this is always an exhaustive `match`; an unrecognized value
/// never reaches it because parsing fails with
/// [`EditorError::UnsupportedVariant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorVariant {
    /// ProseMirror view with y-websocket sync, cursor and undo plugins.
    ProseMirror,
    /// TipTap editor with Hocuspocus collaboration extensions.
    TipTap,
}

impl EditorVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProseMirror => "prosemirror",
            Self::TipTap => "tiptap",
        }
    }

    /// Path the room server routes this editor's sockets under.
    pub fn default_ws_path(&self) -> &'static str {
        match self {
            Self::ProseMirror => "/ws/prosemirror/",
            Self::TipTap => "/ws/tiptap/",
        }
    }

    /// The collaboration protocol each integration speaks.
    ///
    /// The two are not wire compatible; a room server has to be set up for
    /// the one its pages use.
    pub fn protocol(&self) -> WireProtocol {
        match self {
            Self::ProseMirror => WireProtocol::YWebsocket,
            Self::TipTap => WireProtocol::Hocuspocus,
        }
    }
}

impl fmt::Display for EditorVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditorVariant {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prosemirror" => Ok(Self::ProseMirror),
            "tiptap" => Ok(Self::TipTap),
            other => Err(EditorError::UnsupportedVariant(SmolStr::new(other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_variants() {
        assert_eq!(
            "prosemirror".parse::<EditorVariant>().unwrap(),
            EditorVariant::ProseMirror
        );
        assert_eq!("tiptap".parse::<EditorVariant>().unwrap(), EditorVariant::TipTap);
    }

    #[test]
    fn test_parse_unknown_variant_fails_loudly() {
        match "unknown".parse::<EditorVariant>() {
            Err(EditorError::UnsupportedVariant(v)) => assert_eq!(v, "unknown"),
            other => panic!("expected UnsupportedVariant, got {other:?}"),
        }
    }

    #[test]
    fn test_variant_names_are_case_sensitive() {
        assert!("ProseMirror".parse::<EditorVariant>().is_err());
    }

    #[test]
    fn test_display_roundtrips_through_from_str() {
        for v in [EditorVariant::ProseMirror, EditorVariant::TipTap] {
            assert_eq!(v.to_string().parse::<EditorVariant>().unwrap(), v);
        }
    }
}
