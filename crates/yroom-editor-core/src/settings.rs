//! Room settings embedded in the page.
//!
//! The room page renders a JSON object into a script element (Django's
//! `json_script`), and the bootstrap reads it back before doing anything
//! else. Reading is the only side effect; a missing or malformed payload is
//! fatal to startup and no connection is attempted.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::connection::Scheme;
use crate::error::{ConfigurationError, EditorError};
use crate::platform::Page;
use crate::variant::EditorVariant;

/// Id of the element the room page renders its settings into.
pub const SETTINGS_ELEMENT_ID: &str = "room-settings";

/// Socket path used by pages that still render the old `{roomName}` payload.
pub const LEGACY_WS_PATH: &str = "/ws/prosemirror/";

/// Payload as it appears on the page. Every field is optional here so that
/// the legacy shape and the unified shape go through one parser.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSettings {
    editor: Option<String>,
    #[serde(alias = "room-name")]
    room_name: Option<String>,
    ws_path: Option<String>,
    #[serde(default)]
    secure: bool,
    token: Option<String>,
}

/// Validated, immutable configuration for one page load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSettings {
    /// Editor integration to start.
    pub editor: EditorVariant,
    /// CRDT document / room key. Never empty.
    pub room_name: SmolStr,
    /// Socket path segment, appended verbatim after the host.
    pub ws_path: SmolStr,
    /// Use `wss://` instead of `ws://`.
    pub secure: bool,
    /// Token sent in the Hocuspocus auth handshake.
    pub token: Option<SmolStr>,
}

impl RoomSettings {
    /// Settings with the unencrypted scheme and no auth token.
    pub fn new(
        editor: EditorVariant,
        room_name: impl Into<SmolStr>,
        ws_path: impl Into<SmolStr>,
    ) -> Self {
        Self {
            editor,
            room_name: room_name.into(),
            ws_path: ws_path.into(),
            secure: false,
            token: None,
        }
    }

    /// Parse the JSON text of the settings element.
    pub fn from_json(payload: &str) -> Result<Self, EditorError> {
        let raw: RawSettings =
            serde_json::from_str(payload).map_err(ConfigurationError::Malformed)?;

        let room_name = match raw.room_name {
            Some(name) if !name.is_empty() => SmolStr::new(name),
            _ => return Err(ConfigurationError::MissingRoomName.into()),
        };

        let (editor, ws_path) = match raw.editor {
            Some(editor) => {
                let editor: EditorVariant = editor.parse()?;
                let ws_path = raw
                    .ws_path
                    .map(SmolStr::new)
                    .unwrap_or_else(|| SmolStr::new_static(editor.default_ws_path()));
                (editor, ws_path)
            }
            None => {
                tracing::warn!(
                    room = %room_name,
                    "room settings without `editor` are deprecated, assuming prosemirror"
                );
                let ws_path = raw
                    .ws_path
                    .map(SmolStr::new)
                    .unwrap_or_else(|| SmolStr::new_static(LEGACY_WS_PATH));
                (EditorVariant::ProseMirror, ws_path)
            }
        };

        Ok(Self {
            editor,
            room_name,
            ws_path,
            secure: raw.secure,
            token: raw.token.map(SmolStr::new),
        })
    }

    pub fn scheme(&self) -> Scheme {
        if self.secure { Scheme::Wss } else { Scheme::Ws }
    }
}

/// Read and parse the settings element from the page.
pub fn read_settings(page: &dyn Page, element_id: &str) -> Result<RoomSettings, EditorError> {
    let payload = page
        .text_content(element_id)
        .ok_or_else(|| ConfigurationError::MissingElement(SmolStr::new(element_id)))?;
    let settings = RoomSettings::from_json(&payload)?;
    tracing::debug!(
        editor = %settings.editor,
        room = %settings.room_name,
        ws_path = %settings.ws_path,
        "read room settings"
    );
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_err(result: Result<RoomSettings, EditorError>) -> ConfigurationError {
        match result {
            Err(EditorError::Configuration(e)) => e,
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_unified_shape() {
        let settings = RoomSettings::from_json(
            r#"{"editor": "tiptap", "roomName": "room1", "wsPath": "/ws/collab/"}"#,
        )
        .unwrap();
        assert_eq!(settings.editor, EditorVariant::TipTap);
        assert_eq!(settings.room_name, "room1");
        assert_eq!(settings.ws_path, "/ws/collab/");
        assert_eq!(settings.scheme(), Scheme::Ws);
        assert_eq!(settings.token, None);
    }

    #[test]
    fn test_room_name_alias() {
        let settings =
            RoomSettings::from_json(r#"{"editor": "prosemirror", "room-name": "abc"}"#).unwrap();
        assert_eq!(settings.room_name, "abc");
    }

    #[test]
    fn test_missing_ws_path_defaults_per_editor() {
        let pm = RoomSettings::from_json(r#"{"editor": "prosemirror", "roomName": "a"}"#).unwrap();
        assert_eq!(pm.ws_path, "/ws/prosemirror/");
        let tt = RoomSettings::from_json(r#"{"editor": "tiptap", "roomName": "a"}"#).unwrap();
        assert_eq!(tt.ws_path, "/ws/tiptap/");
    }

    #[test]
    fn test_legacy_shape_is_prosemirror_with_fixed_path() {
        let settings = RoomSettings::from_json(r#"{"roomName": "old"}"#).unwrap();
        assert_eq!(settings.editor, EditorVariant::ProseMirror);
        assert_eq!(settings.ws_path, LEGACY_WS_PATH);
    }

    #[test]
    fn test_secure_and_token() {
        let settings = RoomSettings::from_json(
            r#"{"editor": "tiptap", "roomName": "a", "secure": true, "token": "t0k"}"#,
        )
        .unwrap();
        assert_eq!(settings.scheme(), Scheme::Wss);
        assert_eq!(settings.token.as_deref(), Some("t0k"));
    }

    #[test]
    fn test_malformed_json() {
        let err = config_err(RoomSettings::from_json("{not json"));
        assert!(matches!(err, ConfigurationError::Malformed(_)));
    }

    #[test]
    fn test_non_object_payload_is_malformed() {
        let err = config_err(RoomSettings::from_json("[1, 2]"));
        assert!(matches!(err, ConfigurationError::Malformed(_)));
    }

    #[test]
    fn test_empty_room_name_rejected() {
        let err = config_err(RoomSettings::from_json(
            r#"{"editor": "tiptap", "roomName": ""}"#,
        ));
        assert!(matches!(err, ConfigurationError::MissingRoomName));
        let err = config_err(RoomSettings::from_json(r#"{"editor": "tiptap"}"#));
        assert!(matches!(err, ConfigurationError::MissingRoomName));
    }

    #[test]
    fn test_unknown_editor_is_not_a_configuration_error() {
        let result = RoomSettings::from_json(r#"{"editor": "unknown", "roomName": "a"}"#);
        assert!(matches!(result, Err(EditorError::UnsupportedVariant(_))));
    }

    #[test]
    fn test_serialized_form() {
        let settings = RoomSettings::new(EditorVariant::ProseMirror, "room1", "/ws/collab/");
        insta::assert_snapshot!(
            serde_json::to_string(&settings).unwrap(),
            @r#"{"editor":"prosemirror","roomName":"room1","wsPath":"/ws/collab/","secure":false,"token":null}"#
        );
    }
}
