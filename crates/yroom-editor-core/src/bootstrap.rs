//! Page-load entry: settings, then target, then exactly one session.

use crate::error::EditorError;
use crate::platform::{Connector, Page};
use crate::session::{
    CollaborativeEditorSession, EditorSession, ProseMirrorSession, SessionConfig, SessionEnv,
    TipTapSession,
};
use crate::settings::{RoomSettings, read_settings};
use crate::variant::EditorVariant;

/// Open the session `settings` selects.
pub fn open_session(
    settings: &RoomSettings,
    page: &dyn Page,
    connector: &dyn Connector,
) -> Result<EditorSession, EditorError> {
    let config = SessionConfig::from_settings(&page.host(), settings);
    let env = SessionEnv { page, connector };
    tracing::debug!(editor = %settings.editor, target = %config.target, "opening session");

    match settings.editor {
        EditorVariant::ProseMirror => {
            ProseMirrorSession::open(config, env).map(EditorSession::ProseMirror)
        }
        EditorVariant::TipTap => TipTapSession::open(config, env).map(EditorSession::TipTap),
    }
}

/// Read the settings element and open its session.
///
/// Nothing is mounted or connected unless the settings parse and name a
/// known editor.
pub fn start(
    page: &dyn Page,
    connector: &dyn Connector,
    settings_element: &str,
) -> Result<EditorSession, EditorError> {
    let settings = read_settings(page, settings_element)?;
    open_session(&settings, page, connector)
}
