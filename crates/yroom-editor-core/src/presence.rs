//! Presence identity shown next to a participant's cursor.

use rand::Rng;
use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, format_smolstr};

/// Fixed palette presence colours are drawn from.
pub const PRESENCE_COLORS: [&str; 8] = [
    "#ff0000", "#00ff00", "#0000ff", "#ffff00", "#00ffff", "#ff00ff", "#000000", "#ffffff",
];

/// Display identity for the collaboration cursor.
///
/// Generated per session, never persisted, and not checked for collisions
/// with other participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPresence {
    pub name: SmolStr,
    pub color: SmolStr,
}

impl UserPresence {
    pub fn new(name: impl Into<SmolStr>, color: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }

    /// Random identity using the thread-local rng.
    pub fn random() -> Self {
        Self::random_with(&mut rand::rng())
    }

    /// Random identity from the supplied rng.
    pub fn random_with<R: Rng>(rng: &mut R) -> Self {
        let name = format_smolstr!("User {}", rng.random::<f64>());
        let color = PRESENCE_COLORS[rng.random_range(0..PRESENCE_COLORS.len())];
        Self {
            name,
            color: SmolStr::new_static(color),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_presence_uses_palette() {
        for _ in 0..64 {
            let presence = UserPresence::random();
            assert!(PRESENCE_COLORS.contains(&presence.color.as_str()));
            assert!(presence.name.starts_with("User "));
        }
    }

    #[test]
    fn test_presence_serializes_as_awareness_user() {
        let presence = UserPresence::new("Ada", "#ff00ff");
        let value = serde_json::to_value(&presence).unwrap();
        assert_eq!(value, serde_json::json!({"name": "Ada", "color": "#ff00ff"}));
    }
}
