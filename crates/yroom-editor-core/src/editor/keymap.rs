//! Key bindings.
//!
//! Bindings are written the way prosemirror-keymap writes them: modifier
//! names joined with `-` in front of the key, with `Mod` standing for the
//! platform's primary modifier.

use std::collections::HashMap;

use smol_str::{SmolStr, ToSmolStr};

use crate::error::EditorError;

/// Key values for keyboard input.
///
/// Platform code converts native key events to this; only the keys editor
/// bindings care about get their own variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable character key.
    Character(SmolStr),
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    Undo,
    Redo,
    /// Anything else, including bare modifier presses.
    Other(SmolStr),
}

impl Key {
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }

    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Backspace" => Self::Backspace,
            "Delete" => Self::Delete,
            "Enter" => Self::Enter,
            "Tab" => Self::Tab,
            "Escape" | "Esc" => Self::Escape,
            "ArrowLeft" | "Left" => Self::ArrowLeft,
            "ArrowRight" | "Right" => Self::ArrowRight,
            "ArrowUp" | "Up" => Self::ArrowUp,
            "ArrowDown" | "Down" => Self::ArrowDown,
            "Home" => Self::Home,
            "End" => Self::End,
            "Undo" => Self::Undo,
            "Redo" => Self::Redo,
            " " | "Space" => Self::Character(SmolStr::new_static(" ")),
            s if s.chars().count() == 1 => Self::Character(s.to_smolstr()),
            s => Self::Other(s.to_smolstr()),
        }
    }

    /// Shift changes the reported character (`Z` for `z`); bindings are
    /// matched on the lowercase form.
    fn normalized(&self) -> Self {
        match self {
            Self::Character(c) => Self::Character(c.to_lowercase().to_smolstr()),
            other => other.clone(),
        }
    }
}

/// Modifier key state for a key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const META: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: true,
    };

    /// Primary modifier for the platform (Cmd on Mac, Ctrl elsewhere).
    pub fn primary(is_mac: bool) -> Self {
        if is_mac {
            Self::META
        } else {
            Self::CTRL
        }
    }
}

/// A key combination for triggering a command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn primary(key: Key, is_mac: bool) -> Self {
        Self {
            key,
            modifiers: Modifiers::primary(is_mac),
        }
    }

    /// Parse a binding such as `Mod-Shift-z` or `Ctrl-Alt-Enter`.
    pub fn parse(binding: &str, is_mac: bool) -> Result<Self, EditorError> {
        let mut parts: Vec<&str> = binding.split('-').collect();
        // `Mod--` binds the minus key
        if binding.ends_with("--") {
            parts.truncate(parts.len() - 2);
            parts.push("-");
        }
        let Some((key, mods)) = parts.split_last() else {
            return Err(invalid_binding(binding));
        };
        if key.is_empty() {
            return Err(invalid_binding(binding));
        }

        let mut modifiers = Modifiers::NONE;
        for m in mods {
            match *m {
                "Mod" => {
                    if is_mac {
                        modifiers.meta = true;
                    } else {
                        modifiers.ctrl = true;
                    }
                }
                "Ctrl" | "Control" | "c" => modifiers.ctrl = true,
                "Cmd" | "Meta" | "m" => modifiers.meta = true,
                "Alt" | "a" => modifiers.alt = true,
                "Shift" | "s" => modifiers.shift = true,
                _ => return Err(invalid_binding(binding)),
            }
        }

        Ok(Self::with_modifiers(Key::from_name(key), modifiers))
    }

    fn normalized(&self) -> Self {
        Self {
            key: self.key.normalized(),
            modifiers: self.modifiers,
        }
    }
}

fn invalid_binding(binding: &str) -> EditorError {
    EditorError::InvalidSetup(smol_str::format_smolstr!("invalid key binding `{binding}`"))
}

/// Commands a binding can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Undo,
    Redo,
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, PartialEq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Event was not a keybinding, let the platform handle it.
    NotHandled,
}

/// Key combination to command lookup.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: HashMap<KeyCombo, Command>,
}

impl Keymap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Undo on `Mod-z`, redo on `Mod-y` and `Mod-Shift-z`.
    pub fn history(is_mac: bool) -> Self {
        let mut keymap = Self::new();
        for (binding, command) in [
            ("Mod-z", Command::Undo),
            ("Mod-y", Command::Redo),
            ("Mod-Shift-z", Command::Redo),
        ] {
            if let Ok(combo) = KeyCombo::parse(binding, is_mac) {
                keymap.bind(combo, command);
            }
        }
        keymap.bind(KeyCombo::new(Key::Undo), Command::Undo);
        keymap.bind(KeyCombo::new(Key::Redo), Command::Redo);
        keymap
    }

    pub fn bind(&mut self, combo: KeyCombo, command: Command) {
        self.bindings.insert(combo.normalized(), command);
    }

    pub fn lookup(&self, combo: &KeyCombo) -> Option<Command> {
        self.bindings.get(&combo.normalized()).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mod_resolves_per_platform() {
        let mac = KeyCombo::parse("Mod-z", true).unwrap();
        let other = KeyCombo::parse("Mod-z", false).unwrap();
        assert_eq!(mac.modifiers, Modifiers::META);
        assert_eq!(other.modifiers, Modifiers::CTRL);
        assert_eq!(mac.key, Key::character("z"));
    }

    #[test]
    fn test_shifted_character_matches_lowercase_binding() {
        let keymap = Keymap::history(false);
        let pressed = KeyCombo::with_modifiers(
            Key::character("Z"),
            Modifiers {
                ctrl: true,
                shift: true,
                ..Default::default()
            },
        );
        assert_eq!(keymap.lookup(&pressed), Some(Command::Redo));
    }

    #[test]
    fn test_history_bindings() {
        let keymap = Keymap::history(true);
        assert_eq!(
            keymap.lookup(&KeyCombo::primary(Key::character("z"), true)),
            Some(Command::Undo)
        );
        assert_eq!(
            keymap.lookup(&KeyCombo::primary(Key::character("y"), true)),
            Some(Command::Redo)
        );
        // Ctrl-z is not undo on a Mac
        assert_eq!(
            keymap.lookup(&KeyCombo::primary(Key::character("z"), false)),
            None
        );
    }

    #[test]
    fn test_minus_key_binding() {
        let combo = KeyCombo::parse("Mod--", false).unwrap();
        assert_eq!(combo.key, Key::character("-"));
        assert!(combo.modifiers.ctrl);
    }

    #[test]
    fn test_unknown_modifier_rejected() {
        assert!(matches!(
            KeyCombo::parse("Hyper-z", false),
            Err(EditorError::InvalidSetup(_))
        ));
    }

    #[test]
    fn test_named_keys() {
        assert_eq!(Key::from_name("Enter"), Key::Enter);
        assert_eq!(Key::from_name("a"), Key::character("a"));
        assert_eq!(Key::from_name("F5"), Key::Other("F5".into()));
    }
}
