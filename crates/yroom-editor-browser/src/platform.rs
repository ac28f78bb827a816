//! Platform detection for key bindings.

use std::sync::OnceLock;

/// Cached platform detection results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Platform {
    pub ios: bool,
    pub mac: bool,
    pub android: bool,
    pub mobile: bool,
}

impl Platform {
    /// Classify from lowercased navigator strings.
    pub fn classify(user_agent: &str, platform: &str, touch_points: i32) -> Self {
        // iPadOS reports a Mac platform; touch support gives it away
        let ios = user_agent.contains("iphone")
            || user_agent.contains("ipad")
            || user_agent.contains("ipod")
            || (platform.contains("mac") && touch_points > 0);
        let mac = platform.contains("mac") && !ios;
        let android = user_agent.contains("android");
        let mobile = ios || android || user_agent.contains("mobile");

        Self {
            ios,
            mac,
            android,
            mobile,
        }
    }

    /// Whether `Mod` bindings resolve to Cmd. True on iOS hardware keyboards too.
    pub fn uses_cmd(&self) -> bool {
        self.mac || self.ios
    }
}

static PLATFORM: OnceLock<Platform> = OnceLock::new();

/// Get cached platform info. Detection runs once on first call.
pub fn platform() -> &'static Platform {
    PLATFORM.get_or_init(detect_platform)
}

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
fn detect_platform() -> Platform {
    let Some(window) = web_sys::window() else {
        return Platform::default();
    };

    let navigator = window.navigator();
    let user_agent = navigator.user_agent().unwrap_or_default().to_lowercase();
    let platform_str = navigator.platform().unwrap_or_default().to_lowercase();

    Platform::classify(&user_agent, &platform_str, navigator.max_touch_points())
}

#[cfg(not(all(target_arch = "wasm32", target_os = "unknown")))]
fn detect_platform() -> Platform {
    Platform::default()
}
