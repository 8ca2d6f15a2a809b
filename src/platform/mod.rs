//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time in milliseconds
//! - Visibility detection
//! - The wasm32 entry point and JS-facing game handle

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Monotonic millisecond clock for native hosts
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    origin: std::time::Instant,
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Clock {
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }

    /// Milliseconds since the clock was created
    pub fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Milliseconds since the Unix epoch, from the browser
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

/// Whether the document is currently hidden
#[cfg(target_arch = "wasm32")]
pub fn is_hidden() -> bool {
    web_sys::window()
        .and_then(|w| w.document())
        .is_some_and(|d| d.visibility_state() == web_sys::VisibilityState::Hidden)
}
