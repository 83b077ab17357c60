//! macOS key injection using CGEvent.

#![allow(unused_unsafe)]

use crate::error::{Error, Result};
use crate::event::KeyCode;
use crate::hook::INJECT_LOCATION;
use crate::interceptor::KeySink;
use objc2_core_graphics::CGEvent;

use super::listen::tap_location;

/// Posts key-down events from the default event source at [`INJECT_LOCATION`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemKeySink;

impl KeySink for SystemKeySink {
    fn post_key_down(&self, keycode: KeyCode) -> Result<()> {
        unsafe {
            let event = CGEvent::new_keyboard_event(None, keycode, true)
                .ok_or_else(|| Error::InjectFailed("Failed to create keyboard event".into()))?;
            CGEvent::post(tap_location(INJECT_LOCATION), Some(&event));
        }
        Ok(())
    }
}
