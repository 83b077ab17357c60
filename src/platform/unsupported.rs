//! Fallback for platforms without a modifier-flags event tap.

use crate::error::{Error, Result};
use crate::event::KeyCode;
use crate::flags::FlagMask;
use crate::hook::{Platform, TapOptions};
use crate::interceptor::{KeySink, TapHandler};

const REASON: &str = "modifier flag event taps are only available on macOS";

/// Native platform handle. Every operation reports [`Error::NotSupported`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPlatform;

/// Injection sink that always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemKeySink;

impl KeySink for SystemKeySink {
    fn post_key_down(&self, _keycode: KeyCode) -> Result<()> {
        Err(Error::NotSupported(REASON.into()))
    }
}

impl Platform for SystemPlatform {
    type Sink = SystemKeySink;
    type Tap = ();

    fn flags_state(&self) -> FlagMask {
        FlagMask::EMPTY
    }

    fn key_sink(&self) -> Self::Sink {
        SystemKeySink
    }

    fn create_tap(&self, _options: TapOptions, _handler: Box<dyn TapHandler>) -> Result<()> {
        Err(Error::NotSupported(REASON.into()))
    }

    fn run_loop(&self, _tap: &()) -> Result<()> {
        Err(Error::NotSupported(REASON.into()))
    }
}

/// Stop the run loop started by [`Platform::run_loop`].
pub fn stop_run_loop() -> Result<()> {
    Err(Error::NotSupported(REASON.into()))
}
