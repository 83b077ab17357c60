//! Session lifecycle: snapshot, tap registration and the blocking run loop.

use crate::error::Result;
use crate::event::{EventMask, KEYCODE_EQUAL, KeyCode};
use crate::flags::FlagMask;
use crate::interceptor::{KeySink, ModifierInterceptor, TapHandler};
use std::sync::atomic::{AtomicBool, Ordering};

/// Where in the event stream the tap is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TapLocation {
    /// Where HID system events enter the window server.
    Hid,
    /// Where HID and remote control events enter a login session.
    #[default]
    Session,
    /// Where session events are delivered to applications.
    AnnotatedSession,
}

/// Location synthetic key events are posted at.
pub const INJECT_LOCATION: TapLocation = TapLocation::Hid;

/// Position of the tap relative to other taps at the same location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TapPlacement {
    #[default]
    HeadInsert,
    TailAppend,
}

/// Tap configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Key code injected on every modifier change.
    pub keycode: KeyCode,
    pub location: TapLocation,
    pub placement: TapPlacement,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keycode: KEYCODE_EQUAL,
            location: TapLocation::default(),
            placement: TapPlacement::default(),
        }
    }
}

impl Config {
    pub fn with_keycode(mut self, keycode: KeyCode) -> Self {
        self.keycode = keycode;
        self
    }

    pub fn with_location(mut self, location: TapLocation) -> Self {
        self.location = location;
        self
    }

    pub fn with_placement(mut self, placement: TapPlacement) -> Self {
        self.placement = placement;
        self
    }
}

/// Parameters passed to [`Platform::create_tap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapOptions {
    pub location: TapLocation,
    pub placement: TapPlacement,
    pub mask: EventMask,
}

/// The operating-system services a session needs.
pub trait Platform {
    /// Injection sink handed to the interceptor.
    type Sink: KeySink + 'static;
    /// Installed tap. Dropping it tears the tap down.
    type Tap;

    /// Current combined-session modifier flags.
    fn flags_state(&self) -> FlagMask;

    fn key_sink(&self) -> Self::Sink;

    /// Install an event tap that dispatches to `handler`.
    ///
    /// Fails with [`Error::RegistrationDenied`](crate::Error::RegistrationDenied)
    /// when the platform refuses the tap.
    fn create_tap(&self, options: TapOptions, handler: Box<dyn TapHandler>) -> Result<Self::Tap>;

    /// Attach the tap to the current run loop, enable it and block until the
    /// loop is stopped.
    fn run_loop(&self, tap: &Self::Tap) -> Result<()>;
}

/// A stop request that stays set once made.
///
/// A request issued before the run loop starts blocking is still seen by it.
#[derive(Debug, Default)]
pub struct StopLatch(AtomicBool);

impl StopLatch {
    pub const fn new() -> Self {
        StopLatch(AtomicBool::new(false))
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// An installed modifier tap, ready to run.
pub struct Session<P: Platform> {
    platform: P,
    tap: P::Tap,
    reference: FlagMask,
}

impl<P: Platform> Session<P> {
    /// Capture the reference snapshot and register the flags-changed tap.
    pub fn initialize(platform: P, config: Config) -> Result<Self> {
        let reference = platform.flags_state();
        log::debug!("reference modifier flags {}", reference);

        let interceptor = ModifierInterceptor::new(reference, config.keycode, platform.key_sink());
        let options = TapOptions {
            location: config.location,
            placement: config.placement,
            mask: EventMask::FLAGS_CHANGED,
        };
        let tap = platform.create_tap(options, Box::new(interceptor))?;

        Ok(Self {
            platform,
            tap,
            reference,
        })
    }

    /// The snapshot captured by [`Session::initialize`].
    pub fn reference(&self) -> FlagMask {
        self.reference
    }

    /// Block on the run loop. The tap is released when this returns.
    pub fn run(self) -> Result<()> {
        log::debug!("entering run loop");
        let result = self.platform.run_loop(&self.tap);
        log::debug!("run loop exited");
        result
    }
}

/// Initialize and run a session, returning the process exit status.
pub fn launch<P: Platform>(platform: P, config: Config) -> i32 {
    let session = match Session::initialize(platform, config) {
        Ok(session) => session,
        Err(e) => {
            log::error!("{}", e);
            return e.exit_code();
        }
    };

    match session.run() {
        Ok(()) => 0,
        Err(e) => {
            log::error!("{}", e);
            e.exit_code()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.keycode, 24);
        assert_eq!(config.location, TapLocation::Session);
        assert_eq!(config.placement, TapPlacement::HeadInsert);
    }

    #[test]
    fn test_keys_are_injected_at_hid_level() {
        assert_eq!(INJECT_LOCATION, TapLocation::Hid);
        assert_ne!(INJECT_LOCATION, Config::default().location);
    }

    #[test]
    fn test_stop_latch_stays_set() {
        let latch = StopLatch::new();
        assert!(!latch.is_requested());

        latch.request();
        assert!(latch.is_requested());
        latch.request();
        assert!(latch.is_requested());
    }

    #[test]
    fn test_config_builder() {
        let config = Config::default()
            .with_keycode(3)
            .with_location(TapLocation::Hid)
            .with_placement(TapPlacement::TailAppend);
        assert_eq!(config.keycode, 3);
        assert_eq!(config.location, TapLocation::Hid);
        assert_eq!(config.placement, TapPlacement::TailAppend);
    }
}
