//! # flagtap
//!
//! A session-wide modifier-flags event tap that injects a fixed key press on
//! every modifier change.
//!
//! On macOS, key-down/key-up taps stop receiving events while a secure input
//! field (such as a system password prompt) has focus. Flags-changed taps keep
//! firing, and events injected from them still reach the focused field. This
//! crate reproduces that behaviour: each time a modifier key changes state it
//! logs the previous, new and changed flag masks and posts a key-down of the
//! `=` key.
//!
//! ## Quick Start
//!
//! ```no_run
//! use flagtap::{Config, SystemPlatform, launch};
//!
//! let status = launch(SystemPlatform, Config::default());
//! std::process::exit(status);
//! ```
//!
//! ## Architecture
//!
//! [`Session::initialize`] reads the combined-session modifier flags once and
//! registers a tap for the flags-changed category only. [`Session::run`]
//! blocks on the platform run loop, which calls the [`ModifierInterceptor`]
//! synchronously for every event. The OS services sit behind the [`Platform`]
//! trait so the lifecycle can be driven by a fake in tests.
//!
//! The reference snapshot is never refreshed: the diff reported for each event
//! is cumulative since startup, not relative to the previous event.

pub mod error;
pub mod event;
pub mod flags;
pub mod hook;
pub mod interceptor;

mod platform;

// Re-exports
pub use error::{Error, Result};
pub use event::{
    DisableReason, Event, EventCategory, EventKind, EventMask, KEYCODE_EQUAL, KeyCode,
};
pub use flags::FlagMask;
pub use hook::{
    Config, INJECT_LOCATION, Platform, Session, StopLatch, TapLocation, TapOptions, TapPlacement,
    launch,
};
pub use interceptor::{FlagChange, KeySink, ModifierInterceptor, TapHandler};

pub use platform::{SystemKeySink, SystemPlatform, stop_run_loop};
