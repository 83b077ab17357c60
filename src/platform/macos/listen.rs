//! macOS modifier tap using CGEventTap.

#![allow(improper_ctypes_definitions)]
#![allow(unsafe_op_in_unsafe_fn)]
#![allow(unused_unsafe)]

use crate::error::{Error, Result};
use crate::event::{DisableReason, Event, KeyCode};
use crate::flags::FlagMask;
use crate::hook::{Platform, StopLatch, TapLocation, TapOptions, TapPlacement};
use crate::interceptor::TapHandler;
use core::ptr::NonNull;
use objc2_core_foundation::{
    CFMachPort, CFRetained, CFRunLoop, CFRunLoopSource, kCFRunLoopCommonModes,
    kCFRunLoopDefaultMode,
};
use objc2_core_graphics::{
    CGEvent, CGEventField, CGEventSource, CGEventSourceStateID, CGEventTapCallBack,
    CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement, CGEventTapProxy, CGEventType,
};
use objc2_foundation::NSAutoreleasePool;
use std::ffi::c_void;
use std::ptr::null_mut;
use std::sync::Mutex;

use super::simulate::SystemKeySink;

/// Handler of the installed tap. Owned by the live [`MacTap`].
static HANDLER: Mutex<Option<Box<dyn TapHandler>>> = Mutex::new(None);

/// Wrapper for raw pointer to CFMachPort that implements Send + Sync
/// Safety: The pointer is only accessed from the callback which runs on the same thread
struct TapPointer(*const CFMachPort);
unsafe impl Send for TapPointer {}
unsafe impl Sync for TapPointer {}

/// Stored event tap for timeout recovery
static EVENT_TAP: Mutex<Option<TapPointer>> = Mutex::new(None);

/// Set by [`stop_run_loop`], checked between run loop slices.
static STOP: StopLatch = StopLatch::new();

/// Longest the run loop blocks before rechecking [`STOP`], in seconds.
const RUN_SLICE: f64 = 0.5;

#[link(name = "Cocoa", kind = "framework")]
unsafe extern "C" {}

pub(super) fn tap_location(location: TapLocation) -> CGEventTapLocation {
    match location {
        TapLocation::Hid => CGEventTapLocation::HIDEventTap,
        TapLocation::Session => CGEventTapLocation::SessionEventTap,
        TapLocation::AnnotatedSession => CGEventTapLocation::AnnotatedSessionEventTap,
    }
}

fn tap_placement(placement: TapPlacement) -> CGEventTapPlacement {
    match placement {
        TapPlacement::HeadInsert => CGEventTapPlacement::HeadInsertEventTap,
        TapPlacement::TailAppend => CGEventTapPlacement::TailAppendEventTap,
    }
}

fn dispatch(event: &Event) -> bool {
    if let Ok(guard) = HANDLER.lock()
        && let Some(ref handler) = *guard
    {
        return handler.handle_event(event).is_some();
    }
    true
}

/// The CGEventTap callback
unsafe extern "C-unwind" fn event_callback(
    _proxy: CGEventTapProxy,
    event_type: CGEventType,
    cg_event: NonNull<CGEvent>,
    _user_info: *mut c_void,
) -> *mut CGEvent {
    // macOS disables the tap if the callback is slow or on secure input
    if event_type == CGEventType::TapDisabledByTimeout
        || event_type == CGEventType::TapDisabledByUserInput
    {
        let reason = if event_type == CGEventType::TapDisabledByTimeout {
            DisableReason::Timeout
        } else {
            DisableReason::UserInput
        };
        if let Ok(guard) = EVENT_TAP.lock()
            && let Some(ref tap_ptr) = *guard
        {
            log::warn!("Event tap was disabled ({:?}), re-enabling...", reason);
            if !tap_ptr.0.is_null() {
                CGEvent::tap_enable(&*tap_ptr.0, true);
            }
        }
        dispatch(&Event::tap_disabled(reason));
        return cg_event.as_ptr();
    }

    let Some(event) = convert_event(event_type, cg_event) else {
        return cg_event.as_ptr();
    };

    if dispatch(&event) {
        cg_event.as_ptr()
    } else {
        null_mut()
    }
}

/// Convert a CGEvent to our Event type
unsafe fn convert_event(event_type: CGEventType, cg_event: NonNull<CGEvent>) -> Option<Event> {
    let keycode = || unsafe {
        CGEvent::integer_value_field(Some(cg_event.as_ref()), CGEventField::KeyboardEventKeycode)
            as KeyCode
    };

    match event_type {
        CGEventType::KeyDown => Some(Event::key_down(keycode())),
        CGEventType::KeyUp => Some(Event::key_up(keycode())),
        CGEventType::FlagsChanged => {
            let flags = CGEvent::flags(Some(cg_event.as_ref()));
            Some(Event::flags_changed(keycode(), FlagMask::from_bits(flags.0)))
        }
        _ => None,
    }
}

/// An installed CGEventTap and its run loop source.
///
/// Dropping it disables the tap, invalidates the mach port and releases the
/// registered handler.
pub struct MacTap {
    port: CFRetained<CFMachPort>,
    source: CFRetained<CFRunLoopSource>,
}

/// Disable and invalidate a tap port so no further events are delivered.
fn release_port(port: &CFMachPort) {
    unsafe {
        CGEvent::tap_enable(port, false);
    }
    port.invalidate();
}

impl Drop for MacTap {
    fn drop(&mut self) {
        self.source.invalidate();
        release_port(&self.port);

        if let Ok(mut t) = EVENT_TAP.lock() {
            *t = None;
        }
        if let Ok(mut h) = HANDLER.lock() {
            *h = None;
        }
        log::debug!("event tap released");
    }
}

/// The native macOS platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPlatform;

impl Platform for SystemPlatform {
    type Sink = SystemKeySink;
    type Tap = MacTap;

    fn flags_state(&self) -> FlagMask {
        let flags =
            unsafe { CGEventSource::flags_state(CGEventSourceStateID::CombinedSessionState) };
        FlagMask::from_bits(flags.0)
    }

    fn key_sink(&self) -> Self::Sink {
        SystemKeySink::default()
    }

    fn create_tap(&self, options: TapOptions, handler: Box<dyn TapHandler>) -> Result<MacTap> {
        let mut slot = HANDLER
            .lock()
            .map_err(|_| Error::ThreadError("mutex poisoned".into()))?;
        if slot.is_some() {
            return Err(Error::AlreadyRunning);
        }

        unsafe {
            let callback: CGEventTapCallBack = Some(event_callback);
            let port = CGEvent::tap_create(
                tap_location(options.location),
                tap_placement(options.placement),
                CGEventTapOptions::Default,
                options.mask.bits(),
                callback,
                null_mut(),
            )
            .ok_or_else(|| {
                Error::RegistrationDenied(
                    "the system refused the tap. Run as root or grant Accessibility permission."
                        .into(),
                )
            })?;

            let Some(source) = CFMachPort::new_run_loop_source(None, Some(&port), 0) else {
                release_port(&port);
                return Err(Error::RunLoop("Failed to create run loop source".into()));
            };

            {
                let mut tap_guard = EVENT_TAP
                    .lock()
                    .map_err(|_| Error::ThreadError("mutex poisoned".into()))?;
                *tap_guard = Some(TapPointer(&*port as *const CFMachPort));
            }
            *slot = Some(handler);

            Ok(MacTap { port, source })
        }
    }

    fn run_loop(&self, tap: &MacTap) -> Result<()> {
        unsafe {
            let _pool = NSAutoreleasePool::new();

            let current_loop = CFRunLoop::current()
                .ok_or_else(|| Error::RunLoop("Failed to get current run loop".into()))?;

            current_loop.add_source(Some(&tap.source), kCFRunLoopCommonModes);

            // Enable the tap
            CGEvent::tap_enable(&tap.port, true);
            log::info!("listening for modifier flag changes");

            while !STOP.is_requested() {
                CFRunLoop::run_in_mode(kCFRunLoopDefaultMode, RUN_SLICE, false);
            }

            current_loop.remove_source(Some(&tap.source), kCFRunLoopCommonModes);
        }
        Ok(())
    }
}

/// Stop the run loop started by [`Platform::run_loop`].
///
/// The request is latched, so calling this before the loop starts makes it
/// return right away.
pub fn stop_run_loop() -> Result<()> {
    STOP.request();
    if let Some(run_loop) = CFRunLoop::main() {
        run_loop.stop();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventMask;

    #[test]
    fn test_release_port_invalidates_tap() {
        let tap = unsafe {
            CGEvent::tap_create(
                CGEventTapLocation::SessionEventTap,
                CGEventTapPlacement::TailAppendEventTap,
                CGEventTapOptions::ListenOnly,
                EventMask::FLAGS_CHANGED.bits(),
                Some(event_callback),
                null_mut(),
            )
        };
        // Tap creation needs Accessibility permission on the test host.
        let Some(port) = tap else {
            return;
        };

        assert!(port.is_valid());
        release_port(&port);
        assert!(!port.is_valid());
    }
}
