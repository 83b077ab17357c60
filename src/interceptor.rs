//! The modifier-change interceptor.
//!
//! Every flags-changed event is diffed against the reference snapshot taken at
//! startup, logged, and followed by one synthetic key-down of a fixed key.
//!
//! The reference snapshot is never refreshed, so the reported diff is
//! cumulative since startup rather than event-to-event.

use crate::error::Result;
use crate::event::{Event, EventKind, KeyCode};
use crate::flags::FlagMask;

/// Destination for injected key events.
pub trait KeySink: Send + Sync {
    /// Post a key-down event for `keycode` into the system-wide input stream.
    fn post_key_down(&self, keycode: KeyCode) -> Result<()>;
}

/// Implement KeySink for closures.
impl<F> KeySink for F
where
    F: Fn(KeyCode) -> Result<()> + Send + Sync,
{
    fn post_key_down(&self, keycode: KeyCode) -> Result<()> {
        self(keycode)
    }
}

/// Handler invoked by the tap for every delivered event.
///
/// Return `None` to consume the event, `Some(event)` to pass it through.
pub trait TapHandler: Send + Sync {
    fn handle_event(&self, event: &Event) -> Option<Event>;
}

/// Implement TapHandler for closures.
impl<F> TapHandler for F
where
    F: Fn(&Event) -> Option<Event> + Send + Sync,
{
    fn handle_event(&self, event: &Event) -> Option<Event> {
        self(event)
    }
}

/// Diagnostic record for one flags-changed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagChange {
    /// The reference snapshot.
    pub previous: FlagMask,
    /// Flags carried by the event.
    pub new: FlagMask,
    /// `previous ^ new`.
    pub diff: FlagMask,
}

/// Injects `keycode` on every modifier change.
pub struct ModifierInterceptor<S> {
    reference: FlagMask,
    keycode: KeyCode,
    sink: S,
}

impl<S: KeySink> ModifierInterceptor<S> {
    pub fn new(reference: FlagMask, keycode: KeyCode, sink: S) -> Self {
        Self {
            reference,
            keycode,
            sink,
        }
    }

    /// The snapshot all diffs are computed against.
    pub fn reference(&self) -> FlagMask {
        self.reference
    }

    pub fn keycode(&self) -> KeyCode {
        self.keycode
    }

    /// Diff, log and inject for one flags-changed notification.
    ///
    /// Injection happens regardless of the diff, including an empty one.
    /// An injection failure is logged and swallowed.
    pub fn on_modifier_change(&self, new: FlagMask) -> FlagChange {
        let change = FlagChange {
            previous: self.reference,
            new,
            diff: self.reference.diff(new),
        };

        log::info!(
            "Got flags changed event. Old flags {}, new {}, changed {}.",
            change.previous,
            change.new,
            change.diff
        );
        log::info!(
            " {:x} [{}]",
            new.bits() as u32,
            change.diff.modifiers().names().join("|")
        );

        if let Err(e) = self.sink.post_key_down(self.keycode) {
            log::warn!("key {} not injected: {}", self.keycode, e);
        }

        change
    }
}

impl<S: KeySink> TapHandler for ModifierInterceptor<S> {
    fn handle_event(&self, event: &Event) -> Option<Event> {
        if let EventKind::FlagsChanged { flags, .. } = event.kind {
            self.on_modifier_change(flags);
        }
        Some(event.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::event::{DisableReason, KEYCODE_EQUAL};
    use crate::flags::{MASK_CAPS_LOCK, MASK_SHIFT};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingSink {
        posted: Arc<Mutex<Vec<KeyCode>>>,
    }

    impl RecordingSink {
        fn posted(&self) -> Vec<KeyCode> {
            self.posted.lock().unwrap().clone()
        }
    }

    impl KeySink for RecordingSink {
        fn post_key_down(&self, keycode: KeyCode) -> Result<()> {
            self.posted.lock().unwrap().push(keycode);
            Ok(())
        }
    }

    fn interceptor(reference: u64) -> (ModifierInterceptor<RecordingSink>, RecordingSink) {
        let sink = RecordingSink::default();
        (
            ModifierInterceptor::new(FlagMask::from_bits(reference), KEYCODE_EQUAL, sink.clone()),
            sink,
        )
    }

    #[test]
    fn test_diff_against_reference() {
        let (interceptor, _) = interceptor(0x100);
        let change = interceptor.on_modifier_change(FlagMask::from_bits(0x10100));

        assert_eq!(change.previous.bits(), 0x100);
        assert_eq!(change.new.bits(), 0x10100);
        assert_eq!(change.diff.bits(), 0x10000);
    }

    #[test]
    fn test_injects_once_per_change() {
        let (interceptor, sink) = interceptor(0x100);

        interceptor.on_modifier_change(FlagMask::from_bits(0x100 | MASK_SHIFT));
        interceptor.on_modifier_change(FlagMask::from_bits(0x100));
        interceptor.on_modifier_change(FlagMask::from_bits(0x100 | MASK_CAPS_LOCK));

        assert_eq!(sink.posted(), vec![KEYCODE_EQUAL; 3]);
    }

    #[test]
    fn test_injects_when_diff_is_empty() {
        let (interceptor, sink) = interceptor(0x100);
        let change = interceptor.on_modifier_change(FlagMask::from_bits(0x100));

        assert!(change.diff.is_empty());
        assert_eq!(sink.posted(), vec![KEYCODE_EQUAL]);
    }

    #[test]
    fn test_reference_is_not_updated() {
        let (interceptor, _) = interceptor(0x100);

        let first = interceptor.on_modifier_change(FlagMask::from_bits(0x100 | MASK_SHIFT));
        let second = interceptor.on_modifier_change(FlagMask::from_bits(0x100 | MASK_SHIFT));

        assert_eq!(first.previous, second.previous);
        assert_eq!(second.diff.bits(), MASK_SHIFT);
        assert_eq!(interceptor.reference().bits(), 0x100);
    }

    #[test]
    fn test_passes_event_through_unchanged() {
        let (interceptor, sink) = interceptor(0x100);
        let event = Event::flags_changed(56, FlagMask::from_bits(0x100 | MASK_SHIFT));

        assert_eq!(interceptor.handle_event(&event), Some(event.clone()));
        assert_eq!(sink.posted().len(), 1);
    }

    #[test]
    fn test_other_events_do_not_inject() {
        let (interceptor, sink) = interceptor(0x100);
        let events = [
            Event::key_down(KEYCODE_EQUAL),
            Event::key_up(KEYCODE_EQUAL),
            Event::tap_disabled(DisableReason::Timeout),
        ];

        for event in &events {
            assert_eq!(interceptor.handle_event(event).as_ref(), Some(event));
        }
        assert!(sink.posted().is_empty());
    }

    #[test]
    fn test_sink_failure_does_not_propagate() {
        let interceptor = ModifierInterceptor::new(
            FlagMask::EMPTY,
            KEYCODE_EQUAL,
            |_: KeyCode| -> Result<()> { Err(Error::InjectFailed("no event source".into())) },
        );
        let event = Event::flags_changed(57, FlagMask::from_bits(MASK_CAPS_LOCK));

        assert_eq!(interceptor.handle_event(&event), Some(event.clone()));
    }

    #[test]
    fn test_custom_keycode() {
        let sink = RecordingSink::default();
        let interceptor = ModifierInterceptor::new(FlagMask::EMPTY, 3, sink.clone());
        interceptor.on_modifier_change(FlagMask::from_bits(MASK_SHIFT));

        assert_eq!(interceptor.keycode(), 3);
        assert_eq!(sink.posted(), vec![3]);
    }
}
