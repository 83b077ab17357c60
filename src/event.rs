//! Event types delivered by the tap.

use crate::flags::FlagMask;
use std::time::SystemTime;

/// Raw platform virtual key code.
pub type KeyCode = u16;

/// Virtual key code of the `=`/`+` key on ANSI layouts.
pub const KEYCODE_EQUAL: KeyCode = 24;

/// Why the platform turned the tap off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisableReason {
    /// The callback took too long to return.
    Timeout,
    /// The user disabled the tap (secure input, login window, ...).
    UserInput,
}

/// The category-specific payload of an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A key was pressed down.
    KeyDown { keycode: KeyCode },
    /// A key was released.
    KeyUp { keycode: KeyCode },
    /// A modifier key changed state. `flags` is the full mask after the change.
    FlagsChanged { keycode: KeyCode, flags: FlagMask },
    /// The tap was disabled by the platform.
    TapDisabled(DisableReason),
}

impl EventKind {
    /// The subscription category this event belongs to, if any.
    pub fn category(&self) -> Option<EventCategory> {
        match self {
            EventKind::KeyDown { .. } => Some(EventCategory::KeyDown),
            EventKind::KeyUp { .. } => Some(EventCategory::KeyUp),
            EventKind::FlagsChanged { .. } => Some(EventCategory::FlagsChanged),
            EventKind::TapDisabled(_) => None,
        }
    }
}

/// An input event seen by the tap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// When the event was observed.
    pub time: SystemTime,
    pub kind: EventKind,
}

impl Event {
    /// Create a new event stamped with the current time.
    pub fn new(kind: EventKind) -> Self {
        Self {
            time: SystemTime::now(),
            kind,
        }
    }

    pub fn key_down(keycode: KeyCode) -> Self {
        Self::new(EventKind::KeyDown { keycode })
    }

    pub fn key_up(keycode: KeyCode) -> Self {
        Self::new(EventKind::KeyUp { keycode })
    }

    pub fn flags_changed(keycode: KeyCode, flags: FlagMask) -> Self {
        Self::new(EventKind::FlagsChanged { keycode, flags })
    }

    pub fn tap_disabled(reason: DisableReason) -> Self {
        Self::new(EventKind::TapDisabled(reason))
    }
}

/// Event categories a tap can subscribe to.
///
/// Discriminants are the CoreGraphics event type numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum EventCategory {
    KeyDown = 10,
    KeyUp = 11,
    FlagsChanged = 12,
}

/// Set of subscribed event categories, one bit per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EventMask(u64);

impl EventMask {
    /// Only modifier flag changes.
    pub const FLAGS_CHANGED: EventMask = EventMask::of(EventCategory::FlagsChanged);

    /// Mask with a single category.
    pub const fn of(category: EventCategory) -> Self {
        EventMask(1 << category as u32)
    }

    /// Add a category to the mask.
    pub const fn with(self, category: EventCategory) -> Self {
        EventMask(self.0 | Self::of(category).0)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn contains(self, category: EventCategory) -> bool {
        self.0 & Self::of(category).0 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_changed_mask_bit() {
        assert_eq!(EventMask::FLAGS_CHANGED.bits(), 1 << 12);
        assert!(EventMask::FLAGS_CHANGED.contains(EventCategory::FlagsChanged));
        assert!(!EventMask::FLAGS_CHANGED.contains(EventCategory::KeyDown));
        assert!(!EventMask::FLAGS_CHANGED.contains(EventCategory::KeyUp));
    }

    #[test]
    fn test_mask_with_key_events() {
        let mask = EventMask::of(EventCategory::KeyDown).with(EventCategory::KeyUp);
        assert_eq!(mask.bits(), (1 << 10) | (1 << 11));
        assert!(!mask.contains(EventCategory::FlagsChanged));
    }

    #[test]
    fn test_event_category() {
        assert_eq!(
            Event::flags_changed(56, FlagMask::from_bits(0x20100))
                .kind
                .category(),
            Some(EventCategory::FlagsChanged)
        );
        assert_eq!(
            Event::key_down(KEYCODE_EQUAL).kind.category(),
            Some(EventCategory::KeyDown)
        );
        assert_eq!(Event::key_up(0).kind.category(), Some(EventCategory::KeyUp));
        assert_eq!(
            Event::tap_disabled(DisableReason::Timeout).kind.category(),
            None
        );
    }
}
