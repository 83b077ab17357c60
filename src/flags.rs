//! Modifier flag bitmask.
//!
//! Bit values follow the CoreGraphics `CGEventFlags` encoding so a mask read
//! from the platform can be wrapped without translation.

use std::fmt;
use std::ops::BitXor;

/// Caps Lock (alpha shift) mask.
pub const MASK_CAPS_LOCK: u64 = 0x0001_0000;
/// Shift key mask.
pub const MASK_SHIFT: u64 = 0x0002_0000;
/// Control key mask.
pub const MASK_CONTROL: u64 = 0x0004_0000;
/// Option/Alt key mask.
pub const MASK_OPTION: u64 = 0x0008_0000;
/// Command key mask.
pub const MASK_COMMAND: u64 = 0x0010_0000;
/// Key on the numeric pad.
pub const MASK_NUMERIC_PAD: u64 = 0x0020_0000;
/// Help key mask.
pub const MASK_HELP: u64 = 0x0040_0000;
/// Fn key mask.
pub const MASK_SECONDARY_FN: u64 = 0x0080_0000;
/// Set on events that were not coalesced by the window server.
pub const MASK_NON_COALESCED: u64 = 0x0000_0100;

/// The modifier keys an operator can hold.
pub const MASK_ALL_MODIFIERS: u64 =
    MASK_CAPS_LOCK | MASK_SHIFT | MASK_CONTROL | MASK_OPTION | MASK_COMMAND | MASK_SECONDARY_FN;

const NAMES: [(u64, &str); 8] = [
    (MASK_CAPS_LOCK, "CAPSLOCK"),
    (MASK_SHIFT, "SHIFT"),
    (MASK_CONTROL, "CTRL"),
    (MASK_OPTION, "OPTION"),
    (MASK_COMMAND, "COMMAND"),
    (MASK_NUMERIC_PAD, "NUMPAD"),
    (MASK_HELP, "HELP"),
    (MASK_SECONDARY_FN, "FN"),
];

/// Snapshot of the modifier keys held at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FlagMask(u64);

impl FlagMask {
    /// No modifiers held.
    pub const EMPTY: FlagMask = FlagMask(0);

    /// Wrap raw platform flag bits.
    pub const fn from_bits(bits: u64) -> Self {
        FlagMask(bits)
    }

    /// Raw flag bits.
    #[inline]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Bits set in exactly one of `self` and `other`.
    #[inline]
    pub const fn diff(self, other: FlagMask) -> FlagMask {
        FlagMask(self.0 ^ other.0)
    }

    /// Check whether every bit of `mask` is set.
    #[inline]
    pub const fn contains(self, mask: u64) -> bool {
        self.0 & mask == mask
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Only the modifier key bits, dropping device and coalescing bits.
    pub const fn modifiers(self) -> FlagMask {
        FlagMask(self.0 & MASK_ALL_MODIFIERS)
    }

    /// Names of the modifier keys present in this mask, lowest bit first.
    pub fn names(self) -> Vec<&'static str> {
        NAMES
            .iter()
            .filter(|(mask, _)| self.contains(*mask))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl From<u64> for FlagMask {
    fn from(bits: u64) -> Self {
        FlagMask(bits)
    }
}

impl From<FlagMask> for u64 {
    fn from(mask: FlagMask) -> Self {
        mask.0
    }
}

impl BitXor for FlagMask {
    type Output = FlagMask;

    fn bitxor(self, rhs: FlagMask) -> FlagMask {
        self.diff(rhs)
    }
}

impl fmt::LowerHex for FlagMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl fmt::UpperHex for FlagMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

impl fmt::Display for FlagMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}
