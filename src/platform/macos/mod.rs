//! macOS backend built on CGEventTap and CFRunLoop.

mod listen;
mod simulate;

pub use listen::{SystemPlatform, stop_run_loop};
pub use simulate::SystemKeySink;
