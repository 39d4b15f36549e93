//! Typed views over decoded response fields.

mod flags;

pub use flags::{Flag, Flags};
