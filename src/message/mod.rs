//! Wire-level IRC messages.
//!
//! A message is an optional source prefix, a command (an alphabetic
//! word or a 3-digit numeric), and up to fifteen parameters of which
//! only the last may contain spaces.

mod borrowed;
mod parse;
mod serialize;
mod types;

pub use self::borrowed::MessageRef;
pub use self::types::{Message, MessageTarget, TargetMaskKind};

/// Maximum number of parameters a message may carry (RFC 2812).
pub const MAX_PARAMS: usize = 15;
