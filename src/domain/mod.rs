//! Domain layer containing streaming logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `lifecycle` - Session state machine and close reasons
//! - `cursor` - Byte-offset line assembly over upstream console text
//! - `messages` - Log lines, status events, and the ordered message type

pub mod cursor;
pub mod foundation;
pub mod lifecycle;
pub mod messages;
