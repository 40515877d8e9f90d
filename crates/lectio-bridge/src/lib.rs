//! Bridge protocol between the reader host and the embedded content surface.
//!
//! The raw protocol is untyped script text: commands are injected as
//! single-line invocations on a named object inside the surface, events come
//! back through a registered callback with one string argument per call.
//! This crate abstracts that as typed [`Command`]/[`Event`] unions with an
//! explicit encode/decode boundary; the base64 framing rule lives in
//! [`codec`] and is shared with the annotation store serialization.

pub mod channel;
pub mod codec;
pub mod command;
pub mod event;
pub mod types;

pub use channel::{BridgeChannel, BridgeHandler, ScriptSurface, SurfaceGone};
pub use codec::CodecError;
pub use command::{BRIDGE_OBJECT, COMMAND_METHODS, Command};
pub use event::{EVENT_METHODS, Event};
pub use types::{DisplayOptions, Font, FontSize, HighlightColor, Theme};
