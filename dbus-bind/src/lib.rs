//! Runtime support for D-Bus interface bindings.
//!
//! This crate carries everything generated bindings need at run time:
//! validated string types, the D-Bus type model with its signature grammar,
//! argument marshalling between Rust values and message bodies, an in-memory
//! message handle, and the connection capabilities (send, blocking wait,
//! pending-call registration, match-rule delivery) that a transport has to
//! provide. The transport itself - sockets, authentication, wire framing,
//! fd passing - is not part of this crate.
//!
//! Server-side dispatch lives in the companion crate `dbus-dispatch`, and the
//! code generator producing bindings against both crates is `dbus-bindgen`.

#![warn(missing_docs)]

extern crate libc;

pub mod strings;
pub use crate::strings::{BusName, ErrorName, Interface, InvalidStringError, Member, Path, Signature};

pub mod types;

pub mod arg;

pub mod message;
pub use crate::message::{Message, MessageType};
pub use crate::message::{MatchRule, SignalArgs};

mod error;
pub use crate::error::{Error, MethodErr};

pub mod channel;

pub mod blocking;

pub mod stdintf;
