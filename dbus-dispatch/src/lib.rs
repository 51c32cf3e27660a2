//! Framework for writing D-Bus method handlers.
//!
//! An `ObjectServer` maps object paths to user data and registered
//! interfaces; `handle_message` routes an incoming method call through
//! argument validation into the right handler and writes the reply, applying
//! one error policy throughout:
//!
//! * messages that do not decode against the declared signature answer
//!   `org.freedesktop.DBus.Error.InvalidArgs` before any handler runs;
//! * unknown paths and members answer `UnknownMethod`, unknown interfaces
//!   `UnknownInterface`, unknown properties `UnknownProperty`;
//! * a handler's `MethodErr` travels back verbatim, and generic host errors
//!   convert to `org.freedesktop.DBus.Error.Failed` with their message text.
//!
//! Handlers either return their output arguments directly, or - for methods
//! registered as deferred - receive a `ReplyHandle` that can produce the
//! reply later. The handle is consumed by replying, so each call gets at
//! most one reply.
//!
//! The standard `org.freedesktop.DBus.Properties` and
//! `org.freedesktop.DBus.Introspectable` interfaces are served on every
//! registered path.

#![warn(missing_docs)]

mod context;
mod ifacedesc;
mod object_server;
mod stdimpl;

#[cfg(test)]
mod test;

pub use dbus_bind::MethodErr;

pub use crate::context::{Context, PropContext, ReplyHandle};
pub use crate::ifacedesc::{Access, Argument, IfaceBuilder, IfaceInfo, MethodCallback,
    MethodInfo, PropBuilder, PropInfo, SignalInfo};
pub use crate::object_server::{IfaceToken, ObjectServer};
