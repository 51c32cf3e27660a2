//! Generates Rust bindings from D-Bus introspection XML.
//!
//! For every interface in the input, the generator can emit client-side
//! stubs (a trait implemented for `blocking::Proxy`, an asynchronous
//! companion trait, and one struct per signal) and server-side dispatch
//! glue (a trait for the object implementation plus a `register_*` function
//! wiring it into an `ObjectServer`).
//!
//! Most users run the `dbus-bindgen-rust` binary from a build script; the
//! `generate` function is the same entry point as a library.

extern crate xml;

mod generate;

pub use crate::generate::{generate, GenOpts, Mode};
