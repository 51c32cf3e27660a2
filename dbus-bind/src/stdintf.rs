//! This module contains some standard interfaces and an easy way to call them.
//!
//! See the [D-Bus specification](https://dbus.freedesktop.org/doc/dbus-specification.html#standard-interfaces) for more information about these standard interfaces.
//!
//! The code was created by dbus-bindgen-rust, then slightly modified.

pub mod org_freedesktop_dbus {

    use crate::arg;
    use crate::blocking::Proxy;
    use crate::channel::BlockingSender;

    /// Method of the [org.freedesktop.DBus.Introspectable](https://dbus.freedesktop.org/doc/dbus-specification.html#standard-interfaces-introspectable) interface.
    pub trait Introspectable {
        /// Get introspection XML of the remote object.
        fn introspect(&self) -> Result<String, crate::Error>;
    }

    impl<'a, T: BlockingSender, C: std::ops::Deref<Target=T>> Introspectable for Proxy<'a, C> {
        fn introspect(&self) -> Result<String, crate::Error> {
            self.method_call("org.freedesktop.DBus.Introspectable", "Introspect", ())
                .map(|r: (String,)| r.0)
        }
    }

    /// Methods of the [org.freedesktop.DBus.Properties](https://dbus.freedesktop.org/doc/dbus-specification.html#standard-interfaces-properties) interface.
    pub trait Properties {
        /// Get a single property's value.
        fn get<R0: for<'b> arg::Get<'b> + 'static>(&self, interface_name: &str, property_name: &str) -> Result<R0, crate::Error>;
        /// Get all properties' values.
        fn get_all(&self, interface_name: &str) -> Result<arg::PropMap, crate::Error>;
        /// Set a single property's value.
        fn set<I2: arg::Arg + arg::Append + Clone>(&self, interface_name: &str, property_name: &str, value: I2) -> Result<(), crate::Error>;
    }

    impl<'a, T: BlockingSender, C: std::ops::Deref<Target=T>> Properties for Proxy<'a, C> {
        fn get<R0: for<'b> arg::Get<'b> + 'static>(&self, interface_name: &str, property_name: &str) -> Result<R0, crate::Error> {
            self.method_call("org.freedesktop.DBus.Properties", "Get", (interface_name, property_name))
                .map(|r: (arg::Variant<R0>,)| (r.0).0)
        }

        fn get_all(&self, interface_name: &str) -> Result<arg::PropMap, crate::Error> {
            self.method_call("org.freedesktop.DBus.Properties", "GetAll", (interface_name,))
                .map(|r: (arg::PropMap,)| r.0)
        }

        fn set<I2: arg::Arg + arg::Append + Clone>(&self, interface_name: &str, property_name: &str, value: I2) -> Result<(), crate::Error> {
            self.method_call("org.freedesktop.DBus.Properties", "Set", (interface_name, property_name, arg::Variant(value)))
        }
    }

    /// Method of the [org.freedesktop.DBus.Peer](https://dbus.freedesktop.org/doc/dbus-specification.html#standard-interfaces-peer) interface.
    pub trait Peer {
        /// A no-op, useful to check if a remote peer is alive.
        fn ping(&self) -> Result<(), crate::Error>;
    }

    impl<'a, T: BlockingSender, C: std::ops::Deref<Target=T>> Peer for Proxy<'a, C> {
        fn ping(&self) -> Result<(), crate::Error> {
            self.method_call("org.freedesktop.DBus.Peer", "Ping", ())
        }
    }
}
