use crate::context::Context;
use crate::ifacedesc::{IfaceBuilder, IfaceInfo, Registry};
use crate::stdimpl;
use dbus_bind::channel::Sender;
use dbus_bind::strings::{Interface as IfaceName, Path};
use dbus_bind::{Message, MethodErr};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::marker::PhantomData;

/// Opaque token representing a registered interface; the type parameter is
/// the user data type the interface's handlers run against.
#[derive(Debug)]
pub struct IfaceToken<T: Send + 'static>(usize, PhantomData<fn(T) -> T>);

impl<T: Send + 'static> Clone for IfaceToken<T> {
    fn clone(&self) -> Self { IfaceToken(self.0, PhantomData) }
}
impl<T: Send + 'static> Copy for IfaceToken<T> {}

#[derive(Debug)]
struct Object {
    ifaces: BTreeSet<usize>,
    data: Box<dyn Any + Send + 'static>,
}

/// The object server binds paths, user data, and registered interfaces,
/// and routes incoming method calls to the right handler.
#[derive(Debug)]
pub struct ObjectServer {
    map: BTreeMap<Path<'static>, Object>,
    registry: Registry,
    std_tokens: Vec<usize>,
}

impl Default for ObjectServer {
    fn default() -> Self { ObjectServer::new() }
}

impl ObjectServer {
    /// Creates a new object server.
    ///
    /// The standard Introspectable and Properties interfaces are registered
    /// up front and served on every inserted path.
    pub fn new() -> ObjectServer {
        let mut r = ObjectServer {
            map: BTreeMap::new(),
            registry: Default::default(),
            std_tokens: vec!(),
        };
        let t1 = stdimpl::introspectable(&mut r);
        let t2 = stdimpl::properties(&mut r);
        r.std_tokens = vec!(t1.0, t2.0);
        r
    }

    /// Registers an interface and returns a token that objects can be
    /// inserted with.
    pub fn register<T, N, F>(&mut self, name: N, f: F) -> IfaceToken<T>
    where T: Send + 'static, N: Into<IfaceName<'static>>, F: FnOnce(&mut IfaceBuilder<T>)
    {
        let mut b = IfaceBuilder::new(name.into());
        f(&mut b);
        IfaceToken(self.registry.push(b.into_info()), PhantomData)
    }

    /// Publishes an object: binds the path to the user data and the listed
    /// interfaces (plus the standard ones).
    pub fn insert<'z, D, I, N>(&mut self, path: N, ifaces: I, data: D)
    where D: Any + Send + 'static,
          I: IntoIterator<Item = &'z IfaceToken<D>>,
          N: Into<Path<'static>>,
    {
        let mut set: BTreeSet<usize> = ifaces.into_iter().map(|t| t.0).collect();
        set.extend(self.std_tokens.iter().cloned());
        self.map.insert(path.into(), Object { ifaces: set, data: Box::new(data) });
    }

    /// Withdraws an object from the server, releasing all dispatch routes at
    /// that path. Returns the user data if its type matches.
    pub fn remove<D: Any + Send + 'static>(&mut self, path: &Path<'static>) -> Option<D> {
        let obj = self.map.remove(path)?;
        obj.data.downcast().ok().map(|b| *b)
    }

    /// Whether an object is published at the given path.
    pub fn has_path(&self, path: &Path<'static>) -> bool { self.map.contains_key(path) }

    /// Accesses the user data of a published object.
    pub fn data_mut<D: Any + Send + 'static>(&mut self, path: &Path<'static>) -> Option<&mut D> {
        self.map.get_mut(path)?.data.downcast_mut()
    }

    pub(crate) fn typed_data_mut<T: Any + Send + 'static>(&mut self, path: &Path<'static>) -> Result<&mut T, MethodErr> {
        let obj = self.map.get_mut(path).ok_or_else(|| MethodErr::no_path(path))?;
        obj.data.downcast_mut().ok_or_else(|| MethodErr::failed(&"Wrong type of object"))
    }

    pub(crate) fn data_any_mut(&mut self, path: &Path<'static>) -> Result<&mut (dyn Any + 'static), MethodErr> {
        let obj = self.map.get_mut(path).ok_or_else(|| MethodErr::no_path(path))?;
        Ok(&mut *obj.data)
    }

    pub(crate) fn find_iface_token(&self, path: &Path<'static>, name: &IfaceName) -> Result<usize, MethodErr> {
        let obj = self.map.get(path).ok_or_else(|| MethodErr::no_path(path))?;
        obj.ifaces.iter().find(|t| self.registry.get(**t).name() == name).copied()
            .ok_or_else(|| MethodErr::no_interface(name))
    }

    pub(crate) fn registry(&self) -> &Registry { &self.registry }
    pub(crate) fn registry_mut(&mut self) -> &mut Registry { &mut self.registry }

    /// Looks up the descriptor of a registered interface.
    pub fn iface_info<T: Send + 'static>(&self, token: IfaceToken<T>) -> &IfaceInfo {
        self.registry.get(token.0)
    }

    pub(crate) fn introspect_ifaces(&self, path: &Path<'static>) -> String {
        self.map.get(path).map(|obj| self.registry.introspect(&obj.ifaces)).unwrap_or_default()
    }

    /// The names of the immediate children of a path, derived from the set
    /// of published objects.
    pub fn get_children(&self, path: &Path<'static>) -> Vec<&str> {
        let prefix = if &**path == "/" { "/".to_string() } else { format!("{}/", path) };
        let mut r: Vec<&str> = vec!();
        for key in self.map.keys() {
            if !key.starts_with(&prefix) || key.len() == prefix.len() { continue; }
            let child = &key[prefix.len()..];
            let child = child.split('/').next().unwrap_or(child);
            if !r.contains(&child) { r.push(child); }
        }
        r
    }

    /// Handles an incoming method call message: routes it to the right
    /// handler and sends the reply (or error reply) over the connection.
    ///
    /// Returns Err if the message was not a method call, or if sending a
    /// reply failed.
    pub fn handle_message<S: Sender>(&mut self, message: Message, conn: &S) -> Result<(), ()> {
        let mut ctx = Context::new(message).ok_or(())?;
        let (token, mut cb) = match ctx.check(|ctx| {
            let obj = self.map.get(ctx.path()).ok_or_else(|| MethodErr::no_path(ctx.path()))?;
            let token = self.registry.find_token(ctx.interface(), &obj.ifaces, ctx.method())?;
            let cb = self.registry.take_method(token, ctx.method())?;
            Ok((token, cb))
        }) {
            Ok(x) => x,
            Err(_) => return ctx.flush_messages(conn),
        };

        let methodname = ctx.method().clone();
        let octx = cb(ctx, self);
        self.registry.give_method(token, &methodname, cb);
        if let Some(mut ctx) = octx { ctx.flush_messages(conn) } else { Ok(()) }
    }
}
