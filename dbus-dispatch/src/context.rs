use dbus_bind::arg::{AppendAll, IterAppend};
use dbus_bind::channel::Sender;
use dbus_bind::strings::{Interface, Member, Path};
use dbus_bind::{Message, MessageType, MethodErr};
use std::marker::PhantomData;

/// Context of an incoming method call; owns the inbound message until the
/// reply has been written.
#[derive(Debug)]
pub struct Context {
    path: Path<'static>,
    interface: Option<Interface<'static>>,
    method: Member<'static>,
    message: Message,

    reply: Option<Message>,
}

impl Context {
    /// Creates a new Context from a message; returns None if the message is
    /// not a method call or misses a path or member.
    pub fn new(msg: Message) -> Option<Self> {
        if msg.msg_type() != MessageType::MethodCall { return None; }
        let p = msg.path()?.into_static();
        let i = msg.interface().map(|i| i.into_static());
        let m = msg.member()?.into_static();
        Some(Context {
            path: p,
            interface: i,
            method: m,
            message: msg,
            reply: None,
        })
    }

    /// Convenience method that sets an error reply if the closure returns an error.
    pub fn check<R, F: FnOnce(&mut Context) -> Result<R, MethodErr>>(&mut self, f: F) -> Result<R, ()> {
        f(self).map_err(|e| {
            log::debug!("Error reply to {}.{} at {}: {}",
                self.interface.as_ref().map(|i| &**i).unwrap_or(""), self.method, self.path, e);
            if !self.message.get_no_reply() {
                self.reply = Some(e.to_message(&self.message))
            };
        })
    }

    /// Creates a method reply, and runs the closure on it to fill in its
    /// arguments. Does nothing if the caller asked for no reply or if a reply
    /// was already set.
    pub fn do_reply<F: FnOnce(&mut Message)>(&mut self, f: F) {
        if self.message.get_no_reply() { return; }
        if self.reply.is_some() { return; }
        let mut msg = self.message.method_return();
        f(&mut msg);
        self.reply = Some(msg);
    }

    /// Low-level function to set a reply message.
    pub fn set_reply(&mut self, msg: Option<Message>, check_no_reply: bool, check_set: bool) {
        if check_no_reply && self.message.get_no_reply() { return; }
        if check_set && self.reply.is_some() { return; }
        self.reply = msg;
    }

    /// Sends the pending reply, if any, over the connection.
    pub fn flush_messages<S: Sender + ?Sized>(&mut self, conn: &S) -> Result<(), ()> {
        if let Some(msg) = self.reply.take() {
            conn.send(msg)?;
        }
        Ok(())
    }

    /// The object path of the incoming message.
    pub fn path(&self) -> &Path<'static> { &self.path }
    /// The interface of the incoming message, if present.
    pub fn interface(&self) -> Option<&Interface<'static>> { self.interface.as_ref() }
    /// The member name of the incoming message.
    pub fn method(&self) -> &Member<'static> { &self.method }
    /// The incoming message.
    pub fn message(&self) -> &Message { &self.message }

    /// Whether a reply has already been prepared.
    pub fn has_reply(&self) -> bool { self.reply.is_some() }
}

/// Reply handle for a deferred method call.
///
/// Handed to the handler instead of a direct return value; the handler (or
/// whatever it forwards the handle to) replies later with `reply`, which
/// consumes the handle - so each call produces at most one reply, checked at
/// compile time. Dropping the handle unreplied abandons the call; the peer
/// then observes the absence.
#[derive(Debug)]
pub struct ReplyHandle<OA: AppendAll> {
    ctx: Context,
    _out: PhantomData<fn(OA)>,
}

impl<OA: AppendAll> ReplyHandle<OA> {
    pub(crate) fn new(ctx: Context) -> Self {
        ReplyHandle { ctx, _out: PhantomData }
    }

    /// The message that started the deferred call.
    pub fn message(&self) -> &Message { self.ctx.message() }

    /// Sends the reply for the deferred call: a method return carrying the
    /// output arguments, or an error reply per the usual error policy.
    pub fn reply<S: Sender + ?Sized>(mut self, conn: &S, r: Result<OA, MethodErr>) -> Result<(), ()> {
        match r {
            Ok(oa) => self.ctx.do_reply(|msg| oa.append(&mut IterAppend::new(msg))),
            Err(e) => { let _ = self.ctx.check(|_| Err::<(), MethodErr>(e)); }
        }
        self.ctx.flush_messages(conn)
    }
}

/// Context of a property access, provided to get and set handlers.
#[derive(Debug)]
pub struct PropContext {
    path: Path<'static>,
    interface: Interface<'static>,
    name: String,
}

impl PropContext {
    pub(crate) fn new(path: Path<'static>, interface: Interface<'static>, name: String) -> Self {
        PropContext { path, interface, name }
    }

    /// The current object path.
    pub fn path(&self) -> &Path<'static> { &self.path }

    /// The current interface name.
    pub fn interface(&self) -> &Interface<'static> { &self.interface }

    /// The current property name.
    pub fn name(&self) -> &str { &self.name }
}
