//! Client-side proxies: typed method calls against a remote object.
//!
//! A `Proxy` pairs a destination and a path with some way of sending
//! messages. Synchronous calls go through `BlockingSender`, asynchronous
//! ones through `AsyncSender`, and signal matches through
//! `MatchingReceiver`; generated client traits are implemented on top of
//! these three entry points.

use crate::arg::{AppendAll, ArgType, IterAppend, ReadAll};
use crate::channel::{self, AsyncSender, MessageCallback, Token};
pub use crate::channel::BlockingSender;
use crate::message::{MatchRule, SignalArgs};
use crate::strings::{BusName, Interface, Member, Path};
use crate::{Error, Message};
use std::time::Duration;

/// A struct that wraps a connection, destination and path.
///
/// A D-Bus "Proxy" is a client-side object that corresponds to a remote
/// object on the server side. Calling methods on the proxy object calls
/// methods on the remote object.
#[derive(Clone, Debug)]
pub struct Proxy<'a, C> {
    /// Destination, i e what D-Bus service you're communicating with
    pub destination: BusName<'a>,
    /// Object path on the destination
    pub path: Path<'a>,
    /// Timeout for method calls
    pub timeout: Duration,
    /// Some way to send and/or receive messages, either blocking or non-blocking.
    pub connection: C,
}

impl<'a, C> Proxy<'a, C> {
    /// Creates a new proxy struct.
    pub fn new<D: Into<BusName<'a>>, P: Into<Path<'a>>>(dest: D, path: P, timeout: Duration, connection: C) -> Self {
        Proxy { destination: dest.into(), path: path.into(), timeout, connection }
    }
}

fn decode_reply<R: ReadAll>(msg: &mut Message) -> Result<R, Error> {
    msg.as_result()?;
    let mut i = msg.iter_init();
    let r = R::read(&mut i)?;
    // The reply signature must equal the declared output signature; a
    // decodable prefix with surplus arguments is still a mismatch.
    if i.arg_type() != ArgType::Invalid {
        return Err(Error::new_failed("Reply signature mismatch: too many arguments"));
    }
    Ok(r)
}

impl<'a, T: BlockingSender, C: std::ops::Deref<Target=T>> Proxy<'a, C> {
    /// Make a method call using typed input and output arguments, then block
    /// waiting for a reply.
    pub fn method_call<'i, 'm, R: ReadAll, A: AppendAll, I: Into<Interface<'i>>, M: Into<Member<'m>>>(&self, i: I, m: M, args: A) -> Result<R, Error> {
        let mut msg = Message::method_call(&self.destination, &self.path, &i.into(), &m.into());
        args.append(&mut IterAppend::new(&mut msg));
        let mut r = self.connection.send_with_reply_and_block(msg, self.timeout)?;
        decode_reply(&mut r)
    }
}

impl<'a, T: AsyncSender, C: std::ops::Deref<Target=T>> Proxy<'a, C> {
    /// Make a method call using typed input arguments, without waiting for
    /// the reply.
    ///
    /// The callback runs when the reply (or error reply) arrives, with the
    /// decoded output arguments. Returns the serial of the pending call.
    pub fn method_call_async<'i, 'm, R, A, I, M, F>(&self, i: I, m: M, args: A, f: F) -> Result<u32, Error>
    where R: ReadAll + 'static, A: AppendAll, I: Into<Interface<'i>>, M: Into<Member<'m>>,
          F: FnOnce(Result<R, Error>) + 'static {
        let mut msg = Message::method_call(&self.destination, &self.path, &i.into(), &m.into());
        args.append(&mut IterAppend::new(&mut msg));
        let cb: MessageCallback = Box::new(move |mut reply: Message| {
            f(decode_reply(&mut reply));
        });
        self.connection.send_with_reply(msg, cb)
            .map_err(|_| Error::new_failed("Failed to send message"))
    }
}

/// Sets up a match, including calls to the D-Bus server to add and remove this match.
fn add_match<C, T, F>(conn: &C, mr: MatchRule<'static>, timeout: Duration, mut f: F) -> Result<Token, Error>
where
    T: BlockingSender + channel::MatchingReceiver<F=Box<dyn FnMut(Message) -> bool>>,
    C: 'static + std::ops::Deref<Target=T> + Clone,
    F: 'static + FnMut(Message) -> bool {

    let mstr = mr.match_str();
    let msg = Message::call_with_args("org.freedesktop.DBus", "/", "org.freedesktop.DBus", "AddMatch", (&*mstr,));
    conn.send_with_reply_and_block(msg, timeout)?;
    let conn2 = conn.clone();
    let id = conn.start_receive(mr, Box::new(move |msg: Message| {
        if f(msg) { return true };
        let msg = Message::call_with_args("org.freedesktop.DBus", "/", "org.freedesktop.DBus", "RemoveMatch", (&*mstr,));
        let _ = conn2.send_with_reply_and_block(msg, timeout);
        false
    }));
    Ok(id)
}

impl<'a, T, C> Proxy<'a, C>
where
    T: BlockingSender + channel::MatchingReceiver<F=Box<dyn FnMut(Message) -> bool>>,
    C: 'static + std::ops::Deref<Target=T> + Clone
{
    /// Sets up an incoming signal match, that calls the supplied callback
    /// every time the signal is received.
    ///
    /// The returned value can be used to remove the match. The match is also
    /// removed if the callback returns "false".
    pub fn match_signal<S: SignalArgs + ReadAll, F: 'static + FnMut(S) -> bool>(&self, mut f: F) -> Result<Token, Error> {
        let mr = S::match_rule(Some(&self.destination), Some(&self.path)).static_clone();
        add_match(&self.connection, mr, self.timeout, move |msg| {
            // We silently drop type mismatch errors here. Hopefully that's the right thing to do.
            if let Ok(r) = S::read(&mut msg.iter_init()) { f(r) } else { true }
        })
    }
}
