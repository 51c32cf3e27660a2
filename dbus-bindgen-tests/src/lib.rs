//! Test support for generated bindings: the generated modules themselves, a
//! reference service implementation, and an in-process bus that routes
//! messages between client proxies and an ObjectServer.

/// Server-side bindings generated from the test XML at build time.
pub mod server {
    include!(concat!(env!("OUT_DIR"), "/nih_test_server.rs"));
}

/// Client-side bindings generated from the test XML at build time.
pub mod client {
    include!(concat!(env!("OUT_DIR"), "/nih_test_client.rs"));
}

use dbus_bind::channel::{AsyncSender, BlockingSender, MatchingReceiver, MessageCallback, Sender, Token};
use dbus_bind::message::MatchRule;
use dbus_bind::{Error, Message, MessageType, MethodErr};
use dbus_dispatch::{ObjectServer, ReplyHandle};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::time::Duration;

/// Reference implementation of the generated service trait, with enough
/// bookkeeping for the tests to observe what ran.
pub struct TestService {
    /// Current value of the uint32 property.
    pub uint32: u32,
    /// Value served by the read-only version property.
    pub version: String,
    /// Sink of the write-only secret property.
    pub secret: String,
    /// How many times a method handler has run.
    pub calls: u32,
    /// The input of the last deferred call.
    pub last_async_input: Option<String>,
    /// The reply handle of a deferred call in flight.
    pub pending: Option<ReplyHandle<(String,)>>,
}

impl TestService {
    /// A fresh service with the given uint32 property value.
    pub fn new(uint32: u32) -> Self {
        TestService {
            uint32,
            version: "1.0".into(),
            secret: String::new(),
            calls: 0,
            last_async_input: None,
            pending: None,
        }
    }
}

impl server::ComNetsplitNihTest for TestService {
    fn ordinary_method(&mut self, input: String) -> Result<String, MethodErr> {
        self.calls += 1;
        if input.is_empty() {
            return Err(("com.netsplit.Nih.Test.OrdinaryMethod.EmptyInput",
                "The input string was empty").into());
        }
        if input == "invalid" {
            let e: Box<dyn std::error::Error> =
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "Invalid argument").into();
            return Err(e.into());
        }
        Ok(input)
    }

    fn async_method(&mut self, input: String, reply: ReplyHandle<(String,)>) {
        self.calls += 1;
        self.last_async_input = Some(input);
        self.pending = Some(reply);
    }

    fn struct_to_str(&mut self, item: (String, u32,)) -> Result<String, MethodErr> {
        self.calls += 1;
        Ok(format!("{} {}", item.0, item.1))
    }

    fn int32_array_array_to_str(&mut self, value: Vec<Vec<i32>>) -> Result<String, MethodErr> {
        self.calls += 1;
        let rows: Vec<String> = value.iter()
            .map(|row| row.iter().map(|x| x.to_string()).collect::<Vec<_>>().join(" "))
            .collect();
        Ok(rows.join("\n"))
    }

    fn poke(&mut self) -> Result<(), MethodErr> {
        self.calls += 1;
        Ok(())
    }

    fn uint32(&mut self) -> Result<u32, MethodErr> {
        Ok(self.uint32)
    }

    fn set_uint32(&mut self, value: u32) -> Result<(), MethodErr> {
        if value == 0 {
            return Err(("com.netsplit.Nih.Test.UInt32.Zero", "The value was zero").into());
        }
        self.uint32 = value;
        Ok(())
    }

    fn version(&mut self) -> Result<String, MethodErr> {
        Ok(self.version.clone())
    }

    fn set_secret(&mut self, value: String) -> Result<(), MethodErr> {
        self.secret = value;
        Ok(())
    }
}

type Filter = (Token, MatchRule<'static>, Box<dyn FnMut(Message) -> bool>);

/// An in-process connection: routes method calls into an ObjectServer,
/// replies back to pending calls, and broadcasts signals through match
/// rules - enough connection surface for generated bindings to run against
/// without a transport.
pub struct TestBus {
    server: RefCell<ObjectServer>,
    next_serial: Cell<u32>,
    next_token: Cell<usize>,
    pending: RefCell<HashMap<u32, MessageCallback>>,
    filters: RefCell<Vec<Filter>>,
}

impl TestBus {
    /// Wraps an object server into an in-process bus.
    pub fn new(server: ObjectServer) -> Self {
        TestBus {
            server: RefCell::new(server),
            next_serial: Cell::new(1),
            next_token: Cell::new(1),
            pending: RefCell::new(HashMap::new()),
            filters: RefCell::new(vec!()),
        }
    }

    /// Runs a closure against the object server.
    pub fn with_server<R, F: FnOnce(&mut ObjectServer) -> R>(&self, f: F) -> R {
        f(&mut self.server.borrow_mut())
    }

    fn stamp(&self, msg: &mut Message) -> u32 {
        let serial = self.next_serial.get();
        self.next_serial.set(serial + 1);
        msg.set_serial(serial);
        serial
    }

    fn deliver_signal(&self, msg: Message) {
        let mut filters = self.filters.borrow_mut();
        if let Some(idx) = filters.iter().position(|(_, rule, _)| rule.matches(&msg)) {
            let keep = (filters[idx].2)(msg);
            if !keep { filters.remove(idx); }
        }
    }

    fn deliver_reply(&self, msg: Message) {
        if let Some(rs) = msg.get_reply_serial() {
            if let Some(cb) = self.pending.borrow_mut().remove(&rs) {
                cb(msg);
            }
        }
    }
}

impl Sender for TestBus {
    fn send(&self, msg: Message) -> Result<u32, ()> {
        let mut msg = msg;
        let serial = self.stamp(&mut msg);
        match msg.msg_type() {
            MessageType::Signal => self.deliver_signal(msg),
            MessageType::MethodReturn | MessageType::Error => self.deliver_reply(msg),
            MessageType::MethodCall => {
                let replies = RefCell::new(vec!());
                let _ = self.server.borrow_mut().handle_message(msg, &replies);
                for r in replies.into_inner() { self.deliver_reply(r); }
            }
        }
        Ok(serial)
    }
}

impl BlockingSender for TestBus {
    fn send_with_reply_and_block(&self, msg: Message, _timeout: Duration) -> Result<Message, Error> {
        let mut msg = msg;
        self.stamp(&mut msg);
        // Pretend to be the message bus for match bookkeeping.
        if msg.destination().as_ref().map(|d| &**d) == Some("org.freedesktop.DBus") {
            return Ok(msg.method_return());
        }
        let replies = RefCell::new(vec!());
        self.server.borrow_mut().handle_message(msg, &replies)
            .map_err(|_| Error::new_failed("Message was not routable"))?;
        let mut reply = replies.into_inner().pop()
            .ok_or_else(|| Error::new_custom("org.freedesktop.DBus.Error.NoReply",
                "Message did not receive a reply"))?;
        reply.as_result()?;
        Ok(reply)
    }
}

impl AsyncSender for TestBus {
    fn send_with_reply(&self, msg: Message, f: MessageCallback) -> Result<u32, ()> {
        let mut msg = msg;
        let serial = self.stamp(&mut msg);
        self.pending.borrow_mut().insert(serial, f);
        let replies = RefCell::new(vec!());
        let _ = self.server.borrow_mut().handle_message(msg, &replies);
        for r in replies.into_inner() { self.deliver_reply(r); }
        Ok(serial)
    }
}

impl MatchingReceiver for TestBus {
    type F = Box<dyn FnMut(Message) -> bool>;

    fn start_receive(&self, m: MatchRule<'static>, f: Self::F) -> Token {
        let t = Token(self.next_token.get());
        self.next_token.set(t.0 + 1);
        self.filters.borrow_mut().push((t, m, f));
        t
    }

    fn stop_receive(&self, id: Token) -> Option<(MatchRule<'static>, Self::F)> {
        let mut filters = self.filters.borrow_mut();
        if let Some(idx) = filters.iter().position(|(t, _, _)| *t == id) {
            let (_, m, cb) = filters.remove(idx);
            Some((m, cb))
        } else { None }
    }
}
