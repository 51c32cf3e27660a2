//! Contains structs and traits closely related to D-Bus messages.

use crate::strings::{BusName, ErrorName, Interface, Member, Path};
use crate::arg::{Append, AppendAll, Arg, Get, Iter, IterAppend, TypeMismatchError};
use crate::arg::Value;
use crate::Error;
use std::fmt;

#[derive(Copy, Clone, Debug, Eq, Ord, PartialEq, PartialOrd, Hash)]
/// One of the four different message types.
pub enum MessageType {
    /// This is a method call D-Bus message
    MethodCall = 1,
    /// This is a method return Ok D-Bus message, used when the method call message was successfully processed
    MethodReturn = 2,
    /// This is a method return with error D-Bus message, used when the method call message could not be handled
    Error = 3,
    /// This is a signal, usually sent to whoever wants to listen
    Signal = 4,
}

mod signalargs;
pub use self::signalargs::SignalArgs;

mod matchrule;
pub use self::matchrule::MatchRule;

/// A D-Bus message. A message contains headers - usually destination address,
/// path, interface and member, and a list of arguments.
///
/// The message is held entirely in memory; putting it on a wire (and taking
/// it off again) is the transport's business.
pub struct Message {
    msgtype: MessageType,
    serial: Option<u32>,
    reply_serial: Option<u32>,
    path: Option<Path<'static>>,
    interface: Option<Interface<'static>>,
    member: Option<Member<'static>>,
    error_name: Option<ErrorName<'static>>,
    destination: Option<BusName<'static>>,
    sender: Option<BusName<'static>>,
    no_reply: bool,
    body: Vec<Value>,
}

impl Message {
    fn empty(t: MessageType) -> Message {
        Message {
            msgtype: t,
            serial: None,
            reply_serial: None,
            path: None,
            interface: None,
            member: None,
            error_name: None,
            destination: None,
            sender: None,
            no_reply: false,
            body: vec!(),
        }
    }

    /// Creates a new method call message.
    pub fn new_method_call<D, P, I, M>(destination: D, path: P, iface: I, method: M) -> Result<Message, String>
    where D: Into<Vec<u8>>, P: Into<Vec<u8>>, I: Into<Vec<u8>>, M: Into<Vec<u8>> {
        let d = String::from_utf8(destination.into()).map_err(|e| e.to_string())?;
        let p = String::from_utf8(path.into()).map_err(|e| e.to_string())?;
        let i = String::from_utf8(iface.into()).map_err(|e| e.to_string())?;
        let m = String::from_utf8(method.into()).map_err(|e| e.to_string())?;
        let d = BusName::new(d).map_err(|e| e.to_string())?;
        let p = Path::new(p).map_err(|e| e.to_string())?;
        let i = Interface::new(i).map_err(|e| e.to_string())?;
        let m = Member::new(m).map_err(|e| e.to_string())?;
        Ok(Message::method_call(&d, &p, &i, &m))
    }

    /// Creates a new method call message.
    pub fn method_call(destination: &BusName, path: &Path, iface: &Interface, name: &Member) -> Message {
        let mut msg = Message::empty(MessageType::MethodCall);
        msg.destination = Some(destination.clone().into_static());
        msg.path = Some(path.clone().into_static());
        msg.interface = Some(iface.clone().into_static());
        msg.member = Some(name.clone().into_static());
        msg
    }

    /// Creates a new method call message with appended arguments.
    pub fn call_with_args<'d, 'p, 'i, 'm, A, D, P, I, M>(destination: D, path: P, iface: I, method: M, args: A) -> Message
    where D: Into<BusName<'d>>, P: Into<Path<'p>>, I: Into<Interface<'i>>, M: Into<Member<'m>>, A: AppendAll {
        let mut msg = Message::method_call(&destination.into(), &path.into(), &iface.into(), &method.into());
        args.append(&mut IterAppend::new(&mut msg));
        msg
    }

    /// Creates a new signal message.
    pub fn new_signal<P, I, M>(path: P, iface: I, name: M) -> Result<Message, String>
    where P: Into<Vec<u8>>, I: Into<Vec<u8>>, M: Into<Vec<u8>> {
        let p = String::from_utf8(path.into()).map_err(|e| e.to_string())?;
        let i = String::from_utf8(iface.into()).map_err(|e| e.to_string())?;
        let m = String::from_utf8(name.into()).map_err(|e| e.to_string())?;
        let p = Path::new(p).map_err(|e| e.to_string())?;
        let i = Interface::new(i).map_err(|e| e.to_string())?;
        let m = Member::new(m).map_err(|e| e.to_string())?;
        Ok(Message::signal(&p, &i, &m))
    }

    /// Creates a new signal message.
    pub fn signal(path: &Path, iface: &Interface, name: &Member) -> Message {
        let mut msg = Message::empty(MessageType::Signal);
        msg.path = Some(path.clone().into_static());
        msg.interface = Some(iface.clone().into_static());
        msg.member = Some(name.clone().into_static());
        msg
    }

    /// Creates a method return (reply) for this method call.
    pub fn method_return(&self) -> Message {
        let mut msg = Message::empty(MessageType::MethodReturn);
        msg.reply_serial = self.serial;
        msg.destination = self.sender.clone();
        msg
    }

    /// Creates a new error reply for this method call.
    pub fn error(&self, error_name: &ErrorName, error_message: &str) -> Message {
        let mut msg = Message::empty(MessageType::Error);
        msg.error_name = Some(error_name.clone().into_static());
        msg.reply_serial = self.serial;
        msg.destination = self.sender.clone();
        msg.body.push(Value::Str(error_message.into()));
        msg
    }

    /// Get the D-Bus serial of a message, if one was specified.
    pub fn get_serial(&self) -> Option<u32> { self.serial }

    /// Sets the serial of this message.
    ///
    /// Normally the connection assigns one when the message is sent.
    pub fn set_serial(&mut self, val: u32) { self.serial = Some(val); }

    /// Get the serial of the message this message is a reply to, if present.
    pub fn get_reply_serial(&self) -> Option<u32> { self.reply_serial }

    /// Returns true if the message does not expect a reply.
    pub fn get_no_reply(&self) -> bool { self.no_reply }

    /// Set whether or not the message expects a reply.
    ///
    /// Set to true if you send a method call and do not want a reply.
    pub fn set_no_reply(&mut self, v: bool) { self.no_reply = v; }

    /// Appends one argument to this message.
    /// Use in builder style: e g `m.method_return().append1(7i32)`
    pub fn append1<A: Append>(mut self, a: A) -> Self {
        {
            let mut m = IterAppend::new(&mut self);
            m.append(a);
        }
        self
    }

    /// Appends two arguments to this message.
    /// Use in builder style: e g `m.method_return().append2(7i32, 6u8)`
    pub fn append2<A1: Append, A2: Append>(mut self, a1: A1, a2: A2) -> Self {
        {
            let mut m = IterAppend::new(&mut self);
            m.append(a1); m.append(a2);
        }
        self
    }

    /// Appends three arguments to this message.
    /// Use in builder style: e g `m.method_return().append3(7i32, 6u8, true)`
    pub fn append3<A1: Append, A2: Append, A3: Append>(mut self, a1: A1, a2: A2, a3: A3) -> Self {
        {
            let mut m = IterAppend::new(&mut self);
            m.append(a1); m.append(a2); m.append(a3);
        }
        self
    }

    /// Gets the first argument from the message, if that argument is of type G1.
    /// Returns None if there are not enough arguments, or if types don't match.
    pub fn get1<'a, G1: Get<'a>>(&'a self) -> Option<G1> {
        let mut i = Iter::new(&self);
        i.get()
    }

    /// Gets the first two arguments from the message, if those arguments are of type G1 and G2.
    /// Returns None if there are not enough arguments, or if types don't match.
    pub fn get2<'a, G1: Get<'a>, G2: Get<'a>>(&'a self) -> (Option<G1>, Option<G2>) {
        let mut i = Iter::new(&self);
        let g1 = i.get();
        if !i.next() { return (g1, None); }
        (g1, i.get())
    }

    /// Gets the first argument from the message, if that argument is of type G1.
    ///
    /// Returns a TypeMismatchError if there are not enough arguments, or if types don't match.
    pub fn read1<'a, G1: Arg + Get<'a>>(&'a self) -> Result<G1, TypeMismatchError> {
        let mut i = Iter::new(&self);
        i.read()
    }

    /// Gets the first two arguments from the message, if those arguments are of type G1 and G2.
    ///
    /// Returns a TypeMismatchError if there are not enough arguments, or if types don't match.
    pub fn read2<'a, G1: Arg + Get<'a>, G2: Arg + Get<'a>>(&'a self) -> Result<(G1, G2), TypeMismatchError> {
        let mut i = Iter::new(&self);
        Ok((i.read()?, i.read()?))
    }

    /// Gets the first three arguments from the message, if those arguments are of type G1, G2 and G3.
    ///
    /// Returns a TypeMismatchError if there are not enough arguments, or if types don't match.
    pub fn read3<'a, G1: Arg + Get<'a>, G2: Arg + Get<'a>, G3: Arg + Get<'a>>(&'a self) ->
        Result<(G1, G2, G3), TypeMismatchError> {
        let mut i = Iter::new(&self);
        Ok((i.read()?, i.read()?, i.read()?))
    }

    /// Gets the first four arguments from the message, if those arguments are of type G1, G2, G3 and G4.
    ///
    /// Returns a TypeMismatchError if there are not enough arguments, or if types don't match.
    pub fn read4<'a, G1: Arg + Get<'a>, G2: Arg + Get<'a>, G3: Arg + Get<'a>, G4: Arg + Get<'a>>(&'a self) ->
        Result<(G1, G2, G3, G4), TypeMismatchError> {
        let mut i = Iter::new(&self);
        Ok((i.read()?, i.read()?, i.read()?, i.read()?))
    }

    /// Gets the first five arguments from the message, if those arguments are of type G1, G2, G3, G4 and G5.
    ///
    /// Returns a TypeMismatchError if there are not enough arguments, or if types don't match.
    /// Note: If you need more than five arguments, use `iter_init` instead.
    pub fn read5<'a, G1: Arg + Get<'a>, G2: Arg + Get<'a>, G3: Arg + Get<'a>, G4: Arg + Get<'a>, G5: Arg + Get<'a>>(&'a self) ->
        Result<(G1, G2, G3, G4, G5), TypeMismatchError> {
        let mut i = Iter::new(&self);
        Ok((i.read()?, i.read()?, i.read()?, i.read()?, i.read()?))
    }

    /// Returns a struct for retrieving the arguments from a message.
    pub fn iter_init(&self) -> Iter { Iter::new(&self) }

    /// Gets the MessageType of the Message.
    pub fn msg_type(&self) -> MessageType { self.msgtype }

    /// Gets the name of the connection that originated this message.
    pub fn sender(&self) -> Option<BusName> { self.sender.as_ref().map(|s| s.into()) }

    /// Sets the name of the connection that originated this message.
    ///
    /// Normally the transport fills this in; it is settable here so in-process
    /// connections can do the same.
    pub fn set_sender(&mut self, sender: Option<BusName<'static>>) { self.sender = sender; }

    /// Gets the object path this Message is being sent to.
    pub fn path(&self) -> Option<Path> { self.path.as_ref().map(|s| s.into()) }

    /// Gets the destination this Message is being sent to.
    pub fn destination(&self) -> Option<BusName> { self.destination.as_ref().map(|s| s.into()) }

    /// Sets the destination of this Message.
    ///
    /// If dest is none, that means broadcast to all relevant destinations.
    pub fn set_destination(&mut self, dest: Option<BusName<'static>>) { self.destination = dest; }

    /// Gets the interface this Message is being sent to.
    pub fn interface(&self) -> Option<Interface> { self.interface.as_ref().map(|s| s.into()) }

    /// Gets the interface member being called.
    pub fn member(&self) -> Option<Member> { self.member.as_ref().map(|s| s.into()) }

    /// Gets the name of the error, if this message is an error reply.
    pub fn error_name(&self) -> Option<ErrorName> { self.error_name.as_ref().map(|s| s.into()) }

    /// The signature of the message body: the concatenated signatures of
    /// every argument, possibly empty.
    pub fn signature(&self) -> String {
        let mut s = String::new();
        for v in &self.body { s.push_str(&v.signature()); }
        s
    }

    /// When the remote end returns an error, the message itself is
    /// correct but its contents is an error. This method will
    /// transform such an error to a D-Bus Error or otherwise return
    /// the original message.
    pub fn as_result(&mut self) -> Result<&mut Message, Error> {
        self.set_error_from_msg().map(|_| self)
    }

    pub(crate) fn set_error_from_msg(&self) -> Result<(), Error> {
        if self.msgtype != MessageType::Error { return Ok(()); }
        let name = self.error_name.clone()
            .unwrap_or_else(|| ErrorName::new_unchecked("org.freedesktop.DBus.Error.Failed"));
        let text: Option<&str> = self.get1();
        Err(Error::new_custom(&name, text.unwrap_or("")))
    }

    pub(crate) fn body(&self) -> &[Value] { &self.body }

    pub(crate) fn body_mut(&mut self) -> &mut Vec<Value> { &mut self.body }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let mut x = f.debug_struct("Message");
        x.field("Type", &self.msgtype);
        // The &&** derefs to a &&str, which implements &dyn Debug
        if let Some(ref path) = self.path { x.field("Path", &&**path); }
        if let Some(ref iface) = self.interface { x.field("Interface", &&**iface); }
        if let Some(ref member) = self.member { x.field("Member", &&**member); }
        if let Some(ref name) = self.error_name { x.field("ErrorName", &&**name); }
        if let Some(ref sender) = self.sender { x.field("Sender", &&**sender); }
        if let Some(ref dest) = self.destination { x.field("Destination", &&**dest); }
        if let Some(ref serial) = self.serial { x.field("Serial", serial); }
        if let Some(ref rs) = self.reply_serial { x.field("ReplySerial", rs); }
        x.field("Args", &self.body);
        x.finish()
    }
}
