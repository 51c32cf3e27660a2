//! Connection capabilities consumed by generated bindings and by the
//! dispatch framework.
//!
//! The actual transport (socket handling, authentication, wire framing and
//! fd passing) lives outside this crate; anything that can move `Message`s
//! can implement these traits. Within one connection, messages are delivered
//! in submission order; replies are correlated by serial.

use crate::message::MatchRule;
use crate::{Error, Message, MessageType};
use std::time::Duration;

/// Abstraction over different connections that send data
pub trait Sender {
    /// Schedules a message for sending.
    ///
    /// Returns a serial number than can be used to match against a reply.
    fn send(&self, msg: Message) -> Result<u32, ()>;
}

/// Use in case you don't want the send the message, but just collect it instead.
impl Sender for std::cell::RefCell<Vec<Message>> {
    fn send(&self, msg: Message) -> Result<u32, ()> {
        self.borrow_mut().push(msg);
        Ok(0)
    }
}

/// Abstraction over connections that can block while waiting for a reply.
pub trait BlockingSender {
    /// Sends a message over the D-Bus and blocks, waiting for a reply or a timeout.
    /// This is used for method calls.
    ///
    /// Note: In case of an error reply, this is returned as an Err(), not as a Ok(Message)
    /// with the error type.
    fn send_with_reply_and_block(&self, msg: Message, timeout: Duration) -> Result<Message, Error>;
}

/// Callback to run when a reply to a pending call arrives; the message may be
/// a method return or an error reply.
pub type MessageCallback = Box<dyn FnOnce(Message)>;

/// Abstraction over connections that register pending calls; the callback is
/// invoked once the reply arrives, making asynchronous client stubs possible
/// without blocking the caller.
pub trait AsyncSender: Sender {
    /// Sends a method call and registers a callback for its reply.
    ///
    /// Returns the serial number of the call, which identifies the pending
    /// call until its completion.
    fn send_with_reply(&self, msg: Message, f: MessageCallback) -> Result<u32, ()>;
}

/// Token used to identify a callback in the MatchingReceiver trait
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Token(pub usize);

/// Abstraction over different connections that receive data
pub trait MatchingReceiver {
    /// Type of callback
    type F;
    /// Add a callback to be called in case a message matches.
    ///
    /// Returns an id that can be used to remove the callback.
    fn start_receive(&self, m: MatchRule<'static>, f: Self::F) -> Token;
    /// Remove a previously added callback.
    fn stop_receive(&self, id: Token) -> Option<(MatchRule<'static>, Self::F)>;
}

/// Handles what we need to be a good D-Bus citizen.
///
/// Call this if you have not handled the message yourself:
/// * It handles calls to org.freedesktop.DBus.Peer.
/// * For other method calls, it sends an error reply back that the method was unknown.
pub fn default_reply(m: &Message) -> Option<Message> {
    peer(&m).or_else(|| unknown_method(&m))
}

/// Replies if this is a call to org.freedesktop.DBus.Peer, otherwise returns None.
fn peer(m: &Message) -> Option<Message> {
    if let Some(intf) = m.interface() {
        if &*intf != "org.freedesktop.DBus.Peer" { return None; }
        if let Some(method) = m.member() {
            if &*method == "Ping" { return Some(m.method_return()) }
        }
        Some(m.error(&"org.freedesktop.DBus.Error.UnknownMethod".into(), "Method does not exist"))
    } else { None }
}

/// For method calls, it replies that the method was unknown, otherwise returns None.
fn unknown_method(m: &Message) -> Option<Message> {
    if m.msg_type() != MessageType::MethodCall { return None; }
    Some(m.error(&"org.freedesktop.DBus.Error.UnknownMethod".into(), "Path, Interface, or Method does not exist"))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn collecting_sender() {
        let r = RefCell::new(vec!());
        let m = Message::new_method_call("com.example.hello", "/", "com.example.hello", "Hello").unwrap();
        r.send(m).unwrap();
        assert_eq!(r.borrow().len(), 1);
    }

    #[test]
    fn default_replies() {
        let ping = Message::new_method_call("com.example.hello", "/", "org.freedesktop.DBus.Peer", "Ping").unwrap();
        assert_eq!(default_reply(&ping).unwrap().msg_type(), MessageType::MethodReturn);

        let call = Message::new_method_call("com.example.hello", "/", "com.example.hello", "Hello").unwrap();
        let mut r = default_reply(&call).unwrap();
        assert_eq!(r.as_result().unwrap_err().name(), Some("org.freedesktop.DBus.Error.UnknownMethod"));

        let sig = Message::new_signal("/", "com.example.hello", "Hello").unwrap();
        assert!(default_reply(&sig).is_none());
    }
}
