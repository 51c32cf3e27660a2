use crate::arg;
use crate::{Message, MessageType};
use crate::message::MatchRule;
use crate::strings::{BusName, Interface, Member, Path};

/// Helper methods for structs representing a Signal
///
/// The code generator emits one struct per signal, implementing this trait
/// together with `AppendAll` and `ReadAll`; emitting the signal is then
/// `conn.send(args.to_emit_message(&path))` and receiving it goes through
/// `from_message` or a proxy match.
pub trait SignalArgs {
    /// D-Bus name of signal
    const NAME: &'static str;

    /// D-Bus name of interface this signal belongs to
    const INTERFACE: &'static str;

    /// Returns a message that emits the signal.
    fn to_emit_message(&self, path: &Path) -> Message where Self: arg::AppendAll {
        let mut m = Message::signal(path, &Interface::from(Self::INTERFACE), &Member::from(Self::NAME));
        arg::AppendAll::append(self, &mut arg::IterAppend::new(&mut m));
        m
    }

    /// If the message is a signal of the correct type, return its arguments, otherwise return None.
    ///
    /// This does not check sender and path of the message, which is likely relevant to you as well.
    fn from_message(m: &Message) -> Option<Self> where Self: Sized + arg::ReadAll {
        if m.msg_type() != MessageType::Signal { None }
        else if m.interface().as_ref().map(|x| &**x) != Some(Self::INTERFACE) { None }
        else if m.member().as_ref().map(|x| &**x) != Some(Self::NAME) { None }
        else {
            arg::ReadAll::read(&mut m.iter_init()).ok()
        }
    }

    /// Returns a match rule matching this signal.
    ///
    /// If sender and/or path is None, matches all senders and/or paths.
    fn match_rule<'a>(sender: Option<&'a BusName>, path: Option<&'a Path>) -> MatchRule<'a> {
        let mut m: MatchRule = Default::default();
        m.sender = sender.map(|x| x.into());
        m.path = path.map(|x| x.into());
        m.msg_type = Some(MessageType::Signal);
        m.interface = Some(Self::INTERFACE.into());
        m.member = Some(Self::NAME.into());
        m
    }

    /// Returns a string that can be sent to the bus's AddMatch method.
    ///
    /// If sender and/or path is None, matches all senders and/or paths.
    fn match_str(sender: Option<&BusName>, path: Option<&Path>) -> String {
        Self::match_rule(sender, path).match_str()
    }
}

#[cfg(test)]
mod test {
    use super::SignalArgs;
    use crate::arg::{AppendAll, IterAppend, Iter, ReadAll, TypeMismatchError};
    use crate::{Message, MessageType};

    struct NameLost {
        name: String,
    }

    impl AppendAll for NameLost {
        fn append(&self, i: &mut IterAppend) { i.append(self.name.clone()); }
    }

    impl ReadAll for NameLost {
        fn read(i: &mut Iter) -> Result<Self, TypeMismatchError> {
            Ok(NameLost { name: i.read()? })
        }
    }

    impl SignalArgs for NameLost {
        const NAME: &'static str = "NameLost";
        const INTERFACE: &'static str = "org.freedesktop.DBus";
    }

    #[test]
    fn emit_and_parse() {
        let nl = NameLost { name: "com.example.hello".into() };
        let msg = nl.to_emit_message(&"/org/freedesktop/DBus".into());
        assert_eq!(msg.msg_type(), MessageType::Signal);
        assert_eq!(&*msg.signature(), "s");
        let nl2 = NameLost::from_message(&msg).unwrap();
        assert_eq!(nl2.name, "com.example.hello");

        let other = Message::new_signal("/org/freedesktop/DBus", "org.freedesktop.DBus", "NameAcquired")
            .unwrap().append1("com.example.hello");
        assert!(NameLost::from_message(&other).is_none());
    }

    #[test]
    fn match_str() {
        let s = NameLost::match_str(Some(&"org.freedesktop.DBus".into()), None);
        assert_eq!(s, "type='signal',sender='org.freedesktop.DBus',interface='org.freedesktop.DBus',member='NameLost'");
    }
}
