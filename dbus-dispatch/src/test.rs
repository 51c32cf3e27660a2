use crate::*;
use dbus_bind::arg::{PropMap, Variant};
use dbus_bind::{Message, MessageType};
use std::cell::RefCell;
use std::collections::HashMap;

#[test]
fn test_send() {
    fn is_send<T: Send>(_: &T) {}
    let c = ObjectServer::new();
    is_send(&c);

    let ctx = Context::new(Message::new_method_call("a.b", "/", "a.b", "c").unwrap()).unwrap();
    is_send(&ctx);
}

fn dispatch_helper2(os: &mut ObjectServer, mut msg: Message) -> Vec<Message> {
    msg.set_serial(57);
    let r = RefCell::new(vec!());
    os.handle_message(msg, &r).unwrap();
    r.into_inner()
}

fn dispatch_helper(os: &mut ObjectServer, msg: Message) -> Message {
    let mut r = dispatch_helper2(os, msg);
    assert_eq!(r.len(), 1);
    r[0].as_result().unwrap();
    r.into_iter().next().unwrap()
}

fn dispatch_expect_err(os: &mut ObjectServer, msg: Message, name: &str) -> Message {
    let mut r = dispatch_helper2(os, msg);
    assert_eq!(r.len(), 1);
    let e = r[0].as_result().unwrap_err();
    assert_eq!(e.name(), Some(name));
    r.into_iter().next().unwrap()
}

struct Score(u16, u32);

fn score_iface(os: &mut ObjectServer) -> IfaceToken<Score> {
    os.register("com.example.dbusrs.dispatch.score", |b: &mut IfaceBuilder<Score>| {
        b.method("UpdateScore", ("change",), ("new_score", "call_times"), |_, score, (change,): (u16,)| {
            score.0 += change;
            score.1 += 1;
            Ok((score.0, score.1))
        });
        b.property::<u16, _>("Score")
            .get(|_, score| Ok(score.0))
            .set(|_, score, val| { score.0 = val; Ok(()) });
        b.signal::<(u16,), _>("ScoreChanged", ("new_score",));
    })
}

#[test]
fn descriptor_lookups() {
    let mut os = ObjectServer::new();
    let token = score_iface(&mut os);
    let info = os.iface_info(token);
    assert_eq!(&**info.name(), "com.example.dbusrs.dispatch.score");

    let m = info.lookup_method("UpdateScore").unwrap();
    assert_eq!(m.input_signature(), "q");
    assert_eq!(m.output_signature(), "qu");
    assert_eq!(m.input_args()[0].name(), Some("change"));

    let p = info.lookup_property("Score").unwrap();
    assert_eq!(&**p.signature(), "q");
    assert_eq!(p.access(), Access::ReadWrite);

    let z = info.lookup_signal("ScoreChanged").unwrap();
    assert_eq!(z.signature(), "q");

    assert!(info.lookup_method("Missing").is_none());
    assert!(info.lookup_property("Missing").is_none());
    assert!(info.lookup_signal("Missing").is_none());
}

#[test]
fn score() {
    let mut os = ObjectServer::new();
    let iface = score_iface(&mut os);
    os.insert("/", &[iface], Score(2, 0));

    let msg = Message::call_with_args("com.example.dbusrs.dispatch.score", "/",
        "org.freedesktop.DBus.Properties", "Set", ("com.example.dbusrs.dispatch.score", "Score", Variant(7u16)));
    let r = dispatch_helper(&mut os, msg);
    assert_eq!(r.msg_type(), MessageType::MethodReturn);
    assert_eq!(r.get_reply_serial().unwrap(), 57);
    assert_eq!(&*r.signature(), "");

    let msg = Message::call_with_args("com.example.dbusrs.dispatch.score", "/",
        "org.freedesktop.DBus.Properties", "Get", ("com.example.dbusrs.dispatch.score", "Score"));
    let r = dispatch_helper(&mut os, msg);
    assert_eq!(&*r.signature(), "v");
    let q: Variant<u16> = r.read1().unwrap();
    assert_eq!(q.0, 7);

    let msg = Message::call_with_args("com.example.dbusrs.dispatch.score", "/",
        "com.example.dbusrs.dispatch.score", "UpdateScore", (5u16,));
    let r = dispatch_helper(&mut os, msg);
    let (new_score, call_times): (u16, u32) = r.read2().unwrap();
    assert_eq!(new_score, 12);
    assert_eq!(call_times, 1);

    let msg = Message::call_with_args("com.example.dbusrs.dispatch.score", "/",
        "org.freedesktop.DBus.Properties", "GetAll", ("com.example.dbusrs.dispatch.score",));
    let r = dispatch_helper(&mut os, msg);
    let q: PropMap = r.read1().unwrap();
    assert_eq!(q.get("Score").unwrap().0.as_u64(), Some(12));
    assert_eq!(q.len(), 1);
}

#[test]
fn error_taxonomy() {
    let mut os = ObjectServer::new();
    let iface = score_iface(&mut os);
    os.insert("/score", &[iface], Score(0, 0));

    // Unknown path terminates like an unknown member.
    let msg = Message::call_with_args("com.example.dbusrs.dispatch.score", "/nothere",
        "com.example.dbusrs.dispatch.score", "UpdateScore", (5u16,));
    dispatch_expect_err(&mut os, msg, "org.freedesktop.DBus.Error.UnknownMethod");

    let msg = Message::call_with_args("com.example.dbusrs.dispatch.score", "/score",
        "com.example.dbusrs.dispatch.wrong", "UpdateScore", (5u16,));
    dispatch_expect_err(&mut os, msg, "org.freedesktop.DBus.Error.UnknownInterface");

    let msg = Message::call_with_args("com.example.dbusrs.dispatch.score", "/score",
        "com.example.dbusrs.dispatch.score", "NoSuchMethod", (5u16,));
    dispatch_expect_err(&mut os, msg, "org.freedesktop.DBus.Error.UnknownMethod");

    // Wrong argument type, missing argument, surplus argument.
    let msg = Message::call_with_args("com.example.dbusrs.dispatch.score", "/score",
        "com.example.dbusrs.dispatch.score", "UpdateScore", ("five",));
    let r = dispatch_expect_err(&mut os, msg, "org.freedesktop.DBus.Error.InvalidArgs");
    let text: &str = r.read1().unwrap();
    assert!(text.contains("change"), "{}", text);

    let msg = Message::call_with_args("com.example.dbusrs.dispatch.score", "/score",
        "com.example.dbusrs.dispatch.score", "UpdateScore", ());
    dispatch_expect_err(&mut os, msg, "org.freedesktop.DBus.Error.InvalidArgs");

    let msg = Message::call_with_args("com.example.dbusrs.dispatch.score", "/score",
        "com.example.dbusrs.dispatch.score", "UpdateScore", (5u16, 1u8));
    dispatch_expect_err(&mut os, msg, "org.freedesktop.DBus.Error.InvalidArgs");

    // Unknown property, and a write to a property that cannot be written.
    let msg = Message::call_with_args("com.example.dbusrs.dispatch.score", "/score",
        "org.freedesktop.DBus.Properties", "Get", ("com.example.dbusrs.dispatch.score", "Scores"));
    dispatch_expect_err(&mut os, msg, "org.freedesktop.DBus.Error.UnknownProperty");

    // A variant whose inner signature does not match the property.
    let msg = Message::call_with_args("com.example.dbusrs.dispatch.score", "/score",
        "org.freedesktop.DBus.Properties", "Set", ("com.example.dbusrs.dispatch.score", "Score", Variant("nope")));
    dispatch_expect_err(&mut os, msg, "org.freedesktop.DBus.Error.InvalidArgs");
}

#[test]
fn read_only_property() {
    struct Lamp { on: bool }
    let mut os = ObjectServer::new();
    let token = os.register("com.example.dbusrs.lamp", |b: &mut IfaceBuilder<Lamp>| {
        b.property::<bool, _>("On").get(|_, lamp| Ok(lamp.on));
    });
    os.insert("/lamp", &[token], Lamp { on: true });

    let msg = Message::call_with_args("com.example.dbusrs.lamp", "/lamp",
        "org.freedesktop.DBus.Properties", "Set", ("com.example.dbusrs.lamp", "On", Variant(false)));
    let r = dispatch_expect_err(&mut os, msg, "org.freedesktop.DBus.Error.InvalidArgs");
    let text: &str = r.read1().unwrap();
    assert!(text.contains("read-only"), "{}", text);
}

#[test]
fn deferred_method() {
    struct Sleeper { pending: Option<ReplyHandle<(String,)>> }

    let mut os = ObjectServer::new();
    let token = os.register("com.example.dbusrs.sleeper", |b: &mut IfaceBuilder<Sleeper>| {
        b.method_deferred("Sleep", ("input",), ("output",), |handle, sleeper: &mut Sleeper, (_input,): (String,)| {
            sleeper.pending = Some(handle);
        });
    });
    os.insert("/", &[token], Sleeper { pending: None });

    let mut msg = Message::call_with_args("com.example.dbusrs.sleeper", "/",
        "com.example.dbusrs.sleeper", "Sleep", ("zzz",));
    msg.set_serial(77);
    let sent = RefCell::new(vec!());
    os.handle_message(msg, &sent).unwrap();
    // No reply yet; the handler kept the call.
    assert_eq!(sent.borrow().len(), 0);

    let handle = os.data_mut::<Sleeper>(&"/".into()).unwrap().pending.take().unwrap();
    handle.reply(&sent, Ok(("good morning".into(),))).unwrap();
    let mut r = sent.into_inner();
    assert_eq!(r.len(), 1);
    assert_eq!(r[0].get_reply_serial(), Some(77));
    let s: &str = r[0].as_result().unwrap().read1().unwrap();
    assert_eq!(s, "good morning");
}

#[test]
fn deferred_method_error_reply() {
    struct Sleeper { pending: Option<ReplyHandle<(String,)>> }

    let mut os = ObjectServer::new();
    let token = os.register("com.example.dbusrs.sleeper", |b: &mut IfaceBuilder<Sleeper>| {
        b.method_deferred("Sleep", ("input",), ("output",), |handle, sleeper: &mut Sleeper, (_,): (String,)| {
            sleeper.pending = Some(handle);
        });
    });
    os.insert("/", &[token], Sleeper { pending: None });

    let msg = Message::call_with_args("com.example.dbusrs.sleeper", "/",
        "com.example.dbusrs.sleeper", "Sleep", ("zzz",));
    let sent = RefCell::new(vec!());
    os.handle_message(msg, &sent).unwrap();

    let handle = os.data_mut::<Sleeper>(&"/".into()).unwrap().pending.take().unwrap();
    handle.reply(&sent, Err(("com.example.dbusrs.sleeper.Sleep.Insomnia", "Could not sleep").into())).unwrap();
    let mut r = sent.into_inner();
    assert_eq!(r.len(), 1);
    let e = r[0].as_result().unwrap_err();
    assert_eq!(e.name(), Some("com.example.dbusrs.sleeper.Sleep.Insomnia"));
    assert_eq!(e.message(), Some("Could not sleep"));
}

#[test]
fn no_reply_expected() {
    let mut os = ObjectServer::new();
    let iface = score_iface(&mut os);
    os.insert("/", &[iface], Score(2, 0));

    let mut msg = Message::call_with_args("com.example.dbusrs.dispatch.score", "/",
        "com.example.dbusrs.dispatch.score", "UpdateScore", (5u16,));
    msg.set_no_reply(true);
    let r = RefCell::new(vec!());
    os.handle_message(msg, &r).unwrap();
    assert_eq!(r.into_inner().len(), 0);
    // The handler still ran.
    assert_eq!(os.data_mut::<Score>(&"/".into()).unwrap().0, 7);
}

#[test]
fn remove_withdraws_routes() {
    let mut os = ObjectServer::new();
    let iface = score_iface(&mut os);
    os.insert("/", &[iface], Score(2, 0));

    let removed: Score = os.remove(&"/".into()).unwrap();
    assert_eq!(removed.0, 2);

    let msg = Message::call_with_args("com.example.dbusrs.dispatch.score", "/",
        "com.example.dbusrs.dispatch.score", "UpdateScore", (5u16,));
    dispatch_expect_err(&mut os, msg, "org.freedesktop.DBus.Error.UnknownMethod");
}

const INTROSPECT: &str = r###"<!DOCTYPE node PUBLIC "-//freedesktop//DTD D-BUS Object Introspection 1.0//EN"
 "http://www.freedesktop.org/standards/dbus/1.0/introspect.dtd">
<node name="/com/example/sample_object0">
  <interface name="com.example.SampleInterface0">
    <method name="Bazify">
      <arg name="bar" type="(iiu)" direction="in"/>
      <arg name="bar" type="v" direction="out"/>
    </method>
    <method name="Frobate">
      <arg name="foo" type="i" direction="in"/>
      <arg name="bar" type="s" direction="out"/>
      <arg name="baz" type="a{us}" direction="out"/>
      <annotation name="org.freedesktop.DBus.Deprecated" value="true"/>
    </method>
    <signal name="Changed">
      <arg name="new_value" type="b"/>
    </signal>
    <property name="Bar" type="y" access="readwrite"/>
  </interface>
  <interface name="org.freedesktop.DBus.Introspectable">
    <method name="Introspect">
      <arg name="xml_data" type="s" direction="out"/>
    </method>
  </interface>
  <interface name="org.freedesktop.DBus.Properties">
    <method name="Get">
      <arg name="interface_name" type="s" direction="in"/>
      <arg name="property_name" type="s" direction="in"/>
      <arg name="value" type="v" direction="out"/>
    </method>
    <method name="GetAll">
      <arg name="interface_name" type="s" direction="in"/>
      <arg name="properties" type="a{sv}" direction="out"/>
    </method>
    <method name="Set">
      <arg name="interface_name" type="s" direction="in"/>
      <arg name="property_name" type="s" direction="in"/>
      <arg name="value" type="v" direction="in"/>
    </method>
  </interface>
  <node name="another_child_of_sample_object"/>
  <node name="child_of_sample_object"/>
</node>"###;

#[test]
fn introspect() {
    let mut os = ObjectServer::new();
    let token = os.register("com.example.SampleInterface0", |b: &mut IfaceBuilder<()>| {
        b.method("Frobate", ("foo",), ("bar", "baz"), |_, _, _: (i32,)| {
            let x: HashMap<u32, String> = Default::default();
            Ok(("".to_string(), x))
        }).deprecated();
        b.method("Bazify", ("bar",), ("bar",), |_, _, _: ((i32, i32, u32),)| {
            Ok((Variant(5u8),))
        });
        b.signal::<(bool,), _>("Changed", ("new_value",));
        b.property::<u8, _>("Bar").get(|_, _| Ok(0)).set(|_, _, _| Ok(()));
    });
    os.insert("/com/example/sample_object0", &[token], ());
    os.insert("/com/example/sample_object0/child_of_sample_object", &[], ());
    os.insert("/com/example/sample_object0123", &[], ());
    os.insert("/com/example/sample_object0/another_child_of_sample_object", &[], ());

    let msg = Message::new_method_call("com.example.dbusrs.dispatch.score", "/com/example/sample_object0",
        "org.freedesktop.DBus.Introspectable", "Introspect").unwrap();
    let r = dispatch_helper(&mut os, msg);
    let xml_data: &str = r.read1().unwrap();
    assert_eq!(INTROSPECT, xml_data);
}
