//! Drives the generated server dispatchers directly with method call
//! messages and checks the replies.

use dbus_bind::arg::Variant;
use dbus_bind::{Message, Path, SignalArgs};
use dbus_bindgen_tests::{server, TestService};
use dbus_dispatch::ObjectServer;
use std::cell::RefCell;

const IFACE: &str = "com.netsplit.Nih.Test";
const PATH: &str = "/com/netsplit/Nih/Test";

fn make_server(uint32: u32) -> ObjectServer {
    let mut os = ObjectServer::new();
    let token = server::register_com_netsplit_nih_test::<TestService>(&mut os);
    os.insert(PATH, &[token], TestService::new(uint32));
    os
}

fn dispatch(os: &mut ObjectServer, mut msg: Message) -> Vec<Message> {
    msg.set_serial(42);
    let r = RefCell::new(vec!());
    os.handle_message(msg, &r).unwrap();
    r.into_inner()
}

fn dispatch_one(os: &mut ObjectServer, msg: Message) -> Message {
    let mut r = dispatch(os, msg);
    assert_eq!(r.len(), 1);
    r.pop().unwrap()
}

fn call<A: dbus_bind::arg::AppendAll>(member: &str, args: A) -> Message {
    Message::call_with_args(IFACE, PATH, IFACE, member, args)
}

#[test]
fn ordinary_method_echoes() {
    let mut os = make_server(0);
    let mut r = dispatch_one(&mut os, call("OrdinaryMethod", ("she needs more of ze punishment",)));
    assert_eq!(&*r.signature(), "s");
    let out: &str = r.as_result().unwrap().read1().unwrap();
    assert_eq!(out, "she needs more of ze punishment");
}

#[test]
fn empty_input_is_a_domain_error() {
    let mut os = make_server(0);
    let mut r = dispatch_one(&mut os, call("OrdinaryMethod", ("",)));
    let e = r.as_result().unwrap_err();
    assert_eq!(e.name(), Some("com.netsplit.Nih.Test.OrdinaryMethod.EmptyInput"));
}

#[test]
fn generic_errors_map_to_failed() {
    let mut os = make_server(0);
    let mut r = dispatch_one(&mut os, call("OrdinaryMethod", ("invalid",)));
    let e = r.as_result().unwrap_err();
    assert_eq!(e.name(), Some("org.freedesktop.DBus.Error.Failed"));
    assert_eq!(e.message(), Some("Invalid argument"));
}

#[test]
fn type_mismatch_never_reaches_the_handler() {
    let mut os = make_server(0);
    let mut r = dispatch_one(&mut os, call("OrdinaryMethod", (Path::from("/x"),)));
    let e = r.as_result().unwrap_err();
    assert_eq!(e.name(), Some("org.freedesktop.DBus.Error.InvalidArgs"));
    assert_eq!(os.data_mut::<TestService>(&PATH.into()).unwrap().calls, 0);
}

#[test]
fn argument_count_is_strict() {
    let mut os = make_server(0);

    let mut r = dispatch_one(&mut os, call("OrdinaryMethod", ()));
    assert_eq!(r.as_result().unwrap_err().name(), Some("org.freedesktop.DBus.Error.InvalidArgs"));

    let mut r = dispatch_one(&mut os, call("OrdinaryMethod", ("x", 5u32)));
    assert_eq!(r.as_result().unwrap_err().name(), Some("org.freedesktop.DBus.Error.InvalidArgs"));

    assert_eq!(os.data_mut::<TestService>(&PATH.into()).unwrap().calls, 0);
}

#[test]
fn struct_to_str() {
    let mut os = make_server(0);
    let mut r = dispatch_one(&mut os, call("StructToStr", (("Joe", 34u32),)));
    assert_eq!(&*r.signature(), "s");
    let out: &str = r.as_result().unwrap().read1().unwrap();
    assert_eq!(out, "Joe 34");
}

#[test]
fn int32_array_array_to_str() {
    let mut os = make_server(0);
    let aai = vec![vec![4, 8, 15, 16, 23, 42], vec![1, 1, 2, 3, 5, 8]];
    let mut r = dispatch_one(&mut os, call("Int32ArrayArrayToStr", (aai,)));
    let out: &str = r.as_result().unwrap().read1().unwrap();
    assert_eq!(out, "4 8 15 16 23 42\n1 1 2 3 5 8");
}

#[test]
fn void_method_has_empty_reply() {
    let mut os = make_server(0);
    let mut r = dispatch_one(&mut os, call("Poke", ()));
    r.as_result().unwrap();
    assert_eq!(&*r.signature(), "");
}

#[test]
fn property_get_wraps_in_variant() {
    let mut os = make_server(1048576);
    let msg = Message::call_with_args(IFACE, PATH, "org.freedesktop.DBus.Properties", "Get",
        (IFACE, "uint32"));
    let mut r = dispatch_one(&mut os, msg);
    assert_eq!(&*r.signature(), "v");
    let v: Variant<u32> = r.as_result().unwrap().read1().unwrap();
    assert_eq!(v.0, 1048576);
}

#[test]
fn property_set_zero_is_rejected() {
    let mut os = make_server(1048576);
    let msg = Message::call_with_args(IFACE, PATH, "org.freedesktop.DBus.Properties", "Set",
        (IFACE, "uint32", Variant(0u32)));
    let mut r = dispatch_one(&mut os, msg);
    let e = r.as_result().unwrap_err();
    assert_eq!(e.name(), Some("com.netsplit.Nih.Test.UInt32.Zero"));
    assert_eq!(e.message(), Some("The value was zero"));

    let msg = Message::call_with_args(IFACE, PATH, "org.freedesktop.DBus.Properties", "Set",
        (IFACE, "uint32", Variant(99u32)));
    let mut r = dispatch_one(&mut os, msg);
    r.as_result().unwrap();
    assert_eq!(&*r.signature(), "");
    assert_eq!(os.data_mut::<TestService>(&PATH.into()).unwrap().uint32, 99);
}

#[test]
fn property_access_is_gated() {
    let mut os = make_server(0);

    let msg = Message::call_with_args(IFACE, PATH, "org.freedesktop.DBus.Properties", "Set",
        (IFACE, "version", Variant("2.0")));
    let mut r = dispatch_one(&mut os, msg);
    assert_eq!(r.as_result().unwrap_err().name(), Some("org.freedesktop.DBus.Error.InvalidArgs"));

    let msg = Message::call_with_args(IFACE, PATH, "org.freedesktop.DBus.Properties", "Get",
        (IFACE, "secret"));
    let mut r = dispatch_one(&mut os, msg);
    assert_eq!(r.as_result().unwrap_err().name(), Some("org.freedesktop.DBus.Error.InvalidArgs"));
}

#[test]
fn get_all_concatenates_readable_properties() {
    let mut os = make_server(7);
    let msg = Message::call_with_args(IFACE, PATH, "org.freedesktop.DBus.Properties", "GetAll",
        (IFACE,));
    let mut r = dispatch_one(&mut os, msg);
    let map: dbus_bind::arg::PropMap = r.as_result().unwrap().read1().unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map.get("uint32").unwrap().0.as_u64(), Some(7));
    assert_eq!(map.get("version").unwrap().0.as_str(), Some("1.0"));
    assert!(map.get("secret").is_none());
}

#[test]
fn deferred_method_replies_later_exactly_once() {
    let mut os = make_server(0);
    let sent = RefCell::new(vec!());
    let mut msg = call("AsyncMethod", ("stay awhile",));
    msg.set_serial(99);
    os.handle_message(msg, &sent).unwrap();
    assert_eq!(sent.borrow().len(), 0);

    let svc = os.data_mut::<TestService>(&PATH.into()).unwrap();
    assert_eq!(svc.last_async_input.as_deref(), Some("stay awhile"));
    let input = svc.last_async_input.take().unwrap();
    let handle = svc.pending.take().unwrap();

    // Replying consumes the handle; a second reply does not typecheck.
    handle.reply(&sent, Ok((input,))).unwrap();
    let mut r = sent.into_inner();
    assert_eq!(r.len(), 1);
    assert_eq!(r[0].get_reply_serial(), Some(99));
    assert_eq!(&*r[0].signature(), "s");
    let out: &str = r[0].as_result().unwrap().read1().unwrap();
    assert_eq!(out, "stay awhile");
}

#[test]
fn deferred_method_error_reply() {
    let mut os = make_server(0);
    let sent = RefCell::new(vec!());
    let mut msg = call("AsyncMethod", ("x",));
    msg.set_serial(7);
    os.handle_message(msg, &sent).unwrap();

    let handle = os.data_mut::<TestService>(&PATH.into()).unwrap().pending.take().unwrap();
    handle.reply(&sent, Err(("com.netsplit.Nih.Test.AsyncMethod.Cancelled", "The call was cancelled").into())).unwrap();
    let mut r = sent.into_inner();
    assert_eq!(r.len(), 1);
    let e = r[0].as_result().unwrap_err();
    assert_eq!(e.name(), Some("com.netsplit.Nih.Test.AsyncMethod.Cancelled"));
}

#[test]
fn signal_struct_emits_well_formed_messages() {
    let s = server::ComNetsplitNihTestNewString { value: "she needs more".into() };
    let msg = s.to_emit_message(&PATH.into());
    assert_eq!(msg.msg_type(), dbus_bind::MessageType::Signal);
    assert_eq!(msg.interface().as_deref(), Some(IFACE));
    assert_eq!(msg.member().as_deref(), Some("NewString"));
    assert_eq!(&*msg.signature(), "s");
    let back = server::ComNetsplitNihTestNewString::from_message(&msg).unwrap();
    assert_eq!(back.value, "she needs more");
}
