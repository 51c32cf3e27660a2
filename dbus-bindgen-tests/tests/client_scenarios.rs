//! Runs the generated client stubs against the generated server dispatch
//! over the in-process bus.

use dbus_bind::blocking::Proxy;
use dbus_bind::stdintf::org_freedesktop_dbus::Properties;
use dbus_bind::{Error, SignalArgs};
use dbus_bindgen_tests::client::ComNetsplitNihTest;
use dbus_bindgen_tests::{client, server, TestBus, TestService};
use dbus_dispatch::ObjectServer;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

const IFACE: &str = "com.netsplit.Nih.Test";
const PATH: &str = "/com/netsplit/Nih/Test";

fn make_bus(uint32: u32) -> Rc<TestBus> {
    let mut os = ObjectServer::new();
    let token = server::register_com_netsplit_nih_test::<TestService>(&mut os);
    os.insert(PATH, &[token], TestService::new(uint32));
    Rc::new(TestBus::new(os))
}

fn proxy_for(bus: &Rc<TestBus>) -> Proxy<'static, Rc<TestBus>> {
    Proxy::new(IFACE, PATH, Duration::from_millis(5000), bus.clone())
}

#[test]
fn sync_method_calls() {
    let bus = make_bus(0);
    let proxy = proxy_for(&bus);

    assert_eq!(proxy.ordinary_method("she needs more of ze punishment").unwrap(),
        "she needs more of ze punishment");
    assert_eq!(proxy.struct_to_str(("Joe", 34u32)).unwrap(), "Joe 34");
    assert_eq!(proxy.int32_array_array_to_str(vec![vec![4, 8, 15, 16, 23, 42], vec![1, 1, 2, 3, 5, 8]]).unwrap(),
        "4 8 15 16 23 42\n1 1 2 3 5 8");
    proxy.poke().unwrap();
}

#[test]
fn error_replies_surface_with_their_names() {
    let bus = make_bus(0);
    let proxy = proxy_for(&bus);

    let e = proxy.ordinary_method("").unwrap_err();
    assert_eq!(e.name(), Some("com.netsplit.Nih.Test.OrdinaryMethod.EmptyInput"));
    assert_eq!(e.message(), Some("The input string was empty"));

    let e = proxy.ordinary_method("invalid").unwrap_err();
    assert_eq!(e.name(), Some("org.freedesktop.DBus.Error.Failed"));
    assert_eq!(e.message(), Some("Invalid argument"));
}

#[test]
fn properties_through_the_generated_stubs() {
    let bus = make_bus(1048576);
    let proxy = proxy_for(&bus);

    assert_eq!(proxy.uint32().unwrap(), 1048576);
    proxy.set_uint32(42).unwrap();
    assert_eq!(proxy.uint32().unwrap(), 42);

    let e = proxy.set_uint32(0).unwrap_err();
    assert_eq!(e.name(), Some("com.netsplit.Nih.Test.UInt32.Zero"));

    assert_eq!(proxy.version().unwrap(), "1.0");
    proxy.set_secret("hunter2".to_string()).unwrap();
    assert_eq!(bus.with_server(|os| os.data_mut::<TestService>(&PATH.into()).unwrap().secret.clone()),
        "hunter2");

    // Access modes gate the raw Properties interface as well.
    let e = Properties::set(&proxy, IFACE, "version", "2.0").unwrap_err();
    assert_eq!(e.name(), Some("org.freedesktop.DBus.Error.InvalidArgs"));
    let e: Result<String, Error> = Properties::get(&proxy, IFACE, "secret");
    assert_eq!(e.unwrap_err().name(), Some("org.freedesktop.DBus.Error.InvalidArgs"));
}

#[test]
fn introspection_lists_the_generated_interface() {
    use dbus_bind::stdintf::org_freedesktop_dbus::Introspectable;

    let bus = make_bus(0);
    let proxy = proxy_for(&bus);
    let xml = proxy.introspect().unwrap();
    assert!(xml.contains("<interface name=\"com.netsplit.Nih.Test\">"));
    assert!(xml.contains("<method name=\"OrdinaryMethod\">"));
    assert!(xml.contains("<signal name=\"NewString\">"));
    assert!(xml.contains("<property name=\"uint32\" type=\"u\" access=\"readwrite\"/>"));
    assert!(xml.contains("<property name=\"secret\" type=\"s\" access=\"write\"/>"));
}

#[test]
fn signals_reach_registered_handlers() {
    let bus = make_bus(0);
    let proxy = proxy_for(&bus);

    let received: Rc<RefCell<Vec<String>>> = Default::default();
    let r2 = received.clone();
    proxy.match_signal(move |s: client::ComNetsplitNihTestNewString| {
        r2.borrow_mut().push(s.value);
        true
    }).unwrap();

    let sig = server::ComNetsplitNihTestNewString { value: "hello".into() };
    dbus_bind::channel::Sender::send(&*bus, sig.to_emit_message(&PATH.into())).unwrap();

    assert_eq!(&*received.borrow(), &["hello".to_string()]);

    // Signals for other members pass the registered handler by.
    let other = dbus_bind::Message::new_signal(PATH, IFACE, "OtherSignal").unwrap();
    dbus_bind::channel::Sender::send(&*bus, other).unwrap();
    assert_eq!(received.borrow().len(), 1);
}

#[test]
fn async_client_calls_complete_through_callbacks() {
    let bus = make_bus(0);
    let proxy = proxy_for(&bus);

    let result: Rc<RefCell<Option<Result<(String,), Error>>>> = Default::default();
    let r2 = result.clone();
    client::ComNetsplitNihTestAsync::ordinary_method(&proxy, "ping", move |r| {
        *r2.borrow_mut() = Some(r);
    }).unwrap();
    let got = result.borrow_mut().take().expect("callback should have run");
    assert_eq!(got.unwrap().0, "ping");

    // An error reply arrives through the same path.
    let r2 = result.clone();
    client::ComNetsplitNihTestAsync::ordinary_method(&proxy, "", move |r| {
        *r2.borrow_mut() = Some(r);
    }).unwrap();
    let got = result.borrow_mut().take().expect("callback should have run");
    assert_eq!(got.unwrap_err().name(), Some("com.netsplit.Nih.Test.OrdinaryMethod.EmptyInput"));
}

#[test]
fn deferred_server_method_end_to_end() {
    let bus = make_bus(0);
    let proxy = proxy_for(&bus);

    let result: Rc<RefCell<Option<Result<(String,), Error>>>> = Default::default();
    let r2 = result.clone();
    client::ComNetsplitNihTestAsync::async_method(&proxy, "wait for it", move |r| {
        *r2.borrow_mut() = Some(r);
    }).unwrap();
    // The server handler kept the reply handle; nothing has arrived yet.
    assert!(result.borrow().is_none());

    let handle = bus.with_server(|os| {
        os.data_mut::<TestService>(&PATH.into()).unwrap().pending.take().unwrap()
    });
    handle.reply(&*bus, Ok(("done waiting".into(),))).unwrap();

    let got = result.borrow_mut().take().expect("callback should have run");
    assert_eq!(got.unwrap().0, "done waiting");
}
