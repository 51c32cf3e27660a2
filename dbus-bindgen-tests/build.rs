extern crate dbus_bindgen;

use dbus_bindgen::{generate, GenOpts, Mode};
use std::env;
use std::fs::File;
use std::io::Write;
use std::path::Path;

static NIH_TEST_XML: &str = r#"
<!DOCTYPE node PUBLIC "-//freedesktop//DTD D-BUS Object Introspection 1.0//EN"
"http://www.freedesktop.org/standards/dbus/1.0/introspect.dtd">
<node>
  <interface name="com.netsplit.Nih.Test">
    <method name="OrdinaryMethod">
      <arg name="input" type="s" direction="in"/>
      <arg name="output" type="s" direction="out"/>
    </method>
    <method name="AsyncMethod">
      <annotation name="rs.dbus.Async" value="true"/>
      <arg name="input" type="s" direction="in"/>
      <arg name="output" type="s" direction="out"/>
    </method>
    <method name="StructToStr">
      <arg name="item" type="(su)" direction="in"/>
      <arg name="output" type="s" direction="out"/>
    </method>
    <method name="Int32ArrayArrayToStr">
      <arg name="value" type="aai" direction="in"/>
      <arg name="output" type="s" direction="out"/>
    </method>
    <method name="Poke">
    </method>
    <signal name="NewString">
      <arg name="value" type="s"/>
    </signal>
    <property name="uint32" type="u" access="readwrite"/>
    <property name="version" type="s" access="read"/>
    <property name="secret" type="s" access="write"/>
  </interface>
</node>
"#;

fn write_to_file(code: &str, path: &Path) {
    let mut f = File::create(path).unwrap();
    Write::write_all(&mut f, code.as_bytes()).unwrap();
}

fn generate_code(xml: &str, opts: &GenOpts, outfile: &str) {
    let code = generate(xml, opts).unwrap();
    let out_dir = env::var("OUT_DIR").unwrap();
    let path = Path::new(&out_dir).join(outfile);
    write_to_file(&code, &path);
}

fn main() {
    let server = GenOpts {
        mode: Mode::Server,
        ..Default::default()
    };
    generate_code(NIH_TEST_XML, &server, "nih_test_server.rs");

    let client = GenOpts {
        mode: Mode::Client,
        ..Default::default()
    };
    generate_code(NIH_TEST_XML, &client, "nih_test_client.rs");
}
