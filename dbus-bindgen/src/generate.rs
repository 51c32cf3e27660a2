use std::collections::HashSet;
use std::{error, io};

mod types;

use self::types::{Arg, Intf, Method, Prop, Signal};
use self::types::{make_camel, make_fn_name, make_snake, make_type};

type GenResult<T> = Result<T, Box<dyn error::Error>>;

/// Which side of the connection to generate bindings for.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Mode {
    /// Dispatch glue: a trait for the object implementation and a register
    /// function wiring it into an ObjectServer.
    Server,
    /// Stubs: traits implemented for the blocking proxy, plus an
    /// asynchronous companion trait.
    Client,
}

/// Code generation options.
#[derive(Clone, Debug)]
pub struct GenOpts {
    /// Which side to generate for
    pub mode: Mode,
    /// Name of the runtime crate (used for imports)
    pub bindcrate: String,
    /// Name of the dispatch crate (used for imports, server mode only)
    pub dispatchcrate: String,
    /// Replaces the interface-derived name of generated items
    pub prefix: Option<String>,
    /// Removes a prefix from interface names
    pub skipprefix: Option<String>,
    /// If set, only matching interfaces are generated
    pub interfaces: Option<HashSet<String>>,
    /// The command line used to call this program, for the file header
    pub command_line: String,
}

impl ::std::default::Default for GenOpts {
    fn default() -> Self { GenOpts {
        mode: Mode::Client,
        bindcrate: "dbus_bind".into(),
        dispatchcrate: "dbus_dispatch".into(),
        prefix: None,
        skipprefix: None,
        interfaces: None,
        command_line: String::new(),
    }}
}

fn find_attr<'a>(a: &'a [xml::attribute::OwnedAttribute], n: &str) -> GenResult<&'a str> {
    a.iter().find(|q| q.name.local_name == n).map(|f| &*f.value).ok_or_else(|| "attribute not found".into())
}

// Tuple literals of argument names, e g `("input", "output", )`, matching the
// arity of the argument list so they fit the builder's `strs` parameters.
fn names_tuple(args: &[Arg]) -> String {
    if args.is_empty() { return "()".into() }
    let mut r = String::from("(");
    for a in args { r += &format!("{:?}, ", a.name); }
    r + ")"
}

fn types_tuple(args: &[Arg]) -> GenResult<String> {
    if args.is_empty() { return Ok("()".into()) }
    let mut r = String::from("(");
    for a in args { r += &format!("{}, ", a.typename_norefs()?); }
    Ok(r + ")")
}

fn varnames(args: &[Arg]) -> String {
    let v: Vec<String> = args.iter().map(|a| a.varname()).collect();
    v.join(", ")
}

// The declared result type of a handler or stub: (), the single value, or a tuple.
fn result_type(args: &[Arg]) -> GenResult<String> {
    Ok(match args.len() {
        0 => "()".into(),
        1 => args[0].typename_norefs()?,
        _ => {
            let v: GenResult<Vec<String>> = args.iter().map(|a| a.typename_norefs()).collect();
            format!("({})", v?.join(", "))
        }
    })
}

fn write_server_intf(s: &mut String, i: &Intf, opts: &GenOpts) -> GenResult<()> {
    let iname = make_camel(&i.shortname);
    *s += &format!("\npub trait {} {{\n", iname);
    for m in &i.methods {
        let mut args = String::new();
        for a in &m.iargs {
            args += &format!(", {}: {}", a.varname(), a.typename_norefs()?);
        }
        if m.is_async() {
            *s += &format!("    fn {}(&mut self{}, reply: {}::ReplyHandle<{}>);\n",
                m.fn_name, args, opts.dispatchcrate, types_tuple(&m.oargs)?);
        } else {
            *s += &format!("    fn {}(&mut self{}) -> Result<{}, dbus::MethodErr>;\n",
                m.fn_name, args, result_type(&m.oargs)?);
        }
    }
    for p in &i.props {
        if p.can_get() {
            *s += &format!("    fn {}(&mut self) -> Result<{}, dbus::MethodErr>;\n",
                p.get_fn_name, p.typename()?);
        }
        if p.can_set() {
            *s += &format!("    fn {}(&mut self, value: {}) -> Result<(), dbus::MethodErr>;\n",
                p.set_fn_name, p.typename()?);
        }
    }
    *s += "}\n";

    *s += &format!("\npub fn register_{}<T>(os: &mut {}::ObjectServer) -> {}::IfaceToken<T>\n",
        make_snake(&i.shortname, false), opts.dispatchcrate, opts.dispatchcrate);
    *s += &format!("where T: {} + Send + 'static\n{{\n", iname);
    *s += &format!("    os.register({:?}, |b: &mut {}::IfaceBuilder<T>| {{\n", i.origname, opts.dispatchcrate);
    for m in &i.methods {
        let ia_pat = if m.iargs.is_empty() { "_: ()".to_string() } else {
            let names: Vec<String> = m.iargs.iter().map(|a| a.varname()).collect();
            format!("({}, ): {}", names.join(", "), types_tuple(&m.iargs)?)
        };
        if m.is_async() {
            *s += &format!("        b.method_deferred({:?}, {}, {}, |reply, t, {}| {{\n",
                m.name, names_tuple(&m.iargs), names_tuple(&m.oargs), ia_pat);
            let mut call_args = varnames(&m.iargs);
            if !call_args.is_empty() { call_args += ", "; }
            *s += &format!("            t.{}({}reply);\n", m.fn_name, call_args);
            *s += "        });\n";
        } else {
            *s += &format!("        b.method({:?}, {}, {}, |_, t, {}| {{\n",
                m.name, names_tuple(&m.iargs), names_tuple(&m.oargs), ia_pat);
            let call = format!("t.{}({})", m.fn_name, varnames(&m.iargs));
            *s += &match m.oargs.len() {
                1 => format!("            {}.map(|x| (x, ))\n", call),
                _ => format!("            {}\n", call),
            };
            *s += "        });\n";
        }
        for (an, av) in annotations_sorted(&m.annotations) {
            if an == types::ASYNC_ANNOTATION { continue; }
            *s += &format!("        b.annotate({:?}, {:?});\n", an, av);
        }
    }
    for p in &i.props {
        *s += &format!("        b.property::<{}, _>({:?})", p.typename()?, p.name);
        if p.can_get() {
            *s += &format!("\n            .get(|_, t| t.{}())", p.get_fn_name);
        }
        if p.can_set() {
            *s += &format!("\n            .set(|_, t, value| t.{}(value))", p.set_fn_name);
        }
        for (an, av) in annotations_sorted(&p.annotations) {
            *s += &format!("\n            .annotate({:?}, {:?})", an, av);
        }
        *s += ";\n";
    }
    for ss in &i.signals {
        *s += &format!("        b.signal::<{}, _>({:?}, {});\n",
            types_tuple(&ss.args)?, ss.name, names_tuple(&ss.args));
    }
    *s += "    })\n";
    *s += "}\n";
    Ok(())
}

fn annotations_sorted(anns: &std::collections::HashMap<String, String>) -> Vec<(String, String)> {
    let mut v: Vec<(String, String)> = anns.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    v.sort_unstable();
    v
}

fn write_client_intf(s: &mut String, i: &Intf) -> GenResult<()> {
    let iname = make_camel(&i.shortname);
    *s += &format!("\npub trait {} {{\n", iname);
    for m in &i.methods {
        let mut args = String::new();
        for a in &m.iargs {
            args += &format!(", {}: {}", a.varname(), a.typename()?);
        }
        *s += &format!("    fn {}(&self{}) -> Result<{}, dbus::Error>;\n",
            m.fn_name, args, result_type(&m.oargs)?);
    }
    for p in &i.props {
        if p.can_get() {
            *s += &format!("    fn {}(&self) -> Result<{}, dbus::Error>;\n",
                p.get_fn_name, p.typename()?);
        }
        if p.can_set() {
            *s += &format!("    fn {}(&self, value: {}) -> Result<(), dbus::Error>;\n",
                p.set_fn_name, p.typename()?);
        }
    }
    *s += "}\n";

    *s += &format!("\nimpl<'a, T: blocking::BlockingSender, C: ::std::ops::Deref<Target=T>> {} for blocking::Proxy<'a, C> {{\n", iname);
    for m in &i.methods {
        let mut args = String::new();
        for a in &m.iargs {
            args += &format!(", {}: {}", a.varname(), a.typename()?);
        }
        *s += &format!("\n    fn {}(&self{}) -> Result<{}, dbus::Error> {{\n",
            m.fn_name, args, result_type(&m.oargs)?);
        let call = format!("self.method_call({:?}, {:?}, ({}))",
            i.origname, m.name, if m.iargs.is_empty() { String::new() } else { format!("{}, ", varnames(&m.iargs)) });
        *s += &match m.oargs.len() {
            0 => format!("        {}\n", call),
            1 => format!("        {}\n            .map(|r: ({}, )| r.0)\n", call, m.oargs[0].typename_norefs()?),
            _ => format!("        {}\n", call),
        };
        *s += "    }\n";
    }
    for p in &i.props {
        if p.can_get() {
            *s += &format!("\n    fn {}(&self) -> Result<{}, dbus::Error> {{\n",
                p.get_fn_name, p.typename()?);
            *s += &format!("        <Self as dbus::stdintf::org_freedesktop_dbus::Properties>::get(self, {:?}, {:?})\n",
                i.origname, p.name);
            *s += "    }\n";
        }
        if p.can_set() {
            *s += &format!("\n    fn {}(&self, value: {}) -> Result<(), dbus::Error> {{\n",
                p.set_fn_name, p.typename()?);
            *s += &format!("        <Self as dbus::stdintf::org_freedesktop_dbus::Properties>::set(self, {:?}, {:?}, value)\n",
                i.origname, p.name);
            *s += "    }\n";
        }
    }
    *s += "}\n";
    Ok(())
}

fn write_client_async_intf(s: &mut String, i: &Intf) -> GenResult<()> {
    let iname = make_camel(&i.shortname);
    *s += &format!("\npub trait {}Async {{\n", iname);
    for m in &i.methods {
        let mut args = String::new();
        for a in &m.iargs {
            args += &format!(", {}: {}", a.varname(), a.typename()?);
        }
        *s += &format!("    fn {}<F: FnOnce(Result<{}, dbus::Error>) + 'static>(&self{}, on_reply: F) -> Result<u32, dbus::Error>;\n",
            m.fn_name, types_tuple(&m.oargs)?, args);
    }
    *s += "}\n";

    *s += &format!("\nimpl<'a, T: dbus::channel::AsyncSender, C: ::std::ops::Deref<Target=T>> {}Async for blocking::Proxy<'a, C> {{\n", iname);
    for m in &i.methods {
        let mut args = String::new();
        for a in &m.iargs {
            args += &format!(", {}: {}", a.varname(), a.typename()?);
        }
        *s += &format!("\n    fn {}<F: FnOnce(Result<{}, dbus::Error>) + 'static>(&self{}, on_reply: F) -> Result<u32, dbus::Error> {{\n",
            m.fn_name, types_tuple(&m.oargs)?, args);
        *s += &format!("        self.method_call_async({:?}, {:?}, ({}), on_reply)\n",
            i.origname, m.name, if m.iargs.is_empty() { String::new() } else { format!("{}, ", varnames(&m.iargs)) });
        *s += "    }\n";
    }
    *s += "}\n";
    Ok(())
}

fn write_signal(s: &mut String, i: &Intf, ss: &Signal) -> GenResult<()> {
    let structname = format!("{}{}", make_camel(&i.shortname), make_camel(&ss.name));
    *s += "\n#[derive(Debug)]\n";
    *s += &format!("pub struct {} {{\n", structname);
    for a in ss.args.iter() {
        *s += &format!("    pub {}: {},\n", a.varname(), a.typename_norefs()?);
    }
    *s += "}\n";

    *s += &format!("\nimpl arg::AppendAll for {} {{\n", structname);
    *s += &format!("    fn append(&self, {}: &mut arg::IterAppend) {{\n", if ss.args.is_empty() { "_" } else { "i" });
    for a in ss.args.iter() {
        *s += &format!("        arg::Append::append(&self.{}, i);\n", a.varname());
    }
    *s += "    }\n";
    *s += "}\n";

    *s += &format!("\nimpl arg::ReadAll for {} {{\n", structname);
    *s += &format!("    fn read({}: &mut arg::Iter) -> Result<Self, arg::TypeMismatchError> {{\n", if ss.args.is_empty() { "_" } else { "i" });
    *s += &format!("        Ok({} {{\n", structname);
    for a in ss.args.iter() {
        *s += &format!("            {}: i.read()?,\n", a.varname());
    }
    *s += "        })\n";
    *s += "    }\n";
    *s += "}\n";

    *s += &format!("\nimpl dbus::SignalArgs for {} {{\n", structname);
    *s += &format!("    const NAME: &'static str = {:?};\n", ss.name);
    *s += &format!("    const INTERFACE: &'static str = {:?};\n", i.origname);
    *s += "}\n";
    Ok(())
}

fn write_signals(s: &mut String, i: &Intf) -> GenResult<()> {
    for ss in i.signals.iter() { write_signal(s, i, ss)?; }
    Ok(())
}

fn write_module_header(s: &mut String, opts: &GenOpts) {
    *s += "// This code was autogenerated with dbus-bindgen-rust, see https://github.com/diwic/dbus-bindgen\n";
    if !opts.command_line.is_empty() {
        *s += &format!("// Command line was: {}\n", opts.command_line);
    }
    *s += &format!("use {} as dbus;\n", opts.bindcrate);
    *s += "use dbus::arg;\n";
    if opts.mode == Mode::Client {
        *s += "use dbus::blocking;\n";
    }
}

fn write_intf(s: &mut String, i: &Intf, opts: &GenOpts) -> GenResult<()> {
    match opts.mode {
        Mode::Server => write_server_intf(s, i, opts)?,
        Mode::Client => {
            write_client_intf(s, i)?;
            write_client_async_intf(s, i)?;
        }
    }
    write_signals(s, i)
}

/// Generates Rust bindings from introspection XML.
///
/// The output is deterministic: the same input document and options produce
/// byte-identical output, with items emitted in document order.
pub fn generate(xmldata: &str, opts: &GenOpts) -> Result<String, Box<dyn error::Error>> {
    use xml::reader::XmlEvent;
    use xml::EventReader;

    let mut s = String::new();
    write_module_header(&mut s, opts);
    let mut curintf: Option<Intf> = None;
    let mut curm: Option<Method> = None;
    let mut cursig: Option<Signal> = None;
    let mut curprop: Option<Prop> = None;
    let mut curarg: Option<(Arg, bool)> = None;
    let parser = EventReader::new(io::Cursor::new(xmldata));
    for e in parser {
        match e? {
            XmlEvent::StartElement { ref name, ref attributes, .. } if name.local_name == "interface" => {
                if curm.is_some() { Err("Start of Interface inside method")? };
                if curintf.is_some() { Err("Start of Interface inside interface")? };
                let n = find_attr(attributes, "name")?;
                let mut shortname = n;
                if let Some(ref p) = opts.skipprefix {
                    if n.len() > p.len() && n.starts_with(p) { shortname = &n[p.len()..]; }
                }
                let shortname = opts.prefix.clone().unwrap_or_else(|| shortname.into());
                curintf = Some(Intf { origname: n.into(), shortname,
                    methods: Vec::new(), signals: Vec::new(), props: Vec::new(),
                    annotations: Default::default() });
            }
            XmlEvent::EndElement { ref name } if name.local_name == "interface" => {
                if curm.is_some() { Err("End of Interface inside method")? };
                let intf = curintf.take().ok_or("End of Interface outside interface")?;
                let wanted = opts.interfaces.as_ref().map(|s| s.contains(&intf.origname)).unwrap_or(true);
                if wanted {
                    // Check all member signatures up front, so a bad type
                    // fails loudly rather than in the emitted code.
                    for m in intf.methods.iter() {
                        for a in m.iargs.iter().chain(m.oargs.iter()) { make_type(&a.typ, true)?; }
                    }
                    for p in intf.props.iter() { make_type(&p.typ, true)?; }
                    for z in intf.signals.iter() {
                        for a in z.args.iter() { make_type(&a.typ, true)?; }
                    }
                    write_intf(&mut s, &intf, opts)?;
                }
            }

            XmlEvent::StartElement { ref name, ref attributes, .. } if name.local_name == "method" => {
                if curm.is_some() { Err("Start of method inside method")? };
                if curintf.is_none() { Err("Start of method outside interface")? };
                let name: String = find_attr(attributes, "name")?.into();
                let fn_name = make_fn_name(curintf.as_ref().unwrap(), &name);
                curm = Some(Method { name, fn_name,
                    iargs: Vec::new(), oargs: Vec::new(), annotations: Default::default() });
            }
            XmlEvent::EndElement { ref name } if name.local_name == "method" => {
                let m = curm.take().ok_or("End of method outside method")?;
                curintf.as_mut().ok_or("End of method outside interface")?.methods.push(m);
            }

            XmlEvent::StartElement { ref name, ref attributes, .. } if name.local_name == "signal" => {
                if cursig.is_some() { Err("Start of signal inside signal")? };
                if curintf.is_none() { Err("Start of signal outside interface")? };
                cursig = Some(Signal { name: find_attr(attributes, "name")?.into(),
                    args: Vec::new(), annotations: Default::default() });
            }
            XmlEvent::EndElement { ref name } if name.local_name == "signal" => {
                let z = cursig.take().ok_or("End of signal outside signal")?;
                curintf.as_mut().ok_or("End of signal outside interface")?.signals.push(z);
            }

            XmlEvent::StartElement { ref name, ref attributes, .. } if name.local_name == "property" => {
                if curprop.is_some() { Err("Start of property inside property")? };
                let intf = curintf.as_ref().ok_or("Start of property outside interface")?;
                let name: String = find_attr(attributes, "name")?.into();
                let get_fn_name = make_fn_name(intf, &name);
                let set_fn_name = format!("set_{}", get_fn_name);
                curprop = Some(Prop {
                    name, get_fn_name, set_fn_name,
                    typ: find_attr(attributes, "type")?.into(),
                    access: find_attr(attributes, "access")?.into(),
                    annotations: Default::default(),
                });
            }
            XmlEvent::EndElement { ref name } if name.local_name == "property" => {
                let p = curprop.take().ok_or("End of property outside property")?;
                curintf.as_mut().ok_or("End of property outside interface")?.props.push(p);
            }

            XmlEvent::StartElement { ref name, ref attributes, .. } if name.local_name == "arg" => {
                if curarg.is_some() { Err("Start of arg inside arg")? };
                if curm.is_none() && cursig.is_none() { Err("Start of arg outside method and signal")? };
                if curintf.is_none() { Err("Start of arg outside interface")? };
                let typ: String = find_attr(attributes, "type")?.into();
                let is_out = if cursig.is_some() { true } else { match find_attr(attributes, "direction") {
                    Err(_) => false,
                    Ok("in") => false,
                    Ok("out") => true,
                    _ => { Err("Invalid direction")? }
                }};
                let idx = if let Some(ref sig) = cursig { sig.args.len() }
                    else if is_out { curm.as_ref().unwrap().oargs.len() }
                    else { curm.as_ref().unwrap().iargs.len() };
                curarg = Some((Arg { name: find_attr(attributes, "name").unwrap_or("").into(),
                    typ, no_refs: is_out, idx: idx as i32,
                    annotations: Default::default() }, is_out));
            }
            XmlEvent::EndElement { ref name } if name.local_name == "arg" => {
                let (arg, is_out) = curarg.take().ok_or("End of arg outside arg")?;
                let arr = if let Some(ref mut sig) = cursig { &mut sig.args }
                    else if is_out { &mut curm.as_mut().unwrap().oargs }
                    else { &mut curm.as_mut().unwrap().iargs };
                arr.push(arg);
            }

            XmlEvent::StartElement { ref name, ref attributes, .. } if name.local_name == "annotation" => {
                let n: String = find_attr(attributes, "name")?.into();
                let v: String = find_attr(attributes, "value")?.into();
                let anns = if let Some(ref mut a) = curarg { &mut a.0.annotations }
                    else if let Some(ref mut p) = curprop { &mut p.annotations }
                    else if let Some(ref mut z) = cursig { &mut z.annotations }
                    else if let Some(ref mut m) = curm { &mut m.annotations }
                    else if let Some(ref mut i) = curintf { &mut i.annotations }
                    else { Err("Annotation outside interface")? };
                anns.insert(n, v);
            }
            _ => (),
        }
    }
    if curintf.is_some() { Err("Unterminated interface")? }
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::{generate, GenOpts, Mode};

    static NIH_TEST: &str = r#"
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
    <signal name="NewString">
      <arg name="value" type="s"/>
    </signal>
    <property name="uint32" type="u" access="readwrite"/>
  </interface>
</node>
"#;

    #[test]
    fn client_output_shape() {
        let s = generate(NIH_TEST, &Default::default()).unwrap();
        println!("{}", s);
        assert!(s.contains("pub trait ComNetsplitNihTest {"));
        assert!(s.contains("fn ordinary_method(&self, input: &str) -> Result<String, dbus::Error>;"));
        assert!(s.contains("fn struct_to_str(&self, item: (&str, u32,)) -> Result<String, dbus::Error>;"));
        assert!(s.contains("pub trait ComNetsplitNihTestAsync {"));
        assert!(s.contains("pub struct ComNetsplitNihTestNewString {"));
        assert!(s.contains("fn set_uint32(&self, value: u32) -> Result<(), dbus::Error>;"));
        // The async-annotated method is still an ordinary client call.
        assert!(s.contains("fn async_method(&self, input: &str) -> Result<String, dbus::Error>;"));
    }

    #[test]
    fn server_output_shape() {
        let opts = GenOpts { mode: Mode::Server, ..Default::default() };
        let s = generate(NIH_TEST, &opts).unwrap();
        println!("{}", s);
        assert!(s.contains("pub fn register_com_netsplit_nih_test<T>"));
        assert!(s.contains("fn ordinary_method(&mut self, input: String) -> Result<String, dbus::MethodErr>;"));
        assert!(s.contains("fn async_method(&mut self, input: String, reply: dbus_dispatch::ReplyHandle<(String, )>);"));
        assert!(s.contains("b.method_deferred(\"AsyncMethod\""));
        assert!(s.contains("b.property::<u32, _>(\"uint32\")"));
        assert!(s.contains("b.signal::<(String, ), _>(\"NewString\", (\"value\", ));"));
    }

    #[test]
    fn deterministic() {
        let opts = GenOpts { mode: Mode::Server, ..Default::default() };
        let a = generate(NIH_TEST, &opts).unwrap();
        let b = generate(NIH_TEST, &opts).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(generate("<node><interface></interface></node>", &Default::default()).is_err());
        assert!(generate("<node><interface name=\"a.b\"><method name=\"M\"><arg type=\"!\" direction=\"in\"/></method></interface></node>",
            &Default::default()).is_err());
        assert!(generate("<node><interface name=\"a.b\">", &Default::default()).is_err());
    }

    #[test]
    fn prefix_and_skipprefix_rename_items() {
        let mut opts = GenOpts::default();
        opts.skipprefix = Some("com.netsplit.".to_string());
        let s = generate(NIH_TEST, &opts).unwrap();
        assert!(s.contains("pub trait NihTest {"));
        assert!(s.contains("self.method_call(\"com.netsplit.Nih.Test\""));

        let mut opts = GenOpts::default();
        opts.mode = Mode::Server;
        opts.prefix = Some("my".to_string());
        let s = generate(NIH_TEST, &opts).unwrap();
        assert!(s.contains("pub trait My {"));
        assert!(s.contains("pub fn register_my<T>"));
        assert!(s.contains("os.register(\"com.netsplit.Nih.Test\""));
    }

    #[test]
    fn interface_filter() {
        let mut opts = GenOpts::default();
        opts.interfaces = Some(vec!["com.example.other".to_string()].into_iter().collect());
        let s = generate(NIH_TEST, &opts).unwrap();
        assert!(!s.contains("ComNetsplitNihTest"));
    }
}
