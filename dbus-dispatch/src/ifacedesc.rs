use crate::context::{Context, PropContext};
use crate::object_server::ObjectServer;
use crate::ReplyHandle;
use dbus_bind::arg::{Append, AppendAll, Arg, ArgAll, ArgType, Get, Iter, IterAppend, ReadAll};
use dbus_bind::strings::{Interface as IfaceName, Member as MemberName, Signature};
use dbus_bind::{Message, MethodErr};
use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::marker::PhantomData;

/// Callback for a method, in its type-erased form.
pub type MethodCallback = Box<dyn FnMut(Context, &mut ObjectServer) -> Option<Context> + Send + 'static>;

pub(crate) type GetPropCallback =
    Box<dyn FnMut(&mut PropContext, &mut dyn Any, &mut IterAppend) -> Result<(), MethodErr> + Send + 'static>;
pub(crate) type SetPropCallback =
    Box<dyn FnMut(&mut PropContext, &mut dyn Any, &mut Iter) -> Result<(), MethodErr> + Send + 'static>;

struct CallbackDbg<T>(T);

impl<T> fmt::Debug for CallbackDbg<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "Fn") }
}

pub(crate) type Annotations = HashMap<String, String>;

const DEPRECATED: &str = "org.freedesktop.DBus.Deprecated";

/// One named, typed argument of a method or signal.
#[derive(Debug, Clone)]
pub struct Argument {
    name: String,
    sig: Signature<'static>,
}

impl Argument {
    /// The argument name; arguments may be positional only.
    pub fn name(&self) -> Option<&str> {
        if self.name.is_empty() { None } else { Some(&self.name) }
    }

    /// The argument's type signature.
    pub fn signature(&self) -> &Signature<'static> { &self.sig }

    fn introspect(&self, indent: &str, dir: &str, r: &mut String) {
        let n = self.name().map(|n| format!("name=\"{}\" ", n)).unwrap_or_default();
        *r += &format!("{}<arg {}type=\"{}\"{}/>\n", indent, n, self.sig, dir);
    }
}

fn build_argvec<A: ArgAll>(a: A::strs) -> Vec<Argument> {
    let mut v = vec!();
    A::strs_sig(a, |name, sig| {
        v.push(Argument { name: name.into(), sig })
    });
    v
}

fn introspect_annotations(anns: &Annotations, indent: &str, r: &mut String) {
    let mut keys: Vec<_> = anns.keys().collect();
    keys.sort_unstable();
    for k in keys {
        *r += &format!("{}<annotation name=\"{}\" value=\"{}\"/>\n", indent, k, anns[k]);
    }
}

/// Description of one method of an interface.
#[derive(Debug)]
pub struct MethodInfo {
    name: MemberName<'static>,
    cb: Option<CallbackDbg<MethodCallback>>,
    i_args: Vec<Argument>,
    o_args: Vec<Argument>,
    anns: Annotations,
}

impl MethodInfo {
    /// The method name.
    pub fn name(&self) -> &MemberName<'static> { &self.name }

    /// The declared input arguments, in order.
    pub fn input_args(&self) -> &[Argument] { &self.i_args }

    /// The declared output arguments, in order.
    pub fn output_args(&self) -> &[Argument] { &self.o_args }

    /// Concatenated signature of the input arguments.
    pub fn input_signature(&self) -> String {
        self.i_args.iter().map(|a| &**a.signature()).collect()
    }

    /// Concatenated signature of the output arguments.
    pub fn output_signature(&self) -> String {
        self.o_args.iter().map(|a| &**a.signature()).collect()
    }

    fn introspect(&self, r: &mut String) {
        *r += &format!("    <method name=\"{}\">\n", self.name);
        for a in &self.i_args { a.introspect("      ", " direction=\"in\"", r); }
        for a in &self.o_args { a.introspect("      ", " direction=\"out\"", r); }
        introspect_annotations(&self.anns, "      ", r);
        *r += "    </method>\n";
    }
}

/// The possible access characteristics a Property can have.
#[derive(Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Debug)]
pub enum Access {
    /// The Property can only be read (Get).
    Read,
    /// The Property can be read or written.
    ReadWrite,
    /// The Property can only be written (Set).
    Write,
}

impl Access {
    pub(crate) fn can_get(self) -> bool { self != Access::Write }
    pub(crate) fn can_set(self) -> bool { self != Access::Read }

    fn introspect(self) -> &'static str {
        match self {
            Access::Read => "read",
            Access::ReadWrite => "readwrite",
            Access::Write => "write",
        }
    }
}

/// Description of one property of an interface.
#[derive(Debug)]
pub struct PropInfo {
    name: MemberName<'static>,
    sig: Signature<'static>,
    access: Access,
    get_cb: Option<CallbackDbg<GetPropCallback>>,
    set_cb: Option<CallbackDbg<SetPropCallback>>,
    anns: Annotations,
}

impl PropInfo {
    fn new(name: MemberName<'static>, sig: Signature<'static>) -> Self {
        PropInfo { name, sig, access: Access::Read, get_cb: None, set_cb: None, anns: Default::default() }
    }

    /// The property name.
    pub fn name(&self) -> &MemberName<'static> { &self.name }

    /// The property's type signature.
    pub fn signature(&self) -> &Signature<'static> { &self.sig }

    /// The property's access mode, derived from the handlers it was
    /// registered with.
    pub fn access(&self) -> Access { self.access }

    fn update_access(&mut self) {
        self.access = match (self.get_cb.is_some(), self.set_cb.is_some()) {
            (_, false) => Access::Read,
            (true, true) => Access::ReadWrite,
            (false, true) => Access::Write,
        };
    }

    fn introspect(&self, r: &mut String) {
        if self.anns.is_empty() {
            *r += &format!("    <property name=\"{}\" type=\"{}\" access=\"{}\"/>\n",
                self.name, self.sig, self.access.introspect());
        } else {
            *r += &format!("    <property name=\"{}\" type=\"{}\" access=\"{}\">\n",
                self.name, self.sig, self.access.introspect());
            introspect_annotations(&self.anns, "      ", r);
            *r += "    </property>\n";
        }
    }
}

/// Description of one signal of an interface.
#[derive(Debug)]
pub struct SignalInfo {
    name: MemberName<'static>,
    args: Vec<Argument>,
    anns: Annotations,
}

impl SignalInfo {
    /// The signal name.
    pub fn name(&self) -> &MemberName<'static> { &self.name }

    /// The declared arguments, in order.
    pub fn args(&self) -> &[Argument] { &self.args }

    /// Concatenated signature of the signal arguments.
    pub fn signature(&self) -> String {
        self.args.iter().map(|a| &**a.signature()).collect()
    }

    fn introspect(&self, r: &mut String) {
        *r += &format!("    <signal name=\"{}\">\n", self.name);
        for a in &self.args { a.introspect("      ", "", r); }
        introspect_annotations(&self.anns, "      ", r);
        *r += "    </signal>\n";
    }
}

/// Description of one interface: its methods, properties and signals.
///
/// This is the runtime counterpart of the introspection data the bindings
/// were generated from, and what dispatch routes against.
#[derive(Debug)]
pub struct IfaceInfo {
    name: IfaceName<'static>,
    methods: Vec<MethodInfo>,
    props: Vec<PropInfo>,
    signals: Vec<SignalInfo>,
    anns: Annotations,
}

impl IfaceInfo {
    /// The interface name.
    pub fn name(&self) -> &IfaceName<'static> { &self.name }

    /// Finds a method by name.
    pub fn lookup_method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| &*m.name == name)
    }

    /// Finds a property by name.
    pub fn lookup_property(&self, name: &str) -> Option<&PropInfo> {
        self.props.iter().find(|p| &*p.name == name)
    }

    /// Finds a signal by name.
    pub fn lookup_signal(&self, name: &str) -> Option<&SignalInfo> {
        self.signals.iter().find(|s| &*s.name == name)
    }

    fn introspect(&self, r: &mut String) {
        *r += &format!("  <interface name=\"{}\">\n", self.name);
        let mut methods: Vec<_> = self.methods.iter().collect();
        methods.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        for m in methods { m.introspect(r); }
        let mut signals: Vec<_> = self.signals.iter().collect();
        signals.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        for s in signals { s.introspect(r); }
        let mut props: Vec<_> = self.props.iter().collect();
        props.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        for p in props { p.introspect(r); }
        introspect_annotations(&self.anns, "    ", r);
        *r += "  </interface>\n";
    }
}

#[derive(Default, Debug)]
pub(crate) struct Registry(Vec<IfaceInfo>);

impl Registry {
    pub fn push(&mut self, x: IfaceInfo) -> usize {
        self.0.push(x);
        self.0.len() - 1
    }

    pub fn get(&self, token: usize) -> &IfaceInfo { &self.0[token] }

    pub fn find_token(&self, name: Option<&IfaceName>, tokens: &BTreeSet<usize>,
        member: &MemberName) -> Result<usize, MethodErr>
    {
        match name {
            Some(n) => tokens.iter().find(|t| &self.0[**t].name == n).copied()
                .ok_or_else(|| MethodErr::no_interface(n)),
            // Without an interface header, the first interface that knows
            // the member wins.
            None => tokens.iter().find(|t| self.0[**t].lookup_method(member).is_some()).copied()
                .ok_or_else(|| MethodErr::no_method(member)),
        }
    }

    pub fn take_method(&mut self, t: usize, name: &MemberName) -> Result<MethodCallback, MethodErr> {
        let mdesc = self.0[t].methods.iter_mut().find(|m| m.name == *name)
            .ok_or_else(|| MethodErr::no_method(name))?;
        let cb = mdesc.cb.take();
        let cb = cb.ok_or_else(|| MethodErr::failed(&format!("Detected recursive call to {}", name)))?;
        Ok(cb.0)
    }

    pub fn give_method(&mut self, t: usize, name: &MemberName, cb: MethodCallback) {
        let mdesc = self.0[t].methods.iter_mut().find(|m| m.name == *name).unwrap();
        mdesc.cb = Some(CallbackDbg(cb));
    }

    pub fn take_prop_get(&mut self, t: usize, name: &str) -> Result<GetPropCallback, MethodErr> {
        let p = self.0[t].props.iter_mut().find(|p| &*p.name == name)
            .ok_or_else(|| MethodErr::no_property(&name))?;
        if !p.access.can_get() { return Err(MethodErr::wo_property(&name)); }
        let cb = p.get_cb.take()
            .ok_or_else(|| MethodErr::failed(&format!("Detected recursive get of {}", name)))?;
        Ok(cb.0)
    }

    pub fn give_prop_get(&mut self, t: usize, name: &str, cb: GetPropCallback) {
        let p = self.0[t].props.iter_mut().find(|p| &*p.name == name).unwrap();
        p.get_cb = Some(CallbackDbg(cb));
    }

    pub fn take_prop_set(&mut self, t: usize, name: &str) -> Result<SetPropCallback, MethodErr> {
        let p = self.0[t].props.iter_mut().find(|p| &*p.name == name)
            .ok_or_else(|| MethodErr::no_property(&name))?;
        if !p.access.can_set() { return Err(MethodErr::ro_property(&name)); }
        let cb = p.set_cb.take()
            .ok_or_else(|| MethodErr::failed(&format!("Detected recursive set of {}", name)))?;
        Ok(cb.0)
    }

    pub fn give_prop_set(&mut self, t: usize, name: &str, cb: SetPropCallback) {
        let p = self.0[t].props.iter_mut().find(|p| &*p.name == name).unwrap();
        p.set_cb = Some(CallbackDbg(cb));
    }

    pub fn readable_props(&self, t: usize) -> Vec<String> {
        self.0[t].props.iter().filter(|p| p.access.can_get())
            .map(|p| p.name.to_string()).collect()
    }

    pub fn introspect(&self, tokens: &BTreeSet<usize>) -> String {
        let mut ifaces: Vec<&IfaceInfo> = tokens.iter().map(|t| &self.0[*t]).collect();
        ifaces.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        let mut r = String::new();
        for i in ifaces { i.introspect(&mut r); }
        r
    }
}

fn read_all_args<IA: ReadAll>(msg: &Message, names: &[String]) -> Result<IA, MethodErr> {
    let mut i = msg.iter_init();
    let ia = IA::read(&mut i).map_err(|e| -> MethodErr {
        match names.get(e.pos() as usize) {
            Some(n) if !n.is_empty() =>
                ("org.freedesktop.DBus.Error.InvalidArgs", format!("Invalid argument {}: {}", n, e)).into(),
            _ => e.into(),
        }
    })?;
    if i.arg_type() != ArgType::Invalid { return Err(MethodErr::too_many_args()); }
    Ok(ia)
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum MetSigProp { Method, Signal, Prop }

/// Builder passed to the closure given to `ObjectServer::register`; adds
/// methods, properties and signals to the interface being registered.
#[derive(Debug)]
pub struct IfaceBuilder<T: Send + 'static> {
    info: IfaceInfo,
    last: Option<MetSigProp>,
    _data: PhantomData<fn(T) -> T>,
}

impl<T: Send + 'static> IfaceBuilder<T> {
    pub(crate) fn new(name: IfaceName<'static>) -> Self {
        IfaceBuilder {
            info: IfaceInfo {
                name,
                methods: vec!(),
                props: vec!(),
                signals: vec!(),
                anns: Default::default(),
            },
            last: None,
            _data: PhantomData,
        }
    }

    pub(crate) fn into_info(self) -> IfaceInfo { self.info }

    /// Adds a method to the interface, with a handler that replies directly.
    ///
    /// Input arguments are decoded and validated before the handler runs;
    /// the handler's Ok value supplies the output arguments of the reply.
    pub fn method<IA, OA, N, CB>(&mut self, name: N, in_args: IA::strs, out_args: OA::strs, mut cb: CB) -> &mut Self
    where IA: ArgAll + ReadAll + 'static,
          OA: ArgAll + AppendAll + 'static,
          N: Into<MemberName<'static>>,
          CB: FnMut(&mut Context, &mut T, IA) -> Result<OA, MethodErr> + Send + 'static,
    {
        let iargs = build_argvec::<IA>(in_args);
        let in_names: Vec<String> = iargs.iter().map(|a| a.name.clone()).collect();
        let boxed: MethodCallback = Box::new(move |mut ctx: Context, os: &mut ObjectServer| {
            let ia = match ctx.check(|ctx| read_all_args::<IA>(ctx.message(), &in_names)) {
                Ok(ia) => ia,
                Err(_) => return Some(ctx),
            };
            let path = ctx.path().clone();
            let r = match os.typed_data_mut::<T>(&path) {
                Ok(t) => ctx.check(|ctx| cb(ctx, t, ia)),
                Err(e) => ctx.check(|_| Err::<OA, MethodErr>(e)),
            };
            if let Ok(oa) = r {
                ctx.do_reply(|msg| oa.append(&mut IterAppend::new(msg)));
            }
            Some(ctx)
        });
        self.push_method(name.into(), iargs, build_argvec::<OA>(out_args), boxed)
    }

    /// Adds a method whose reply is deferred.
    ///
    /// The handler receives a `ReplyHandle` instead of returning output
    /// arguments; the reply is produced whenever the handle is used, from
    /// any context that shares the connection.
    pub fn method_deferred<IA, OA, N, CB>(&mut self, name: N, in_args: IA::strs, out_args: OA::strs, mut cb: CB) -> &mut Self
    where IA: ArgAll + ReadAll + 'static,
          OA: ArgAll + AppendAll + 'static,
          N: Into<MemberName<'static>>,
          CB: FnMut(ReplyHandle<OA>, &mut T, IA) + Send + 'static,
    {
        let iargs = build_argvec::<IA>(in_args);
        let in_names: Vec<String> = iargs.iter().map(|a| a.name.clone()).collect();
        let boxed: MethodCallback = Box::new(move |mut ctx: Context, os: &mut ObjectServer| {
            let ia = match ctx.check(|ctx| read_all_args::<IA>(ctx.message(), &in_names)) {
                Ok(ia) => ia,
                Err(_) => return Some(ctx),
            };
            let path = ctx.path().clone();
            match os.typed_data_mut::<T>(&path) {
                Ok(t) => {
                    cb(ReplyHandle::new(ctx), t, ia);
                    // Ownership of the call went to the handler; no reply yet.
                    None
                }
                Err(e) => {
                    let _ = ctx.check(|_| Err::<(), MethodErr>(e));
                    Some(ctx)
                }
            }
        });
        self.push_method(name.into(), iargs, build_argvec::<OA>(out_args), boxed)
    }

    /// Adds a method with a raw, type-erased callback. The argument lists
    /// are used for introspection only; the callback validates and decodes
    /// by itself.
    pub fn method_custom<IA, OA>(&mut self, name: MemberName<'static>, in_args: IA::strs,
        out_args: OA::strs, cb: MethodCallback) -> &mut Self
    where IA: ArgAll, OA: ArgAll
    {
        self.push_method(name, build_argvec::<IA>(in_args), build_argvec::<OA>(out_args), cb)
    }

    fn push_method(&mut self, name: MemberName<'static>, i_args: Vec<Argument>,
        o_args: Vec<Argument>, cb: MethodCallback) -> &mut Self
    {
        self.info.methods.push(MethodInfo {
            name, cb: Some(CallbackDbg(cb)), i_args, o_args, anns: Default::default(),
        });
        self.last = Some(MetSigProp::Method);
        self
    }

    /// Adds a signal to the interface.
    ///
    /// This registers the signal for introspection and keeps its signature
    /// available for emit-time checks; emitting happens through the
    /// `SignalArgs` message constructors.
    pub fn signal<A: ArgAll, N: Into<MemberName<'static>>>(&mut self, name: N, args: A::strs) -> &mut Self {
        self.info.signals.push(SignalInfo {
            name: name.into(), args: build_argvec::<A>(args), anns: Default::default(),
        });
        self.last = Some(MetSigProp::Signal);
        self
    }

    /// Adds a property to the interface; access mode follows from which of
    /// `get` and `set` are then called on the returned builder.
    pub fn property<A: Arg + 'static, N: Into<MemberName<'static>>>(&mut self, name: N) -> PropBuilder<T, A> {
        self.info.props.push(PropInfo::new(name.into(), A::signature()));
        self.last = Some(MetSigProp::Prop);
        let idx = self.info.props.len() - 1;
        PropBuilder { b: self, idx, _prop: PhantomData }
    }

    /// Annotates the last added method, signal or property, or the interface
    /// itself if nothing was added yet.
    pub fn annotate<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) -> &mut Self {
        let anns = match self.last {
            None => &mut self.info.anns,
            Some(MetSigProp::Method) => &mut self.info.methods.last_mut().unwrap().anns,
            Some(MetSigProp::Signal) => &mut self.info.signals.last_mut().unwrap().anns,
            Some(MetSigProp::Prop) => &mut self.info.props.last_mut().unwrap().anns,
        };
        anns.insert(name.into(), value.into());
        self
    }

    /// Adds a deprecated annotation to the last added member.
    pub fn deprecated(&mut self) -> &mut Self {
        self.annotate(DEPRECATED, "true")
    }
}

/// Builder for one property, returned by `IfaceBuilder::property`.
#[derive(Debug)]
pub struct PropBuilder<'a, T: Send + 'static, A> {
    b: &'a mut IfaceBuilder<T>,
    idx: usize,
    _prop: PhantomData<fn(A) -> A>,
}

impl<'a, T: Send + 'static, A: Arg + 'static> PropBuilder<'a, T, A> {
    /// Installs a get handler, making the property readable.
    pub fn get<CB>(self, mut cb: CB) -> Self
    where CB: FnMut(&mut PropContext, &mut T) -> Result<A, MethodErr> + Send + 'static,
          A: Append,
    {
        let sig = A::signature();
        let wrapper: GetPropCallback = Box::new(move |pctx, any, ia| {
            let t: &mut T = any.downcast_mut().ok_or_else(|| MethodErr::failed(&"Wrong type of object"))?;
            let v = cb(pctx, t)?;
            // Property values travel wrapped in a variant of the declared signature.
            ia.append_variant(&sig, |s| s.append(v));
            Ok(())
        });
        self.b.info.props[self.idx].get_cb = Some(CallbackDbg(wrapper));
        self.b.info.props[self.idx].update_access();
        self
    }

    /// Installs a set handler, making the property writable.
    pub fn set<CB>(self, mut cb: CB) -> Self
    where CB: FnMut(&mut PropContext, &mut T, A) -> Result<(), MethodErr> + Send + 'static,
          A: for<'z> Get<'z>,
    {
        let sig = A::signature();
        let wrapper: SetPropCallback = Box::new(move |pctx, any, i| {
            let t: &mut T = any.downcast_mut().ok_or_else(|| MethodErr::failed(&"Wrong type of object"))?;
            let mut sub = i.recurse(ArgType::Variant).ok_or_else(MethodErr::no_arg)?;
            // The variant's inner signature must equal the property's
            // declared signature before anything is decoded.
            match sub.signature() {
                Some(ref vsig) if *vsig == sig => {}
                Some(vsig) => return Err(("org.freedesktop.DBus.Error.InvalidArgs",
                    format!("Property value has signature {}, expected {}", vsig, sig)).into()),
                None => return Err(MethodErr::no_arg()),
            }
            let v: A = sub.read()?;
            cb(pctx, t, v)
        });
        self.b.info.props[self.idx].set_cb = Some(CallbackDbg(wrapper));
        self.b.info.props[self.idx].update_access();
        self
    }

    /// Adds a deprecated annotation to the property.
    pub fn deprecated(self) -> Self {
        self.annotate(DEPRECATED, "true")
    }

    /// Annotates the property.
    pub fn annotate<N: Into<String>, V: Into<String>>(self, name: N, value: V) -> Self {
        self.b.info.props[self.idx].anns.insert(name.into(), value.into());
        self
    }
}
