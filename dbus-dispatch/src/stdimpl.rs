use crate::context::{Context, PropContext};
use crate::ifacedesc::GetPropCallback;
use crate::object_server::{IfaceToken, ObjectServer};
use dbus_bind::arg::{ArgType, IterAppend, RefArg, Variant};
use dbus_bind::strings::{Interface as IfaceName, Path, Signature};
use dbus_bind::{Message, MethodErr};

fn introspect(os: &ObjectServer, path: &Path<'static>) -> String {
    let mut children = os.get_children(path);
    let mut childstr = String::new();
    children.sort_unstable();
    for c in children {
        childstr += &format!("  <node name=\"{}\"/>\n", c);
    }
    let ifacestr = os.introspect_ifaces(path);

    let nodestr = format!(
r##"<!DOCTYPE node PUBLIC "-//freedesktop//DTD D-BUS Object Introspection 1.0//EN"
 "http://www.freedesktop.org/standards/dbus/1.0/introspect.dtd">
<node name="{}">
{}{}</node>"##, path, ifacestr, childstr);
    nodestr
}

pub(crate) fn introspectable(os: &mut ObjectServer) -> IfaceToken<()> {
    os.register("org.freedesktop.DBus.Introspectable", |b| {
        b.method_custom::<(), (String,)>("Introspect".into(), (), ("xml_data",),
            Box::new(|mut ctx: Context, os: &mut ObjectServer| {
                if ctx.check(|ctx| {
                    if ctx.message().iter_init().arg_type() != ArgType::Invalid {
                        return Err(MethodErr::too_many_args());
                    }
                    Ok(())
                }).is_err() { return Some(ctx); }
                let xml = introspect(os, ctx.path());
                ctx.do_reply(|msg| { IterAppend::new(msg).append(xml); });
                Some(ctx)
            }));
    })
}

fn parse_iface(name: String) -> Result<IfaceName<'static>, MethodErr> {
    IfaceName::new(name)
        .map_err(|e| ("org.freedesktop.DBus.Error.UnknownInterface", format!("{}", e)).into())
}

// Runs one property getter; the variant-wrapped value ends up in a scratch
// message, so GetAll can reuse it.
fn get_prop_value(ctx: &Context, os: &mut ObjectServer, token: usize, iname: &IfaceName<'static>,
    prop: &str) -> Result<Message, MethodErr>
{
    let mut cb: GetPropCallback = os.registry_mut().take_prop_get(token, prop)?;
    let mut pctx = PropContext::new(ctx.path().clone(), iname.clone(), prop.to_string());
    let mut scratch = ctx.message().method_return();
    let r = match os.data_any_mut(ctx.path()) {
        Ok(data) => cb(&mut pctx, data, &mut IterAppend::new(&mut scratch)),
        Err(e) => Err(e),
    };
    os.registry_mut().give_prop_get(token, prop, cb);
    r.map(|_| scratch)
}

fn get(mut ctx: Context, os: &mut ObjectServer) -> Option<Context> {
    let (iname, prop) = match ctx.check(|ctx| {
        let mut i = ctx.message().iter_init();
        let iname: String = i.read()?;
        let prop: String = i.read()?;
        if i.arg_type() != ArgType::Invalid { return Err(MethodErr::too_many_args()); }
        Ok((parse_iface(iname)?, prop))
    }) {
        Ok(x) => x,
        Err(_) => return Some(ctx),
    };

    let r = (|| {
        let token = os.find_iface_token(ctx.path(), &iname)?;
        get_prop_value(&ctx, os, token, &iname, &prop)
    })();
    match r {
        Ok(reply) => ctx.set_reply(Some(reply), true, true),
        Err(e) => { let _ = ctx.check(|_| Err::<(), MethodErr>(e)); }
    }
    Some(ctx)
}

fn getall(mut ctx: Context, os: &mut ObjectServer) -> Option<Context> {
    let iname = match ctx.check(|ctx| {
        let mut i = ctx.message().iter_init();
        let iname: String = i.read()?;
        if i.arg_type() != ArgType::Invalid { return Err(MethodErr::too_many_args()); }
        parse_iface(iname)
    }) {
        Ok(x) => x,
        Err(_) => return Some(ctx),
    };

    let r = (|| -> Result<Message, MethodErr> {
        let token = os.find_iface_token(ctx.path(), &iname)?;
        let names = os.registry().readable_props(token);
        let mut values: Vec<(String, Variant<Box<dyn RefArg>>)> = vec!();
        for name in names {
            // A failing getter drops its property from the result rather
            // than failing the whole call.
            if let Ok(scratch) = get_prop_value(&ctx, os, token, &iname, &name) {
                if let Some(v) = scratch.get1::<Variant<Box<dyn RefArg>>>() {
                    values.push((name, v));
                }
            }
        }
        let mut reply = ctx.message().method_return();
        {
            let mut ia = IterAppend::new(&mut reply);
            ia.append_dict(&Signature::new_unchecked("s"), &Signature::new_unchecked("v"), |d| {
                for (name, v) in values {
                    d.append_dict_entry(|e| {
                        e.append(name);
                        e.append(v);
                    });
                }
            });
        }
        Ok(reply)
    })();
    match r {
        Ok(reply) => ctx.set_reply(Some(reply), true, true),
        Err(e) => { let _ = ctx.check(|_| Err::<(), MethodErr>(e)); }
    }
    Some(ctx)
}

fn set(mut ctx: Context, os: &mut ObjectServer) -> Option<Context> {
    let (iname, prop) = match ctx.check(|ctx| {
        let mut i = ctx.message().iter_init();
        let iname: String = i.read()?;
        let prop: String = i.read()?;
        if i.arg_type() != ArgType::Variant { return Err(MethodErr::invalid_arg(&"value")); }
        let mut j = i;
        j.next();
        if j.arg_type() != ArgType::Invalid { return Err(MethodErr::too_many_args()); }
        Ok((parse_iface(iname)?, prop))
    }) {
        Ok(x) => x,
        Err(_) => return Some(ctx),
    };

    let r = (|| {
        let token = os.find_iface_token(ctx.path(), &iname)?;
        let mut cb = os.registry_mut().take_prop_set(token, &prop)?;
        let mut pctx = PropContext::new(ctx.path().clone(), iname.clone(), prop.clone());
        let r = match os.data_any_mut(ctx.path()) {
            Ok(data) => {
                let mut i = ctx.message().iter_init();
                i.next();
                i.next();
                cb(&mut pctx, data, &mut i)
            }
            Err(e) => Err(e),
        };
        os.registry_mut().give_prop_set(token, &prop, cb);
        r
    })();
    match r {
        Ok(()) => ctx.do_reply(|_| ()),
        Err(e) => { let _ = ctx.check(|_| Err::<(), MethodErr>(e)); }
    }
    Some(ctx)
}

pub(crate) fn properties(os: &mut ObjectServer) -> IfaceToken<()> {
    os.register("org.freedesktop.DBus.Properties", |b| {
        b.method_custom::<(String, String), (Variant<u8>,)>("Get".into(),
            ("interface_name", "property_name"), ("value",), Box::new(get));
        b.method_custom::<(String,), (dbus_bind::arg::PropMap,)>("GetAll".into(),
            ("interface_name",), ("properties",), Box::new(getall));
        b.method_custom::<(String, String, Variant<u8>), ()>("Set".into(),
            ("interface_name", "property_name", "value"), (), Box::new(set));
    })
}
