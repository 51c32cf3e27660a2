use crate::strings::{Path, Signature};
use crate::types::ArgType;
use super::{Arg, Append, DictKey, Get, Iter, IterAppend, OwnedFd, RefArg, Value};
use std::any;

macro_rules! integer_impl {
    ($t: ty, $at: ident, $sig: expr, $variant: ident) => {

impl Arg for $t {
    const ARG_TYPE: ArgType = ArgType::$at;
    fn signature() -> Signature<'static> { Signature::new_unchecked($sig) }
}

impl Append for $t {
    fn append(self, i: &mut IterAppend) { i.push(Value::$variant(self)) }
}

impl<'a> Get<'a> for $t {
    fn get(i: &mut Iter<'a>) -> Option<Self> {
        match i.current()? {
            Value::$variant(v) => Some(*v),
            _ => None,
        }
    }
}

impl DictKey for $t {}

impl RefArg for $t {
    fn arg_type(&self) -> ArgType { ArgType::$at }
    fn signature(&self) -> Signature<'static> { Signature::new_unchecked($sig) }
    fn append(&self, i: &mut IterAppend) { i.push(Value::$variant(*self)) }
    #[inline]
    fn as_any(&self) -> &dyn any::Any { self }
    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn any::Any { self }
    #[inline]
    fn as_i64(&self) -> Option<i64> { Value::$variant(*self).as_i64() }
    #[inline]
    fn as_u64(&self) -> Option<u64> { Value::$variant(*self).as_u64() }
    #[inline]
    fn as_f64(&self) -> Option<f64> { Value::$variant(*self).as_f64() }
}

    }
}

integer_impl!(u8, Byte, "y", Byte);
integer_impl!(bool, Boolean, "b", Boolean);
integer_impl!(i16, Int16, "n", Int16);
integer_impl!(u16, UInt16, "q", UInt16);
integer_impl!(i32, Int32, "i", Int32);
integer_impl!(u32, UInt32, "u", UInt32);
integer_impl!(i64, Int64, "x", Int64);
integer_impl!(u64, UInt64, "t", UInt64);
integer_impl!(f64, Double, "d", Double);

impl Arg for String {
    const ARG_TYPE: ArgType = ArgType::String;
    fn signature() -> Signature<'static> { Signature::new_unchecked("s") }
}

impl Append for String {
    fn append(self, i: &mut IterAppend) { i.push(Value::Str(self)) }
}

impl<'a> Get<'a> for String {
    fn get(i: &mut Iter<'a>) -> Option<Self> {
        match i.current()? {
            Value::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl DictKey for String {}

impl RefArg for String {
    fn arg_type(&self) -> ArgType { ArgType::String }
    fn signature(&self) -> Signature<'static> { Signature::new_unchecked("s") }
    fn append(&self, i: &mut IterAppend) { i.push(Value::Str(self.clone())) }
    #[inline]
    fn as_any(&self) -> &dyn any::Any { self }
    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn any::Any { self }
    #[inline]
    fn as_str(&self) -> Option<&str> { Some(self) }
}

impl<'a> Arg for &'a str {
    const ARG_TYPE: ArgType = ArgType::String;
    fn signature() -> Signature<'static> { Signature::new_unchecked("s") }
}

impl<'a> Append for &'a str {
    fn append(self, i: &mut IterAppend) { i.push(Value::Str(self.into())) }
}

impl<'a> Get<'a> for &'a str {
    fn get(i: &mut Iter<'a>) -> Option<Self> {
        match i.current()? {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl<'a> DictKey for &'a str {}

impl<'m> Arg for Path<'m> {
    const ARG_TYPE: ArgType = ArgType::ObjectPath;
    fn signature() -> Signature<'static> { Signature::new_unchecked("o") }
}

impl<'m> Append for Path<'m> {
    fn append(self, i: &mut IterAppend) { i.push(Value::Path(self.into_static())) }
}

impl<'a> Get<'a> for Path<'static> {
    fn get(i: &mut Iter<'a>) -> Option<Self> {
        match i.current()? {
            Value::Path(p) => Some(p.clone()),
            _ => None,
        }
    }
}

impl<'m> DictKey for Path<'m> {}

impl RefArg for Path<'static> {
    fn arg_type(&self) -> ArgType { ArgType::ObjectPath }
    fn signature(&self) -> Signature<'static> { Signature::new_unchecked("o") }
    fn append(&self, i: &mut IterAppend) { i.push(Value::Path(self.clone())) }
    #[inline]
    fn as_any(&self) -> &dyn any::Any { self }
    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn any::Any { self }
    #[inline]
    fn as_str(&self) -> Option<&str> { Some(self) }
}

impl<'m> Arg for Signature<'m> {
    const ARG_TYPE: ArgType = ArgType::Signature;
    fn signature() -> Signature<'static> { Signature::new_unchecked("g") }
}

impl<'m> Append for Signature<'m> {
    fn append(self, i: &mut IterAppend) { i.push(Value::Sig(self.into_static())) }
}

impl<'a> Get<'a> for Signature<'static> {
    fn get(i: &mut Iter<'a>) -> Option<Self> {
        match i.current()? {
            Value::Sig(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl<'m> DictKey for Signature<'m> {}

impl RefArg for Signature<'static> {
    fn arg_type(&self) -> ArgType { ArgType::Signature }
    fn signature(&self) -> Signature<'static> { Signature::new_unchecked("g") }
    fn append(&self, i: &mut IterAppend) { i.push(Value::Sig(self.clone())) }
    #[inline]
    fn as_any(&self) -> &dyn any::Any { self }
    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn any::Any { self }
    #[inline]
    fn as_str(&self) -> Option<&str> { Some(self) }
}

impl Arg for OwnedFd {
    const ARG_TYPE: ArgType = ArgType::UnixFd;
    fn signature() -> Signature<'static> { Signature::new_unchecked("h") }
}

impl Append for OwnedFd {
    fn append(self, i: &mut IterAppend) { i.push(Value::Fd(self)) }
}

// The message keeps its own duplicate; getting a descriptor dups it again,
// so the returned fd is owned by the caller alone.
impl<'a> Get<'a> for OwnedFd {
    fn get(i: &mut Iter<'a>) -> Option<Self> {
        match i.current()? {
            Value::Fd(f) => Some(f.clone()),
            _ => None,
        }
    }
}

impl RefArg for OwnedFd {
    fn arg_type(&self) -> ArgType { ArgType::UnixFd }
    fn signature(&self) -> Signature<'static> { Signature::new_unchecked("h") }
    fn append(&self, i: &mut IterAppend) { i.push(Value::Fd(self.clone())) }
    #[inline]
    fn as_any(&self) -> &dyn any::Any { self }
    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn any::Any { self }
}
