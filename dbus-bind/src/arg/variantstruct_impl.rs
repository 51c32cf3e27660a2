use crate::strings::Signature;
use crate::types::ArgType;
use super::{Arg, ArgAll, Append, AppendAll, Get, Iter, IterAppend, ReadAll, RefArg,
    TypeMismatchError};
use std::any;

/// A simple wrapper to specify a D-Bus variant.
///
/// See the argument guide and module level documentation for details and examples.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Variant<T>(pub T);

impl Variant<Box<dyn RefArg>> {
    /// Creates a new variant with a dynamically typed inner value.
    pub fn new_refarg<T: RefArg + 'static>(t: T) -> Self {
        Variant(Box::new(t))
    }
}

impl<T> Arg for Variant<T> {
    const ARG_TYPE: ArgType = ArgType::Variant;
    fn signature() -> Signature<'static> { Signature::new_unchecked("v") }
}

impl<T: Arg + Append> Append for Variant<T> {
    fn append(self, i: &mut IterAppend) {
        let sig = T::signature();
        i.append_variant(&sig, |s| s.append(self.0));
    }
}

impl Append for Variant<Box<dyn RefArg>> {
    fn append(self, i: &mut IterAppend) {
        let sig = self.0.signature();
        i.append_variant(&sig, |s| (&*self.0).append(s));
    }
}

impl<'a, T: Get<'a>> Get<'a> for Variant<T> {
    fn get(i: &mut Iter<'a>) -> Option<Self> {
        let mut sub = i.recurse(ArgType::Variant)?;
        T::get(&mut sub).map(Variant)
    }
}

impl<'a> Get<'a> for Variant<Iter<'a>> {
    fn get(i: &mut Iter<'a>) -> Option<Self> {
        i.recurse(ArgType::Variant).map(Variant)
    }
}

impl<'a> Get<'a> for Variant<Box<dyn RefArg + 'static>> {
    fn get(i: &mut Iter<'a>) -> Option<Self> {
        let mut sub = i.recurse(ArgType::Variant)?;
        sub.get_refarg().map(Variant)
    }
}

impl<T: RefArg> RefArg for Variant<T> {
    fn arg_type(&self) -> ArgType { ArgType::Variant }
    fn signature(&self) -> Signature<'static> { Signature::new_unchecked("v") }
    fn append(&self, i: &mut IterAppend) {
        let sig = self.0.signature();
        i.append_variant(&sig, |s| self.0.append(s));
    }
    #[inline]
    fn as_any(&self) -> &dyn any::Any where T: 'static { self }
    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn any::Any where T: 'static { self }
    #[inline]
    fn as_i64(&self) -> Option<i64> { self.0.as_i64() }
    #[inline]
    fn as_u64(&self) -> Option<u64> { self.0.as_u64() }
    #[inline]
    fn as_f64(&self) -> Option<f64> { self.0.as_f64() }
    #[inline]
    fn as_str(&self) -> Option<&str> { self.0.as_str() }
    #[inline]
    fn as_iter<'a>(&'a self) -> Option<Box<dyn Iterator<Item=&'a dyn RefArg> + 'a>> {
        self.0.as_iter()
    }
}

macro_rules! argall_str {
    ($t: ident) => { &'static str }
}

macro_rules! struct_impl {
    ($($n: ident $t: ident,)+) => {

/// Tuples are represented as D-Bus structs.
impl<$($t: Arg),*> Arg for ($($t,)*) {
    const ARG_TYPE: ArgType = ArgType::Struct;
    fn signature() -> Signature<'static> {
        let mut s = String::from("(");
        $( s.push_str(&$t::signature()); )*
        s.push(')');
        Signature::new_unchecked(s)
    }
}

impl<$($t: Append),*> Append for ($($t,)*) {
    fn append(self, i: &mut IterAppend) {
        let ($($n,)*) = self;
        i.append_struct(|s| { $( s.append($n); )* });
    }
}

impl<'a, $($t: Get<'a>),*> Get<'a> for ($($t,)*) {
    fn get(i: &mut Iter<'a>) -> Option<Self> {
        let mut sub = i.recurse(ArgType::Struct)?;
        let r = ($( { let x = $t::get(&mut sub)?; sub.next(); x },)*);
        // Surplus fields make the value a different struct type.
        if sub.arg_type() != ArgType::Invalid { return None; }
        Some(r)
    }
}

impl<$($t: Arg + for<'z> Get<'z>),*> ReadAll for ($($t,)*) {
    fn read(i: &mut Iter) -> Result<Self, TypeMismatchError> {
        Ok(($( i.read::<$t>()?, )*))
    }
}

impl<$($t: Append + Clone),*> AppendAll for ($($t,)*) {
    fn append(&self, i: &mut IterAppend) {
        let ($($n,)*) = self;
        $( i.append($n.clone()); )*
    }
}

impl<$($t: Arg),*> ArgAll for ($($t,)*) {
    type strs = ($(argall_str!($t),)*);
    fn strs_sig<__StrsSigF: FnMut(&'static str, Signature<'static>)>(z: Self::strs, mut f: __StrsSigF) {
        let ($($n,)*) = z;
        $( f($n, $t::signature()); )*
    }
}

    }
}

struct_impl!(a A,);
struct_impl!(a A, b B,);
struct_impl!(a A, b B, c C,);
struct_impl!(a A, b B, c C, d D,);
struct_impl!(a A, b B, c C, d D, e E,);
struct_impl!(a A, b B, c C, d D, e E, f F,);
struct_impl!(a A, b B, c C, d D, e E, f F, g G,);
struct_impl!(a A, b B, c C, d D, e E, f F, g G, h H,);
struct_impl!(a A, b B, c C, d D, e E, f F, g G, h H, i I,);
struct_impl!(a A, b B, c C, d D, e E, f F, g G, h H, i I, j J,);

impl ReadAll for () {
    fn read(_: &mut Iter) -> Result<Self, TypeMismatchError> { Ok(()) }
}

impl AppendAll for () {
    fn append(&self, _: &mut IterAppend) {}
}

impl ArgAll for () {
    type strs = ();
    fn strs_sig<F: FnMut(&'static str, Signature<'static>)>(_: (), _: F) {}
}
