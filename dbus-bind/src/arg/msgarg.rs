use crate::strings::Signature;
use crate::types::ArgType;
use super::{Iter, IterAppend, TypeMismatchError, Value};
use std::{any, fmt};
use std::sync::Arc;
use std::rc::Rc;

/// Types that can represent a D-Bus message argument implement this trait.
///
/// Types should also implement either Append or Get to be useful.
pub trait Arg {
    /// The corresponding D-Bus argument type code.
    const ARG_TYPE: ArgType;
    /// The corresponding D-Bus type signature for this type.
    fn signature() -> Signature<'static>;
}

/// Types that can be appended to a message as arguments implement this trait.
pub trait Append: Sized {
    /// Performs the append operation.
    fn append(self, i: &mut IterAppend);
}

/// Types that can be retrieved from a message as arguments implement this trait.
pub trait Get<'a>: Sized {
    /// Performs the get operation.
    ///
    /// Returns None if the current argument is not of the right type;
    /// the iterator is left where it was.
    fn get(i: &mut Iter<'a>) -> Option<Self>;
}

/// Types that can be used as keys in a dict type implement this trait.
pub trait DictKey: Arg {}

/// Object safe version of Arg + Append + Get.
pub trait RefArg: fmt::Debug {
    /// The corresponding D-Bus argument type code.
    fn arg_type(&self) -> ArgType;
    /// The corresponding D-Bus type signature for this type.
    fn signature(&self) -> Signature<'static>;
    /// Performs the append operation.
    fn append(&self, i: &mut IterAppend);
    /// Transforms this argument to Any (which can be downcasted to read the current value).
    fn as_any(&self) -> &dyn any::Any where Self: 'static;
    /// Transforms this argument to Any (which can be downcasted to read the current value).
    fn as_any_mut(&mut self) -> &mut dyn any::Any where Self: 'static;
    /// Try to read the argument as an i64.
    #[inline]
    fn as_i64(&self) -> Option<i64> { None }
    /// Try to read the argument as a u64.
    #[inline]
    fn as_u64(&self) -> Option<u64> { None }
    /// Try to read the argument as an f64.
    #[inline]
    fn as_f64(&self) -> Option<f64> { None }
    /// Try to read the argument as a str.
    #[inline]
    fn as_str(&self) -> Option<&str> { None }
    /// Try to read the argument as an iterator.
    ///
    /// For dicts, keys and values alternate.
    #[inline]
    fn as_iter<'a>(&'a self) -> Option<Box<dyn Iterator<Item=&'a dyn RefArg> + 'a>> { None }
}

/// Cast a RefArg as a specific type (shortcut for as_any + downcast_ref).
#[inline]
pub fn cast<'a, T: 'static>(a: &'a (dyn RefArg + 'static)) -> Option<&'a T> {
    a.as_any().downcast_ref()
}

/// Cast a RefArg as a specific type (shortcut for as_any_mut + downcast_mut).
#[inline]
pub fn cast_mut<'a, T: 'static>(a: &'a mut (dyn RefArg + 'static)) -> Option<&'a mut T> {
    a.as_any_mut().downcast_mut()
}

/// Simple lift over reference to value - this makes some iterators more ergonomic to use
impl<'a, T: Arg> Arg for &'a T {
    const ARG_TYPE: ArgType = T::ARG_TYPE;
    fn signature() -> Signature<'static> { T::signature() }
}
impl<'a, T: Append + Clone> Append for &'a T {
    fn append(self, i: &mut IterAppend) { self.clone().append(i) }
}
impl<'a, T: DictKey> DictKey for &'a T {}

impl<'a, T: RefArg + ?Sized> RefArg for &'a T {
    #[inline]
    fn arg_type(&self) -> ArgType { (&**self).arg_type() }
    #[inline]
    fn signature(&self) -> Signature<'static> { (&**self).signature() }
    #[inline]
    fn append(&self, i: &mut IterAppend) { (&**self).append(i) }
    #[inline]
    fn as_any(&self) -> &dyn any::Any where T: 'static { (&**self).as_any() }
    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn any::Any where T: 'static { unreachable!() }
    #[inline]
    fn as_i64(&self) -> Option<i64> { (&**self).as_i64() }
    #[inline]
    fn as_u64(&self) -> Option<u64> { (&**self).as_u64() }
    #[inline]
    fn as_f64(&self) -> Option<f64> { (&**self).as_f64() }
    #[inline]
    fn as_str(&self) -> Option<&str> { (&**self).as_str() }
    #[inline]
    fn as_iter<'b>(&'b self) -> Option<Box<dyn Iterator<Item=&'b dyn RefArg> + 'b>> {
        (&**self).as_iter()
    }
}

macro_rules! deref_impl {
    ($t: ident, $ss: ident, $make_mut: expr) => {

impl<T: RefArg + ?Sized> RefArg for $t<T> {
    #[inline]
    fn arg_type(&self) -> ArgType { (&**self).arg_type() }
    #[inline]
    fn signature(&self) -> Signature<'static> { (&**self).signature() }
    #[inline]
    fn append(&self, i: &mut IterAppend) { (&**self).append(i) }
    #[inline]
    fn as_any(&self) -> &dyn any::Any where T: 'static { (&**self).as_any() }
    #[inline]
    fn as_any_mut<'a>(&'a mut $ss) -> &'a mut dyn any::Any where T: 'static { $make_mut.as_any_mut() }
    #[inline]
    fn as_i64(&self) -> Option<i64> { (&**self).as_i64() }
    #[inline]
    fn as_u64(&self) -> Option<u64> { (&**self).as_u64() }
    #[inline]
    fn as_f64(&self) -> Option<f64> { (&**self).as_f64() }
    #[inline]
    fn as_str(&self) -> Option<&str> { (&**self).as_str() }
    #[inline]
    fn as_iter<'a>(&'a self) -> Option<Box<dyn Iterator<Item=&'a dyn RefArg> + 'a>> {
        (&**self).as_iter()
    }
}
impl<T: DictKey> DictKey for $t<T> {}

impl<T: Arg> Arg for $t<T> {
    const ARG_TYPE: ArgType = T::ARG_TYPE;
    fn signature() -> Signature<'static> { T::signature() }
}
impl<'a, T: Get<'a>> Get<'a> for $t<T> {
    fn get(i: &mut Iter<'a>) -> Option<Self> { T::get(i).map(|v| $t::new(v)) }
}

    }
}

impl<T: Append> Append for Box<T> {
    fn append(self, i: &mut IterAppend) { let q: T = *self; q.append(i) }
}

deref_impl!(Box, self, &mut **self );
deref_impl!(Rc, self, Rc::get_mut(self).unwrap());
deref_impl!(Arc, self, Arc::get_mut(self).unwrap());

/// The dynamically typed argument tree implements RefArg itself, which is
/// what `Iter::get_refarg` hands out.
impl RefArg for Value {
    fn arg_type(&self) -> ArgType { Value::arg_type(self) }
    fn signature(&self) -> Signature<'static> { Value::signature(self) }
    fn append(&self, i: &mut IterAppend) { i.push(self.clone()) }
    fn as_any(&self) -> &dyn any::Any {
        match self {
            Value::Byte(v) => v,
            Value::Boolean(v) => v,
            Value::Int16(v) => v,
            Value::UInt16(v) => v,
            Value::Int32(v) => v,
            Value::UInt32(v) => v,
            Value::Int64(v) => v,
            Value::UInt64(v) => v,
            Value::Double(v) => v,
            Value::Str(v) => v,
            Value::Path(v) => v,
            Value::Sig(v) => v,
            Value::Fd(v) => v,
            v => v,
        }
    }
    fn as_any_mut(&mut self) -> &mut dyn any::Any {
        match self {
            Value::Byte(v) => v,
            Value::Boolean(v) => v,
            Value::Int16(v) => v,
            Value::UInt16(v) => v,
            Value::Int32(v) => v,
            Value::UInt32(v) => v,
            Value::Int64(v) => v,
            Value::UInt64(v) => v,
            Value::Double(v) => v,
            Value::Str(v) => v,
            Value::Path(v) => v,
            Value::Sig(v) => v,
            Value::Fd(v) => v,
            v => v,
        }
    }
    fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(*v as i64),
            Value::Boolean(v) => Some(*v as i64),
            Value::Int16(v) => Some(*v as i64),
            Value::UInt16(v) => Some(*v as i64),
            Value::Int32(v) => Some(*v as i64),
            Value::UInt32(v) => Some(*v as i64),
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }
    fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Byte(v) => Some(*v as u64),
            Value::Boolean(v) => Some(*v as u64),
            Value::UInt16(v) => Some(*v as u64),
            Value::UInt32(v) => Some(*v as u64),
            Value::UInt64(v) => Some(*v),
            _ => None,
        }
    }
    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }
    fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            Value::Path(v) => Some(v),
            Value::Sig(v) => Some(v),
            _ => None,
        }
    }
    fn as_iter<'a>(&'a self) -> Option<Box<dyn Iterator<Item=&'a dyn RefArg> + 'a>> {
        match self {
            Value::Array(_, items) => Some(Box::new(items.iter().flat_map(|v| {
                let b: Box<dyn Iterator<Item=&'a dyn RefArg> + 'a> = match v {
                    // Dicts iterate as alternating keys and values.
                    Value::DictEntry(pair) => Box::new(pair.iter().map(|x| x as &dyn RefArg)),
                    x => Box::new(std::iter::once(x as &dyn RefArg)),
                };
                b
            }))),
            Value::Struct(fields) => Some(Box::new(fields.iter().map(|x| x as &dyn RefArg))),
            Value::DictEntry(pair) => Some(Box::new(pair.iter().map(|x| x as &dyn RefArg))),
            Value::Variant(inner) => Some(Box::new(std::iter::once(&**inner as &dyn RefArg))),
            _ => None,
        }
    }
}

/// Types that every argument in a message, taken together, can convert to
/// and from implement these traits.
///
/// In practice these are tuples of Append/Get types, used by generated code
/// to encode and decode whole argument lists.
pub trait AppendAll {
    /// Performs the append operation.
    fn append(&self, i: &mut IterAppend);
}

/// The counterpart of AppendAll for reading all arguments of a message.
pub trait ReadAll: Sized {
    /// Performs the read operation.
    fn read(i: &mut Iter) -> Result<Self, TypeMismatchError>;
}

/// Helper trait to introspect many arguments: pairs every argument name with
/// the corresponding signature.
#[allow(non_camel_case_types)]
pub trait ArgAll {
    /// A tuple of &str with the same arity as Self.
    type strs;
    /// Enumerates (name, signature) pairs for the arguments.
    fn strs_sig<F: FnMut(&'static str, Signature<'static>)>(a: Self::strs, f: F);
}
