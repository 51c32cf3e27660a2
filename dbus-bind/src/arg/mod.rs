//! Types and traits for easily getting a message's arguments, or appending
//! arguments to a message.
//!
//! A message body is held as a tree of values mirroring the D-Bus type
//! system. `Iter` walks that tree for decoding and `IterAppend` builds it for
//! encoding; the `Arg`/`Append`/`Get` traits map Rust types onto both.
//!
//! Decoding is strict: a value is only produced when the stored argument's
//! type matches the requested one, struct arity is exact, and array element
//! signatures must agree even for empty arrays.

mod msgarg;
mod basic_impl;
mod variantstruct_impl;
mod array_impl;

pub use self::msgarg::{Arg, Append, Get, RefArg, DictKey, AppendAll, ReadAll, ArgAll, cast, cast_mut};
pub use self::variantstruct_impl::Variant;
pub use crate::types::ArgType;

/// The type typically used for a dictionary of property names to their values.
pub type PropMap = std::collections::HashMap<String, Variant<Box<dyn RefArg + 'static>>>;

use crate::strings::{Path, Signature};
use crate::Message;
use std::os::unix::io::RawFd;
use std::fmt;

/// A simple wrapper for a duplicated file descriptor, which closes on drop.
///
/// Clones by calling `dup`, so every `OwnedFd` owns its descriptor alone.
pub struct OwnedFd {
    fd: RawFd,
}

impl OwnedFd {
    /// Creates a new OwnedFd from a RawFd, taking ownership of it.
    pub fn new(fd: RawFd) -> OwnedFd { OwnedFd { fd } }

    /// Convert an OwnedFd back into a RawFd; the caller takes over closing it.
    pub fn into_fd(self) -> RawFd {
        let fd = self.fd;
        std::mem::forget(self);
        fd
    }

    /// The raw descriptor number, still owned by this struct.
    pub fn as_raw_fd(&self) -> RawFd { self.fd }
}

impl Drop for OwnedFd {
    fn drop(&mut self) {
        unsafe { libc::close(self.fd); }
    }
}

impl Clone for OwnedFd {
    fn clone(&self) -> OwnedFd {
        let x = unsafe { libc::dup(self.fd) };
        if x == -1 { panic!("Duplicating file descriptor failed") }
        OwnedFd::new(x)
    }
}

impl fmt::Debug for OwnedFd {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "OwnedFd({})", self.fd)
    }
}

impl PartialEq for OwnedFd {
    fn eq(&self, other: &OwnedFd) -> bool { self.fd == other.fd }
}

/// A decoded or to-be-encoded message argument.
///
/// Arrays remember their element signature, so an empty array is still a
/// typed value; a dict entry appears only as an array element.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
    Byte(u8),
    Boolean(bool),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Double(f64),
    Str(String),
    Path(Path<'static>),
    Sig(Signature<'static>),
    Fd(OwnedFd),
    Array(Signature<'static>, Vec<Value>),
    Struct(Vec<Value>),
    DictEntry(Box<[Value; 2]>),
    Variant(Box<Value>),
}

impl Value {
    pub(crate) fn arg_type(&self) -> ArgType {
        match self {
            Value::Byte(_) => ArgType::Byte,
            Value::Boolean(_) => ArgType::Boolean,
            Value::Int16(_) => ArgType::Int16,
            Value::UInt16(_) => ArgType::UInt16,
            Value::Int32(_) => ArgType::Int32,
            Value::UInt32(_) => ArgType::UInt32,
            Value::Int64(_) => ArgType::Int64,
            Value::UInt64(_) => ArgType::UInt64,
            Value::Double(_) => ArgType::Double,
            Value::Str(_) => ArgType::String,
            Value::Path(_) => ArgType::ObjectPath,
            Value::Sig(_) => ArgType::Signature,
            Value::Fd(_) => ArgType::UnixFd,
            Value::Array(_, _) => ArgType::Array,
            Value::Struct(_) => ArgType::Struct,
            Value::DictEntry(_) => ArgType::DictEntry,
            Value::Variant(_) => ArgType::Variant,
        }
    }

    pub(crate) fn signature(&self) -> Signature<'static> {
        match self {
            Value::Array(esig, _) => Signature::new_unchecked(format!("a{}", esig)),
            Value::Struct(fields) => {
                let mut s = String::from("(");
                for f in fields { s.push_str(&f.signature()); }
                s.push(')');
                Signature::new_unchecked(s)
            }
            Value::DictEntry(pair) => Signature::new_unchecked(
                format!("{{{}{}}}", pair[0].signature(), pair[1].signature())),
            v => Signature::new_unchecked(v.arg_type().as_char().to_string()),
        }
    }
}

/// Error struct to indicate a D-Bus argument type mismatch.
///
/// Might be returned from `iter::read()`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TypeMismatchError {
    pub(crate) expected: ArgType,
    pub(crate) found: ArgType,
    pub(crate) position: u32,
}

impl TypeMismatchError {
    /// The ArgType we were expecting.
    pub fn expected_arg_type(&self) -> ArgType { self.expected }

    /// The ArgType we should have been expecting.
    pub fn found_arg_type(&self) -> ArgType { self.found }

    /// At what argument was the error found?
    ///
    /// Returns 0 for first argument, 1 for second argument, etc.
    pub fn pos(&self) -> u32 { self.position }
}

impl fmt::Display for TypeMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "D-Bus argument type mismatch at position {}: expected {}, found {}",
            self.position, self.expected, self.found)
    }
}

impl std::error::Error for TypeMismatchError {}

/// Helper struct for retrieving arguments from a message.
#[derive(Clone, Copy, Debug)]
pub struct Iter<'a> {
    items: &'a [Value],
    pos: usize,
}

impl<'a> Iter<'a> {
    /// Creates a new iterator over the arguments of a message.
    pub fn new(m: &'a Message) -> Iter<'a> {
        Iter { items: m.body(), pos: 0 }
    }

    pub(crate) fn from_slice(items: &'a [Value]) -> Iter<'a> {
        Iter { items, pos: 0 }
    }

    pub(crate) fn current(&self) -> Option<&'a Value> {
        self.items.get(self.pos)
    }

    /// The type of the current argument, or `ArgType::Invalid` when the
    /// iterator is exhausted.
    pub fn arg_type(&self) -> ArgType {
        self.current().map(|v| v.arg_type()).unwrap_or(ArgType::Invalid)
    }

    /// The signature of the current argument, if any.
    pub fn signature(&self) -> Option<Signature<'static>> {
        self.current().map(|v| v.signature())
    }

    /// Advances to the next argument. Returns false if there is no argument
    /// at the new position.
    pub fn next(&mut self) -> bool {
        if self.pos < self.items.len() { self.pos += 1; }
        self.pos < self.items.len()
    }

    /// Returns the current argument as T, if it is of that type.
    /// Does not advance the iterator.
    pub fn get<T: Get<'a>>(&mut self) -> Option<T> {
        T::get(self)
    }

    /// Returns the current argument as T and advances past it; on type
    /// mismatch, reports the position and the two types involved.
    pub fn read<T: Arg + Get<'a>>(&mut self) -> Result<T, TypeMismatchError> {
        let r = self.get::<T>().ok_or_else(|| TypeMismatchError {
            expected: T::ARG_TYPE,
            found: self.arg_type(),
            position: self.pos as u32,
        })?;
        self.next();
        Ok(r)
    }

    /// Opens a sub-iterator over the contents of the current container
    /// argument, if it is a container of the given kind.
    pub fn recurse(&mut self, arg_type: ArgType) -> Option<Iter<'a>> {
        let v = self.current()?;
        match (arg_type, v) {
            (ArgType::Array, Value::Array(_, items)) => Some(Iter::from_slice(items)),
            (ArgType::Struct, Value::Struct(fields)) => Some(Iter::from_slice(fields)),
            (ArgType::DictEntry, Value::DictEntry(pair)) => Some(Iter::from_slice(&pair[..])),
            (ArgType::Variant, Value::Variant(inner)) =>
                Some(Iter::from_slice(std::slice::from_ref(&**inner))),
            _ => None,
        }
    }

    /// Returns a dynamically typed copy of the current argument.
    /// Does not advance the iterator.
    pub fn get_refarg(&mut self) -> Option<Box<dyn RefArg + 'static>> {
        self.current().map(|v| Box::new(v.clone()) as Box<dyn RefArg>)
    }
}

/// Helper struct for appending one or more arguments to a message.
#[derive(Debug)]
pub struct IterAppend<'a> {
    items: &'a mut Vec<Value>,
}

impl<'a> IterAppend<'a> {
    /// Creates a new IterAppend struct appending to the body of a message.
    pub fn new(m: &'a mut Message) -> IterAppend<'a> {
        IterAppend { items: m.body_mut() }
    }

    pub(crate) fn from_vec(items: &'a mut Vec<Value>) -> IterAppend<'a> {
        IterAppend { items }
    }

    pub(crate) fn push(&mut self, v: Value) {
        self.items.push(v);
    }

    /// Appends one argument.
    pub fn append<T: Append>(&mut self, a: T) { a.append(self) }

    /// Appends a struct; the closure must append every field to its
    /// sub-iterator before the struct is closed.
    pub fn append_struct<F: FnOnce(&mut IterAppend)>(&mut self, f: F) {
        let mut fields = vec!();
        f(&mut IterAppend::from_vec(&mut fields));
        debug_assert!(!fields.is_empty(), "D-Bus structs cannot be empty");
        self.push(Value::Struct(fields));
    }

    /// Appends an array with the given element signature; an empty array is
    /// still typed by that signature.
    pub fn append_array<F: FnOnce(&mut IterAppend)>(&mut self, element_sig: &Signature, f: F) {
        let mut items = vec!();
        f(&mut IterAppend::from_vec(&mut items));
        debug_assert!(items.iter().all(|v| v.signature() == *element_sig));
        self.push(Value::Array(element_sig.clone().into_static(), items));
    }

    /// Appends a dict (an array of dict entries); inside the closure, add
    /// entries with `append_dict_entry`.
    pub fn append_dict<F: FnOnce(&mut IterAppend)>(&mut self, key_sig: &Signature,
        value_sig: &Signature, f: F)
    {
        let esig = Signature::new_unchecked(format!("{{{}{}}}", key_sig, value_sig));
        let mut entries = vec!();
        f(&mut IterAppend::from_vec(&mut entries));
        debug_assert!(entries.iter().all(|v| v.arg_type() == ArgType::DictEntry));
        self.push(Value::Array(esig, entries));
    }

    /// Appends one dict entry; the closure must append the key and then the
    /// value, nothing else.
    pub fn append_dict_entry<F: FnOnce(&mut IterAppend)>(&mut self, f: F) {
        let mut pair = vec!();
        f(&mut IterAppend::from_vec(&mut pair));
        debug_assert_eq!(pair.len(), 2, "a dict entry takes exactly a key and a value");
        if pair.len() == 2 {
            let v = pair.pop().unwrap();
            let k = pair.pop().unwrap();
            self.push(Value::DictEntry(Box::new([k, v])));
        }
    }

    /// Appends a variant holding a single value of the given signature.
    pub fn append_variant<F: FnOnce(&mut IterAppend)>(&mut self, inner_sig: &Signature, f: F) {
        let mut inner = vec!();
        f(&mut IterAppend::from_vec(&mut inner));
        debug_assert_eq!(inner.len(), 1, "a variant wraps exactly one value");
        if let Some(v) = inner.into_iter().next() {
            debug_assert_eq!(v.signature(), *inner_sig);
            self.push(Value::Variant(Box::new(v)));
        }
    }
}

#[cfg(test)]
mod test {
    use crate::Message;
    use super::*;

    #[test]
    fn iter_next_and_end() {
        let m = Message::new_method_call("com.example.hello", "/", "com.example.hello", "Hello")
            .unwrap().append2(5u8, true);
        let mut i = Iter::new(&m);
        assert_eq!(i.arg_type(), ArgType::Byte);
        assert!(i.next());
        assert_eq!(i.arg_type(), ArgType::Boolean);
        assert!(!i.next());
        assert_eq!(i.arg_type(), ArgType::Invalid);
    }
}
