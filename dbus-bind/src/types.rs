//! The D-Bus type model: type codes, the type tree, and the signature grammar.
//!
//! Signatures are parsed by a recursive-descent walk over the signature
//! string. A dict entry is accepted only as the immediate element of an
//! array, with a basic key type, which is the only place the D-Bus grammar
//! allows one.

use crate::strings::Signature;
use std::fmt;

/// Maximum nesting depth for arrays and for structs, per the D-Bus
/// specification.
const MAX_DEPTH: u8 = 32;

/// The type code of a single message argument, as found in signature strings.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ArgType {
    /// Not a valid argument type; also used for "end of arguments".
    Invalid,
    /// Unsigned 8 bit integer ('y').
    Byte,
    /// Boolean ('b').
    Boolean,
    /// Signed 16 bit integer ('n').
    Int16,
    /// Unsigned 16 bit integer ('q').
    UInt16,
    /// Signed 32 bit integer ('i').
    Int32,
    /// Unsigned 32 bit integer ('u').
    UInt32,
    /// Signed 64 bit integer ('x').
    Int64,
    /// Unsigned 64 bit integer ('t').
    UInt64,
    /// IEEE-754 double precision float ('d').
    Double,
    /// UTF-8 string ('s').
    String,
    /// Object path ('o').
    ObjectPath,
    /// Type signature ('g').
    Signature,
    /// File descriptor ('h').
    UnixFd,
    /// Array or dict ('a').
    Array,
    /// Struct ('(').
    Struct,
    /// Dict entry ('{'); only valid as the element type of an array.
    DictEntry,
    /// Variant ('v').
    Variant,
}

impl ArgType {
    /// Returns the signature character for this type, or '\0' for Invalid.
    pub fn as_char(self) -> char {
        match self {
            ArgType::Invalid => '\0',
            ArgType::Byte => 'y',
            ArgType::Boolean => 'b',
            ArgType::Int16 => 'n',
            ArgType::UInt16 => 'q',
            ArgType::Int32 => 'i',
            ArgType::UInt32 => 'u',
            ArgType::Int64 => 'x',
            ArgType::UInt64 => 't',
            ArgType::Double => 'd',
            ArgType::String => 's',
            ArgType::ObjectPath => 'o',
            ArgType::Signature => 'g',
            ArgType::UnixFd => 'h',
            ArgType::Array => 'a',
            ArgType::Struct => '(',
            ArgType::DictEntry => '{',
            ArgType::Variant => 'v',
        }
    }

    /// Returns the type for a signature character, if there is one.
    pub fn from_char(c: char) -> Option<ArgType> {
        Some(match c {
            'y' => ArgType::Byte,
            'b' => ArgType::Boolean,
            'n' => ArgType::Int16,
            'q' => ArgType::UInt16,
            'i' => ArgType::Int32,
            'u' => ArgType::UInt32,
            'x' => ArgType::Int64,
            't' => ArgType::UInt64,
            'd' => ArgType::Double,
            's' => ArgType::String,
            'o' => ArgType::ObjectPath,
            'g' => ArgType::Signature,
            'h' => ArgType::UnixFd,
            'a' => ArgType::Array,
            '(' => ArgType::Struct,
            '{' => ArgType::DictEntry,
            'v' => ArgType::Variant,
            _ => return None,
        })
    }

    /// Whether this is a basic (non-container) type.
    pub fn is_basic(self) -> bool {
        match self {
            ArgType::Array | ArgType::Struct | ArgType::DictEntry | ArgType::Variant
            | ArgType::Invalid => false,
            _ => true,
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            ArgType::Invalid => "nothing",
            ArgType::Byte => "byte",
            ArgType::Boolean => "boolean",
            ArgType::Int16 => "int16",
            ArgType::UInt16 => "uint16",
            ArgType::Int32 => "int32",
            ArgType::UInt32 => "uint32",
            ArgType::Int64 => "int64",
            ArgType::UInt64 => "uint64",
            ArgType::Double => "double",
            ArgType::String => "string",
            ArgType::ObjectPath => "object path",
            ArgType::Signature => "signature",
            ArgType::UnixFd => "file descriptor",
            ArgType::Array => "array",
            ArgType::Struct => "struct",
            ArgType::DictEntry => "dict entry",
            ArgType::Variant => "variant",
        };
        f.write_str(s)
    }
}

/// A complete D-Bus type, basic or container.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Type {
    /// Unsigned 8 bit integer.
    Byte,
    /// Boolean.
    Boolean,
    /// Signed 16 bit integer.
    Int16,
    /// Unsigned 16 bit integer.
    UInt16,
    /// Signed 32 bit integer.
    Int32,
    /// Unsigned 32 bit integer.
    UInt32,
    /// Signed 64 bit integer.
    Int64,
    /// Unsigned 64 bit integer.
    UInt64,
    /// IEEE-754 double precision float.
    Double,
    /// UTF-8 string.
    String,
    /// Object path.
    ObjectPath,
    /// Type signature.
    Signature,
    /// File descriptor.
    UnixFd,
    /// Ordered sequence of one element type; possibly empty.
    Array(Box<Type>),
    /// Fixed-arity tuple of one or more field types.
    Struct(Vec<Type>),
    /// Key-value pair; only the element of an array, key must be basic.
    DictEntry(Box<Type>, Box<Type>),
    /// A type-tagged boxed value.
    Variant,
}

/// A signature failed to parse; reports where and why.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SigParseError {
    /// Byte position into the signature string.
    pub pos: usize,
    /// What went wrong at that position.
    pub reason: &'static str,
}

impl fmt::Display for SigParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid signature at position {}: {}", self.pos, self.reason)
    }
}

impl std::error::Error for SigParseError {}

struct SigParser<'a> {
    s: &'a [u8],
    pos: usize,
}

impl<'a> SigParser<'a> {
    fn peek(&self) -> Option<u8> { self.s.get(self.pos).cloned() }

    fn err(&self, reason: &'static str) -> SigParseError {
        SigParseError { pos: self.pos, reason }
    }

    fn single(&mut self, arrs: u8, structs: u8) -> Result<Type, SigParseError> {
        let c = self.peek().ok_or_else(|| self.err("unexpected end of signature"))?;
        self.pos += 1;
        Ok(match c {
            b'y' => Type::Byte,
            b'b' => Type::Boolean,
            b'n' => Type::Int16,
            b'q' => Type::UInt16,
            b'i' => Type::Int32,
            b'u' => Type::UInt32,
            b'x' => Type::Int64,
            b't' => Type::UInt64,
            b'd' => Type::Double,
            b's' => Type::String,
            b'o' => Type::ObjectPath,
            b'g' => Type::Signature,
            b'h' => Type::UnixFd,
            b'v' => Type::Variant,
            b'a' => {
                if arrs >= MAX_DEPTH { return Err(self.err("arrays nested too deeply")); }
                if self.peek() == Some(b'{') {
                    self.pos += 1;
                    let key = self.single(arrs + 1, structs)?;
                    if !key.arg_type().is_basic() {
                        return Err(self.err("dict entry key must be a basic type"));
                    }
                    let value = self.single(arrs + 1, structs)?;
                    if self.peek() != Some(b'}') {
                        return Err(self.err("expected '}' closing dict entry"));
                    }
                    self.pos += 1;
                    Type::Array(Box::new(Type::DictEntry(Box::new(key), Box::new(value))))
                } else {
                    Type::Array(Box::new(self.single(arrs + 1, structs)?))
                }
            }
            b'(' => {
                if structs >= MAX_DEPTH { return Err(self.err("structs nested too deeply")); }
                let mut fields = vec![];
                while self.peek() != Some(b')') {
                    fields.push(self.single(arrs, structs + 1)?);
                }
                self.pos += 1;
                if fields.is_empty() { return Err(self.err("empty struct")); }
                Type::Struct(fields)
            }
            b'{' => return Err(self.err("dict entry outside array")),
            _ => {
                self.pos -= 1;
                return Err(self.err("unknown type code"));
            }
        })
    }
}

impl Type {
    /// Parses a signature holding exactly one complete type.
    pub fn parse_single(s: &str) -> Result<Type, SigParseError> {
        if s.len() > 255 { return Err(SigParseError { pos: 255, reason: "signature too long" }); }
        let mut p = SigParser { s: s.as_bytes(), pos: 0 };
        let t = p.single(0, 0)?;
        if p.pos != s.len() { return Err(p.err("trailing characters after complete type")); }
        Ok(t)
    }

    /// Parses a signature holding zero or more complete types.
    pub fn parse_multi(s: &str) -> Result<Vec<Type>, SigParseError> {
        if s.len() > 255 { return Err(SigParseError { pos: 255, reason: "signature too long" }); }
        let mut p = SigParser { s: s.as_bytes(), pos: 0 };
        let mut v = vec![];
        while p.pos < s.len() {
            v.push(p.single(0, 0)?);
        }
        Ok(v)
    }

    /// The outermost type code of this type.
    pub fn arg_type(&self) -> ArgType {
        match self {
            Type::Byte => ArgType::Byte,
            Type::Boolean => ArgType::Boolean,
            Type::Int16 => ArgType::Int16,
            Type::UInt16 => ArgType::UInt16,
            Type::Int32 => ArgType::Int32,
            Type::UInt32 => ArgType::UInt32,
            Type::Int64 => ArgType::Int64,
            Type::UInt64 => ArgType::UInt64,
            Type::Double => ArgType::Double,
            Type::String => ArgType::String,
            Type::ObjectPath => ArgType::ObjectPath,
            Type::Signature => ArgType::Signature,
            Type::UnixFd => ArgType::UnixFd,
            Type::Array(_) => ArgType::Array,
            Type::Struct(_) => ArgType::Struct,
            Type::DictEntry(_, _) => ArgType::DictEntry,
            Type::Variant => ArgType::Variant,
        }
    }

    fn write_sig(&self, out: &mut String) {
        match self {
            Type::Array(t) => {
                out.push('a');
                t.write_sig(out);
            }
            Type::Struct(fields) => {
                out.push('(');
                for f in fields { f.write_sig(out); }
                out.push(')');
            }
            Type::DictEntry(k, v) => {
                out.push('{');
                k.write_sig(out);
                v.write_sig(out);
                out.push('}');
            }
            t => out.push(t.arg_type().as_char()),
        }
    }

    /// The signature string of this type. Total and injective: distinct
    /// types print distinct signatures, and `parse_single` inverts it.
    pub fn signature(&self) -> Signature<'static> {
        let mut s = String::new();
        self.write_sig(&mut s);
        Signature::new_unchecked(s)
    }

    /// The wire alignment of this type in bytes, for implementations that
    /// need to compute struct-member padding.
    pub fn alignment(&self) -> usize {
        match self {
            Type::Byte | Type::Signature | Type::Variant => 1,
            Type::Int16 | Type::UInt16 => 2,
            Type::Boolean | Type::Int32 | Type::UInt32 | Type::String | Type::ObjectPath
            | Type::UnixFd | Type::Array(_) => 4,
            Type::Int64 | Type::UInt64 | Type::Double | Type::Struct(_) | Type::DictEntry(_, _) => 8,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_basic() {
        assert_eq!(Type::parse_single("i"), Ok(Type::Int32));
        assert_eq!(Type::parse_single("as"), Ok(Type::Array(Box::new(Type::String))));
        assert_eq!(Type::parse_multi("").unwrap(), vec![]);
        assert_eq!(Type::parse_multi("iis").unwrap(),
            vec![Type::Int32, Type::Int32, Type::String]);
    }

    #[test]
    fn parse_containers() {
        let t = Type::parse_single("a{s(iu)}").unwrap();
        assert_eq!(t, Type::Array(Box::new(Type::DictEntry(
            Box::new(Type::String),
            Box::new(Type::Struct(vec![Type::Int32, Type::UInt32]))))));
        assert_eq!(t.signature(), Signature::from("a{s(iu)}"));
    }

    #[test]
    fn parse_errors() {
        assert_eq!(Type::parse_single("ii").unwrap_err().pos, 1);
        assert_eq!(Type::parse_single("z").unwrap_err().pos, 0);
        assert_eq!(Type::parse_single("a").unwrap_err().pos, 1);
        assert_eq!(Type::parse_single("(ss").unwrap_err().pos, 3);
        assert_eq!(Type::parse_single("()").unwrap_err().pos, 2);
        // Dict entries live inside arrays only, and keys are basic.
        assert!(Type::parse_single("{ss}").is_err());
        assert!(Type::parse_single("a{vs}").is_err());
        assert!(Type::parse_single("(a{ss})").is_ok());
        // Deep nesting is rejected rather than overflowing the stack.
        let deep: String = std::iter::repeat('a').take(40).chain("i".chars()).collect();
        assert!(Type::parse_single(&deep).is_err());
    }

    #[test]
    fn alignments() {
        assert_eq!(Type::parse_single("y").unwrap().alignment(), 1);
        assert_eq!(Type::parse_single("n").unwrap().alignment(), 2);
        assert_eq!(Type::parse_single("as").unwrap().alignment(), 4);
        assert_eq!(Type::parse_single("(yy)").unwrap().alignment(), 8);
        assert_eq!(Type::parse_single("t").unwrap().alignment(), 8);
        assert_eq!(Type::parse_single("v").unwrap().alignment(), 1);
    }

    #[test]
    fn roundtrip() {
        for sig in &["y", "b", "nqiuxt", "d", "sog", "h", "aai", "a(sai)", "a{oa{sv}}", "v",
                     "(yyyyuua(yv))"] {
            let types = Type::parse_multi(sig).unwrap();
            let printed: String = types.iter().map(|t| t.signature().to_string()).collect();
            assert_eq!(&printed, sig);
        }
    }
}
