//! This module contains strings with a specific format, such as a valid
//! Interface name, a valid Error name, etc.
//!
//! The internal representation is `Cow<str>`, so owned and borrowed strings
//! share one type and a validated string can be kept without reallocation.

use std::borrow::{Borrow, Cow};
use std::{default, fmt, hash, ops};

/// The supplied string was not valid for the requested string type.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct InvalidStringError {
    kind: &'static str,
    string: String,
}

impl fmt::Display for InvalidStringError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "'{}' is not a valid {}", self.string, self.kind)
    }
}

impl std::error::Error for InvalidStringError {}

macro_rules! dbus_string_wrapper {
    ($(#[$comments:meta])* $t: ident, $validate: ident) => {

$(#[$comments])*
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct $t<'a>(Cow<'a, str>);

impl<'m> $t<'m> {
    /// Creates a new instance of this struct, checking that the string
    /// conforms to the corresponding D-Bus grammar.
    pub fn new<S: Into<Cow<'m, str>>>(s: S) -> Result<$t<'m>, InvalidStringError> {
        let c = s.into();
        match validity::$validate(c.as_bytes()) {
            Ok(()) => Ok($t(c)),
            Err(()) => Err(InvalidStringError { kind: stringify!($t), string: c.into_owned() }),
        }
    }

    /// Creates a new instance of this struct without checking the grammar.
    ///
    /// Sending an actually invalid string over D-Bus can get you immediately
    /// disconnected from the server, so use only with known-good input.
    pub fn new_unchecked<S: Into<Cow<'m, str>>>(s: S) -> $t<'m> {
        $t(s.into())
    }

    /// Makes sure this string does not contain borrows.
    pub fn into_static(self) -> $t<'static> {
        $t(Cow::Owned(self.0.into_owned()))
    }

    /// Unwraps the inner string.
    pub fn into_string(self) -> String { self.0.into_owned() }
}

/// #Panics
///
/// If given string is not valid.
impl<'m> From<String> for $t<'m> {
    fn from(s: String) -> $t<'m> { $t::new(s).unwrap() }
}

/// #Panics
///
/// If given string is not valid.
impl<'m> From<&'m str> for $t<'m> {
    fn from(s: &'m str) -> $t<'m> { $t::new(s).unwrap() }
}

/// #Panics
///
/// If given string is not valid.
impl<'m> From<&'m String> for $t<'m> {
    fn from(s: &'m String) -> $t<'m> { $t::new(&**s).unwrap() }
}

/// #Panics
///
/// If given string is not valid.
impl<'m> From<Cow<'m, str>> for $t<'m> {
    fn from(s: Cow<'m, str>) -> $t<'m> {
        match s {
            Cow::Borrowed(z) => z.into(),
            Cow::Owned(z) => z.into(),
        }
    }
}

impl<'inner, 'm: 'inner> From<&'m $t<'inner>> for $t<'m> {
    fn from(borrow: &'m $t<'inner>) -> $t<'m> {
        $t(Cow::Borrowed(borrow.0.borrow()))
    }
}

impl<'m> ops::Deref for $t<'m> {
    type Target = str;
    fn deref(&self) -> &str { &self.0 }
}

impl<'m> AsRef<str> for $t<'m> {
    fn as_ref(&self) -> &str { &self.0 }
}

impl<'m> fmt::Display for $t<'m> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        <str as fmt::Display>::fmt(self, f)
    }
}

impl<'m> hash::Hash for $t<'m> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

}}

dbus_string_wrapper!(
    /// A wrapper around a string that is guaranteed to be
    /// a valid (single) D-Bus type signature.
    Signature, is_valid_signature_single
);

impl Signature<'static> {
    /// Makes a D-Bus signature that corresponds to A.
    pub fn make<A: crate::arg::Arg>() -> Signature<'static> { A::signature() }
}

dbus_string_wrapper!(
    /// A wrapper around a string that is guaranteed to be
    /// a valid D-Bus object path.
    Path, is_valid_object_path
);

// This is needed so one can make arrays of paths easily
impl<'a> default::Default for Path<'a> {
    fn default() -> Path<'a> { Path(Cow::Borrowed("/")) }
}

dbus_string_wrapper!(
    /// A wrapper around a string that is guaranteed to be
    /// a valid D-Bus member, i e, a signal or method name.
    Member, is_valid_member_name
);

dbus_string_wrapper!(
    /// A wrapper around a string that is guaranteed to be
    /// a valid D-Bus interface name.
    Interface, is_valid_interface_name
);

dbus_string_wrapper!(
    /// A wrapper around a string that is guaranteed to be
    /// a valid D-Bus bus name.
    BusName, is_valid_bus_name
);

dbus_string_wrapper!(
    /// A wrapper around a string that is guaranteed to be
    /// a valid D-Bus error name.
    ErrorName, is_valid_error_name
);

mod validity {
    fn is_az_(b: u8) -> Result<(), ()> {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => Ok(()),
            _ => Err(()),
        }
    }

    fn is_az09_(b: u8) -> Result<(), ()> {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' => Ok(()),
            _ => Err(()),
        }
    }

    fn is_az_hyphen(b: u8) -> Result<(), ()> {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'_' | b'-' => Ok(()),
            _ => Err(()),
        }
    }

    fn is_az09_hyphen(b: u8) -> Result<(), ()> {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' => Ok(()),
            _ => Err(()),
        }
    }

    pub fn is_valid_member_name(s: &[u8]) -> Result<(), ()> {
        if s.len() > 255 { Err(())? }
        let mut x = s.iter();
        let c = *x.next().ok_or(())?;
        is_az_(c)?;
        for c in x { is_az09_(*c)? }
        Ok(())
    }

    pub fn is_valid_error_name(s: &[u8]) -> Result<(), ()> {
        is_valid_interface_name(s)
    }

    pub fn is_valid_interface_name(s: &[u8]) -> Result<(), ()> {
        if s.len() > 255 { Err(())? }
        let mut x = s.iter();
        let mut elements = 1;
        'outer: loop {
            let c = *x.next().ok_or(())?;
            is_az_(c)?;
            while let Some(&c) = x.next() {
                if c == b'.' {
                    elements += 1;
                    continue 'outer;
                }
                is_az09_(c)?;
            }
            return if elements > 1 { Ok(()) } else { Err(()) };
        }
    }

    fn is_valid_unique_conn_name(mut x: std::slice::Iter<u8>) -> Result<(), ()> {
        let mut elements = 1;
        'outer: loop {
            let c = *x.next().ok_or(())?;
            is_az09_hyphen(c)?;
            while let Some(&c) = x.next() {
                if c == b'.' {
                    elements += 1;
                    continue 'outer;
                }
                is_az09_hyphen(c)?;
            }
            return if elements > 1 { Ok(()) } else { Err(()) };
        }
    }

    pub fn is_valid_bus_name(s: &[u8]) -> Result<(), ()> {
        if s.len() > 255 { return Err(()); }
        let mut x = s.iter();
        let mut c_first = *x.next().ok_or(())?;
        if c_first == b':' { return is_valid_unique_conn_name(x); }
        let mut elements = 1;
        'outer: loop {
            is_az_hyphen(c_first)?;
            while let Some(&c) = x.next() {
                if c == b'.' {
                    elements += 1;
                    c_first = *x.next().ok_or(())?;
                    continue 'outer;
                }
                is_az09_hyphen(c)?;
            }
            return if elements > 1 { Ok(()) } else { Err(()) };
        }
    }

    pub fn is_valid_object_path(s: &[u8]) -> Result<(), ()> {
        let mut x = s.iter();
        if x.next() != Some(&b'/') { Err(())? }
        if s.len() == 1 { return Ok(()) }

        'outer: loop {
            let c = *x.next().ok_or(())?;
            is_az09_(c)?;
            while let Some(&c) = x.next() {
                if c == b'/' { continue 'outer; }
                is_az09_(c)?;
            }
            return Ok(());
        }
    }

    pub fn is_valid_signature_single(s: &[u8]) -> Result<(), ()> {
        let s = std::str::from_utf8(s).map_err(|_| ())?;
        crate::types::Type::parse_single(s).map(|_| ()).map_err(|_| ())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn member() {
        assert!(Member::new("").is_err());
        assert!(Member::new("He11o").is_ok());
        assert!(Member::new("He11o!").is_err());
        assert!(Member::new("1Hello").is_err());
        assert!(Member::new(":1.54").is_err());
    }

    #[test]
    fn interface() {
        assert!(Interface::new("").is_err());
        assert!(Interface::new("He11o").is_err());
        assert!(Interface::new("Hello.").is_err());
        assert!(Interface::new("Hello!.World").is_err());
        assert!(Interface::new("ZZZ.1Hello").is_err());
        assert!(Interface::new("Hello.W0rld").is_ok());
        assert!(Interface::new(":1.54").is_err());
    }

    #[test]
    fn bus() {
        assert!(BusName::new("").is_err());
        assert!(BusName::new("He11o").is_err());
        assert!(BusName::new("Hello.").is_err());
        assert!(BusName::new("ZZZ.1Hello").is_err());
        assert!(BusName::new("Hello.W0rld").is_ok());
        assert!(BusName::new(":1.54").is_ok());
        assert!(BusName::new("1.54").is_err());
    }

    #[test]
    fn object_path() {
        assert!(Path::new("").is_err());
        assert!(Path::new("/").is_ok());
        assert!(Path::new("/1234").is_ok());
        assert!(Path::new("/abce/").is_err());
        assert!(Path::new("/ab//c/d").is_err());
        assert!(Path::new("/a/c/df1").is_ok());
        assert!(Path::new("/12.43/fasd").is_err());
        assert!(Path::new("/asdf/_123").is_ok());
    }

    #[test]
    fn signature() {
        assert!(Signature::new("").is_err());
        assert!(Signature::new("i").is_ok());
        assert!(Signature::new("ii").is_err());
        assert!(Signature::new("vi").is_err());
        assert!(Signature::new("g").is_ok());
        assert!(Signature::new("{ss}").is_err());
        assert!(Signature::new("ad").is_ok());
        assert!(Signature::new("a{ss}").is_ok());
        assert!(Signature::new("a{vs}").is_err());
        assert!(Signature::new("a{ss}i").is_err());
        assert!(Signature::new("a{oa{sv}}").is_ok());
        assert!(Signature::new("v").is_ok());
        assert!(Signature::new("()").is_err());
        assert!(Signature::new("(s)").is_ok());
        assert!(Signature::new("(sa{sv}(i))").is_ok());
        assert!(Signature::new("(sa{sv}(i)").is_err());
        assert!(Signature::new("(dbus)").is_ok());
    }

    #[test]
    fn reborrow_path() {
        let p1 = Path::from("/valid");
        let p2 = p1.clone();
        {
            let p2_borrow: &Path = &p2;
            let p3 = Path::from(p2_borrow);
            assert_eq!(p2, p3);
        }
        assert_eq!(p1, p2);
    }

    #[test]
    fn make_sig() {
        assert_eq!(&*Signature::make::<(String, u8)>(), "(sy)");
    }
}
