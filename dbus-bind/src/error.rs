use crate::arg::TypeMismatchError;
use crate::strings::ErrorName;
use crate::Message;
use std::fmt;

/// D-Bus Error, as observed on the client side.
///
/// Carries the error name and message text of an error reply, or of a local
/// failure (e.g. a reply that did not decode).
#[derive(Debug, Clone)]
pub struct Error {
    name: Option<ErrorName<'static>>,
    message: Option<String>,
}

impl Error {
    /// Create a new custom D-Bus Error.
    pub fn new_custom<'a, N: Into<ErrorName<'a>>>(name: N, message: &str) -> Error {
        Error {
            name: Some(name.into().into_static()),
            message: Some(message.to_string()),
        }
    }

    /// Create a new generic D-Bus Error with "org.freedesktop.DBus.Error.Failed" as the Error name.
    pub fn new_failed(message: &str) -> Error {
        Error::new_custom("org.freedesktop.DBus.Error.Failed", message)
    }

    /// Error name/type, e g 'org.freedesktop.DBus.Error.Failed'
    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().map(|n| &**n)
    }

    /// Custom message, e g 'Could not find a matching object path'
    pub fn message(&self) -> Option<&str> {
        self.message.as_ref().map(|m| &**m)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{}", self.message().unwrap_or("D-Bus error"))
    }
}

impl std::error::Error for Error {}

impl From<TypeMismatchError> for Error {
    fn from(t: TypeMismatchError) -> Error {
        Error::new_custom("org.freedesktop.DBus.Error.Failed", &format!("{}", t))
    }
}

impl From<MethodErr> for Error {
    fn from(t: MethodErr) -> Error {
        Error::new_custom(t.errorname().clone(), t.description())
    }
}

/// A D-Bus Method Error, used in server side dispatch.
///
/// Both the error name and the message text travel back to the caller
/// verbatim, so a handler can answer with a domain-specific error name.
/// Generic host errors convert into "org.freedesktop.DBus.Error.Failed"
/// while keeping their message text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MethodErr(ErrorName<'static>, String);

impl MethodErr {
    /// Create an Invalid Args MethodErr, naming the offending argument.
    pub fn invalid_arg<T: fmt::Debug + ?Sized>(a: &T) -> MethodErr {
        ("org.freedesktop.DBus.Error.InvalidArgs", format!("Invalid argument {:?}", a)).into()
    }
    /// Create an Invalid Args MethodErr; use when the message has too few arguments.
    pub fn no_arg() -> MethodErr {
        ("org.freedesktop.DBus.Error.InvalidArgs", "Not enough arguments").into()
    }
    /// Create an Invalid Args MethodErr; use when the message has surplus arguments.
    pub fn too_many_args() -> MethodErr {
        ("org.freedesktop.DBus.Error.InvalidArgs", "Too many arguments").into()
    }
    /// Create a generic error, mapped to org.freedesktop.DBus.Error.Failed.
    pub fn failed<T: fmt::Display + ?Sized>(a: &T) -> MethodErr {
        ("org.freedesktop.DBus.Error.Failed", a.to_string()).into()
    }
    /// Create an Unknown Interface MethodErr.
    pub fn no_interface<T: fmt::Display + ?Sized>(a: &T) -> MethodErr {
        ("org.freedesktop.DBus.Error.UnknownInterface", format!("Unknown interface {}", a)).into()
    }
    /// Create an Unknown Method MethodErr.
    pub fn no_method<T: fmt::Display + ?Sized>(a: &T) -> MethodErr {
        ("org.freedesktop.DBus.Error.UnknownMethod", format!("Unknown method {}", a)).into()
    }
    /// Create an Unknown Property MethodErr.
    pub fn no_property<T: fmt::Display + ?Sized>(a: &T) -> MethodErr {
        ("org.freedesktop.DBus.Error.UnknownProperty", format!("Unknown property {}", a)).into()
    }
    /// Create an Unknown Method MethodErr for a path without handlers.
    ///
    /// The reserved error vocabulary has no name for a missing object, so
    /// this terminates in the same state as an unknown member.
    pub fn no_path<T: fmt::Display + ?Sized>(a: &T) -> MethodErr {
        ("org.freedesktop.DBus.Error.UnknownMethod", format!("No such object path {}", a)).into()
    }
    /// Create an Invalid Args MethodErr for a property that cannot be written.
    pub fn ro_property<T: fmt::Display + ?Sized>(a: &T) -> MethodErr {
        ("org.freedesktop.DBus.Error.InvalidArgs",
            format!("Property {} is read-only (PropertyReadOnly)", a)).into()
    }
    /// Create an Invalid Args MethodErr for a property that cannot be read.
    pub fn wo_property<T: fmt::Display + ?Sized>(a: &T) -> MethodErr {
        ("org.freedesktop.DBus.Error.InvalidArgs",
            format!("Property {} is write-only (PropertyWriteOnly)", a)).into()
    }

    /// Error name accessor
    pub fn errorname(&self) -> &ErrorName<'static> { &self.0 }
    /// Description accessor
    pub fn description(&self) -> &str { &self.1 }

    /// Creates an error reply to the message; the message must be a method call.
    pub fn to_message(&self, msg: &Message) -> Message {
        msg.error(&self.0, &self.1)
    }
}

impl fmt::Display for MethodErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.0, self.1)
    }
}

impl std::error::Error for MethodErr {}

impl<T: Into<ErrorName<'static>>, M: Into<String>> From<(T, M)> for MethodErr {
    fn from((t, m): (T, M)) -> MethodErr { MethodErr(t.into(), m.into()) }
}

/// Structural decode failures never reach the handler and always map to InvalidArgs.
impl From<TypeMismatchError> for MethodErr {
    fn from(t: TypeMismatchError) -> MethodErr {
        ("org.freedesktop.DBus.Error.InvalidArgs", format!("{}", t)).into()
    }
}

/// The generic-error mapping: any host error without a D-Bus name becomes
/// org.freedesktop.DBus.Error.Failed, with the message text preserved.
impl From<Box<dyn std::error::Error>> for MethodErr {
    fn from(e: Box<dyn std::error::Error>) -> MethodErr {
        MethodErr::failed(&e.to_string())
    }
}

impl From<Error> for MethodErr {
    fn from(e: Error) -> MethodErr {
        let name: ErrorName<'static> = e.name()
            .and_then(|n| ErrorName::new(n.to_string()).ok())
            .unwrap_or_else(|| ErrorName::new_unchecked("org.freedesktop.DBus.Error.Failed"));
        MethodErr(name, e.message().unwrap_or("").to_string())
    }
}
