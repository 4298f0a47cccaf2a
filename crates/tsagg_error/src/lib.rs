//! Error type shared by all crates in the workspace.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::borrow::Cow;
use std::error::Error;
use std::fmt;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

/// Broad category of an error.
///
/// Callers generally shouldn't need to branch on this, but it's useful for
/// deciding if an error indicates bad input, bad configuration, or a bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A type was provided that the operation doesn't support.
    UnsupportedType,
    /// Arguments didn't meet the operation's preconditions.
    InvalidArgument,
    /// Something happened that shouldn't be possible.
    Internal,
    /// A memory reservation was refused.
    ResourceExhausted,
    Other,
}

impl ErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedType => "Unsupported type",
            Self::InvalidArgument => "Invalid argument",
            Self::Internal => "Internal",
            Self::ResourceExhausted => "Resource exhausted",
            Self::Other => "Error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Value that can be attached to an error as an additional field.
pub trait ErrorFieldValue: fmt::Debug + fmt::Display + Sync + Send {}

impl<T> ErrorFieldValue for T where T: fmt::Debug + fmt::Display + Sync + Send {}

pub struct DbError {
    inner: Box<DbErrorInner>,
}

struct DbErrorInner {
    kind: ErrorKind,
    /// Message for the error.
    msg: String,
    /// Source of the error.
    source: Option<Box<dyn Error + Send + Sync>>,
    /// Captured backtrace, respects `RUST_BACKTRACE`.
    backtrace: Backtrace,
    /// Extra fields providing context for the error.
    fields: Vec<(Cow<'static, str>, Box<dyn ErrorFieldValue>)>,
}

impl DbError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Other, msg)
    }

    pub fn with_kind(kind: ErrorKind, msg: impl Into<String>) -> Self {
        DbError {
            inner: Box::new(DbErrorInner {
                kind,
                msg: msg.into(),
                source: None,
                backtrace: Backtrace::capture(),
                fields: Vec::new(),
            }),
        }
    }

    pub fn unsupported_type(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::UnsupportedType, msg)
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::InvalidArgument, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Internal, msg)
    }

    pub fn with_source(msg: impl Into<String>, source: Box<dyn Error + Send + Sync>) -> Self {
        let mut err = Self::new(msg);
        err.inner.source = Some(source);
        err
    }

    /// Attach an additional field to the error.
    pub fn with_field<V>(mut self, key: impl Into<Cow<'static, str>>, value: V) -> Self
    where
        V: ErrorFieldValue + 'static,
    {
        self.inner.fields.push((key.into(), Box::new(value)));
        self
    }

    pub fn with_fields<K, V, I>(mut self, fields: I) -> Self
    where
        K: Into<Cow<'static, str>>,
        V: ErrorFieldValue + 'static,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in fields {
            self.inner.fields.push((key.into(), Box::new(value)));
        }
        self
    }

    /// Change the kind of this error.
    pub fn kind_of(mut self, kind: ErrorKind) -> Self {
        self.inner.kind = kind;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.inner.kind
    }

    pub fn get_msg(&self) -> &str {
        &self.inner.msg
    }

    pub fn get_field(&self, key: &str) -> Option<&dyn ErrorFieldValue> {
        self.inner
            .fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_ref())
    }

    pub fn get_backtrace(&self) -> &Backtrace {
        &self.inner.backtrace
    }
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.msg)?;

        for (key, value) in &self.inner.fields {
            write!(f, "\n  {key}: {value}")?;
        }

        if let Some(source) = &self.inner.source {
            write!(f, "\nError source: {source}")?;
        }

        if self.inner.backtrace.status() == BacktraceStatus::Captured {
            write!(f, "\nBacktrace: {}", self.inner.backtrace)?;
        }

        Ok(())
    }
}

impl fmt::Debug for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("DbError");
        s.field("kind", &self.inner.kind);
        s.field("msg", &self.inner.msg);
        for (key, value) in &self.inner.fields {
            s.field(key, value);
        }
        s.field("source", &self.inner.source);
        s.finish()
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl From<fmt::Error> for DbError {
    fn from(value: fmt::Error) -> Self {
        DbError::with_source("Format error", Box::new(value))
    }
}

impl From<std::io::Error> for DbError {
    fn from(value: std::io::Error) -> Self {
        DbError::with_source("IO error", Box::new(value))
    }
}

/// Extension for wrapping errors with additional context.
pub trait ResultExt<T, E> {
    /// Wrap an error with a static context string.
    fn context(self, msg: &'static str) -> Result<T>;

    /// Wrap an error with a context string generated from a function.
    fn context_fn<F>(self, f: F) -> Result<T>
    where
        F: Fn() -> String;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: Error + Send + Sync + 'static,
{
    fn context(self, msg: &'static str) -> Result<T> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(DbError::with_source(msg, Box::new(e))),
        }
    }

    fn context_fn<F>(self, f: F) -> Result<T>
    where
        F: Fn() -> String,
    {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(DbError::with_source(f(), Box::new(e))),
        }
    }
}

pub trait OptionExt<T> {
    /// Return an error if the option is None.
    fn required(self, field: &'static str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn required(self, field: &'static str) -> Result<T> {
        match self {
            Some(v) => Ok(v),
            None => Err(DbError::new(format!(
                "Missing field '{field}'. This indicates a bug."
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_fields() {
        let err = DbError::new("bad group")
            .with_field("group", 4)
            .with_field("count", 2);
        let s = err.to_string();
        assert!(s.starts_with("bad group"));
        assert!(s.contains("group: 4"));
        assert!(s.contains("count: 2"));
    }

    #[test]
    fn get_field() {
        let err = DbError::invalid_argument("bad").with_field("len", 3);
        assert_eq!("3", err.get_field("len").unwrap().to_string());
        assert!(err.get_field("missing").is_none());
        assert_eq!(ErrorKind::InvalidArgument, err.kind());
    }

    #[test]
    fn context_wraps_source() {
        let res: std::result::Result<u32, _> = "abc".parse::<u32>();
        let err = res.context("failed to parse").unwrap_err();
        assert_eq!("failed to parse", err.get_msg());
        assert!(err.source().is_some());
    }

    #[test]
    fn required_none() {
        let v: Option<u8> = None;
        assert!(v.required("value").is_err());
        assert_eq!(3, Some(3).required("value").unwrap());
    }
}
