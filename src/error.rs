use std::{error, fmt, io, result};

#[cfg(feature = "smtp")]
use async_smtp::error::Error as SmtpError;

#[cfg(feature = "smtp")]
use async_native_tls::Error as TlsError;

#[cfg(feature = "runtime-tokio")]
use tokio::time::error::Elapsed;

#[derive(Debug)]
pub enum ErrorKind {
    /// A required input was missing or empty.
    Validation,
    /// The builder was used in a state that forbids the operation.
    IllegalState,
    /// An address list was indexed out of range.
    Index,
    /// Failed to parse a formatted address such as `Name <user@example.com>`.
    ParseAddress,
    /// The built message could not be turned into its wire form.
    InvalidMessage,
    /// The requested feature is unsupported by the transport.
    Unsupported,
    Io(io::Error),
    #[cfg(feature = "smtp")]
    Smtp(SmtpError),
    #[cfg(feature = "smtp")]
    Tls(TlsError),
    #[cfg(feature = "runtime-tokio")]
    Timeout(Elapsed),
    /// Failed to serialize the given data to JSON.
    SerializeJSON,
}

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    pub fn new<S: Into<String>>(kind: ErrorKind, msg: S) -> Self {
        Self {
            message: msg.into(),
            kind,
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.kind() {
            ErrorKind::Io(e) => Some(e),
            #[cfg(feature = "smtp")]
            ErrorKind::Smtp(e) => Some(e),
            #[cfg(feature = "smtp")]
            ErrorKind::Tls(e) => Some(e),
            #[cfg(feature = "runtime-tokio")]
            ErrorKind::Timeout(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(feature = "smtp")]
impl From<SmtpError> for Error {
    fn from(smtp_error: SmtpError) -> Self {
        Self::new(ErrorKind::Smtp(smtp_error), "Error from smtp server")
    }
}

#[cfg(feature = "smtp")]
impl From<TlsError> for Error {
    fn from(native_tls_error: TlsError) -> Self {
        Error::new(
            ErrorKind::Tls(native_tls_error),
            "Error creating a secure connection",
        )
    }
}

impl From<io::Error> for Error {
    fn from(io_error: io::Error) -> Self {
        Error::new(ErrorKind::Io(io_error), "Error with io")
    }
}

#[cfg(feature = "runtime-tokio")]
impl From<Elapsed> for Error {
    fn from(timeout_error: Elapsed) -> Self {
        Error::new(ErrorKind::Timeout(timeout_error), "Timeout error")
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

macro_rules! err {
    ($kind:expr, $($arg:tt)*) => {{
        use crate::error::Error;

        let kind = $kind;
        let message = format!($($arg)*);
        return Err(Error::new(kind, message));
    }};
}

pub(crate) use err;

pub type Result<T> = result::Result<T, Error>;
