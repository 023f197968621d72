mod client;
mod error;

#[cfg(all(feature = "smtp", feature = "runtime-tokio"))]
mod runtime;

pub use client::{
    address::{Address, AddressList},
    builder::MessageBuilder,
    connection::ConnectionSecurity,
    content::Content,
    headers::HeaderMap,
    session::{Session, SessionConfig, SessionFactory},
    Credentials, MailTransport, Message,
};

#[cfg(all(feature = "smtp", feature = "runtime-tokio"))]
pub use client::SmtpTransport;

pub use error::{Error, ErrorKind, Result};
