pub mod address;
pub mod builder;
pub mod connection;
pub mod content;
pub mod headers;
pub mod session;

mod outgoing;
mod protocol;

pub use outgoing::message::Message;

#[cfg(all(feature = "smtp", feature = "runtime-tokio"))]
pub use outgoing::smtp::SmtpTransport;

pub use protocol::{Credentials, MailTransport};
