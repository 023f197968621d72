use async_trait::async_trait;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::{outgoing::message::Message, session::Session};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Credentials {
    Password { username: String, password: String },
    OAuth { username: String, token: String },
}

impl Credentials {
    pub fn username(&self) -> &str {
        match &self {
            Credentials::OAuth { username, .. } => username,
            Credentials::Password { username, .. } => username,
        }
    }
}

impl Credentials {
    pub fn password<U: Into<String>, P: Into<String>>(username: U, password: P) -> Self {
        Credentials::Password {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn oauth<U: Into<String>, T: Into<String>>(username: U, token: T) -> Self {
        Credentials::OAuth {
            username: username.into(),
            token: token.into(),
        }
    }
}

/// Delivers a built message using the settings of a session.
///
/// Implementations own all network behaviour; the builder only hands over the two artifacts.
#[async_trait]
pub trait MailTransport {
    async fn send_message(&mut self, message: &Message, session: &Session) -> Result<()>;
}
