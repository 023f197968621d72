#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the transport secures its connection to the mail server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConnectionSecurity {
    /// Tls from the first byte (smtps).
    Tls,
    /// Plain connection upgraded with STARTTLS.
    StartTls,
    #[default]
    Plain,
}

impl ConnectionSecurity {
    pub fn is_ssl(&self) -> bool {
        matches!(self, ConnectionSecurity::Tls)
    }
}
