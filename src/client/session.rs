use std::time::Duration;

use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{err, ErrorKind, Result};

use super::{connection::ConnectionSecurity, protocol::Credentials};

pub const DEFAULT_SMTP_PORT: u16 = 25;
pub const DEFAULT_SSL_SMTP_PORT: u16 = 465;

/// Connection and read timeout used when none is configured.
pub const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_millis(60_000);

/// Transport settings carried by a message builder until a session is derived from them.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    pub host_name: Option<String>,
    pub smtp_port: Option<u16>,
    pub ssl_smtp_port: Option<u16>,
    pub security: ConnectionSecurity,
    pub credentials: Option<Credentials>,
    pub connection_timeout: Duration,
    pub socket_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host_name: None,
            smtp_port: None,
            ssl_smtp_port: None,
            security: ConnectionSecurity::default(),
            credentials: None,
            connection_timeout: DEFAULT_SOCKET_TIMEOUT,
            socket_timeout: DEFAULT_SOCKET_TIMEOUT,
        }
    }
}

/// Everything a transport needs to reach the mail server.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Session {
    host_name: String,
    port: u16,
    timeout: Duration,
    socket_timeout: Duration,
    security: ConnectionSecurity,
    credentials: Option<Credentials>,
}

impl Session {
    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// How long the transport may take to establish a connection.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn socket_timeout(&self) -> Duration {
        self.socket_timeout
    }

    pub fn security(&self) -> ConnectionSecurity {
        self.security
    }

    pub fn use_ssl(&self) -> bool {
        self.security.is_ssl()
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }
}

pub(crate) fn validate_port(port: u16) -> Result<u16> {
    if port < 1 {
        err!(
            ErrorKind::Validation,
            "Cannot connect to a port number that is less than 1 ( {} )",
            port
        );
    }

    Ok(port)
}

/// Derives a [`Session`] from transport configuration. Never touches the network.
#[derive(Debug, Clone, Default)]
pub struct SessionFactory {
    config: SessionConfig,
    port: Option<u16>,
}

impl From<SessionConfig> for SessionFactory {
    fn from(config: SessionConfig) -> Self {
        Self { config, port: None }
    }
}

impl SessionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host_name<H: Into<String>>(mut self, host_name: H) -> Self {
        self.config.host_name = Some(host_name.into());

        self
    }

    /// Overrides the port regardless of the connection security.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);

        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.connection_timeout = timeout;

        self
    }

    /// Bounds every exchange with the server once connected.
    pub fn socket_timeout(mut self, timeout: Duration) -> Self {
        self.config.socket_timeout = timeout;

        self
    }

    pub fn security(mut self, security: ConnectionSecurity) -> Self {
        self.config.security = security;

        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.config.credentials = Some(credentials);

        self
    }

    pub fn mail_session(&self) -> Result<Session> {
        let host_name = match self.config.host_name.as_deref().map(str::trim) {
            Some(host_name) if !host_name.is_empty() => host_name.to_string(),
            _ => err!(
                ErrorKind::Validation,
                "Cannot find valid hostname for mail session"
            ),
        };

        let port = match self.port {
            Some(port) => port,
            None if self.config.security.is_ssl() => self
                .config
                .ssl_smtp_port
                .unwrap_or(DEFAULT_SSL_SMTP_PORT),
            None => self.config.smtp_port.unwrap_or(DEFAULT_SMTP_PORT),
        };

        let session = Session {
            host_name,
            port: validate_port(port)?,
            timeout: self.config.connection_timeout,
            socket_timeout: self.config.socket_timeout,
            security: self.config.security,
            credentials: self.config.credentials.clone(),
        };

        debug!(
            "Created mail session for {}:{} ({:?})",
            session.host_name, session.port, session.security
        );

        Ok(session)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn missing_host_name() {
        let error = SessionFactory::new().mail_session().unwrap_err();

        assert!(matches!(error.kind(), ErrorKind::Validation));
        assert_eq!(
            error.to_string(),
            "Cannot find valid hostname for mail session"
        );

        let blank = SessionFactory::new().host_name("  ").mail_session();

        assert!(blank.is_err());
    }

    #[test]
    fn default_ports() {
        let plain = SessionFactory::new().host_name("host").mail_session().unwrap();

        assert_eq!(plain.port(), DEFAULT_SMTP_PORT);
        assert!(!plain.use_ssl());
        assert_eq!(plain.timeout(), DEFAULT_SOCKET_TIMEOUT);

        let tls = SessionFactory::new()
            .host_name("host")
            .security(ConnectionSecurity::Tls)
            .mail_session()
            .unwrap();

        assert_eq!(tls.port(), DEFAULT_SSL_SMTP_PORT);
        assert!(tls.use_ssl());
    }

    #[test]
    fn explicit_settings() {
        let session = SessionFactory::new()
            .host_name("smtp.example.com")
            .port(2525)
            .timeout(Duration::from_secs(5))
            .socket_timeout(Duration::from_secs(30))
            .credentials(Credentials::password("user", "secret"))
            .mail_session()
            .unwrap();

        assert_eq!(session.host_name(), "smtp.example.com");
        assert_eq!(session.port(), 2525);
        assert_eq!(session.timeout(), Duration::from_secs(5));
        assert_eq!(session.socket_timeout(), Duration::from_secs(30));
        assert_eq!(session.credentials().unwrap().username(), "user");
    }

    #[test]
    fn configured_ports() {
        let config = SessionConfig {
            host_name: Some(String::from("host")),
            smtp_port: Some(587),
            ssl_smtp_port: Some(993),
            ..Default::default()
        };

        let session = SessionFactory::from(config.clone()).mail_session().unwrap();

        assert_eq!(session.port(), 587);

        let config = SessionConfig {
            security: ConnectionSecurity::Tls,
            ..config
        };

        let session = SessionFactory::from(config).mail_session().unwrap();

        assert_eq!(session.port(), 993);
    }

    #[test]
    fn port_zero_is_rejected() {
        let error = SessionFactory::new()
            .host_name("host")
            .port(0)
            .mail_session()
            .unwrap_err();

        assert_eq!(
            error.to_string(),
            "Cannot connect to a port number that is less than 1 ( 0 )"
        );
    }
}
