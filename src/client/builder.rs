use std::{collections::HashMap, time::Duration};

use chrono::{DateTime, Utc};
use log::{debug, trace, warn};

use crate::error::{err, ErrorKind, Result};

use super::{
    address::{Address, AddressList},
    connection::ConnectionSecurity,
    content::Content,
    headers::HeaderMap,
    outgoing::message::Message,
    protocol::{Credentials, MailTransport},
    session::{validate_port, Session, SessionConfig, SessionFactory},
};

const ALREADY_BUILT: &str = "The MimeMessage is already built.";

#[derive(Debug)]
enum State {
    Open,
    Built(Message),
}

/// Collects everything needed to compose an email and turns it into a [`Message`] exactly once.
///
/// Every mutator fails once [`build`](Self::build) has succeeded.
#[derive(Debug)]
pub struct MessageBuilder {
    from: Option<Address>,
    to: AddressList,
    cc: AddressList,
    bcc: AddressList,
    reply_to: AddressList,
    headers: HeaderMap,
    subject: Option<String>,
    content: Content,
    sent_date: Option<DateTime<Utc>>,
    bounce_address: Option<String>,
    session: SessionConfig,
    state: State,
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self {
            from: None,
            to: AddressList::new(),
            cc: AddressList::new(),
            bcc: AddressList::new(),
            reply_to: AddressList::new(),
            headers: HeaderMap::new(),
            subject: None,
            content: Content::default(),
            sent_date: None,
            bounce_address: None,
            session: SessionConfig::default(),
            state: State::Open,
        }
    }

    /// Creates a builder with the given transport settings.
    pub fn with_config(config: SessionConfig) -> Self {
        let mut builder = Self::new();

        builder.session = config;

        builder
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            State::Open => Ok(()),
            State::Built(_) => err!(ErrorKind::IllegalState, "{}", ALREADY_BUILT),
        }
    }

    pub fn set_from<E: AsRef<str>>(&mut self, email: E) -> Result<&mut Self> {
        self.ensure_open()?;

        self.from = Some(Address::new(email, None)?);

        Ok(self)
    }

    pub fn set_from_with_name<E: AsRef<str>, N: Into<String>>(
        &mut self,
        email: E,
        name: N,
    ) -> Result<&mut Self> {
        self.ensure_open()?;

        self.from = Some(Address::new(email, Some(name.into()))?);

        Ok(self)
    }

    pub fn add_to<E: AsRef<str>>(&mut self, email: E) -> Result<&mut Self> {
        self.ensure_open()?;

        trace!("Adding to recipient {}", email.as_ref());

        self.to.add(email, None)?;

        Ok(self)
    }

    pub fn add_to_with_name<E: AsRef<str>, N: Into<String>>(
        &mut self,
        email: E,
        name: N,
    ) -> Result<&mut Self> {
        self.ensure_open()?;

        self.to.add(email, Some(name.into()))?;

        Ok(self)
    }

    pub fn add_tos<E: AsRef<str>, I: IntoIterator<Item = E>>(
        &mut self,
        emails: I,
    ) -> Result<&mut Self> {
        self.ensure_open()?;

        self.to.add_all(emails)?;

        Ok(self)
    }

    pub fn add_cc<E: AsRef<str>>(&mut self, email: E) -> Result<&mut Self> {
        self.ensure_open()?;

        trace!("Adding cc recipient {}", email.as_ref());

        self.cc.add(email, None)?;

        Ok(self)
    }

    pub fn add_cc_with_name<E: AsRef<str>, N: Into<String>>(
        &mut self,
        email: E,
        name: N,
    ) -> Result<&mut Self> {
        self.ensure_open()?;

        self.cc.add(email, Some(name.into()))?;

        Ok(self)
    }

    pub fn add_ccs<E: AsRef<str>, I: IntoIterator<Item = E>>(
        &mut self,
        emails: I,
    ) -> Result<&mut Self> {
        self.ensure_open()?;

        self.cc.add_all(emails)?;

        Ok(self)
    }

    pub fn add_bcc<E: AsRef<str>>(&mut self, email: E) -> Result<&mut Self> {
        self.ensure_open()?;

        trace!("Adding bcc recipient {}", email.as_ref());

        self.bcc.add(email, None)?;

        Ok(self)
    }

    pub fn add_bcc_with_name<E: AsRef<str>, N: Into<String>>(
        &mut self,
        email: E,
        name: N,
    ) -> Result<&mut Self> {
        self.ensure_open()?;

        self.bcc.add(email, Some(name.into()))?;

        Ok(self)
    }

    pub fn add_bccs<E: AsRef<str>, I: IntoIterator<Item = E>>(
        &mut self,
        emails: I,
    ) -> Result<&mut Self> {
        self.ensure_open()?;

        self.bcc.add_all(emails)?;

        Ok(self)
    }

    pub fn add_reply_to<E: AsRef<str>, N: Into<String>>(
        &mut self,
        email: E,
        name: N,
    ) -> Result<&mut Self> {
        self.ensure_open()?;

        self.reply_to.add(email, Some(name.into()))?;

        Ok(self)
    }

    pub fn add_header<N: Into<String>, V: Into<String>>(
        &mut self,
        name: N,
        value: V,
    ) -> Result<&mut Self> {
        self.ensure_open()?;

        let name = name.into();

        trace!("Setting header {}", name);

        self.headers.add(name, value)?;

        Ok(self)
    }

    /// Replaces all custom headers. Nothing is changed if any entry is invalid.
    pub fn set_headers(&mut self, headers: HashMap<String, String>) -> Result<&mut Self> {
        self.ensure_open()?;

        let mut replacement = HeaderMap::new();

        for (name, value) in headers {
            replacement.add(name, value)?;
        }

        self.headers = replacement;

        Ok(self)
    }

    pub fn set_subject<S: Into<String>>(&mut self, subject: S) -> Result<&mut Self> {
        self.ensure_open()?;

        self.subject = Some(subject.into());

        Ok(self)
    }

    pub fn set_text<T: Into<String>>(&mut self, text: T) -> Result<&mut Self> {
        self.ensure_open()?;

        self.content.set_text(text);

        Ok(self)
    }

    pub fn set_html<H: Into<String>>(&mut self, html: H) -> Result<&mut Self> {
        self.ensure_open()?;

        self.content.set_html(html);

        Ok(self)
    }

    pub fn set_content<C: Into<Content>>(&mut self, content: C) -> Result<&mut Self> {
        self.ensure_open()?;

        self.content = content.into();

        Ok(self)
    }

    pub fn set_sent_date(&mut self, sent_date: DateTime<Utc>) -> Result<&mut Self> {
        self.ensure_open()?;

        self.sent_date = Some(sent_date);

        Ok(self)
    }

    /// Sets the address bounced mail is returned to, used as the envelope sender.
    pub fn set_bounce_address<E: AsRef<str>>(&mut self, email: E) -> Result<&mut Self> {
        self.ensure_open()?;

        let address = Address::new(email, None)?;

        self.bounce_address = Some(address.email().to_string());

        Ok(self)
    }

    pub fn set_host_name<H: Into<String>>(&mut self, host_name: H) -> Result<&mut Self> {
        self.ensure_open()?;

        self.session.host_name = Some(host_name.into());

        Ok(self)
    }

    pub fn set_smtp_port(&mut self, port: u16) -> Result<&mut Self> {
        self.ensure_open()?;

        self.session.smtp_port = Some(validate_port(port)?);

        Ok(self)
    }

    pub fn set_ssl_smtp_port(&mut self, port: u16) -> Result<&mut Self> {
        self.ensure_open()?;

        self.session.ssl_smtp_port = Some(validate_port(port)?);

        Ok(self)
    }

    pub fn set_security(&mut self, security: ConnectionSecurity) -> Result<&mut Self> {
        self.ensure_open()?;

        self.session.security = security;

        Ok(self)
    }

    pub fn set_credentials(&mut self, credentials: Credentials) -> Result<&mut Self> {
        self.ensure_open()?;

        self.session.credentials = Some(credentials);

        Ok(self)
    }

    pub fn set_authentication<U: Into<String>, P: Into<String>>(
        &mut self,
        username: U,
        password: P,
    ) -> Result<&mut Self> {
        self.set_credentials(Credentials::password(username, password))
    }

    pub fn set_socket_connection_timeout(&mut self, timeout: Duration) -> Result<&mut Self> {
        self.ensure_open()?;

        self.session.connection_timeout = timeout;

        Ok(self)
    }

    pub fn set_socket_timeout(&mut self, timeout: Duration) -> Result<&mut Self> {
        self.ensure_open()?;

        self.session.socket_timeout = timeout;

        Ok(self)
    }

    /// Replaces all transport settings at once.
    pub fn configure(&mut self, config: SessionConfig) -> Result<&mut Self> {
        self.ensure_open()?;

        self.session = config;

        Ok(self)
    }

    pub fn from_address(&self) -> Option<&Address> {
        self.from.as_ref()
    }

    pub fn to_addresses(&self) -> &AddressList {
        &self.to
    }

    pub fn cc_addresses(&self) -> &AddressList {
        &self.cc
    }

    pub fn bcc_addresses(&self) -> &AddressList {
        &self.bcc
    }

    pub fn reply_to_addresses(&self) -> &AddressList {
        &self.reply_to
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn bounce_address(&self) -> Option<&str> {
        self.bounce_address.as_deref()
    }

    pub fn host_name(&self) -> Option<&str> {
        self.session.host_name.as_deref()
    }

    /// The configured sent date, or the current time if none was set. Nothing is stored.
    pub fn sent_date(&self) -> DateTime<Utc> {
        self.sent_date.unwrap_or_else(Utc::now)
    }

    pub fn socket_connection_timeout(&self) -> Duration {
        self.session.connection_timeout
    }

    pub fn socket_timeout(&self) -> Duration {
        self.session.socket_timeout
    }

    pub fn config(&self) -> &SessionConfig {
        &self.session
    }

    pub fn is_built(&self) -> bool {
        matches!(self.state, State::Built(_))
    }

    /// The message produced by [`build`](Self::build), if it has run.
    pub fn message(&self) -> Option<&Message> {
        match &self.state {
            State::Built(message) => Some(message),
            State::Open => None,
        }
    }

    pub fn mail_session(&self) -> Result<Session> {
        SessionFactory::from(self.session.clone()).mail_session()
    }

    pub fn build(&mut self) -> Result<Message> {
        self.build_at(Utc::now())
    }

    /// Builds the message, stamping it with `now` when no sent date was set.
    pub fn build_at(&mut self, now: DateTime<Utc>) -> Result<Message> {
        if self.is_built() {
            warn!("Rejected attempt to build a message twice");

            err!(ErrorKind::IllegalState, "{}", ALREADY_BUILT);
        }

        let from = match self.from.as_ref() {
            Some(from) => from.clone(),
            None => err!(ErrorKind::Validation, "From address required"),
        };

        if self.to.is_empty() && self.cc.is_empty() && self.bcc.is_empty() {
            err!(ErrorKind::Validation, "At least one receiver address required");
        }

        let message = Message {
            from,
            to: self.to.clone(),
            cc: self.cc.clone(),
            bcc: self.bcc.clone(),
            reply_to: self.reply_to.clone(),
            headers: self.headers.clone(),
            subject: self.subject.clone(),
            content: self.content.clone(),
            sent_date: self.sent_date.unwrap_or(now),
            bounce_address: self.bounce_address.clone(),
        };

        debug!(
            "Built message from {} with {} recipient(s)",
            message.from(),
            message.recipients().count()
        );

        self.state = State::Built(message.clone());

        Ok(message)
    }

    /// Builds the message and hands it to `transport` together with a session derived from this builder.
    ///
    /// The session is derived first, so a configuration error leaves the builder open.
    pub async fn send<T: MailTransport + ?Sized>(&mut self, transport: &mut T) -> Result<Message> {
        let session = self.mail_session()?;

        let message = self.build()?;

        transport.send_message(&message, &session).await?;

        Ok(message)
    }
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    const EMAILS: [&str; 3] = ["ab@bc.com", "ab@c.org", "hjdfh@fjdfh.com"];

    const EMAIL: &str = "ab@bc.com";

    #[test]
    fn add_bccs_counts_every_address() {
        let mut builder = MessageBuilder::new();

        builder.add_bccs(EMAILS).unwrap();

        assert_eq!(builder.bcc_addresses().len(), 3);
    }

    #[test]
    fn add_cc_keeps_address() {
        let mut builder = MessageBuilder::new();

        builder.add_cc(EMAIL).unwrap();

        assert_eq!(builder.cc_addresses().get(0).unwrap().to_string(), EMAIL);
    }

    #[test]
    fn add_header() {
        let mut builder = MessageBuilder::new();

        builder.add_header("testheader", "testheader").unwrap();

        assert_eq!(builder.headers().get("testheader"), Some("testheader"));
    }

    #[test]
    fn add_header_empty_name() {
        let mut builder = MessageBuilder::new();

        let error = builder.add_header("", "testheader").unwrap_err();

        assert_eq!(error.to_string(), "name can not be null or empty");
    }

    #[test]
    fn add_header_empty_value() {
        let mut builder = MessageBuilder::new();

        let error = builder.add_header("testheader", "").unwrap_err();

        assert_eq!(error.to_string(), "value can not be null or empty");
    }

    #[test]
    fn add_reply_to() {
        let mut builder = MessageBuilder::new();

        builder.add_reply_to(EMAIL, "abcd").unwrap();

        assert_eq!(builder.reply_to_addresses().len(), 1);
        assert_eq!(
            builder.reply_to_addresses().get(0).unwrap().name(),
            Some("abcd")
        );
    }

    #[test]
    fn build_complete_message() {
        let mut builder = MessageBuilder::new();

        builder
            .set_host_name("host")
            .unwrap()
            .set_from(EMAIL)
            .unwrap()
            .add_reply_to(EMAIL, "abcd")
            .unwrap()
            .add_to("ac@d.com")
            .unwrap()
            .add_bcc("bj@g.com")
            .unwrap()
            .add_cc("ab@c.org")
            .unwrap()
            .add_header("header", "testheader")
            .unwrap()
            .set_subject("subject")
            .unwrap();

        let message = builder.build().unwrap();

        assert_eq!(message.subject(), Some("subject"));
        assert_eq!(builder.message(), Some(&message));
        assert!(message.render().unwrap().contains("subject"));
    }

    #[test]
    fn build_without_from() {
        let mut builder = MessageBuilder::new();

        builder
            .set_host_name("host")
            .unwrap()
            .add_header("header", "testheader")
            .unwrap()
            .set_subject("subject")
            .unwrap()
            .add_to("ac@d.com")
            .unwrap()
            .add_cc("ab@c.org")
            .unwrap();

        let error = builder.build().unwrap_err();

        assert!(matches!(error.kind(), ErrorKind::Validation));
        assert_eq!(error.to_string(), "From address required");
        assert!(!builder.is_built());
    }

    #[test]
    fn build_without_receivers() {
        let mut builder = MessageBuilder::new();

        builder
            .set_host_name("host")
            .unwrap()
            .set_from(EMAIL)
            .unwrap()
            .add_header("header", "testheader")
            .unwrap()
            .set_subject("subject")
            .unwrap()
            .add_reply_to("reply@bc.com", "reply")
            .unwrap();

        let error = builder.build().unwrap_err();

        assert_eq!(error.to_string(), "At least one receiver address required");
    }

    #[test]
    fn build_twice() {
        let mut builder = MessageBuilder::new();

        builder
            .set_host_name("host")
            .unwrap()
            .set_from(EMAIL)
            .unwrap()
            .add_to("ac@d.com")
            .unwrap()
            .add_bcc("bj@g.com")
            .unwrap()
            .add_cc("ab@c.org")
            .unwrap()
            .set_text("Hello")
            .unwrap();

        builder.build().unwrap();

        let error = builder.build().unwrap_err();

        assert!(matches!(error.kind(), ErrorKind::IllegalState));
        assert_eq!(error.to_string(), "The MimeMessage is already built.");
        assert!(builder.message().is_some());
    }

    #[test]
    fn mutation_after_build() {
        let mut builder = MessageBuilder::new();

        builder.set_from(EMAIL).unwrap().add_to("ac@d.com").unwrap();

        builder.build().unwrap();

        assert!(builder.set_subject("late").is_err());
        assert!(builder.add_cc("late@d.com").is_err());
        assert!(builder.add_header("X-Late", "yes").is_err());
        assert!(builder.set_host_name("late").is_err());

        let error = builder
            .set_socket_connection_timeout(Duration::from_secs(1))
            .unwrap_err();

        assert_eq!(error.to_string(), ALREADY_BUILT);
        assert_eq!(builder.cc_addresses().len(), 0);
    }

    #[test]
    fn host_name() {
        let mut builder = MessageBuilder::new();

        assert_eq!(builder.host_name(), None);

        builder.set_host_name("host").unwrap();

        assert_eq!(builder.host_name(), Some("host"));
    }

    #[test]
    fn mail_session_requires_host_name() {
        let builder = MessageBuilder::new();

        let error = builder.mail_session().unwrap_err();

        assert_eq!(
            error.to_string(),
            "Cannot find valid hostname for mail session"
        );
    }

    #[test]
    fn mail_session_uses_builder_settings() {
        let mut builder = MessageBuilder::new();

        builder
            .set_host_name("smtp.example.com")
            .unwrap()
            .set_security(ConnectionSecurity::Tls)
            .unwrap()
            .set_authentication("user", "secret")
            .unwrap()
            .set_socket_connection_timeout(Duration::from_millis(1500))
            .unwrap();

        let session = builder.mail_session().unwrap();

        assert_eq!(session.port(), 465);
        assert!(session.use_ssl());
        assert_eq!(session.timeout(), Duration::from_millis(1500));
        assert_eq!(
            session.credentials(),
            Some(&Credentials::password("user", "secret"))
        );
    }

    #[test]
    fn sent_date() {
        let mut builder = MessageBuilder::new();

        let date = Utc.with_ymd_and_hms(2023, 4, 1, 12, 0, 0).unwrap();

        builder.set_sent_date(date).unwrap();

        assert_eq!(builder.sent_date(), date);
    }

    #[test]
    fn sent_date_defaults_at_build() {
        let mut builder = MessageBuilder::new();

        builder.set_from(EMAIL).unwrap().add_to("ac@d.com").unwrap();

        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        let message = builder.build_at(now).unwrap();

        assert_eq!(message.sent_date(), now);
    }

    #[test]
    fn socket_connection_timeout() {
        let mut builder = MessageBuilder::new();

        assert_eq!(
            builder.socket_connection_timeout(),
            builder.config().connection_timeout
        );
        assert!(builder.socket_connection_timeout() > Duration::ZERO);

        builder
            .set_socket_connection_timeout(Duration::from_secs(10))
            .unwrap();

        assert_eq!(builder.socket_connection_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn set_from() {
        let mut builder = MessageBuilder::new();

        builder.set_from(EMAIL).unwrap();

        assert_eq!(builder.from_address().unwrap().to_string(), "ab@bc.com");
    }

    #[test]
    fn set_headers_replaces() {
        let mut builder = MessageBuilder::new();

        builder.add_header("X-Old", "old").unwrap();

        let mut headers = HashMap::new();
        headers.insert(String::from("X-New"), String::from("new"));

        builder.set_headers(headers).unwrap();

        assert_eq!(builder.headers().get("X-Old"), None);
        assert_eq!(builder.headers().get("X-New"), Some("new"));

        let mut invalid = HashMap::new();
        invalid.insert(String::from("X-Empty"), String::new());

        assert!(builder.set_headers(invalid).is_err());
        assert_eq!(builder.headers().get("X-New"), Some("new"));
    }

    #[test]
    fn smtp_port_zero() {
        let mut builder = MessageBuilder::new();

        let error = builder.set_smtp_port(0).unwrap_err();

        assert_eq!(
            error.to_string(),
            "Cannot connect to a port number that is less than 1 ( 0 )"
        );
    }
}
