use crate::{
    client::{
        connection::ConnectionSecurity,
        outgoing::message::Message,
        protocol::{Credentials, MailTransport},
        session::Session,
    },
    error::{err, ErrorKind, Result},
    runtime::{
        io::{BufRead, BufStream, Write},
        net::TcpStream,
        time::timeout,
    },
};

use async_native_tls::{TlsConnector, TlsStream};
use async_smtp::{self, authentication::Mechanism, SendableEmail};
use async_trait::async_trait;
use log::{debug, info};

/// Delivers messages over smtp, opening one connection per message.
///
/// Every exchange with the server after the tcp connect is bounded by the session's socket timeout.
#[derive(Debug, Default)]
pub struct SmtpTransport;

impl SmtpTransport {
    pub fn new() -> Self {
        Self
    }
}

async fn connect(
    session: &Session,
) -> Result<async_smtp::SmtpTransport<BufStream<TlsStream<TcpStream>>>> {
    let tls = TlsConnector::new();

    let tcp_stream = timeout(
        session.timeout(),
        TcpStream::connect((session.host_name(), session.port())),
    )
    .await??;

    let tls_stream = timeout(
        session.socket_timeout(),
        tls.connect(session.host_name(), tcp_stream),
    )
    .await??;

    let buf_stream = BufStream::new(tls_stream);

    let client = async_smtp::SmtpClient::new();

    let transport = timeout(
        session.socket_timeout(),
        async_smtp::SmtpTransport::new(client, buf_stream),
    )
    .await??;

    Ok(transport)
}

async fn connect_plain(session: &Session) -> Result<async_smtp::SmtpTransport<BufStream<TcpStream>>> {
    let stream = timeout(
        session.timeout(),
        TcpStream::connect((session.host_name(), session.port())),
    )
    .await??;

    let buf_stream = BufStream::new(stream);

    let client = async_smtp::SmtpClient::new();

    let transport = timeout(
        session.socket_timeout(),
        async_smtp::SmtpTransport::new(client, buf_stream),
    )
    .await??;

    Ok(transport)
}

async fn send<S: BufRead + Write + Unpin>(
    mut transport: async_smtp::SmtpTransport<S>,
    message: &Message,
    session: &Session,
) -> Result<()> {
    let sendable = SendableEmail::try_from(message)?;

    timeout(session.socket_timeout(), transport.send(sendable)).await??;

    timeout(session.socket_timeout(), transport.quit()).await??;

    Ok(())
}

const PASSWORD_MECHANISMS: [Mechanism; 2] = [Mechanism::Plain, Mechanism::Login];
const OAUTH_MECHANISMS: [Mechanism; 1] = [Mechanism::Xoauth2];

async fn login<S: BufRead + Write + Unpin>(
    transport: &mut async_smtp::SmtpTransport<S>,
    session: &Session,
) -> Result<()> {
    match session.credentials() {
        Some(Credentials::Password { username, password }) => {
            let smtp_credentials =
                async_smtp::authentication::Credentials::new(username.clone(), password.clone());

            timeout(
                session.socket_timeout(),
                transport.try_login(&smtp_credentials, &PASSWORD_MECHANISMS),
            )
            .await??;
        }
        Some(Credentials::OAuth { username, token }) => {
            let smtp_credentials =
                async_smtp::authentication::Credentials::new(username.clone(), token.clone());

            timeout(
                session.socket_timeout(),
                transport.try_login(&smtp_credentials, &OAUTH_MECHANISMS),
            )
            .await??;
        }
        None => debug!("No credentials configured, sending without authentication"),
    }

    Ok(())
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send_message(&mut self, message: &Message, session: &Session) -> Result<()> {
        info!(
            "Sending message from {} to {}:{}",
            message.envelope_sender(),
            session.host_name(),
            session.port()
        );

        match session.security() {
            ConnectionSecurity::Tls => {
                let mut transport = connect(session).await?;

                login(&mut transport, session).await?;

                send(transport, message, session).await
            }
            ConnectionSecurity::Plain => {
                let mut transport = connect_plain(session).await?;

                login(&mut transport, session).await?;

                send(transport, message, session).await
            }
            ConnectionSecurity::StartTls => err!(
                ErrorKind::Unsupported,
                "STARTTLS is not supported by the smtp transport, use Tls or Plain"
            ),
        }
    }
}
