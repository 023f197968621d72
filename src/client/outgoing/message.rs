use chrono::{DateTime, Utc};
use mail_builder::headers::{address::Address as MimeAddress, date::Date, text::Text};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    client::{
        address::{Address, AddressList},
        content::Content,
        headers::HeaderMap,
    },
    error::{Error, ErrorKind, Result},
};

/// The immutable result of a successful build.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Message {
    pub(crate) from: Address,
    pub(crate) to: AddressList,
    pub(crate) cc: AddressList,
    pub(crate) bcc: AddressList,
    pub(crate) reply_to: AddressList,
    pub(crate) headers: HeaderMap,
    pub(crate) subject: Option<String>,
    pub(crate) content: Content,
    pub(crate) sent_date: DateTime<Utc>,
    pub(crate) bounce_address: Option<String>,
}

fn mime_list(list: &AddressList) -> MimeAddress<'_> {
    MimeAddress::new_list(list.iter().map(MimeAddress::from).collect())
}

impl Message {
    pub fn from(&self) -> &Address {
        &self.from
    }

    pub fn to(&self) -> &AddressList {
        &self.to
    }

    pub fn cc(&self) -> &AddressList {
        &self.cc
    }

    pub fn bcc(&self) -> &AddressList {
        &self.bcc
    }

    pub fn reply_to(&self) -> &AddressList {
        &self.reply_to
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// What the message is about.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn sent_date(&self) -> DateTime<Utc> {
        self.sent_date
    }

    pub fn bounce_address(&self) -> Option<&str> {
        self.bounce_address.as_deref()
    }

    /// The address used in the smtp `MAIL FROM` command.
    pub fn envelope_sender(&self) -> &str {
        match self.bounce_address.as_deref() {
            Some(bounce) => bounce,
            None => self.from.email(),
        }
    }

    /// Every address the message is delivered to, in to, cc, bcc order.
    pub fn recipients(&self) -> impl Iterator<Item = &Address> {
        self.to.iter().chain(self.cc.iter()).chain(self.bcc.iter())
    }

    /// Renders the message as an rfc822 document. Bcc recipients are not written to the headers.
    pub fn render(&self) -> Result<String> {
        let mut builder = mail_builder::MessageBuilder::new()
            .from(MimeAddress::from(&self.from))
            .date(Date::new(self.sent_date.timestamp()));

        if !self.to.is_empty() {
            builder = builder.to(mime_list(&self.to));
        }

        if !self.cc.is_empty() {
            builder = builder.cc(mime_list(&self.cc));
        }

        if !self.reply_to.is_empty() {
            builder = builder.reply_to(mime_list(&self.reply_to));
        }

        if let Some(subject) = self.subject.as_deref() {
            builder = builder.subject(subject);
        }

        for (name, value) in self.headers.iter() {
            builder = builder.header(name.as_str(), Text::new(value.as_str()));
        }

        if let Some(text) = self.content.text() {
            builder = builder.text_body(text);
        }

        if let Some(html) = self.content.html() {
            builder = builder.html_body(html);
        }

        if self.content.is_empty() {
            builder = builder.text_body("");
        }

        builder.write_to_string().map_err(|io_error| {
            Error::new(
                ErrorKind::InvalidMessage,
                format!("Failed to render message: {}", io_error),
            )
        })
    }

    #[cfg(feature = "json")]
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|json_error| {
            Error::new(
                ErrorKind::SerializeJSON,
                format!("Failed to serialize message: {}", json_error),
            )
        })
    }
}

#[cfg(feature = "smtp")]
use async_smtp::{EmailAddress, Envelope, SendableEmail};

#[cfg(feature = "smtp")]
fn smtp_address(address: &str) -> Result<EmailAddress> {
    address.parse().map_err(|parse_error| {
        Error::new(
            ErrorKind::InvalidMessage,
            format!("Invalid smtp address '{}': {}", address, parse_error),
        )
    })
}

#[cfg(feature = "smtp")]
impl TryFrom<&Message> for SendableEmail {
    type Error = Error;

    fn try_from(message: &Message) -> std::result::Result<Self, Self::Error> {
        use crate::error::err;

        let from = smtp_address(message.envelope_sender())?;

        let to = message
            .recipients()
            .map(|recipient| smtp_address(recipient.email()))
            .collect::<Result<Vec<_>>>()?;

        let envelope = match Envelope::new(Some(from), to) {
            Ok(envelope) => envelope,
            Err(err) => err!(
                ErrorKind::InvalidMessage,
                "Failed to create message envelope: {}",
                err
            ),
        };

        let rendered = message.render()?;

        Ok(SendableEmail::new(envelope, rendered))
    }
}
