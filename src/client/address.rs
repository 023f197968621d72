use std::{fmt, result, slice, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{err, Error, ErrorKind, Result};

/// A single mailbox, optionally carrying a display name.
///
/// Two addresses are equal when their email part is equal, the display name is ignored.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawAddress"))]
pub struct Address {
    name: Option<String>,
    email: String,
}

/// Unvalidated wire form of an [`Address`]; deserialized addresses pass through [`Address::new`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawAddress {
    name: Option<String>,
    email: String,
}

#[cfg(feature = "serde")]
impl TryFrom<RawAddress> for Address {
    type Error = Error;

    fn try_from(raw: RawAddress) -> Result<Self> {
        Address::new(raw.email, raw.name)
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.email == other.email
    }
}

impl Eq for Address {}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> result::Result<Self, Self::Err> {
        let mailbox = email::Mailbox::from_str(s).map_err(|parse_error| {
            Error::new(
                ErrorKind::ParseAddress,
                format!("Failed to parse address '{}': {:?}", s, parse_error),
            )
        })?;

        Self::new(mailbox.address, mailbox.name)
    }
}

impl<'x> From<&'x Address> for mail_builder::headers::address::Address<'x> {
    fn from(address: &'x Address) -> Self {
        mail_builder::headers::address::Address::new_address(
            address.name.as_deref(),
            address.email.as_str(),
        )
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name.as_ref() {
            Some(name) => write!(f, "{} <{}>", name, self.email),
            None => write!(f, "{}", self.email),
        }
    }
}

impl Address {
    /// Creates a new address. The email is trimmed and must not be empty afterwards.
    pub fn new<E: AsRef<str>>(email: E, name: Option<String>) -> Result<Self> {
        let email = email.as_ref().trim();

        if email.is_empty() {
            err!(ErrorKind::Validation, "address can not be null or empty");
        }

        let name = name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        Ok(Self {
            name,
            email: email.to_string(),
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

/// An append-only, ordered list of addresses. Duplicates are kept as given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AddressList {
    addresses: Vec<Address>,
}

impl<'a> IntoIterator for &'a AddressList {
    type Item = &'a Address;
    type IntoIter = slice::Iter<'a, Address>;

    fn into_iter(self) -> Self::IntoIter {
        self.addresses.iter()
    }
}

impl AddressList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a single address.
    pub fn add<E: AsRef<str>>(&mut self, email: E, name: Option<String>) -> Result<&Address> {
        let address = Address::new(email, name)?;

        self.addresses.push(address);

        Ok(&self.addresses[self.addresses.len() - 1])
    }

    /// Appends one address per entry.
    ///
    /// Every entry is validated before anything is appended, so a failure leaves the list untouched.
    pub fn add_all<E: AsRef<str>, I: IntoIterator<Item = E>>(&mut self, emails: I) -> Result<()> {
        let validated = emails
            .into_iter()
            .map(|email| Address::new(email, None))
            .collect::<Result<Vec<_>>>()?;

        self.addresses.extend(validated);

        Ok(())
    }

    pub fn get(&self, index: usize) -> Result<&Address> {
        match self.addresses.get(index) {
            Some(address) => Ok(address),
            None => err!(
                ErrorKind::Index,
                "Index {} is out of bounds for address list of length {}",
                index,
                self.addresses.len()
            ),
        }
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Address> {
        self.addresses.iter()
    }
}
