use std::collections::{hash_map, HashMap};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{err, ErrorKind, Result};

/// Custom message headers, keyed by name. Adding a header with an existing name replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HeaderMap {
    headers: HashMap<String, String>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) -> Result<()> {
        let name = name.into();
        let value = value.into();

        if name.trim().is_empty() {
            err!(ErrorKind::Validation, "name can not be null or empty");
        }

        if value.trim().is_empty() {
            err!(ErrorKind::Validation, "value can not be null or empty");
        }

        self.headers.insert(name, value);

        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.headers.clear()
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, String> {
        self.headers.iter()
    }
}
