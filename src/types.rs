//! Data types for the SimpleVOC client

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// A record held by the store: a key, its data and metadata.
///
/// Values are built by the caller for writes and by the client for reads.
/// `created` is assigned by the server and is never sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VocValue {
    /// The key addressing this record
    pub key: String,
    /// Payload; `None` sends no body, reads always carry the body text
    pub data: Option<String>,
    /// Creation time, only populated on read
    pub created: Option<DateTime<Utc>>,
    /// Expiration time; `None` means the record does not expire
    pub expires: Option<DateTime<Utc>>,
    /// Opaque numeric tag
    pub flags: i32,
    /// Extended attributes, sent out-of-band as a JSON header
    pub extended: Option<BTreeMap<String, String>>,
}

impl VocValue {
    /// Create a value with the given key and no data
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    /// Set the payload
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set the flags
    pub fn with_flags(mut self, flags: i32) -> Self {
        self.flags = flags;
        self
    }

    /// Set the expiration time
    pub fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Replace the extended attributes
    pub fn with_extended(mut self, extended: BTreeMap<String, String>) -> Self {
        self.extended = Some(extended);
        self
    }

    /// Add a single extended attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extended
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Extended attributes, if any are present
    pub(crate) fn non_empty_extended(&self) -> Option<&BTreeMap<String, String>> {
        self.extended.as_ref().filter(|map| !map.is_empty())
    }
}
