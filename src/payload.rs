//! Payload data structures

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// Field name carrying the payload kind label
pub const TYPE_FIELD: &str = "Type";

/// Name given to a JSON field that would otherwise replace `Type`
pub const JSON_TYPE_FIELD: &str = "Type (JSON)";

/// Short code reported for text that matched no structured format
pub const UNSTRUCTURED_CODE: &str = "text";

/// Structured formats recognised in decoded QR text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Url,
    VCard,
    Wifi,
    Phone,
    Sms,
    Email,
    Location,
    Json,
}

impl PayloadKind {
    /// Human readable label, used as the value of the `Type` field
    pub fn label(&self) -> &'static str {
        match self {
            Self::Url => "URL",
            Self::VCard => "vCard/Contact",
            Self::Wifi => "WiFi Network",
            Self::Phone => "Phone Number",
            Self::Sms => "SMS",
            Self::Email => "Email",
            Self::Location => "Location",
            Self::Json => "JSON",
        }
    }

    /// Short machine-friendly code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::VCard => "vcard",
            Self::Wifi => "wifi",
            Self::Phone => "phone",
            Self::Sms => "sms",
            Self::Email => "email",
            Self::Location => "geo",
            Self::Json => "json",
        }
    }

    /// Look a kind up by its `Type` label
    pub fn from_label(label: &str) -> Option<Self> {
        [
            Self::Url,
            Self::VCard,
            Self::Wifi,
            Self::Phone,
            Self::Sms,
            Self::Email,
            Self::Location,
            Self::Json,
        ]
        .into_iter()
        .find(|kind| kind.label() == label)
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordered field-name to field-value mapping produced for a structured payload.
///
/// The first entry is always `Type`. Inserting a key that already exists
/// replaces its value but keeps its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResult {
    kind: PayloadKind,
    fields: Vec<(String, String)>,
}

impl ParsedResult {
    /// Create a result holding only the `Type` field
    pub fn new(kind: PayloadKind) -> Self {
        Self {
            kind,
            fields: vec![(TYPE_FIELD.to_string(), kind.label().to_string())],
        }
    }

    pub fn kind(&self) -> PayloadKind {
        self.kind
    }

    /// Insert or overwrite a field
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Insert a field only when a value is present
    pub fn insert_opt(&mut self, key: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Fields in insertion order, `Type` first
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false: a result carries at least the `Type` field
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for ParsedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.fields {
            writeln!(f, "{}: {}", key, value)?;
        }
        Ok(())
    }
}

impl Serialize for ParsedResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'a> IntoIterator for &'a ParsedResult {
    type Item = &'a (String, String);
    type IntoIter = std::slice::Iter<'a, (String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// A classified payload with its extracted fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Url {
        protocol: String,
        host: String,
        path: Option<String>,
        query: Option<String>,
        hash: Option<String>,
    },
    VCard(Contact),
    Wifi {
        ssid: Option<String>,
        security: Option<String>,
        password: Option<String>,
        hidden: bool,
    },
    Phone {
        number: String,
    },
    Sms {
        number: String,
        message: Option<String>,
    },
    Email {
        address: String,
        subject: Option<String>,
        body: Option<String>,
    },
    Location {
        latitude: String,
        longitude: String,
    },
    /// Flattened `key.path` / value pairs in document order
    Json(Vec<(String, String)>),
}

/// Fields extracted from a vCard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contact {
    pub full_name: Option<String>,
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub organization: Option<String>,
    pub title: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    /// Field keys in the order they were first seen
    order: Vec<&'static str>,
}

const CONTACT_KEYS: [&str; 9] = [
    "Full Name",
    "Last Name",
    "First Name",
    "Phone",
    "Email",
    "Organization",
    "Title",
    "Website",
    "Address",
];

impl Contact {
    /// Display keys of the set fields: parse order first, then any field
    /// assigned directly in declaration order
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys = self.order.clone();
        for key in CONTACT_KEYS {
            if !keys.contains(&key) && self.value(key).is_some() {
                keys.push(key);
            }
        }
        keys.retain(|key| self.value(key).is_some());
        keys
    }

    pub(crate) fn set(&mut self, key: &'static str, value: impl Into<String>) {
        let value = Some(value.into());
        match key {
            "Full Name" => self.full_name = value,
            "Last Name" => self.last_name = value,
            "First Name" => self.first_name = value,
            "Phone" => self.phone = value,
            "Email" => self.email = value,
            "Organization" => self.organization = value,
            "Title" => self.title = value,
            "Website" => self.website = value,
            "Address" => self.address = value,
            _ => return,
        }
        if !self.order.contains(&key) {
            self.order.push(key);
        }
    }

    fn value(&self, key: &str) -> Option<&str> {
        match key {
            "Full Name" => self.full_name.as_deref(),
            "Last Name" => self.last_name.as_deref(),
            "First Name" => self.first_name.as_deref(),
            "Phone" => self.phone.as_deref(),
            "Email" => self.email.as_deref(),
            "Organization" => self.organization.as_deref(),
            "Title" => self.title.as_deref(),
            "Website" => self.website.as_deref(),
            "Address" => self.address.as_deref(),
            _ => None,
        }
    }
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::Url { .. } => PayloadKind::Url,
            Self::VCard(_) => PayloadKind::VCard,
            Self::Wifi { .. } => PayloadKind::Wifi,
            Self::Phone { .. } => PayloadKind::Phone,
            Self::Sms { .. } => PayloadKind::Sms,
            Self::Email { .. } => PayloadKind::Email,
            Self::Location { .. } => PayloadKind::Location,
            Self::Json(_) => PayloadKind::Json,
        }
    }

    /// Project the payload onto display fields
    pub fn to_result(&self) -> ParsedResult {
        let mut result = ParsedResult::new(self.kind());

        match self {
            Self::Url { protocol, host, path, query, hash } => {
                result.insert("Protocol", protocol.as_str());
                result.insert("Host", host.as_str());
                result.insert_opt("Path", path.as_deref());
                result.insert_opt("Query", query.as_deref());
                result.insert_opt("Hash", hash.as_deref());
            }
            Self::VCard(contact) => {
                for key in contact.keys() {
                    result.insert_opt(key, contact.value(key));
                }
            }
            Self::Wifi { ssid, security, password, hidden } => {
                result.insert_opt("Network Name (SSID)", ssid.as_deref());
                result.insert_opt("Security Type", security.as_deref());
                result.insert_opt("Password", password.as_deref());
                if *hidden {
                    result.insert("Hidden Network", "Yes");
                }
            }
            Self::Phone { number } => {
                result.insert("Number", number.as_str());
            }
            Self::Sms { number, message } => {
                result.insert("Number", number.as_str());
                result.insert_opt("Message", message.as_deref());
            }
            Self::Email { address, subject, body } => {
                result.insert("Address", address.as_str());
                result.insert_opt("Subject", subject.as_deref());
                result.insert_opt("Body", body.as_deref());
            }
            Self::Location { latitude, longitude } => {
                result.insert("Latitude", latitude.as_str());
                result.insert("Longitude", longitude.as_str());
            }
            Self::Json(pairs) => {
                for (key, value) in pairs {
                    let key = if key == TYPE_FIELD { JSON_TYPE_FIELD } else { key.as_str() };
                    result.insert(key, value.as_str());
                }
            }
        }

        result
    }
}
