// Contact records.
// The agent's save_contact payload and the CSV row written to disk.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Placeholder written for fields the crawler could not find.
pub const UNKNOWN: &str = "Unbekannt";

/// A contact as saved by the agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    #[serde(default)]
    pub political_party: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub contact_url: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub additional_info: Option<String>,
    /// URL where the search started.
    #[serde(default)]
    pub start_url: Option<String>,
}

impl Contact {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Mutable access to every field except `name`, labelled by column.
    pub fn fields_mut(&mut self) -> [(&'static str, &mut Option<String>); 8] {
        [
            ("political_party", &mut self.political_party),
            ("position", &mut self.position),
            ("email", &mut self.email),
            ("phone", &mut self.phone),
            ("contact_url", &mut self.contact_url),
            ("address", &mut self.address),
            ("additional_info", &mut self.additional_info),
            ("start_url", &mut self.start_url),
        ]
    }

    /// One-line summary with absent fields shown as unknown.
    pub fn summary(&self) -> String {
        let or_unknown = |v: &Option<String>| v.clone().unwrap_or_else(|| UNKNOWN.to_string());
        format!(
            "Name: {}, Party: {}, Position: {}, Email: {}, Phone: {}, Website: {}, Address: {}, Additional info: {}",
            self.name,
            or_unknown(&self.political_party),
            or_unknown(&self.position),
            or_unknown(&self.email),
            or_unknown(&self.phone),
            or_unknown(&self.contact_url),
            or_unknown(&self.address),
            or_unknown(&self.additional_info),
        )
    }
}

/// A contact row as stored in the CSV files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRow {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub political_party: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub contact_url: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub additional_info: Option<String>,
    #[serde(default)]
    pub start_url: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
    /// Input columns this tool does not know, in file order. Written back unchanged.
    #[serde(skip)]
    pub extra: Vec<(String, String)>,
}

impl ContactRow {
    /// Values of the fixed columns, absent ones as empty strings.
    pub fn values(&self) -> [&str; 10] {
        fn or_empty(value: &Option<String>) -> &str {
            value.as_deref().unwrap_or_default()
        }
        [
            &self.name,
            or_empty(&self.political_party),
            or_empty(&self.position),
            or_empty(&self.email),
            or_empty(&self.phone),
            or_empty(&self.contact_url),
            or_empty(&self.address),
            or_empty(&self.additional_info),
            or_empty(&self.start_url),
            or_empty(&self.last_updated),
        ]
    }

    pub fn extra_value(&self, column: &str) -> Option<&str> {
        self.extra
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// Stamp a contact with the time it was crawled.
    pub fn stamped(contact: Contact, at: DateTime<Local>) -> Self {
        Self {
            last_updated: Some(at.format("%Y-%m-%d %H:%M:%S%.6f").to_string()),
            ..Self::from(contact)
        }
    }
}

impl From<Contact> for ContactRow {
    fn from(c: Contact) -> Self {
        Self {
            name: c.name,
            political_party: c.political_party,
            position: c.position,
            email: c.email,
            phone: c.phone,
            contact_url: c.contact_url,
            address: c.address,
            additional_info: c.additional_info,
            start_url: c.start_url,
            last_updated: None,
            extra: Vec::new(),
        }
    }
}
