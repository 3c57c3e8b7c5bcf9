//! Student records and the form input they are built from.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// A single student registration record.
///
/// `reg_number` is the unique key of the collection and never changes once
/// the record has been added. Numeric JSON values are accepted for any field
/// and read as their decimal text, so hand-edited data such as `"level": 300`
/// still loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    #[serde(deserialize_with = "text_or_number")]
    pub name: String,
    #[serde(deserialize_with = "text_or_number")]
    pub reg_number: String,
    #[serde(deserialize_with = "text_or_number")]
    pub department: String,
    /// Free-form academic level label ("100", "200", "MSc", ...).
    #[serde(deserialize_with = "text_or_number")]
    pub level: String,
}

fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Unsigned(u64),
        Signed(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Unsigned(n) => n.to_string(),
        Raw::Signed(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
    })
}

impl StudentRecord {
    pub fn new(
        name: impl Into<String>,
        reg_number: impl Into<String>,
        department: impl Into<String>,
        level: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            reg_number: reg_number.into(),
            department: department.into(),
            level: level.into(),
        }
    }

    /// Case-insensitive substring match across all four fields.
    ///
    /// An empty query matches every record.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [
            &self.name,
            &self.reg_number,
            &self.department,
            &self.level,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Returns a copy of this record keyed on `reg_number`.
    pub fn rekeyed(mut self, reg_number: &str) -> Self {
        self.reg_number = reg_number.to_string();
        self
    }
}

impl fmt::Display for StudentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) - {}, level {}",
            self.name, self.reg_number, self.department, self.level
        )
    }
}

/// Raw form input for the add and edit pages.
///
/// Every field is optional on the wire; presence is checked by
/// [`StudentForm::into_record`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StudentForm {
    pub name: String,
    pub reg_number: String,
    pub department: String,
    pub level: String,
}

/// A required form field was missing or blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingFields(pub Vec<&'static str>);

impl fmt::Display for MissingFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing required fields: {}", self.0.join(", "))
    }
}

impl std::error::Error for MissingFields {}

impl StudentForm {
    /// Trim every field and build a record.
    ///
    /// When `fixed_key` is given (the edit page) it replaces whatever
    /// `reg_number` was submitted, so the key is never taken from the form.
    pub fn into_record(self, fixed_key: Option<&str>) -> Result<StudentRecord, MissingFields> {
        let reg_number = match fixed_key {
            Some(key) => key.trim().to_string(),
            None => self.reg_number.trim().to_string(),
        };
        let record = StudentRecord {
            name: self.name.trim().to_string(),
            reg_number,
            department: self.department.trim().to_string(),
            level: self.level.trim().to_string(),
        };

        let missing: Vec<&'static str> = [
            ("name", &record.name),
            ("reg_number", &record.reg_number),
            ("department", &record.department),
            ("level", &record.level),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
        .collect();

        if missing.is_empty() {
            Ok(record)
        } else {
            Err(MissingFields(missing))
        }
    }
}
