//! Typed EXTINF metadata line
//!
//! An EXTINF line looks like
//! `#EXTINF:-1 tvg-id="bbc1.uk" group-title="News, UK",BBC One`. It is held as
//! a duration token, an ordered attribute list and a title so that policies
//! can read and rewrite attributes without touching the raw text.

use std::fmt;

/// Prefix shared by every EXTINF line
pub const EXTINF_PREFIX: &str = "#EXTINF:";

/// Title used when a metadata line carries no title separator at all
pub const UNTITLED: &str = "Unknown";

/// Parsed EXTINF metadata line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtInf {
    /// Duration token, `-1` for live streams
    pub duration: String,
    attributes: Vec<(String, String)>,
    /// Display title, the text after the title-separating comma
    pub title: String,
}

impl ExtInf {
    /// Create a live (`-1`) entry with no attributes
    pub fn new<T: Into<String>>(title: T) -> Self {
        Self {
            duration: "-1".to_string(),
            attributes: Vec::new(),
            title: title.into(),
        }
    }

    /// Parse a metadata line, returning `None` when it is not an EXTINF line
    ///
    /// Attributes may be quoted (`key="value"`) or bare (`key=value`). Commas
    /// inside quoted values are part of the value; the first comma outside
    /// quotes starts the title, so titles may contain commas themselves.
    pub fn parse(line: &str) -> Option<Self> {
        let body = line.trim().strip_prefix(EXTINF_PREFIX)?;
        let bytes = body.as_bytes();
        let len = bytes.len();

        let mut i = body
            .find(|c: char| c.is_ascii_whitespace() || c == ',')
            .unwrap_or(len);
        let duration = match &body[..i] {
            "" => "-1".to_string(),
            token => token.to_string(),
        };

        let mut info = Self {
            duration,
            attributes: Vec::new(),
            title: UNTITLED.to_string(),
        };

        // All delimiters are ASCII, so byte offsets always land on char boundaries.
        loop {
            while i < len && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= len {
                break;
            }
            if bytes[i] == b',' {
                info.title = body[i + 1..].trim().to_string();
                break;
            }

            let key_start = i;
            while i < len && bytes[i] != b'=' && bytes[i] != b',' && !bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            let key = &body[key_start..i];

            if i < len && bytes[i] == b'=' {
                i += 1;
                let value = if i < len && bytes[i] == b'"' {
                    let value_start = i + 1;
                    match body[value_start..].find('"') {
                        Some(offset) => {
                            i = value_start + offset + 1;
                            &body[value_start..value_start + offset]
                        }
                        None => {
                            i = len;
                            &body[value_start..]
                        }
                    }
                } else {
                    let value_start = i;
                    while i < len && bytes[i] != b',' && !bytes[i].is_ascii_whitespace() {
                        i += 1;
                    }
                    &body[value_start..i]
                };

                if !key.is_empty() {
                    info.set(key, value);
                }
            }
            // bare tokens without '=' carry no attribute and are dropped
        }

        Some(info)
    }

    /// Attribute value by name
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the attribute is present (even if empty)
    pub fn has(&self, key: &str) -> bool {
        self.attributes.iter().any(|(k, _)| k == key)
    }

    /// Replace the attribute value in place, or append it when absent
    ///
    /// Double quotes are dropped from the value, rendered values are always
    /// quoted and have no escape syntax.
    pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let key = key.into();
        let value = without_quotes(value.into());
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Append the attribute only when it is not already present
    ///
    /// Returns `true` when the attribute was inserted.
    pub fn insert_if_absent<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) -> bool {
        let key = key.into();
        if self.has(&key) {
            return false;
        }
        self.attributes.push((key, without_quotes(value.into())));
        true
    }

    /// Remove the attribute, returning its previous value
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(k, _)| k == key)?;
        Some(self.attributes.remove(index).1)
    }

    /// Attributes in their original order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }
}

fn without_quotes(value: String) -> String {
    if value.contains('"') {
        value.replace('"', "")
    } else {
        value
    }
}

impl fmt::Display for ExtInf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{EXTINF_PREFIX}{}", self.duration)?;
        for (key, value) in &self.attributes {
            write!(f, " {key}=\"{value}\"")?;
        }
        write!(f, ",{}", self.title)
    }
}
