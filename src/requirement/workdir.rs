//! InitialWorkDirRequirement listing

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// File created in the working directory before the tool runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dirent {
    pub entry: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entryname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writable: Option<bool>,
}

impl Dirent {
    /// Build a dirent; with `encode` the entry is base64 of `content`.
    pub fn new(content: &str, entryname: Option<&str>, writable: bool, encode: bool) -> Self {
        let entry = if encode {
            STANDARD.encode(content.as_bytes())
        } else {
            content.to_string()
        };
        Self {
            entry,
            entryname: entryname.map(str::to_string),
            writable: writable.then_some(true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListingEntry {
    /// `$(inputs.reads)` or any expression yielding files
    Expression(String),
    Dirent(Dirent),
    /// Literal File or Directory object
    Literal(Value),
}

impl From<Dirent> for ListingEntry {
    fn from(dirent: Dirent) -> Self {
        ListingEntry::Dirent(dirent)
    }
}

impl From<&str> for ListingEntry {
    fn from(expression: &str) -> Self {
        ListingEntry::Expression(expression.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitialWorkDirRequirement {
    #[serde(default)]
    pub listing: Vec<ListingEntry>,
}

impl InitialWorkDirRequirement {
    pub fn merge_from(&mut self, other: Self) {
        super::kinds::overwrite_list(&mut self.listing, other.listing);
    }

    /// Append an entry unless an identical one is already listed.
    pub fn push(&mut self, entry: ListingEntry) -> bool {
        if self.listing.contains(&entry) {
            return false;
        }
        self.listing.push(entry);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn listing_entry_shapes() {
        let req: InitialWorkDirRequirement = serde_json::from_value(json!({
            "listing": [
                "$(inputs.reads)",
                {"entry": "echo hi", "entryname": "run.sh"},
                {"class": "File", "location": "ref.fa"}
            ]
        }))
        .unwrap();
        assert!(matches!(req.listing[0], ListingEntry::Expression(_)));
        assert!(matches!(req.listing[1], ListingEntry::Dirent(_)));
        assert!(matches!(req.listing[2], ListingEntry::Literal(_)));
    }

    #[test]
    fn encoded_dirent() {
        let dirent = Dirent::new("hello", Some("a.txt"), false, true);
        assert_eq!(dirent.entry, "aGVsbG8=");
        assert_eq!(dirent.writable, None);
    }

    #[test]
    fn push_skips_identical() {
        let mut req = InitialWorkDirRequirement::default();
        assert!(req.push("$(inputs.a)".into()));
        assert!(!req.push("$(inputs.a)".into()));
        assert_eq!(req.listing.len(), 1);
    }
}
