// The dashboard's view of the last message listing, and parsing of
// user-entered message ids.

use std::collections::BTreeMap;
use std::fmt;

/// One listed message as shown in the dashboard output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub sender: String,
    pub subject: String,
    pub date: String,
}

/// Message ids from the last "List Emails", with their summaries.
#[derive(Debug, Default)]
pub struct Listing {
    entries: BTreeMap<u32, Summary>,
}

impl Listing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: u32, summary: Summary) {
        self.entries.insert(id, summary);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn get(&self, id: u32) -> Option<&Summary> {
        self.entries.get(&id)
    }

    /// Keep only the ids present in this listing.
    pub fn known(&self, ids: &[u32]) -> Vec<u32> {
        ids.iter().copied().filter(|id| self.contains(*id)).collect()
    }

    pub fn remove_all(&mut self, ids: &[u32]) {
        for id in ids {
            self.entries.remove(id);
        }
    }
}

/// Line printed for a listed message.
pub struct Entry<'a>(pub u32, pub &'a Summary);

impl fmt::Display for Entry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {} | From: {} | Subject: {} | Date: {}",
            self.0, self.1.sender, self.1.subject, self.1.date
        )
    }
}

/// Parse a comma-separated list of message ids. Tokens that are not plain
/// decimal numbers (or overflow `u32`) are skipped.
pub fn parse_ids(input: &str) -> Vec<u32> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tok| !tok.is_empty() && tok.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|tok| tok.parse().ok())
        .collect()
}
