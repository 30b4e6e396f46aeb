//! Per-user display flair, e.g. an emoji shown after a mention.

use std::collections::HashMap;

use crate::utils::mention;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlairRegistry {
    entries: HashMap<String, String>,
}

impl FlairRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(entries: HashMap<String, String>) -> Self {
        let entries = entries.into_iter().filter(|(_, f)| !f.is_empty()).collect();
        Self { entries }
    }

    /// Set a handle's flair. An empty flair clears it.
    pub fn set(&mut self, handle: &str, flair: &str) {
        if flair.is_empty() {
            self.clear(handle);
        } else {
            self.entries.insert(handle.to_string(), flair.to_string());
        }
    }

    pub fn clear(&mut self, handle: &str) {
        self.entries.remove(handle);
    }

    /// The handle's flair, or an empty string.
    pub fn get(&self, handle: &str) -> String {
        self.entries.get(handle).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `<@handle>` followed by the flair, separated by one space when present.
pub fn display_mention(handle: &str, flair: &str) -> String {
    if flair.is_empty() {
        mention(handle)
    } else {
        format!("{} {}", mention(handle), flair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mention() {
        assert_eq!(display_mention("U", "=]"), "<@U> =]");
        assert_eq!(display_mention("U", ""), "<@U>");
    }

    #[test]
    fn test_set_get_clear_round_trip() {
        let mut reg = FlairRegistry::new();
        assert_eq!(reg.get("U1"), "");

        reg.set("U1", ":crab:");
        assert_eq!(reg.get("U1"), ":crab:");

        reg.set("U1", ":tada:");
        assert_eq!(reg.get("U1"), ":tada:");

        reg.clear("U1");
        assert_eq!(reg.get("U1"), "");
        assert!(reg.is_empty());
    }

    #[test]
    fn test_empty_set_is_clear() {
        let mut reg = FlairRegistry::new();
        reg.set("U1", ":crab:");
        reg.set("U1", "");
        assert_eq!(reg.get("U1"), "");
        assert_eq!(reg.len(), 0);
    }

    #[test]
    fn test_from_map_drops_empty() {
        let reg = FlairRegistry::from_map(HashMap::from([
            ("U1".to_string(), ":crab:".to_string()),
            ("U2".to_string(), String::new()),
        ]));
        assert_eq!(reg.len(), 1);
    }
}
