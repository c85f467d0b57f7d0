//! Bidirectional tag index.
//!
//! Tracks which cache keys were written under which tags so a tag
//! invalidation can find every affected entry, and so evicted entries can be
//! unlinked from every tag they carried.

use std::collections::{HashMap, HashSet};

/// Tag → keys and key → tags mappings.
///
/// Not synchronized on its own; the owning store guards it together with the
/// entries so both always change under one lock.
#[derive(Debug, Default)]
pub struct TagIndex {
    tag_to_keys: HashMap<String, HashSet<String>>,
    key_to_tags: HashMap<String, HashSet<String>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link `key` to `tags`, replacing whatever the key was linked to before.
    pub fn register(&mut self, key: &str, tags: &[String]) {
        self.unregister(key);

        let tag_set: HashSet<String> = tags.iter().cloned().collect();
        for tag in &tag_set {
            self.tag_to_keys
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
        if !tag_set.is_empty() {
            self.key_to_tags.insert(key.to_string(), tag_set);
        }
    }

    /// Unlink `key` from every tag; tags left without keys are dropped.
    pub fn unregister(&mut self, key: &str) {
        let Some(tags) = self.key_to_tags.remove(key) else {
            return;
        };
        for tag in tags {
            if let Some(keys) = self.tag_to_keys.get_mut(&tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.tag_to_keys.remove(&tag);
                }
            }
        }
    }

    /// Remove `tags` and return every key that was linked to any of them.
    ///
    /// Returned keys are fully unlinked, including from tags not listed.
    pub fn take_keys_for_tags(&mut self, tags: &[String]) -> HashSet<String> {
        let mut affected = HashSet::new();
        for tag in tags {
            if let Some(keys) = self.tag_to_keys.remove(tag) {
                affected.extend(keys);
            }
        }
        for key in &affected {
            self.unregister(key);
        }
        affected
    }

    pub fn keys_for_tag(&self, tag: &str) -> HashSet<String> {
        self.tag_to_keys.get(tag).cloned().unwrap_or_default()
    }

    pub fn tags_for_key(&self, key: &str) -> HashSet<String> {
        self.key_to_tags.get(key).cloned().unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.tag_to_keys.clear();
        self.key_to_tags.clear();
    }

    pub fn tag_count(&self) -> usize {
        self.tag_to_keys.len()
    }

    pub fn key_count(&self) -> usize {
        self.key_to_tags.len()
    }
}
