use std::collections::{HashMap, VecDeque};

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Content-addressed response memo: the first answer computed for a
/// fingerprint wins and is replayed for every identical request afterwards,
/// which also deduplicates paid provider calls for repeated submissions.
///
/// Growth is bounded by `max_entries`; once full, the oldest insertion is
/// evicted to make room. The original design kept entries forever.
#[derive(Debug)]
pub struct ResponseCache {
    entries: HashMap<String, Value>,
    order: VecDeque<String>,
    max_entries: usize,
}

impl ResponseCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            max_entries: max_entries.max(1),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    pub fn put(&mut self, key: String, value: Value) {
        if self.entries.contains_key(&key) {
            return; // first answer wins
        }
        while self.entries.len() >= self.max_entries {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// SHA-256 over the concatenation of `parts` separated by `|`, truncated to a
/// 24-hex-char prefix. Deterministic for identical inputs, collision-resistant
/// enough for a process-local cache key.
pub fn fingerprint(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update(b"|");
        }
        hasher.update(part);
    }
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(24);
    for byte in digest.iter().take(12) {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

pub fn fingerprint_str(text: &str) -> String {
    fingerprint(&[text.as_bytes()])
}
