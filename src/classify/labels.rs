//! Dense integer ids for named classes.

use std::collections::HashMap;

/// Maps class names to ids `0..len()` in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMap {
    names: Vec<String>,
    ids: HashMap<String, usize>,
}

impl LabelMap {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode a sequence of names, returning the map and one id per name.
    pub fn encode<I, S>(names: I) -> (Self, Vec<usize>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = Self::new();
        let ids = names.into_iter().map(|s| map.insert(s.as_ref())).collect();
        (map, ids)
    }

    /// Id of `name`, assigning the next free one if unseen.
    pub fn insert(&mut self, name: &str) -> usize {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.names.len();
        self.names.push(name.to_owned());
        self.ids.insert(name.to_owned(), id);
        id
    }

    /// Id of a known name.
    pub fn id(&self, name: &str) -> Option<usize> {
        self.ids.get(name).copied()
    }

    /// Name of a known id.
    pub fn name(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// Names in id order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of distinct classes.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no class has been seen.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
