//! UID-keyed arena.
//!
//! Entities live in insertion order in a `Vec`; a side table maps each UID
//! to its slot. Entities refer to each other by UID only, so the arena is
//! the single place a reference is resolved.

use std::collections::HashMap;

/// Anything stored in a [`Registry`].
pub trait Identified {
    fn uid(&self) -> &str;
    fn set_uid(&mut self, uid: String);
}

#[derive(Clone, Debug)]
pub struct Registry<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self { items: Vec::new(), index: HashMap::new() }
    }
}

impl<T: Identified> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `item`. Hands it back if its UID is taken.
    pub fn add(&mut self, item: T) -> Result<usize, T> {
        if self.index.contains_key(item.uid()) {
            return Err(item);
        }
        let slot = self.items.len();
        self.index.insert(item.uid().to_owned(), slot);
        self.items.push(item);
        Ok(slot)
    }

    pub fn get(&self, uid: &str) -> Option<&T> {
        self.index.get(uid).map(|&i| &self.items[i])
    }

    pub fn get_mut(&mut self, uid: &str) -> Option<&mut T> {
        self.index.get(uid).map(|&i| &mut self.items[i])
    }

    /// Entity in slot `i` (0-based).
    pub fn at(&self, i: usize) -> Option<&T> {
        self.items.get(i)
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.index.contains_key(uid)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    /// Remove the entity with `uid`, keeping the order of the rest.
    pub fn remove(&mut self, uid: &str) -> Option<T> {
        let slot = self.index.remove(uid)?;
        let item = self.items.remove(slot);
        for i in self.index.values_mut() {
            if *i > slot {
                *i -= 1;
            }
        }
        Some(item)
    }

    /// Give entity `old` the UID `new`. False if `old` is unknown or `new` is taken.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        if self.index.contains_key(new) {
            return false;
        }
        let Some(slot) = self.index.remove(old) else {
            return false;
        };
        self.items[slot].set_uid(new.to_owned());
        self.index.insert(new.to_owned(), slot);
        true
    }
}

impl<'a, T> IntoIterator for &'a Registry<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
