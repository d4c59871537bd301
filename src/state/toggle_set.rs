use std::collections::HashSet;
use std::hash::Hash;

/// A set with toggle semantics that remembers insertion order.
///
/// Membership checks are O(1); iteration yields members in the order they
/// were (last) added.
#[derive(Debug, Clone)]
pub struct ToggleSet<T: Eq + Hash + Clone> {
    order: Vec<T>,
    members: HashSet<T>,
}

impl<T: Eq + Hash + Clone> Default for ToggleSet<T> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            members: HashSet::new(),
        }
    }
}

impl<T: Eq + Hash + Clone> PartialEq for ToggleSet<T> {
    /// Set equality; insertion order is presentation only
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members
    }
}

impl<T: Eq + Hash + Clone> Eq for ToggleSet<T> {}

impl<T: Eq + Hash + Clone> ToggleSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set holding exactly one member
    pub fn singleton(item: T) -> Self {
        let mut set = Self::new();
        set.insert(item);
        set
    }

    /// Flip membership of `item`. Returns true if it is a member afterwards.
    pub fn toggle(&mut self, item: T) -> bool {
        if self.members.remove(&item) {
            self.order.retain(|existing| existing != &item);
            false
        } else {
            self.insert(item);
            true
        }
    }

    /// Non-mutating toggle: the set as it would be after toggling `item`
    pub fn toggled(&self, item: T) -> Self {
        let mut next = self.clone();
        next.toggle(item);
        next
    }

    /// Add `item` if absent. Returns true if it was added.
    pub fn insert(&mut self, item: T) -> bool {
        if self.members.insert(item.clone()) {
            self.order.push(item);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, item: &T) -> bool {
        self.members.contains(item)
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Members in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.order.iter()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.order.clone()
    }
}

impl<T: Eq + Hash + Clone> FromIterator<T> for ToggleSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for item in iter {
            set.insert(item);
        }
        set
    }
}
