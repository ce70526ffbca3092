//! An insertion-ordered set with constant-time membership checks.
//!
//! [`OrderedSet`] keeps the first occurrence of every value and remembers
//! the order values were first seen in. Re-inserting an existing value is a
//! no-op, so iteration order never changes once an element is present.
//!
//! # Complexity
//! - `insert`, `contains`, `len` and `is_empty` are **O(1)** on average.
//! - Values are stored twice (vector plus hash index), so `T: Clone`.

use std::collections::HashSet;
use std::hash::Hash;

/// A set that iterates in first-insertion order.
///
/// # Examples
///
/// ```rust
/// use restcollector_common::collections::OrderedSet;
///
/// let mut keys = OrderedSet::new();
/// assert!(keys.insert(3));
/// assert!(keys.insert(4));
/// assert!(!keys.insert(3));
///
/// assert_eq!(keys.as_slice(), &[3, 4]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderedSet<T>
where
    T: Eq + Hash,
{
    items: Vec<T>,
    index: HashSet<T>,
}

impl<T> Default for OrderedSet<T>
where
    T: Eq + Hash,
{
    fn default() -> Self {
        Self { items: Vec::new(), index: HashSet::new() }
    }
}

impl<T> OrderedSet<T>
where
    T: Eq + Hash + Clone,
{
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` if absent. Returns `true` when the value was new.
    pub fn insert(&mut self, value: T) -> bool {
        if self.index.contains(&value) {
            return false;
        }
        self.index.insert(value.clone());
        self.items.push(value);
        true
    }

    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.index.contains(value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Values in first-insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> FromIterator<T> for OrderedSet<T>
where
    T: Eq + Hash + Clone,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = OrderedSet::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl<T> Extend<T> for OrderedSet<T>
where
    T: Eq + Hash + Clone,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<'a, T> IntoIterator for &'a OrderedSet<T>
where
    T: Eq + Hash + Clone,
{
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
