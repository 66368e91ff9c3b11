use std::{fmt, marker::PhantomData};

/// Index into an [`Assets`] store.
pub struct Handle<T> {
    pub idx: usize,
    _p: PhantomData<T>,
}

/// Append-only store of CPU-side assets shared by handle.
pub struct Assets<T> {
    items: Vec<T>,
}

impl<T> Assets<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, item: T) -> Handle<T> {
        self.items.push(item);
        Handle {
            idx: self.items.len() - 1,
            _p: PhantomData,
        }
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.items.get(handle.idx)
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.items.get_mut(handle.idx)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Clone> Assets<T> {
    /// Stores a copy of the asset behind `handle`.
    pub fn duplicate(&mut self, handle: Handle<T>) -> Option<Handle<T>> {
        let item = self.get(handle)?.clone();
        Some(self.push(item))
    }
}

impl<T> Default for Assets<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Copy for Handle<T> {}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.idx == other.idx
    }
}

impl<T> Eq for Handle<T> {}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&self.idx).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_resolve_in_push_order() {
        let mut assets = Assets::new();
        let a = assets.push("a");
        let b = assets.push("b");

        assert_eq!(assets.get(a), Some(&"a"));
        assert_eq!(assets.get(b), Some(&"b"));
        assert_eq!(assets.len(), 2);
    }

    #[test]
    fn duplicate_is_independent() {
        let mut assets = Assets::new();
        let original = assets.push(vec![1]);
        let copy = assets.duplicate(original).unwrap();

        assets.get_mut(copy).unwrap().push(2);
        assert_eq!(assets.get(original), Some(&vec![1]));
        assert_eq!(assets.get(copy), Some(&vec![1, 2]));
    }
}
