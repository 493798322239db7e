use std::collections::HashSet;
use std::sync::Arc;

/// The set of file ids currently checked in the listing, in the order they
/// were checked.
///
/// A `SelectionSet` is immutable: [`toggle`](Self::toggle) and
/// [`retain_listed`](Self::retain_listed) return a new set and leave the
/// receiver untouched. Each new set owns a fresh allocation, so
/// [`ptr_eq`](Self::ptr_eq) tells a renderer whether anything changed
/// without comparing contents.
///
/// Cloning is cheap (one `Arc` bump); a clone taken when a batch starts is
/// the snapshot that batch works from. Equality compares membership only.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    ids: Arc<Vec<String>>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a set with `id` removed if present, appended otherwise.
    pub fn toggle(&self, id: &str) -> Self {
        let mut ids: Vec<String> = self.ids.iter().filter(|m| *m != id).cloned().collect();
        let selected = ids.len() == self.ids.len();
        if selected {
            ids.push(id.to_owned());
        }
        tracing::trace!(id, selected, "selection_toggled");
        Self { ids: Arc::new(ids) }
    }

    /// Returns an empty set.
    pub fn clear(&self) -> Self {
        Self::new()
    }

    /// Drops every member that does not appear in `listed`.
    pub fn retain_listed<'a>(&self, listed: impl IntoIterator<Item = &'a str>) -> Self {
        let listed: HashSet<&str> = listed.into_iter().collect();
        let ids: Vec<String> = self
            .ids
            .iter()
            .filter(|id| listed.contains(id.as_str()))
            .cloned()
            .collect();
        let pruned = self.ids.len() - ids.len();
        if pruned > 0 {
            tracing::debug!(pruned, "selection_pruned");
        }
        Self { ids: Arc::new(ids) }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|m| m == id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Members in the order they were checked.
    pub fn ids(&self) -> Vec<String> {
        self.ids.to_vec()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// True when both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.ids, &other.ids)
    }
}

impl PartialEq for SelectionSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|id| other.contains(id))
    }
}

impl Eq for SelectionSet {}

impl<S: Into<String>> FromIterator<S> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut ids: Vec<String> = Vec::new();
        for id in iter.into_iter().map(Into::into) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Self { ids: Arc::new(ids) }
    }
}
