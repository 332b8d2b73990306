use std::collections::BTreeSet;

use tracing::debug;

/// Ids the operator has ticked on the visible page.
///
/// `all_visible` is derived: it is true only when the set is exactly the
/// visible ids, and never for an empty page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<String>,
    all_visible: bool,
}

impl Selection {
    /// Flip membership of `id`. Ids that are not on the visible page are
    /// ignored. Returns whether anything changed.
    pub fn toggle(&mut self, id: &str, visible: &[&str]) -> bool {
        if !visible.contains(&id) {
            debug!(id, "ignoring toggle for a record that is not visible");
            return false;
        }
        if !self.ids.remove(id) {
            self.ids.insert(id.to_string());
        }
        self.reconcile(visible);
        true
    }

    /// Select exactly the visible page. This never reaches rows on other
    /// pages of the filtered set.
    pub fn select_all_visible(&mut self, visible: &[&str]) {
        self.ids = visible.iter().map(|id| id.to_string()).collect();
        self.reconcile(visible);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.all_visible = false;
    }

    /// Drop ids that are no longer visible and recompute the flag.
    pub fn retain_visible(&mut self, visible: &[&str]) {
        self.ids.retain(|id| visible.contains(&id.as_str()));
        self.reconcile(visible);
    }

    fn reconcile(&mut self, visible: &[&str]) {
        let visible: BTreeSet<&str> = visible.iter().copied().collect();
        self.all_visible = !visible.is_empty()
            && self.ids.len() == visible.len()
            && self.ids.iter().all(|id| visible.contains(id.as_str()));
    }

    pub fn is_all_visible(&self) -> bool {
        self.all_visible
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids in sorted order.
    pub fn ids(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }
}
