// Tab switcher state.
// Keeps exactly one panel visible and exactly one selector active.

/// Mutually exclusive panel set with one active entry.
///
/// Visibility and selector state are both derived from a single active
/// index, so switching is O(1) and the one-visible invariant cannot break.
#[derive(Debug, Clone)]
pub struct TabSwitcher<K> {
    panels: Vec<K>,
    active: usize,
}

impl<K: Copy + PartialEq> TabSwitcher<K> {
    /// Build a switcher with the first selector activated.
    /// Returns `None` for an empty panel set.
    pub fn new(panels: Vec<K>) -> Option<Self> {
        if panels.is_empty() {
            return None;
        }
        Some(Self { panels, active: 0 })
    }

    /// Activate the panel with the given identifier.
    /// Unknown identifiers leave the current state untouched.
    pub fn activate(&mut self, target: K) -> bool {
        match self.panels.iter().position(|p| *p == target) {
            Some(index) => {
                self.active = index;
                true
            }
            None => false,
        }
    }

    /// Activate by zero-based selector position.
    pub fn activate_index(&mut self, index: usize) -> bool {
        if index < self.panels.len() {
            self.active = index;
            true
        } else {
            false
        }
    }

    pub fn next(&mut self) {
        self.active = (self.active + 1) % self.panels.len();
    }

    pub fn prev(&mut self) {
        self.active = (self.active + self.panels.len() - 1) % self.panels.len();
    }

    /// Identifier of the visible panel.
    pub fn active(&self) -> K {
        self.panels[self.active]
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn is_visible(&self, panel: K) -> bool {
        self.active() == panel
    }

    /// Whether the selector at `index` carries the active flag.
    pub fn is_selector_active(&self, index: usize) -> bool {
        index == self.active
    }

    pub fn panels(&self) -> &[K] {
        &self.panels
    }
}
