//! Back-button integration for overlays.
//!
//! Opening an overlay pushes one synthetic entry so a system "back" closes
//! the overlay instead of leaving the page. Closing through UI controls
//! reconciles (replaces) that entry. Hosts without a navigable history use
//! [`NoHistory`].

/// Overlay that owns a pushed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayEntry {
    Gallery,
    Fullscreen,
}

pub trait DismissalStack {
    /// An overlay opened; record a synthetic entry for it.
    fn push(&mut self, entry: OverlayEntry);

    /// The overlay closed through UI controls; neutralize its entry so a
    /// later back action performs a real navigation.
    fn reconcile(&mut self, entry: OverlayEntry);
}

/// For hosts without a history stack.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHistory;

impl DismissalStack for NoHistory {
    fn push(&mut self, _entry: OverlayEntry) {}

    fn reconcile(&mut self, _entry: OverlayEntry) {}
}

/// One entry of an in-memory history stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryEntry {
    Page,
    Overlay(OverlayEntry),
}

/// Browser-like history kept in memory. Useful for hosts that own their own
/// navigation stack and for inspecting overlay bookkeeping.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<HistoryEntry>,
    pushes: usize,
    reconciles: usize,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self {
            entries: vec![HistoryEntry::Page],
            pushes: 0,
            reconciles: 0,
        }
    }

    /// Pops the top entry, as a system back action would.
    pub fn back(&mut self) -> Option<HistoryEntry> {
        if self.entries.len() <= 1 {
            return None;
        }
        self.entries.pop()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn overlay_entries(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, HistoryEntry::Overlay(_)))
            .count()
    }

    pub fn pushes(&self) -> usize {
        self.pushes
    }

    pub fn reconciles(&self) -> usize {
        self.reconciles
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl DismissalStack for MemoryHistory {
    fn push(&mut self, entry: OverlayEntry) {
        self.pushes += 1;
        self.entries.push(HistoryEntry::Overlay(entry));
    }

    /// Neutralizes the topmost entry pushed for `entry`. A nested overlay
    /// closed earlier may sit above it as a plain page.
    fn reconcile(&mut self, entry: OverlayEntry) {
        self.reconciles += 1;
        let target = HistoryEntry::Overlay(entry);
        if let Some(slot) = self.entries.iter_mut().rev().find(|e| **e == target) {
            *slot = HistoryEntry::Page;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_back() {
        let mut history = MemoryHistory::new();
        history.push(OverlayEntry::Gallery);
        history.push(OverlayEntry::Fullscreen);
        assert_eq!(history.overlay_entries(), 2);

        assert_eq!(
            history.back(),
            Some(HistoryEntry::Overlay(OverlayEntry::Fullscreen))
        );
        assert_eq!(
            history.back(),
            Some(HistoryEntry::Overlay(OverlayEntry::Gallery))
        );
        assert_eq!(history.back(), None);
    }

    #[test]
    fn test_reconcile_ignores_other_overlays() {
        let mut history = MemoryHistory::new();
        history.push(OverlayEntry::Gallery);
        history.reconcile(OverlayEntry::Fullscreen);
        assert_eq!(history.overlay_entries(), 1);

        history.reconcile(OverlayEntry::Gallery);
        assert_eq!(history.overlay_entries(), 0);
        assert_eq!(history.entries(), &[HistoryEntry::Page, HistoryEntry::Page]);
        assert_eq!(history.reconciles(), 2);
    }

    #[test]
    fn test_reconcile_reaches_below_closed_nested_overlay() {
        let mut history = MemoryHistory::new();
        history.push(OverlayEntry::Gallery);
        history.push(OverlayEntry::Fullscreen);

        history.reconcile(OverlayEntry::Fullscreen);
        assert_eq!(
            history.entries(),
            &[
                HistoryEntry::Page,
                HistoryEntry::Overlay(OverlayEntry::Gallery),
                HistoryEntry::Page
            ]
        );

        history.reconcile(OverlayEntry::Gallery);
        assert_eq!(history.overlay_entries(), 0);
    }
}
