//! Round-robin over the eligible list.

use crate::models::MediaRecord;

/// Eligible list, rotation index and the record on screen.
///
/// The index is not reset when the list is replaced; it is reduced modulo the
/// current length whenever it is read.
#[derive(Debug, Default)]
pub struct RotationState {
    eligible: Vec<MediaRecord>,
    index: usize,
    position: Option<usize>,
    current: Option<MediaRecord>,
}

impl RotationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a recomputed eligible list. The record on screen is untouched.
    pub fn replace_eligible(&mut self, eligible: Vec<MediaRecord>) {
        self.eligible = eligible;
    }

    /// Select the next record, or clear the current one if nothing is eligible.
    pub fn advance(&mut self) -> Option<&MediaRecord> {
        if self.eligible.is_empty() {
            self.current = None;
            self.position = None;
            return None;
        }

        let len = self.eligible.len();
        let at = self.index % len;
        self.current = Some(self.eligible[at].clone());
        self.position = Some(at);
        self.index = (at + 1) % len;
        self.current.as_ref()
    }

    /// Index of the next record to show.
    #[cfg(test)]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Where the current record sat in the eligible list when it was selected.
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    #[cfg(test)]
    pub fn current(&self) -> Option<&MediaRecord> {
        self.current.as_ref()
    }

    pub fn eligible(&self) -> &[MediaRecord] {
        &self.eligible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::record;
    use crate::models::{Folder, MediaKind};

    fn list(ids: &[&str]) -> Vec<MediaRecord> {
        ids.iter()
            .map(|id| record(id, MediaKind::Image, Folder::All))
            .collect()
    }

    #[test]
    fn test_n_advances_return_to_start() {
        for n in 1..=6 {
            let ids: Vec<String> = (0..n).map(|i| format!("m{}", i)).collect();
            let refs: Vec<&str> = ids.iter().map(String::as_str).collect();

            for offset in 0..n {
                let mut rotation = RotationState::new();
                rotation.replace_eligible(list(&refs));
                for _ in 0..offset {
                    rotation.advance();
                }
                let start = rotation.index();

                for _ in 0..n {
                    assert!(rotation.advance().is_some());
                }
                assert_eq!(rotation.index(), start, "n={} offset={}", n, offset);
            }
        }
    }

    #[test]
    fn test_empty_list_clears_current() {
        let mut rotation = RotationState::new();
        assert!(rotation.advance().is_none());

        rotation.replace_eligible(list(&["a"]));
        assert_eq!(rotation.advance().unwrap().id, "a");

        rotation.replace_eligible(Vec::new());
        assert!(rotation.advance().is_none());
        assert!(rotation.current().is_none());
        assert!(rotation.position().is_none());
    }

    #[test]
    fn test_replace_keeps_current_and_index() {
        let mut rotation = RotationState::new();
        rotation.replace_eligible(list(&["a", "b"]));
        assert_eq!(rotation.advance().unwrap().id, "a");
        assert_eq!(rotation.index(), 1);

        rotation.replace_eligible(list(&["c"]));
        assert_eq!(rotation.current().unwrap().id, "a");
        assert_eq!(rotation.index(), 1);

        // Index 1 wraps onto the single remaining record.
        assert_eq!(rotation.advance().unwrap().id, "c");
        assert_eq!(rotation.index(), 0);
    }

    #[test]
    fn test_shrunk_list_wraps_stale_index() {
        let mut rotation = RotationState::new();
        rotation.replace_eligible(list(&["a", "b", "c", "d"]));
        for _ in 0..3 {
            rotation.advance();
        }
        assert_eq!(rotation.index(), 3);

        rotation.replace_eligible(list(&["x", "y"]));
        assert_eq!(rotation.advance().unwrap().id, "y");
        assert_eq!(rotation.position(), Some(1));
        assert_eq!(rotation.advance().unwrap().id, "x");
    }
}
