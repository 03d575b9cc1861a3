//! Selection set over import candidates

use crate::models::ImportCandidate;
use rk_common::events::CandidateRef;
use std::collections::HashSet;

/// Ordered candidate list with per-item `selected` flags
///
/// The selected count is always derived from the list, never cached.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    candidates: Vec<ImportCandidate>,
}

impl SelectionSet {
    pub fn new(candidates: Vec<ImportCandidate>) -> Self {
        Self { candidates }
    }

    pub fn candidates(&self) -> &[ImportCandidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Flip `selected` for the candidate at `index`
    ///
    /// Returns `false` (and changes nothing) when `index` is out of range.
    pub fn toggle(&mut self, index: usize) -> bool {
        match self.candidates.get_mut(index) {
            Some(candidate) => {
                candidate.selected = !candidate.selected;
                true
            }
            None => false,
        }
    }

    /// Select all, or deselect all when everything is already selected
    pub fn toggle_all(&mut self) {
        let select = !self.all_selected();
        for candidate in &mut self.candidates {
            candidate.selected = select;
        }
    }

    /// True when the set is non-empty and every candidate is selected
    pub fn all_selected(&self) -> bool {
        !self.candidates.is_empty() && self.candidates.iter().all(|c| c.selected)
    }

    /// Set `selected` to `predicate(candidate)` for every candidate
    pub fn select_where<F>(&mut self, mut predicate: F)
    where
        F: FnMut(&ImportCandidate) -> bool,
    {
        for candidate in &mut self.candidates {
            candidate.selected = predicate(candidate);
        }
    }

    pub fn selected_count(&self) -> usize {
        self.candidates.iter().filter(|c| c.selected).count()
    }

    /// Selected candidates in list order
    pub fn selected(&self) -> impl Iterator<Item = &ImportCandidate> {
        self.candidates.iter().filter(|c| c.selected)
    }

    /// Remove every candidate referenced in `refs`; returns how many went
    pub fn prune(&mut self, refs: &HashSet<CandidateRef>) -> usize {
        let before = self.candidates.len();
        self.candidates.retain(|c| !refs.contains(&c.to_ref()));
        before - self.candidates.len()
    }

    pub fn into_candidates(self) -> Vec<ImportCandidate> {
        self.candidates
    }
}

impl FromIterator<ImportCandidate> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = ImportCandidate>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
