use crate::model::ProjectDraft;

/// An immutable copy of a project taken right after a successful load, used
/// only for change detection. A new load replaces it; leaving the session
/// discards it.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot(ProjectDraft);

impl Snapshot {
    pub fn capture(draft: &ProjectDraft) -> Self {
        Self(draft.clone())
    }

    /// Structural equality over the whole project graph. List order is
    /// significant, so reordering schema fields or rules counts as a change.
    pub fn matches(&self, current: &ProjectDraft) -> bool {
        &self.0 == current
    }
}
