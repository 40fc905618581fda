use std::ops::{Deref, DerefMut};

use super::{NodeId, Surface};

/// A change reported by an observing [`Surface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// A text node's value changed.
    Text { target: NodeId },
    /// Children were added to or removed from `target`.
    Children {
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
}

impl Mutation {
    pub fn target(&self) -> NodeId {
        match self {
            Mutation::Text { target } | Mutation::Children { target, .. } => *target,
        }
    }
}

/// Suspends mutation recording on a surface until dropped.
///
/// Observation goes back to whatever it was when the guard was taken, so
/// guards nest and every exit path resumes.
pub struct PauseGuard<'a> {
    surface: &'a mut Surface,
    was_observing: bool,
}

impl<'a> PauseGuard<'a> {
    pub(crate) fn new(surface: &'a mut Surface) -> Self {
        let was_observing = surface.observing;
        surface.observing = false;
        Self {
            surface,
            was_observing,
        }
    }
}

impl Deref for PauseGuard<'_> {
    type Target = Surface;

    fn deref(&self) -> &Surface {
        self.surface
    }
}

impl DerefMut for PauseGuard<'_> {
    fn deref_mut(&mut self) -> &mut Surface {
        self.surface
    }
}

impl Drop for PauseGuard<'_> {
    fn drop(&mut self) {
        self.surface.observing = self.was_observing;
    }
}
