//! Drag gesture state machine.
//!
//! `Idle -> Dragging -> Hovering -> (drop | cancel) -> Idle`. Every gesture
//! gets a fresh id; events carrying any other id are ignored, so a gesture
//! that was superseded can never act on the new one.

use super::models::NodeKind;
use super::reorder::DropIntent;

/// Identifies one drag gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GestureId(u64);

/// The node being dragged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSource {
    pub id: String,
    pub kind: NodeKind,
}

/// The node currently under the pointer and what dropping would mean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTarget {
    pub id: String,
    pub kind: NodeKind,
    pub intent: DropIntent,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Dragging {
        gesture: GestureId,
        source: DragSource,
    },
    Hovering {
        gesture: GestureId,
        source: DragSource,
        target: DropTarget,
    },
}

impl GestureState {
    #[must_use]
    pub const fn gesture(&self) -> Option<GestureId> {
        match self {
            Self::Idle => None,
            Self::Dragging { gesture, .. } | Self::Hovering { gesture, .. } => Some(*gesture),
        }
    }

    #[must_use]
    pub const fn source(&self) -> Option<&DragSource> {
        match self {
            Self::Idle => None,
            Self::Dragging { source, .. } | Self::Hovering { source, .. } => Some(source),
        }
    }

    #[must_use]
    pub const fn target(&self) -> Option<&DropTarget> {
        match self {
            Self::Hovering { target, .. } => Some(target),
            _ => None,
        }
    }
}

/// What a drop released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Release {
    /// Pointer was over a valid target.
    Drop { source: DragSource, target: DropTarget },
    /// Nothing valid under the pointer.
    Cancelled,
}

/// Owns the current gesture and applies events to it.
#[derive(Debug, Default)]
pub struct GestureTracker {
    state: GestureState,
    next_id: u64,
}

impl GestureTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> &GestureState {
        &self.state
    }

    /// Start a gesture. Any gesture still in progress is discarded.
    pub fn start(&mut self, id: impl Into<String>, kind: NodeKind) -> GestureId {
        if let Some(stale) = self.state.gesture() {
            tracing::debug!(?stale, "Discarding unfinished drag gesture");
        }
        self.next_id += 1;
        let gesture = GestureId(self.next_id);
        self.state = GestureState::Dragging {
            gesture,
            source: DragSource {
                id: id.into(),
                kind,
            },
        };
        gesture
    }

    /// Track the target under the pointer.
    ///
    /// Returns whether the target was accepted. Hovering over the source
    /// itself or asking to drop into a link falls back to plain dragging.
    pub fn hover(
        &mut self,
        gesture: GestureId,
        target_id: &str,
        target_kind: NodeKind,
        intent: DropIntent,
    ) -> bool {
        if self.state.gesture() != Some(gesture) {
            return false;
        }
        let Some(source) = self.state.source().cloned() else {
            return false;
        };

        if source.id == target_id || !intent.allowed_on(target_kind) {
            self.state = GestureState::Dragging { gesture, source };
            return false;
        }

        // Same target and intent: nothing changes.
        if let Some(current) = self.state.target() {
            if current.id == target_id && current.intent == intent {
                return true;
            }
        }

        self.state = GestureState::Hovering {
            gesture,
            source,
            target: DropTarget {
                id: target_id.to_string(),
                kind: target_kind,
                intent,
            },
        };
        true
    }

    /// The pointer left `target_id`; forget it if it is the tracked target.
    pub fn leave(&mut self, gesture: GestureId, target_id: &str) {
        if self.state.gesture() != Some(gesture) {
            return;
        }
        if self.state.target().is_some_and(|t| t.id == target_id) {
            if let GestureState::Hovering { source, .. } = std::mem::take(&mut self.state) {
                self.state = GestureState::Dragging { gesture, source };
            }
        }
    }

    /// Abort the gesture.
    pub fn cancel(&mut self, gesture: GestureId) {
        if self.state.gesture() == Some(gesture) {
            self.state = GestureState::Idle;
        }
    }

    /// Finish the gesture and return to idle.
    ///
    /// Returns `None` for a stale gesture id (the current gesture, if any,
    /// is left untouched).
    pub fn release(&mut self, gesture: GestureId) -> Option<Release> {
        if self.state.gesture() != Some(gesture) {
            return None;
        }
        match std::mem::take(&mut self.state) {
            GestureState::Hovering { source, target, .. } => Some(Release::Drop { source, target }),
            _ => Some(Release::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_gesture() {
        let mut tracker = GestureTracker::new();
        let g = tracker.start("a", NodeKind::Link);
        assert!(matches!(tracker.state(), GestureState::Dragging { .. }));

        assert!(tracker.hover(g, "b", NodeKind::Link, DropIntent::After));
        assert_eq!(tracker.state().target().map(|t| t.intent), Some(DropIntent::After));

        let release = tracker.release(g).unwrap();
        assert_eq!(
            release,
            Release::Drop {
                source: DragSource { id: "a".into(), kind: NodeKind::Link },
                target: DropTarget {
                    id: "b".into(),
                    kind: NodeKind::Link,
                    intent: DropIntent::After,
                },
            }
        );
        assert_eq!(tracker.state(), &GestureState::Idle);
    }

    #[test]
    fn test_release_without_target_is_cancel() {
        let mut tracker = GestureTracker::new();
        let g = tracker.start("a", NodeKind::Link);
        tracker.hover(g, "b", NodeKind::Link, DropIntent::Before);
        tracker.leave(g, "b");

        assert_eq!(tracker.release(g), Some(Release::Cancelled));
        assert_eq!(tracker.state(), &GestureState::Idle);
    }

    #[test]
    fn test_rejects_self_and_into_link() {
        let mut tracker = GestureTracker::new();
        let g = tracker.start("a", NodeKind::Folder);

        assert!(!tracker.hover(g, "a", NodeKind::Folder, DropIntent::Into));
        assert!(!tracker.hover(g, "b", NodeKind::Link, DropIntent::Into));
        assert!(tracker.state().target().is_none());

        assert!(tracker.hover(g, "c", NodeKind::Folder, DropIntent::Into));
    }

    #[test]
    fn test_new_start_discards_stale_gesture() {
        let mut tracker = GestureTracker::new();
        let old = tracker.start("a", NodeKind::Link);
        tracker.hover(old, "b", NodeKind::Link, DropIntent::After);

        let new = tracker.start("c", NodeKind::Link);
        assert_ne!(old, new);

        assert!(!tracker.hover(old, "d", NodeKind::Link, DropIntent::After));
        assert_eq!(tracker.release(old), None);
        tracker.cancel(old);
        assert_eq!(tracker.state().source().map(|s| s.id.as_str()), Some("c"));
    }

    #[test]
    fn test_leave_other_target_keeps_hover() {
        let mut tracker = GestureTracker::new();
        let g = tracker.start("a", NodeKind::Link);
        tracker.hover(g, "b", NodeKind::Link, DropIntent::After);
        tracker.leave(g, "z");
        assert!(tracker.state().target().is_some());
    }
}
