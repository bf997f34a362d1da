//! Drop intents and the index translator.
//!
//! The grid shows links and folders as two separate lists, but the store keeps
//! one mixed sibling array and its move call takes an index into that array.
//! Everything here works on the mixed array.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::models::{BookmarkNode, NodeKind};

/// Share of a folder card's width, on each side, that still means
/// "reorder past" rather than "drop into".
const FOLDER_EDGE_ZONE: f64 = 0.3;

/// What dropping on a target means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropIntent {
    Before,
    After,
    /// Reparent into the target folder (folder targets only).
    Into,
}

impl DropIntent {
    /// Resolve the intent from the pointer's horizontal offset inside the
    /// target card.
    ///
    /// Links split at the midpoint. Folders split 30/40/30 into
    /// before/into/after.
    #[must_use]
    pub fn from_pointer(target: NodeKind, offset_x: f64, width: f64) -> Self {
        let fraction = if width > 0.0 { offset_x / width } else { 0.0 };
        match target {
            NodeKind::Link => {
                if fraction < 0.5 {
                    Self::Before
                } else {
                    Self::After
                }
            }
            NodeKind::Folder => {
                if fraction < FOLDER_EDGE_ZONE {
                    Self::Before
                } else if fraction < 1.0 - FOLDER_EDGE_ZONE {
                    Self::Into
                } else {
                    Self::After
                }
            }
        }
    }

    /// Whether this intent may be used against a target of the given kind.
    #[must_use]
    pub fn allowed_on(self, target: NodeKind) -> bool {
        self != Self::Into || target == NodeKind::Folder
    }
}

impl fmt::Display for DropIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => write!(f, "before"),
            Self::After => write!(f, "after"),
            Self::Into => write!(f, "into"),
        }
    }
}

impl FromStr for DropIntent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "before" => Ok(Self::Before),
            "after" => Ok(Self::After),
            "into" => Ok(Self::Into),
            _ => Err(format!("Unknown drop intent: {s}. Use: before, after, into")),
        }
    }
}

/// Where the store should put the dragged node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Move within the same parent to this index of the mixed sibling array.
    At(usize),
    /// Move under the given folder, appended at the end.
    Into(String),
}

/// Minimal view of a sibling: just what the translator needs.
pub trait Sibling {
    fn sibling_id(&self) -> &str;
    fn sibling_kind(&self) -> NodeKind;
}

impl Sibling for BookmarkNode {
    fn sibling_id(&self) -> &str {
        &self.id
    }

    fn sibling_kind(&self) -> NodeKind {
        self.kind()
    }
}

impl Sibling for (&str, NodeKind) {
    fn sibling_id(&self) -> &str {
        self.0
    }

    fn sibling_kind(&self) -> NodeKind {
        self.1
    }
}

/// Compute the move for dropping `source_id` on `target_id`.
///
/// Returns `None` (nothing to do) when source and target are the same node,
/// when either is missing from `siblings` (the caller's snapshot is stale),
/// or when `Into` is used on a link.
///
/// The store's move removes the source before inserting, so an insertion
/// point after the source shifts down by one.
#[must_use]
pub fn translate_drop<S: Sibling>(
    siblings: &[S],
    source_id: &str,
    target_id: &str,
    intent: DropIntent,
) -> Option<Placement> {
    if source_id == target_id {
        return None;
    }

    let target_idx = siblings.iter().position(|s| s.sibling_id() == target_id)?;
    let source_idx = siblings.iter().position(|s| s.sibling_id() == source_id)?;

    match intent {
        DropIntent::Into => {
            let target = &siblings[target_idx];
            (target.sibling_kind() == NodeKind::Folder)
                .then(|| Placement::Into(target.sibling_id().to_string()))
        }
        DropIntent::Before | DropIntent::After => {
            let mut index = if intent == DropIntent::Before {
                target_idx
            } else {
                target_idx + 1
            };
            if source_idx < index {
                index -= 1;
            }
            Some(Placement::At(index))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use NodeKind::{Folder, Link};

    /// Apply a placement the way the store does: remove, then insert.
    fn apply<'a>(
        siblings: &[(&'a str, NodeKind)],
        source: &str,
        placement: &Placement,
    ) -> Vec<(&'a str, NodeKind)> {
        let mut out = siblings.to_vec();
        let from = out.iter().position(|s| s.0 == source).unwrap();
        let moved = out.remove(from);
        match placement {
            Placement::At(index) => out.insert(*index, moved),
            Placement::Into(_) => {}
        }
        out
    }

    fn ids<'a>(siblings: &[(&'a str, NodeKind)]) -> Vec<&'a str> {
        siblings.iter().map(|s| s.0).collect()
    }

    fn of_kind<'a>(siblings: &[(&'a str, NodeKind)], kind: NodeKind) -> Vec<&'a str> {
        siblings.iter().filter(|s| s.1 == kind).map(|s| s.0).collect()
    }

    #[test]
    fn test_drag_link_before_first() {
        let siblings = [("A", Link), ("B", Folder), ("C", Link)];
        let placement = translate_drop(&siblings, "C", "A", DropIntent::Before).unwrap();

        assert_eq!(placement, Placement::At(0));
        assert_eq!(ids(&apply(&siblings, "C", &placement)), ["C", "A", "B"]);
    }

    #[test]
    fn test_drag_folder_after_last() {
        let siblings = [("B", Folder), ("A", Link), ("C", Link)];
        let placement = translate_drop(&siblings, "B", "C", DropIntent::After).unwrap();

        assert_eq!(placement, Placement::At(2));
        assert_eq!(ids(&apply(&siblings, "B", &placement)), ["A", "C", "B"]);
    }

    #[test]
    fn test_drag_right_across_interleaved_folder() {
        // Links: L1 L2 L3, visually drag L1 after L3.
        let siblings = [("L1", Link), ("F1", Folder), ("L2", Link), ("L3", Link)];
        let placement = translate_drop(&siblings, "L1", "L3", DropIntent::After).unwrap();
        let result = apply(&siblings, "L1", &placement);

        assert_eq!(of_kind(&result, Link), ["L2", "L3", "L1"]);
        assert_eq!(of_kind(&result, Folder), ["F1"]);
    }

    #[test]
    fn test_drag_left_across_interleaved_folder() {
        let siblings = [("L1", Link), ("F1", Folder), ("L2", Link), ("L3", Link)];
        let placement = translate_drop(&siblings, "L3", "L1", DropIntent::After).unwrap();
        let result = apply(&siblings, "L3", &placement);

        assert_eq!(of_kind(&result, Link), ["L1", "L3", "L2"]);
        assert_eq!(ids(&result), ["L1", "L3", "F1", "L2"]);
    }

    #[test]
    fn test_adjacent_pairs_in_both_directions() {
        let siblings = [("A", Link), ("B", Link)];

        // Already in place: the move is a no-op reorder.
        let p = translate_drop(&siblings, "A", "B", DropIntent::Before).unwrap();
        assert_eq!(p, Placement::At(0));
        assert_eq!(ids(&apply(&siblings, "A", &p)), ["A", "B"]);

        let p = translate_drop(&siblings, "A", "B", DropIntent::After).unwrap();
        assert_eq!(p, Placement::At(1));
        assert_eq!(ids(&apply(&siblings, "A", &p)), ["B", "A"]);

        let p = translate_drop(&siblings, "B", "A", DropIntent::Before).unwrap();
        assert_eq!(p, Placement::At(0));
        assert_eq!(ids(&apply(&siblings, "B", &p)), ["B", "A"]);

        let p = translate_drop(&siblings, "B", "A", DropIntent::After).unwrap();
        assert_eq!(p, Placement::At(1));
        assert_eq!(ids(&apply(&siblings, "B", &p)), ["A", "B"]);
    }

    #[test]
    fn test_every_before_after_drop_lands_next_to_target() {
        let siblings = [
            ("a", Link),
            ("F", Folder),
            ("b", Link),
            ("G", Folder),
            ("c", Link),
        ];
        for (source, _) in siblings {
            for (target, _) in siblings {
                if source == target {
                    continue;
                }
                for intent in [DropIntent::Before, DropIntent::After] {
                    let p = translate_drop(&siblings, source, target, intent).unwrap();
                    let result = ids(&apply(&siblings, source, &p));
                    let s = result.iter().position(|id| *id == source).unwrap();
                    let t = result.iter().position(|id| *id == target).unwrap();
                    match intent {
                        DropIntent::Before => assert_eq!(s + 1, t, "{source} before {target}"),
                        _ => assert_eq!(t + 1, s, "{source} after {target}"),
                    }
                }
            }
        }
    }

    #[test]
    fn test_into_reparents_without_index() {
        let siblings = [("A", Link), ("B", Folder)];
        assert_eq!(
            translate_drop(&siblings, "A", "B", DropIntent::Into),
            Some(Placement::Into("B".into()))
        );
        assert_eq!(translate_drop(&siblings, "B", "A", DropIntent::Into), None);
    }

    #[test]
    fn test_rejects_self_and_stale_targets() {
        let siblings = [("A", Link), ("B", Link)];
        assert_eq!(translate_drop(&siblings, "A", "A", DropIntent::After), None);
        assert_eq!(translate_drop(&siblings, "A", "Z", DropIntent::Before), None);
        assert_eq!(translate_drop(&siblings, "Z", "A", DropIntent::Before), None);
    }

    #[test]
    fn test_pointer_zones() {
        assert_eq!(DropIntent::from_pointer(Link, 49.0, 100.0), DropIntent::Before);
        assert_eq!(DropIntent::from_pointer(Link, 50.0, 100.0), DropIntent::After);

        assert_eq!(DropIntent::from_pointer(Folder, 29.0, 100.0), DropIntent::Before);
        assert_eq!(DropIntent::from_pointer(Folder, 30.0, 100.0), DropIntent::Into);
        assert_eq!(DropIntent::from_pointer(Folder, 69.0, 100.0), DropIntent::Into);
        assert_eq!(DropIntent::from_pointer(Folder, 70.0, 100.0), DropIntent::After);

        assert_eq!(DropIntent::from_pointer(Folder, 10.0, 0.0), DropIntent::Before);
    }

    #[test]
    fn test_intent_from_str() {
        assert_eq!("Before".parse::<DropIntent>(), Ok(DropIntent::Before));
        assert_eq!("into".parse::<DropIntent>(), Ok(DropIntent::Into));
        assert!("sideways".parse::<DropIntent>().is_err());
        assert!(!DropIntent::Into.allowed_on(Link));
        assert!(DropIntent::After.allowed_on(Link));
    }
}
