//! Position lookup shared by every level of the hierarchy
//!
//! Nodes only know where they start. A node ends where its next sibling
//! starts, or at the end of its parent for the last sibling. Lookups work on
//! the list of sibling starts plus the parent's end.

use crate::Result;
use text_store::{MarkId, Position, TextStore};

/// Anything that occupies a contiguous span of a text store
pub trait Span {
    /// Where the node currently starts
    fn start<S: TextStore>(&self, store: &S) -> Result<Position>;
}

/// Current starts of a list of sibling nodes
pub fn starts<T: Span, S: TextStore>(nodes: &[T], store: &S) -> Result<Vec<Position>> {
    nodes.iter().map(|node| node.start(store)).collect()
}

/// Index of the node containing `position`.
///
/// A position on a boundary belongs to the node starting there. Returns
/// `None` when there are no nodes or `position` lies before the first one.
pub fn exact_index(starts: &[Position], position: Position) -> Option<usize> {
    starts
        .partition_point(|start| *start <= position)
        .checked_sub(1)
}

/// Index of the sibling gap closest to `position`.
///
/// Gap `i` is the boundary before node `i`; gap `starts.len()` is the
/// parent's end. Within the containing node the nearer boundary wins and an
/// exact tie goes to the left one.
pub fn best_gap(starts: &[Position], end: Position, position: Position) -> usize {
    let Some(index) = exact_index(starts, position) else {
        return 0;
    };
    let node_end = starts.get(index + 1).copied().unwrap_or(end);
    let left = position.offset().saturating_sub(starts[index].offset());
    let right = node_end.offset().saturating_sub(position.offset());
    if left > right {
        index + 1
    } else {
        index
    }
}

/// Number of nodes that start strictly before `position`; the index a new
/// node inserted at `position` takes among its siblings
pub fn insertion_index(starts: &[Position], position: Position) -> usize {
    starts.partition_point(|start| *start < position)
}

/// End of every node, given the parent's end
pub fn ends(starts: &[Position], end: Position) -> Vec<Position> {
    starts
        .iter()
        .skip(1)
        .copied()
        .chain(std::iter::once(end))
        .collect()
}

/// Push marks forward after text was inserted in front of them
pub fn shift_marks<S: TextStore>(store: &mut S, marks: &[MarkId], by: usize) -> Result<()> {
    if by == 0 {
        return Ok(());
    }
    for mark in marks {
        let position = store.mark_position(*mark)?;
        store.move_mark(*mark, position.forward(by))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn positions(offsets: &[usize]) -> Vec<Position> {
        offsets.iter().copied().map(Position::new).collect()
    }

    #[test]
    fn test_exact_index_ties_go_to_following_node() {
        let starts = positions(&[0, 5, 9]);
        assert_eq!(exact_index(&starts, Position::new(0)), Some(0));
        assert_eq!(exact_index(&starts, Position::new(4)), Some(0));
        assert_eq!(exact_index(&starts, Position::new(5)), Some(1));
        assert_eq!(exact_index(&starts, Position::new(30)), Some(2));
        assert_eq!(exact_index(&positions(&[3]), Position::new(1)), None);
        assert_eq!(exact_index(&[], Position::new(1)), None);
    }

    #[test]
    fn test_best_gap_prefers_nearer_boundary() {
        let starts = positions(&[0, 10]);
        let end = Position::new(20);
        assert_eq!(best_gap(&starts, end, Position::new(2)), 0);
        assert_eq!(best_gap(&starts, end, Position::new(8)), 1);
        assert_eq!(best_gap(&starts, end, Position::new(16)), 2);
    }

    #[test]
    fn test_best_gap_tie_goes_left() {
        let starts = positions(&[0, 10]);
        assert_eq!(best_gap(&starts, Position::new(20), Position::new(5)), 0);
        assert_eq!(best_gap(&starts, Position::new(20), Position::new(15)), 1);
    }

    #[test]
    fn test_insertion_index_and_ends() {
        let starts = positions(&[0, 4, 8]);
        assert_eq!(insertion_index(&starts, Position::new(4)), 1);
        assert_eq!(insertion_index(&starts, Position::new(5)), 2);
        assert_eq!(ends(&starts, Position::new(12)), positions(&[4, 8, 12]));
    }

    proptest! {
        #[test]
        fn prop_best_gap_is_a_neighbour_of_exact_index(
            offsets in prop::collection::btree_set(0usize..200, 1..12),
            extra in 1usize..20,
            probe in 0usize..240,
        ) {
            let starts: Vec<Position> = offsets.into_iter().map(Position::new).collect();
            let end = Position::new(starts[starts.len() - 1].offset() + extra);
            let probe = Position::new(probe.min(end.offset()));
            let gap = best_gap(&starts, end, probe);
            match exact_index(&starts, probe) {
                Some(index) => prop_assert!(gap == index || gap == index + 1),
                None => prop_assert_eq!(gap, 0),
            }
            prop_assert!(gap <= starts.len());
        }
    }
}
