//! Bubble path computation.
//!
//! [`bubble_path`] computes the traversal order from an element up to the
//! tree root; [`crate::window::Window::bubble_event`] offers the event along
//! it until a handler consumes it.

use crate::dom::node::ElementId;
use crate::dom::tree::Tree;

/// Compute the bubble path from `start` up to the root (inclusive).
///
/// Returns `[start, parent, grandparent, ..., root]`.
/// If `start` does not exist in the tree, returns an empty vec.
pub fn bubble_path(tree: &Tree, start: ElementId) -> Vec<ElementId> {
    if !tree.contains(start) {
        return Vec::new();
    }
    let mut path = vec![start];
    path.extend(tree.ancestors(start));
    path
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::node::ElementData;
    use crate::dom::tree::AddPosition;
    use crate::element::Base;

    /// Build a small test tree:
    /// ```text
    ///       root
    ///      /    \
    ///    a        b
    ///   /
    ///  c
    /// ```
    fn build_tree() -> (Tree, ElementId, ElementId, ElementId, ElementId) {
        let mut tree = Tree::new();
        let root = tree.insert(ElementData::new(), Box::new(Base));
        let child = |tree: &mut Tree, parent| {
            tree.insert_child(parent, ElementData::new(), Box::new(Base), AddPosition::Tail)
                .unwrap()
        };
        let a = child(&mut tree, root);
        let b = child(&mut tree, root);
        let c = child(&mut tree, a);
        (tree, root, a, b, c)
    }

    #[test]
    fn bubble_path_from_leaf() {
        let (tree, root, a, _, c) = build_tree();
        assert_eq!(bubble_path(&tree, c), vec![c, a, root]);
    }

    #[test]
    fn bubble_path_from_root() {
        let (tree, root, ..) = build_tree();
        assert_eq!(bubble_path(&tree, root), vec![root]);
    }

    #[test]
    fn bubble_path_sibling() {
        let (tree, root, _, b, _) = build_tree();
        assert_eq!(bubble_path(&tree, b), vec![b, root]);
    }

    #[test]
    fn bubble_path_nonexistent_element() {
        let (mut tree, ..) = build_tree();
        let stale = tree.insert(ElementData::new(), Box::new(Base));
        tree.remove(stale);
        assert!(bubble_path(&tree, stale).is_empty());
    }
}
