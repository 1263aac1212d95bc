//! Tree operations: insert, remove, walk, behavior access.

use slotmap::{SecondaryMap, SlotMap};

use super::node::{ElementData, ElementId};
use crate::element::surface::SurfaceCache;
use crate::element::traits::Element;

/// Empty slice constant for returning when a node has no children.
const EMPTY_CHILDREN: &[ElementId] = &[];

/// Errors from element lookups and checked downcasts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("element {0:?} does not exist")]
    NotFound(ElementId),
    #[error("element {id:?} is a {found}, not a {expected}")]
    TypeMismatch {
        id: ElementId,
        expected: &'static str,
        found: &'static str,
    },
    #[error("element {0:?} is busy handling another call")]
    Busy(ElementId),
}

/// Where a new child goes in its parent's document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddPosition {
    /// Before all existing children.
    Head,
    /// After all existing children.
    #[default]
    Tail,
}

/// One arena slot: element data, the cache a surface owns, and the
/// element's behavior.
///
/// The behavior is `None` while one of its operations is running; the
/// window takes it out of the slot for the duration of the call so the
/// operation can borrow the rest of the tree mutably.
pub(crate) struct Node {
    pub(crate) data: ElementData,
    pub(crate) cache: Option<SurfaceCache>,
    pub(crate) behavior: Option<Box<dyn Element>>,
}

/// The element tree, backed by a slotmap arena.
///
/// Parent/child relationships are stored in secondary maps so that removal
/// is O(subtree size) and lookup is O(1). Children keep document order.
pub struct Tree {
    nodes: SlotMap<ElementId, Node>,
    children: SecondaryMap<ElementId, Vec<ElementId>>,
    parent: SecondaryMap<ElementId, ElementId>,
    root: Option<ElementId>,
}

impl Tree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            children: SecondaryMap::new(),
            parent: SecondaryMap::new(),
            root: None,
        }
    }

    /// Insert a parentless element.
    ///
    /// If no root has been set yet, this element becomes the root.
    pub fn insert(&mut self, data: ElementData, behavior: Box<dyn Element>) -> ElementId {
        let id = self.nodes.insert(Node {
            data,
            cache: None,
            behavior: Some(behavior),
        });
        self.children.insert(id, Vec::new());
        if self.root.is_none() {
            self.root = Some(id);
        }
        id
    }

    /// Insert an element as a child of `parent` at `position`.
    pub fn insert_child(
        &mut self,
        parent: ElementId,
        data: ElementData,
        behavior: Box<dyn Element>,
        position: AddPosition,
    ) -> Result<ElementId, TreeError> {
        if !self.nodes.contains_key(parent) {
            return Err(TreeError::NotFound(parent));
        }
        let id = self.nodes.insert(Node {
            data,
            cache: None,
            behavior: Some(behavior),
        });
        self.children.insert(id, Vec::new());
        self.parent.insert(id, parent);
        if let Some(siblings) = self.children.get_mut(parent) {
            match position {
                AddPosition::Head => siblings.insert(0, id),
                AddPosition::Tail => siblings.push(id),
            }
        }
        Ok(id)
    }

    /// Remove an element and all its descendants.
    ///
    /// Returns the removed ids, descendants before ancestors. Behaviors and
    /// caches are dropped without teardown; the window runs `fini` first.
    pub fn remove(&mut self, id: ElementId) -> Vec<ElementId> {
        if !self.nodes.contains_key(id) {
            return Vec::new();
        }

        if let Some(parent_id) = self.parent.remove(id) {
            if let Some(siblings) = self.children.get_mut(parent_id) {
                siblings.retain(|&child| child != id);
            }
        }

        if self.root == Some(id) {
            self.root = None;
        }

        let order = self.walk_post_order(id);
        for &current in &order {
            self.children.remove(current);
            self.parent.remove(current);
            self.nodes.remove(current);
        }
        order
    }

    /// Get the parent of an element, if it has one.
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.parent.get(id).copied()
    }

    /// Get the children of an element in document order. Returns an empty
    /// slice if the element has no children or does not exist.
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// Walk from `id` up to the root, collecting ancestor ids.
    ///
    /// The returned vec does **not** include `id` itself; it starts with the
    /// immediate parent and ends at the root.
    pub fn ancestors(&self, id: ElementId) -> Vec<ElementId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            result.push(p);
            current = p;
        }
        result
    }

    /// Immutable access to an element's data.
    pub fn get(&self, id: ElementId) -> Option<&ElementData> {
        self.nodes.get(id).map(|n| &n.data)
    }

    /// Mutable access to an element's data.
    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut ElementData> {
        self.nodes.get_mut(id).map(|n| &mut n.data)
    }

    /// The cache owned by `id`, if it is a surface.
    pub fn cache(&self, id: ElementId) -> Option<&SurfaceCache> {
        self.nodes.get(id).and_then(|n| n.cache.as_ref())
    }

    /// Mutable access to the cache owned by `id`.
    pub fn cache_mut(&mut self, id: ElementId) -> Option<&mut SurfaceCache> {
        self.nodes.get_mut(id).and_then(|n| n.cache.as_mut())
    }

    /// Install or remove the cache owned by `id`. Returns the previous one.
    pub(crate) fn set_cache(
        &mut self,
        id: ElementId,
        cache: Option<SurfaceCache>,
    ) -> Option<SurfaceCache> {
        let node = self.nodes.get_mut(id)?;
        std::mem::replace(&mut node.cache, cache)
    }

    /// Whether `id` owns a cache.
    pub fn is_surface(&self, id: ElementId) -> bool {
        self.cache(id).is_some()
    }

    /// Whether `id` can be redrawn in isolation: it owns a cache or declares
    /// that it repaints its whole rect.
    pub fn is_clearable(&self, id: ElementId) -> bool {
        self.nodes
            .get(id)
            .is_some_and(|n| n.cache.is_some() || n.data.clearable)
    }

    /// The closest ancestor of `id` (excluding `id`) that owns a cache.
    pub fn nearest_surface_ancestor(&self, id: ElementId) -> Option<ElementId> {
        let mut current = id;
        while let Some(p) = self.parent(current) {
            if self.is_surface(p) {
                return Some(p);
            }
            current = p;
        }
        None
    }

    /// The entry that stands in for `id` on the redraw queues of `surface`.
    ///
    /// Walks from `id` toward `surface` and returns the first clearable
    /// element. If none is clearable, returns the branch root directly under
    /// `surface`, so a single entry redraws the whole branch.
    pub fn nearest_clearable(&self, id: ElementId, surface: ElementId) -> ElementId {
        let mut current = id;
        loop {
            if self.is_clearable(current) {
                return current;
            }
            match self.parent(current) {
                Some(p) if p != surface => current = p,
                _ => return current,
            }
        }
    }

    /// Whether the branch under `entry` still holds a continuous-redraw
    /// element owned by `surface`: one marked every-frame, or a nested
    /// surface with entries of its own.
    pub fn covers_every_frame(&self, entry: ElementId, surface: ElementId) -> bool {
        self.walk_depth_first(entry).into_iter().any(|id| {
            let Some(node) = self.nodes.get(id) else {
                return false;
            };
            node.data.surface == Some(surface)
                && (node.data.render_every_frame
                    || node.cache.as_ref().is_some_and(|cache| !cache.every_frame.is_empty()))
        })
    }

    // ── Behavior access ──────────────────────────────────────────────

    /// Take the behavior out of its slot. `None` if the element does not
    /// exist or one of its operations is already running.
    pub(crate) fn take_behavior(&mut self, id: ElementId) -> Option<Box<dyn Element>> {
        self.nodes.get_mut(id).and_then(|n| n.behavior.take())
    }

    /// Put a behavior back. Returns it again if the element was removed
    /// while the behavior was out.
    pub(crate) fn restore_behavior(
        &mut self,
        id: ElementId,
        behavior: Box<dyn Element>,
    ) -> Option<Box<dyn Element>> {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.behavior = Some(behavior);
                None
            }
            None => Some(behavior),
        }
    }

    /// Whether one of the element's operations is currently running.
    pub fn is_busy(&self, id: ElementId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.behavior.is_none())
    }

    /// The type name reported by the element's behavior.
    pub fn type_name(&self, id: ElementId) -> Result<&'static str, TreeError> {
        let node = self.nodes.get(id).ok_or(TreeError::NotFound(id))?;
        let behavior = node.behavior.as_ref().ok_or(TreeError::Busy(id))?;
        Ok(behavior.type_name())
    }

    /// Checked downcast of an element's behavior to a concrete type.
    pub fn behavior_as<T: Element>(&self, id: ElementId) -> Result<&T, TreeError> {
        let node = self.nodes.get(id).ok_or(TreeError::NotFound(id))?;
        let behavior = node.behavior.as_ref().ok_or(TreeError::Busy(id))?;
        let found = behavior.type_name();
        behavior
            .as_any()
            .downcast_ref::<T>()
            .ok_or(TreeError::TypeMismatch {
                id,
                expected: std::any::type_name::<T>(),
                found,
            })
    }

    /// Checked mutable downcast of an element's behavior.
    pub fn behavior_as_mut<T: Element>(&mut self, id: ElementId) -> Result<&mut T, TreeError> {
        let node = self.nodes.get_mut(id).ok_or(TreeError::NotFound(id))?;
        let behavior = node.behavior.as_mut().ok_or(TreeError::Busy(id))?;
        let found = behavior.type_name();
        behavior
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or(TreeError::TypeMismatch {
                id,
                expected: std::any::type_name::<T>(),
                found,
            })
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// The current root element, if set.
    pub fn root(&self) -> Option<ElementId> {
        self.root
    }

    /// Explicitly set the root element.
    pub fn set_root(&mut self, id: ElementId) {
        self.root = Some(id);
    }

    /// Number of elements in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the tree contains an element with the given id.
    pub fn contains(&self, id: ElementId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Pre-order depth-first traversal starting from `start`.
    pub fn walk_depth_first(&self, start: ElementId) -> Vec<ElementId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            // Push children in reverse so the first child is visited first.
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    /// Post-order traversal: every element after all of its descendants.
    pub fn walk_post_order(&self, start: ElementId) -> Vec<ElementId> {
        let mut result = self.walk_depth_first(start);
        // Reversed pre-order visits children before parents; restore
        // sibling order within each level isn't required by callers.
        result.reverse();
        result
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree")
            .field("len", &self.nodes.len())
            .field("root", &self.root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Base;

    fn node() -> (ElementData, Box<dyn Element>) {
        (ElementData::new(), Box::new(Base))
    }

    /// Build a small test tree:
    /// ```text
    ///       root
    ///      /    \
    ///    a        b
    ///   / \
    ///  c   d
    /// ```
    fn build_tree() -> (Tree, ElementId, ElementId, ElementId, ElementId, ElementId) {
        let mut tree = Tree::new();
        let (data, behavior) = node();
        let root = tree.insert(data.with_label("root"), behavior);
        let a = tree.insert_child(root, ElementData::new(), Box::new(Base), AddPosition::Tail).unwrap();
        let b = tree.insert_child(root, ElementData::new(), Box::new(Base), AddPosition::Tail).unwrap();
        let c = tree.insert_child(a, ElementData::new(), Box::new(Base), AddPosition::Tail).unwrap();
        let d = tree.insert_child(a, ElementData::new(), Box::new(Base), AddPosition::Tail).unwrap();
        (tree, root, a, b, c, d)
    }

    #[test]
    fn insert_sets_root() {
        let mut tree = Tree::new();
        let (data, behavior) = node();
        let id = tree.insert(data, behavior);
        assert_eq!(tree.root(), Some(id));
    }

    #[test]
    fn insert_child_parent_relationship() {
        let (tree, root, a, _b, c, _d) = build_tree();
        assert_eq!(tree.parent(a), Some(root));
        assert_eq!(tree.parent(c), Some(a));
        assert_eq!(tree.parent(root), None);
    }

    #[test]
    fn insert_child_at_head() {
        let (mut tree, root, a, b, ..) = build_tree();
        let first = tree
            .insert_child(root, ElementData::new(), Box::new(Base), AddPosition::Head)
            .unwrap();
        assert_eq!(tree.children(root), &[first, a, b]);
    }

    #[test]
    fn insert_child_missing_parent() {
        let (mut tree, _root, a, ..) = build_tree();
        tree.remove(a);
        let err = tree
            .insert_child(a, ElementData::new(), Box::new(Base), AddPosition::Tail)
            .unwrap_err();
        assert_eq!(err, TreeError::NotFound(a));
    }

    #[test]
    fn children_list() {
        let (tree, root, a, b, c, d) = build_tree();
        assert_eq!(tree.children(root), &[a, b]);
        assert_eq!(tree.children(a), &[c, d]);
        assert!(tree.children(c).is_empty());
    }

    #[test]
    fn ancestors() {
        let (tree, root, a, _b, c, _d) = build_tree();
        assert_eq!(tree.ancestors(c), vec![a, root]);
        assert!(tree.ancestors(root).is_empty());
    }

    #[test]
    fn remove_subtree_returns_descendants_first() {
        let (mut tree, root, a, b, c, d) = build_tree();
        let removed = tree.remove(a);
        assert_eq!(removed.len(), 3);
        assert_eq!(*removed.last().unwrap(), a);
        assert!(!tree.contains(c));
        assert!(!tree.contains(d));
        assert_eq!(tree.children(root), &[b]);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn remove_root_clears_root() {
        let (mut tree, root, ..) = build_tree();
        tree.remove(root);
        assert!(tree.is_empty());
        assert_eq!(tree.root(), None);
    }

    #[test]
    fn remove_stale_id_is_noop() {
        let (mut tree, _root, a, ..) = build_tree();
        tree.remove(a);
        assert!(tree.remove(a).is_empty());
    }

    #[test]
    fn walk_depth_first_is_document_order() {
        let (tree, root, a, b, c, d) = build_tree();
        assert_eq!(tree.walk_depth_first(root), vec![root, a, c, d, b]);
    }

    #[test]
    fn walk_post_order_children_before_parents() {
        let (tree, root, a, _b, c, d) = build_tree();
        let order = tree.walk_post_order(root);
        let pos = |id| order.iter().position(|&x| x == id).unwrap();
        assert!(pos(c) < pos(a));
        assert!(pos(d) < pos(a));
        assert!(pos(a) < pos(root));
        assert_eq!(order.len(), 5);
    }

    #[test]
    fn nearest_clearable_stops_at_clearable() {
        let (mut tree, root, a, _b, c, _d) = build_tree();
        tree.get_mut(a).unwrap().clearable = true;
        assert_eq!(tree.nearest_clearable(c, root), a);
    }

    #[test]
    fn nearest_clearable_falls_back_to_branch_root() {
        let (tree, root, a, _b, c, _d) = build_tree();
        assert_eq!(tree.nearest_clearable(c, root), a);
        assert_eq!(tree.nearest_clearable(a, root), a);
    }

    #[test]
    fn nearest_clearable_prefers_self() {
        let (mut tree, root, _a, _b, c, _d) = build_tree();
        tree.get_mut(c).unwrap().clearable = true;
        assert_eq!(tree.nearest_clearable(c, root), c);
    }

    #[test]
    fn behavior_downcast_checked() {
        let (tree, root, ..) = build_tree();
        assert!(tree.behavior_as::<Base>(root).is_ok());

        let err = tree
            .behavior_as::<crate::element::Surface>(root)
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, TreeError::TypeMismatch { found: "gilt.element", .. }));
    }

    #[test]
    fn taken_behavior_reports_busy() {
        let (mut tree, root, ..) = build_tree();
        let behavior = tree.take_behavior(root).unwrap();
        assert!(tree.is_busy(root));
        assert_eq!(tree.type_name(root), Err(TreeError::Busy(root)));
        assert!(tree.restore_behavior(root, behavior).is_none());
        assert!(!tree.is_busy(root));
    }

    #[test]
    fn restore_after_removal_hands_behavior_back() {
        let (mut tree, _root, a, ..) = build_tree();
        let behavior = tree.take_behavior(a).unwrap();
        tree.remove(a);
        assert!(tree.restore_behavior(a, behavior).is_some());
    }
}
