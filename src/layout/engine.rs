//! TaffyTree wrapper for layout computation.
//!
//! [`LayoutEngine`] mirrors the element tree into a taffy layout tree, runs
//! layout computation, and feeds the resulting absolute rects to
//! [`Window::place`], which reflows each element leafward.

use std::collections::{HashMap, HashSet};

use taffy::prelude::*;

use crate::dom::node::ElementId;
use crate::dom::tree::Tree;
use crate::geometry::Rect;
use crate::window::Window;

/// Errors from the layout bridge.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("layout tree error: {0}")]
    Taffy(#[from] taffy::TaffyError),
}

/// Wraps a [`TaffyTree`] and maintains a mapping from [`ElementId`]s to
/// taffy node ids.
///
/// Elements with a style set through [`set_style`](Self::set_style) are laid
/// out by it; elements without one keep their current size.
pub struct LayoutEngine {
    /// The taffy tree, carrying the element id as context data.
    tree: TaffyTree<ElementId>,
    /// Maps ElementId -> taffy NodeId for quick lookup.
    node_map: HashMap<ElementId, taffy::prelude::NodeId>,
    /// Explicit styles by element.
    styles: HashMap<ElementId, Style>,
    /// The taffy root node, if a layout has been synced.
    root: Option<taffy::prelude::NodeId>,
    /// The element the taffy root mirrors.
    element_root: Option<ElementId>,
}

impl LayoutEngine {
    /// Create a new, empty layout engine.
    pub fn new() -> Self {
        Self {
            tree: TaffyTree::new(),
            node_map: HashMap::new(),
            styles: HashMap::new(),
            root: None,
            element_root: None,
        }
    }

    /// Set the layout style of `id`.
    pub fn set_style(&mut self, id: ElementId, style: Style) {
        self.styles.insert(id, style);
    }

    /// Drop the explicit style of `id`.
    pub fn clear_style(&mut self, id: ElementId) -> Option<Style> {
        self.styles.remove(&id)
    }

    /// Synchronize the taffy tree with the element tree.
    ///
    /// Stale taffy nodes (and styles) of removed elements are dropped, live
    /// elements get a node carrying their style, and parent/child links are
    /// rebuilt to mirror the element tree.
    pub fn sync(&mut self, elements: &Tree) -> Result<(), LayoutError> {
        let Some(element_root) = elements.root() else {
            self.clear();
            return Ok(());
        };

        let live = elements.walk_depth_first(element_root);
        let live_set: HashSet<ElementId> = live.iter().copied().collect();

        let stale: Vec<ElementId> = self
            .node_map
            .keys()
            .filter(|id| !live_set.contains(id))
            .copied()
            .collect();
        for id in stale {
            if let Some(node) = self.node_map.remove(&id) {
                self.tree.remove(node)?;
            }
        }
        self.styles.retain(|id, _| live_set.contains(id));

        for &id in &live {
            let style = self.style_for(elements, id);
            match self.node_map.get(&id) {
                Some(&node) => self.tree.set_style(node, style)?,
                None => {
                    let node = self.tree.new_leaf_with_context(style, id)?;
                    self.node_map.insert(id, node);
                }
            }
        }

        for &id in &live {
            let children: Vec<taffy::prelude::NodeId> = elements
                .children(id)
                .iter()
                .filter_map(|child| self.node_map.get(child).copied())
                .collect();
            if let Some(&node) = self.node_map.get(&id) {
                self.tree.set_children(node, &children)?;
            }
        }

        self.root = self.node_map.get(&element_root).copied();
        self.element_root = Some(element_root);
        tracing::trace!(nodes = self.node_map.len(), "synced layout tree");
        Ok(())
    }

    /// Run taffy layout computation on the root node.
    pub fn compute(&mut self, available_width: f32, available_height: f32) -> Result<(), LayoutError> {
        if let Some(root) = self.root {
            self.tree.compute_layout(
                root,
                taffy::geometry::Size {
                    width: AvailableSpace::Definite(available_width),
                    height: AvailableSpace::Definite(available_height),
                },
            )?;
        }
        Ok(())
    }

    /// The computed rect of `id`, relative to its parent.
    pub fn layout(&self, id: ElementId) -> Option<Rect> {
        let node = self.node_map.get(&id)?;
        let layout = self.tree.layout(*node).ok()?;
        Some(Rect::new(
            layout.location.x,
            layout.location.y,
            layout.size.width,
            layout.size.height,
        ))
    }

    /// Computed absolute rects of every element, parents before children.
    pub fn absolute_layouts(&self, elements: &Tree) -> Vec<(ElementId, Rect)> {
        let Some(root) = self.element_root.filter(|id| elements.contains(*id)) else {
            return Vec::new();
        };
        let mut result = Vec::new();
        let mut stack = vec![(root, 0.0_f32, 0.0_f32)];
        while let Some((id, ox, oy)) = stack.pop() {
            let Some(relative) = self.layout(id) else {
                continue;
            };
            let rect = Rect::new(ox + relative.x, oy + relative.y, relative.w, relative.h);
            result.push((id, rect));
            for &child in elements.children(id).iter().rev() {
                stack.push((child, rect.x, rect.y));
            }
        }
        result
    }

    /// Sync, compute for the window size, and place every element.
    ///
    /// Returns the number of elements placed.
    pub fn apply(&mut self, win: &mut Window) -> Result<usize, LayoutError> {
        self.sync(win.tree())?;
        let (width, height) = (win.config().width as f32, win.config().height as f32);
        self.compute(width, height)?;

        let placements = self.absolute_layouts(win.tree());
        for &(id, rect) in &placements {
            win.place(id, rect);
        }
        tracing::debug!(placed = placements.len(), "applied layout");
        Ok(placements.len())
    }

    fn style_for(&self, elements: &Tree, id: ElementId) -> Style {
        if let Some(style) = self.styles.get(&id) {
            return style.clone();
        }
        let rect = elements.get(id).map(|data| data.rect).unwrap_or_default();
        Style {
            size: taffy::geometry::Size { width: length(rect.w), height: length(rect.h) },
            flex_shrink: 0.0,
            ..Default::default()
        }
    }

    /// Clear all state, removing all taffy nodes and mappings.
    fn clear(&mut self) {
        let nodes: Vec<_> = self.node_map.drain().map(|(_, node)| node).collect();
        for node in nodes {
            let _ = self.tree.remove(node);
        }
        self.styles.clear();
        self.root = None;
        self.element_root = None;
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutEngine")
            .field("nodes", &self.node_map.len())
            .field("styles", &self.styles.len())
            .field("root", &self.element_root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::node::ElementData;
    use crate::element::Surface;
    use crate::testing::RecordingBackend;
    use crate::widgets::{Container, Knob};
    use crate::window::WindowConfig;

    fn window() -> Window {
        Window::new(WindowConfig::default().with_size(200, 100), RecordingBackend::new(200, 100))
    }

    fn column(w: f32, h: f32) -> Style {
        Style {
            flex_direction: FlexDirection::Column,
            size: taffy::geometry::Size { width: length(w), height: length(h) },
            ..Default::default()
        }
    }

    fn height(h: f32) -> Style {
        Style {
            size: taffy::geometry::Size { width: auto(), height: length(h) },
            ..Default::default()
        }
    }

    /// Surface root with two containers stacked vertically.
    fn stacked() -> (Window, LayoutEngine, ElementId, ElementId, ElementId) {
        let mut win = window();
        let root = win.insert_root(ElementData::new(), Surface::new());
        let a = win.add_child(root, ElementData::new(), Container::new()).unwrap();
        let b = win.add_child(root, ElementData::new(), Container::new()).unwrap();

        let mut engine = LayoutEngine::new();
        engine.set_style(root, column(200.0, 100.0));
        engine.set_style(a, height(40.0));
        engine.set_style(b, height(60.0));
        (win, engine, root, a, b)
    }

    #[test]
    fn new_engine_is_empty() {
        let engine = LayoutEngine::new();
        assert!(engine.node_map.is_empty());
        assert!(engine.root.is_none());
    }

    #[test]
    fn sync_empty_tree() {
        let tree = Tree::new();
        let mut engine = LayoutEngine::new();
        engine.sync(&tree).unwrap();
        assert!(engine.root.is_none());
    }

    #[test]
    fn sync_mirrors_children() {
        let (win, mut engine, root, a, b) = stacked();
        engine.sync(win.tree()).unwrap();
        assert!(engine.node_map.contains_key(&a));
        assert!(engine.node_map.contains_key(&b));
        let children = engine.tree.children(engine.node_map[&root]).unwrap();
        assert_eq!(children.len(), 2);
    }

    #[test]
    fn apply_places_stacked_children() {
        let (mut win, mut engine, root, a, b) = stacked();
        assert_eq!(engine.apply(&mut win).unwrap(), 3);

        assert_eq!(win.element(root).unwrap().rect, Rect::new(0.0, 0.0, 200.0, 100.0));
        assert_eq!(win.element(a).unwrap().rect, Rect::new(0.0, 0.0, 200.0, 40.0));
        assert_eq!(win.element(b).unwrap().rect, Rect::new(0.0, 40.0, 200.0, 60.0));
    }

    #[test]
    fn nested_rects_are_absolute() {
        let (mut win, mut engine, _root, _a, b) = stacked();
        let c = win.add_child(b, ElementData::new(), Container::new()).unwrap();
        engine.set_style(
            c,
            Style {
                size: taffy::geometry::Size { width: length(20.0), height: length(20.0) },
                margin: taffy::geometry::Rect {
                    left: length(5.0),
                    right: zero(),
                    top: length(5.0),
                    bottom: zero(),
                },
                ..Default::default()
            },
        );
        engine.apply(&mut win).unwrap();
        assert_eq!(win.element(c).unwrap().rect, Rect::new(5.0, 45.0, 20.0, 20.0));
    }

    #[test]
    fn unstyled_elements_keep_their_size() {
        let (mut win, mut engine, _root, a, _b) = stacked();
        let knob = win.add_child(a, ElementData::new(), Knob::new()).unwrap();
        engine.apply(&mut win).unwrap();
        let rect = win.element(knob).unwrap().rect;
        assert_eq!((rect.w, rect.h), (30.0, 30.0));
    }

    #[test]
    fn removed_elements_are_dropped() {
        let (mut win, mut engine, _root, a, b) = stacked();
        engine.apply(&mut win).unwrap();
        win.remove(a);
        engine.apply(&mut win).unwrap();

        assert!(!engine.node_map.contains_key(&a));
        assert!(!engine.styles.contains_key(&a));
        assert_eq!(win.element(b).unwrap().rect, Rect::new(0.0, 0.0, 200.0, 60.0));
    }

    #[test]
    fn layout_invalidates_root_surface() {
        let (mut win, mut engine, root, ..) = stacked();
        engine.apply(&mut win).unwrap();
        assert!(win.needs_frame());
        assert!(win.frame());
        assert!(!win.surface_is_dirty(root));

        // Same layout again changes nothing.
        engine.apply(&mut win).unwrap();
        assert!(!win.needs_frame());
    }
}
