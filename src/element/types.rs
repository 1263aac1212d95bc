//! Window-scoped element type registry.
//!
//! Every `attached` level registers the element under its own type name
//! (`gilt.element`, `gilt.surface`, `gilt.knob`, ...), handing back the id it
//! held before. The registry counts live instances per type so the window
//! can release a type's shared GPU resources once its last instance is torn
//! down.

use std::collections::HashMap;

/// Identifier of a registered element type, valid for one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementTypeId(u32);

impl ElementTypeId {
    /// Raw index of this type in its registry.
    pub fn index(self) -> u32 {
        self.0
    }
}

#[derive(Debug)]
struct TypeEntry {
    name: &'static str,
    refs: usize,
}

/// Reference-counted registry of element type names.
///
/// Ids are stable for the life of the registry: a type whose count drops to
/// zero keeps its id and is revived by the next `type_ref` of the same name.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    entries: Vec<TypeEntry>,
    by_name: HashMap<&'static str, ElementTypeId>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a reference on `name`, dropping the reference held by `old`.
    ///
    /// Re-registering under the same name keeps the count unchanged. The
    /// dropped reference never triggers a release: it belongs to an
    /// instance that is still alive under its new type.
    pub fn type_ref(&mut self, old: Option<ElementTypeId>, name: &'static str) -> ElementTypeId {
        let id = match self.by_name.get(name) {
            Some(&id) => id,
            None => {
                let id = ElementTypeId(self.entries.len() as u32);
                self.entries.push(TypeEntry { name, refs: 0 });
                self.by_name.insert(name, id);
                tracing::trace!(name, index = id.0, "registered element type");
                id
            }
        };

        if let Some(entry) = self.entries.get_mut(id.0 as usize) {
            entry.refs += 1;
        }
        if let Some(old) = old {
            self.decrement(old);
        }
        id
    }

    /// Drop one reference on `id`.
    ///
    /// Returns the type name when this was the last live instance, so the
    /// caller can release the resources that type owns.
    pub fn type_unref(&mut self, id: ElementTypeId) -> Option<&'static str> {
        match self.decrement(id) {
            Some((name, 0)) => Some(name),
            _ => None,
        }
    }

    fn decrement(&mut self, id: ElementTypeId) -> Option<(&'static str, usize)> {
        let entry = self.entries.get_mut(id.0 as usize)?;
        // Unbalanced unrefs saturate rather than wrap.
        entry.refs = entry.refs.saturating_sub(1);
        Some((entry.name, entry.refs))
    }

    /// Live instance count of `id`.
    pub fn ref_count(&self, id: ElementTypeId) -> usize {
        self.entries.get(id.0 as usize).map_or(0, |e| e.refs)
    }

    /// Name registered for `id`.
    pub fn name(&self, id: ElementTypeId) -> Option<&'static str> {
        self.entries.get(id.0 as usize).map(|e| e.name)
    }

    /// Look up the id registered for `name`.
    pub fn lookup(&self, name: &str) -> Option<ElementTypeId> {
        self.by_name.get(name).copied()
    }

    /// Number of distinct type names ever registered.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no type has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_registry_is_empty() {
        let registry = TypeRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.lookup("gilt.element"), None);
    }

    #[test]
    fn first_ref_registers() {
        let mut registry = TypeRegistry::new();
        let id = registry.type_ref(None, "gilt.element");
        assert_eq!(registry.name(id), Some("gilt.element"));
        assert_eq!(registry.ref_count(id), 1);
        assert_eq!(registry.lookup("gilt.element"), Some(id));
    }

    #[test]
    fn same_name_shares_id() {
        let mut registry = TypeRegistry::new();
        let a = registry.type_ref(None, "gilt.knob");
        let b = registry.type_ref(None, "gilt.knob");
        assert_eq!(a, b);
        assert_eq!(registry.ref_count(a), 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn re_register_moves_reference() {
        let mut registry = TypeRegistry::new();
        let base = registry.type_ref(None, "gilt.element");
        let surface = registry.type_ref(Some(base), "gilt.surface");
        assert_ne!(base, surface);
        assert_eq!(registry.ref_count(base), 0);
        assert_eq!(registry.ref_count(surface), 1);
    }

    #[test]
    fn re_register_same_name_keeps_count() {
        let mut registry = TypeRegistry::new();
        let id = registry.type_ref(None, "gilt.surface");
        let again = registry.type_ref(Some(id), "gilt.surface");
        assert_eq!(id, again);
        assert_eq!(registry.ref_count(id), 1);
    }

    #[test]
    fn last_unref_reports_name() {
        let mut registry = TypeRegistry::new();
        let id = registry.type_ref(None, "gilt.canvas");
        registry.type_ref(None, "gilt.canvas");

        assert_eq!(registry.type_unref(id), None);
        assert_eq!(registry.type_unref(id), Some("gilt.canvas"));
        assert_eq!(registry.ref_count(id), 0);
    }

    #[test]
    fn revived_type_keeps_id() {
        let mut registry = TypeRegistry::new();
        let id = registry.type_ref(None, "gilt.value");
        registry.type_unref(id);
        assert_eq!(registry.type_ref(None, "gilt.value"), id);
        assert_eq!(registry.ref_count(id), 1);
    }

    #[test]
    fn unbalanced_unref_saturates() {
        let mut registry = TypeRegistry::new();
        let id = registry.type_ref(None, "gilt.element");
        registry.type_unref(id);
        registry.type_unref(id);
        assert_eq!(registry.ref_count(id), 0);
    }
}
