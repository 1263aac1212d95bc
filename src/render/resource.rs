//! Per-type GPU resource cache.
//!
//! Widgets of one type share their shader programs and static textures. The
//! [`ResourceCache`] creates them lazily on first use, keyed by the owning
//! type name, and releases them when the window reports that the last
//! instance of that type is gone (or when the window itself is torn down).
//! Failures are cached too, so a broken asset is logged once rather than on
//! every frame.

use std::collections::HashMap;

use super::asset::Asset;
use super::backend::{Backend, ShaderId, ShaderSource, TextureId};

/// A texture together with its pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
}

/// A cached resource slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Shader(ShaderId),
    Texture(TextureInfo),
    /// Creation was attempted and failed; not retried.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ResourceKey {
    owner: &'static str,
    name: &'static str,
}

/// Lazily populated cache of shared GPU resources keyed by owner type.
#[derive(Debug, Default)]
pub struct ResourceCache {
    entries: HashMap<ResourceKey, Resource>,
}

impl ResourceCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or compile the shader `source` on behalf of `owner`.
    ///
    /// Returns `None` if compilation failed, now or on an earlier call.
    pub fn shader(
        &mut self,
        backend: &mut dyn Backend,
        owner: &'static str,
        source: &ShaderSource,
    ) -> Option<ShaderId> {
        let key = ResourceKey { owner, name: source.name };
        let slot = self.entries.entry(key).or_insert_with(|| {
            match backend.compile_shader(source) {
                Ok(id) => {
                    tracing::debug!(owner, shader = source.name, "compiled shader");
                    Resource::Shader(id)
                }
                Err(err) => {
                    tracing::error!(owner, %err, "shader unavailable");
                    Resource::Failed
                }
            }
        });

        match *slot {
            Resource::Shader(id) => Some(id),
            _ => None,
        }
    }

    /// Get or upload the texture for `asset` under `name` on behalf of `owner`.
    ///
    /// Returns `None` if the asset failed to load, now or on an earlier call.
    pub fn texture(
        &mut self,
        backend: &mut dyn Backend,
        owner: &'static str,
        name: &'static str,
        asset: &Asset,
    ) -> Option<TextureInfo> {
        let key = ResourceKey { owner, name };
        let slot = self.entries.entry(key).or_insert_with(|| match asset.load() {
            Ok(image) => {
                let id = backend.create_texture();
                backend.upload_texture(id, image.width, image.height, &image.pixels);
                tracing::debug!(
                    owner,
                    texture = name,
                    width = image.width,
                    height = image.height,
                    "uploaded texture"
                );
                Resource::Texture(TextureInfo { id, width: image.width, height: image.height })
            }
            Err(err) => {
                tracing::warn!(owner, texture = name, %err, "couldn't load texture, drawing without it");
                Resource::Failed
            }
        });

        match *slot {
            Resource::Texture(info) => Some(info),
            _ => None,
        }
    }

    /// Release every resource owned by `owner`. Returns how many slots were
    /// dropped.
    pub fn release_owner(&mut self, backend: &mut dyn Backend, owner: &str) -> usize {
        let keys: Vec<ResourceKey> = self
            .entries
            .keys()
            .filter(|k| k.owner == owner)
            .copied()
            .collect();

        for key in &keys {
            if let Some(resource) = self.entries.remove(key) {
                release(backend, resource);
            }
        }

        if !keys.is_empty() {
            tracing::debug!(owner, released = keys.len(), "released type resources");
        }
        keys.len()
    }

    /// Release everything.
    pub fn release_all(&mut self, backend: &mut dyn Backend) {
        for (_, resource) in self.entries.drain() {
            release(backend, resource);
        }
    }

    /// Whether a slot (successful or failed) exists for `owner`/`name`.
    pub fn contains(&self, owner: &'static str, name: &'static str) -> bool {
        self.entries.contains_key(&ResourceKey { owner, name })
    }

    /// Number of cached slots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn release(backend: &mut dyn Backend, resource: Resource) {
    match resource {
        Resource::Shader(id) => backend.delete_shader(id),
        Resource::Texture(info) => backend.delete_texture(info.id),
        Resource::Failed => {}
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingBackend;

    const SOURCE: ShaderSource = ShaderSource {
        name: "flat",
        vertex: "void main() {}",
        fragment: "void main() {}",
    };

    static PIXEL: [u8; 4] = [1, 2, 3, 4];

    #[test]
    fn shader_compiled_once() {
        let mut backend = RecordingBackend::new(64, 64);
        let mut cache = ResourceCache::new();

        let a = cache.shader(&mut backend, "knob", &SOURCE);
        let b = cache.shader(&mut backend, "knob", &SOURCE);
        assert!(a.is_some());
        assert_eq!(a, b);
        assert_eq!(backend.live_shaders(), 1);
    }

    #[test]
    fn failed_shader_is_cached() {
        let mut backend = RecordingBackend::new(64, 64);
        backend.fail_shader("flat");
        let mut cache = ResourceCache::new();

        assert_eq!(cache.shader(&mut backend, "knob", &SOURCE), None);
        assert_eq!(cache.shader(&mut backend, "knob", &SOURCE), None);
        assert_eq!(backend.compile_attempts(), 1);
        assert!(cache.contains("knob", "flat"));
    }

    #[test]
    fn texture_uploaded_once() {
        let mut backend = RecordingBackend::new(64, 64);
        let mut cache = ResourceCache::new();
        let asset = Asset::embedded(&PIXEL, 1, 1);

        let first = cache.texture(&mut backend, "canvas", "tile", &asset).unwrap();
        let second = cache.texture(&mut backend, "canvas", "tile", &asset).unwrap();
        assert_eq!(first, second);
        assert_eq!((first.width, first.height), (1, 1));
        assert_eq!(backend.live_textures(), 1);
    }

    #[test]
    fn broken_texture_degrades() {
        let mut backend = RecordingBackend::new(64, 64);
        let mut cache = ResourceCache::new();
        let asset = Asset::embedded(&PIXEL, 4, 4);

        assert!(cache.texture(&mut backend, "canvas", "tile", &asset).is_none());
        assert_eq!(backend.live_textures(), 0);
    }

    #[test]
    fn release_owner_only_touches_owner() {
        let mut backend = RecordingBackend::new(64, 64);
        let mut cache = ResourceCache::new();
        cache.shader(&mut backend, "knob", &SOURCE);
        cache.shader(&mut backend, "canvas", &SOURCE);
        cache.texture(&mut backend, "canvas", "tile", &Asset::embedded(&PIXEL, 1, 1));

        assert_eq!(cache.release_owner(&mut backend, "canvas"), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(backend.live_shaders(), 1);
        assert_eq!(backend.live_textures(), 0);
    }

    #[test]
    fn release_all_empties() {
        let mut backend = RecordingBackend::new(64, 64);
        let mut cache = ResourceCache::new();
        cache.shader(&mut backend, "knob", &SOURCE);
        cache.release_all(&mut backend);
        assert!(cache.is_empty());
        assert_eq!(backend.live_shaders(), 0);
    }
}
