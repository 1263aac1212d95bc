//! Rendering: backend primitives, image assets, shared per-type resources.

pub mod asset;
pub mod backend;
pub mod resource;

pub use asset::{Asset, AssetError, AssetSource, ImageData};
pub use backend::{
    Backend, BackendError, BlendFactor, BlendMode, Color, FramebufferId, ShaderId, ShaderSource,
    TextureId, Viewport,
};
pub use resource::{Resource, ResourceCache, TextureInfo};
