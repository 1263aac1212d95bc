//! RecordingBackend: a headless [`Backend`] that records every call.
//!
//! Commands are appended in call order so tests can assert on the exact GPU
//! work a pass issued. Live object counts make leaks visible: after a
//! window's teardown every count must be back to zero.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::geometry::{Mat4, Point, Quad};
use crate::render::backend::{
    Backend, BackendError, BlendMode, Color, FramebufferId, ShaderId, ShaderSource, TextureId,
    Viewport,
};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateTexture(TextureId),
    AllocateTexture { texture: TextureId, width: u32, height: u32 },
    UploadTexture { texture: TextureId, width: u32, height: u32 },
    DeleteTexture(TextureId),
    CreateFramebuffer(FramebufferId),
    AttachColor { framebuffer: FramebufferId, texture: TextureId },
    DeleteFramebuffer(FramebufferId),
    CompileShader(&'static str),
    DeleteShader(ShaderId),
    BindFramebuffer(Option<FramebufferId>),
    SetViewport(Viewport),
    SetScissor(bool),
    Clear(Color),
    SetBlend(Option<BlendMode>),
    UseShader(ShaderId),
    SetProjection(Mat4),
    SetModelview(Mat4),
    SetPosition(f32, f32),
    SetColor(Color),
    BindTexture(Option<TextureId>),
    DrawQuad(Quad),
    DrawLine(Point, Point),
}

/// Headless backend recording commands and tracking live GPU objects.
#[derive(Debug)]
pub struct RecordingBackend {
    commands: Vec<Command>,
    next_handle: u32,
    bound: Option<FramebufferId>,
    viewport: Viewport,
    textures: BTreeMap<TextureId, Option<(u32, u32)>>,
    framebuffers: BTreeSet<FramebufferId>,
    shaders: BTreeSet<ShaderId>,
    failing_shaders: HashSet<&'static str>,
    compile_attempts: usize,
}

impl RecordingBackend {
    /// A backend whose default target is `width x height`.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            commands: Vec::new(),
            next_handle: 1,
            bound: None,
            viewport: Viewport::new(0, 0, width, height),
            textures: BTreeMap::new(),
            framebuffers: BTreeSet::new(),
            shaders: BTreeSet::new(),
            failing_shaders: HashSet::new(),
            compile_attempts: 0,
        }
    }

    /// Make compilation of the shader named `name` fail.
    pub fn fail_shader(&mut self, name: &'static str) {
        self.failing_shaders.insert(name);
    }

    /// Every command recorded since creation or the last clear.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Forget recorded commands; live object tracking is kept.
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Take the recorded commands.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn live_framebuffers(&self) -> usize {
        self.framebuffers.len()
    }

    pub fn live_shaders(&self) -> usize {
        self.shaders.len()
    }

    /// Number of `compile_shader` calls, failed ones included.
    pub fn compile_attempts(&self) -> usize {
        self.compile_attempts
    }

    /// Storage size of a live texture, `None` if unallocated or deleted.
    pub fn texture_size(&self, texture: TextureId) -> Option<(u32, u32)> {
        self.textures.get(&texture).copied().flatten()
    }

    /// Number of quads drawn since the last clear.
    pub fn quads_drawn(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::DrawQuad(_)))
            .count()
    }

    fn handle(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }
}

impl Backend for RecordingBackend {
    fn create_texture(&mut self) -> TextureId {
        let id = TextureId(self.handle());
        self.textures.insert(id, None);
        self.commands.push(Command::CreateTexture(id));
        id
    }

    fn allocate_texture(&mut self, texture: TextureId, width: u32, height: u32) {
        if let Some(size) = self.textures.get_mut(&texture) {
            *size = Some((width, height));
        }
        self.commands.push(Command::AllocateTexture { texture, width, height });
    }

    fn upload_texture(&mut self, texture: TextureId, width: u32, height: u32, pixels: &[u8]) {
        debug_assert_eq!(pixels.len(), width as usize * height as usize * 4);
        if let Some(size) = self.textures.get_mut(&texture) {
            *size = Some((width, height));
        }
        self.commands.push(Command::UploadTexture { texture, width, height });
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
        self.commands.push(Command::DeleteTexture(texture));
    }

    fn create_framebuffer(&mut self) -> FramebufferId {
        let id = FramebufferId(self.handle());
        self.framebuffers.insert(id);
        self.commands.push(Command::CreateFramebuffer(id));
        id
    }

    fn attach_color(&mut self, framebuffer: FramebufferId, texture: TextureId) {
        self.commands.push(Command::AttachColor { framebuffer, texture });
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId) {
        self.framebuffers.remove(&framebuffer);
        if self.bound == Some(framebuffer) {
            self.bound = None;
        }
        self.commands.push(Command::DeleteFramebuffer(framebuffer));
    }

    fn compile_shader(&mut self, source: &ShaderSource) -> Result<ShaderId, BackendError> {
        self.compile_attempts += 1;
        self.commands.push(Command::CompileShader(source.name));
        if self.failing_shaders.contains(source.name) {
            return Err(BackendError::ShaderCompile {
                name: source.name.to_owned(),
                message: "rejected by recording backend".to_owned(),
            });
        }
        let id = ShaderId(self.handle());
        self.shaders.insert(id);
        Ok(id)
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.shaders.remove(&shader);
        self.commands.push(Command::DeleteShader(shader));
    }

    fn bound_framebuffer(&self) -> Option<FramebufferId> {
        self.bound
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.bound = framebuffer;
        self.commands.push(Command::BindFramebuffer(framebuffer));
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.commands.push(Command::SetViewport(viewport));
    }

    fn set_scissor(&mut self, enabled: bool) {
        self.commands.push(Command::SetScissor(enabled));
    }

    fn clear(&mut self, color: Color) {
        self.commands.push(Command::Clear(color));
    }

    fn set_blend(&mut self, mode: Option<BlendMode>) {
        self.commands.push(Command::SetBlend(mode));
    }

    fn use_shader(&mut self, shader: ShaderId) {
        self.commands.push(Command::UseShader(shader));
    }

    fn set_projection(&mut self, projection: &Mat4) {
        self.commands.push(Command::SetProjection(*projection));
    }

    fn set_modelview(&mut self, modelview: &Mat4) {
        self.commands.push(Command::SetModelview(*modelview));
    }

    fn set_position(&mut self, x: f32, y: f32) {
        self.commands.push(Command::SetPosition(x, y));
    }

    fn set_color(&mut self, color: Color) {
        self.commands.push(Command::SetColor(color));
    }

    fn bind_texture(&mut self, texture: Option<TextureId>) {
        self.commands.push(Command::BindTexture(texture));
    }

    fn draw_quad(&mut self, quad: &Quad) {
        self.commands.push(Command::DrawQuad(*quad));
    }

    fn draw_line(&mut self, from: Point, to: Point) {
        self.commands.push(Command::DrawLine(from, to));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ===========================================================================
// Tests
// ===========================================================================
