/// Opaque handle to a device-owned render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSurface(pub u64);

/// Configuration for a session render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSurfaceConfig {
    pub alpha: bool,
    pub depth: bool,
    pub stencil: bool,
    pub width: u32,
    pub height: u32,
}

/// Boundary to the low-level graphics device.
///
/// The XR manager only ever needs the current backbuffer resolution, a way to
/// propagate session-driven resolution changes, and a factory for the render
/// surface a session composites from.
pub trait GraphicsDevice {
    fn resolution(&self) -> (u32, u32);
    fn set_resolution(&mut self, width: u32, height: u32);
    fn create_render_surface(&mut self, config: RenderSurfaceConfig) -> RenderSurface;
}
