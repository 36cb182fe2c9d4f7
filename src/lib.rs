//! Gyrotron: XR session and view management for realtime rendering engines.
//! Negotiates immersive sessions against a host XR platform, keeps camera and
//! render state in sync with the live session, and recycles per-eye view
//! records through a persistent pool every frame. The host platform, graphics
//! device and scene graph are collaborators behind trait boundaries, so the
//! whole lifecycle can be driven (and tested) without a headset attached.

pub mod camera;
pub mod events;
pub mod gfx;
pub mod xr;

pub use camera::{Camera, CameraEvent, Node, RenderCamera};
pub use events::{EventEmitter, ListenerKey};
pub use gfx::{GraphicsDevice, RenderSurface, RenderSurfaceConfig};
pub use xr::{
    StartOptions, XrError, XrEvent, XrManager, XrSessionKind, XrSpaceKind, XrVisibility,
};
