use crate::events::EventEmitter;
use log::warn;
use nalgebra::{Isometry3, UnitQuaternion, Vector3};

/// Clip-plane change notification fired by [`Camera::set_near_clip`] and
/// [`Camera::set_far_clip`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraEvent {
    NearClip(f32),
    FarClip(f32),
}

/// Scene-graph attachment point for a camera.
///
/// The XR manager writes the tracked head pose into the local position and
/// rotation every frame; the parent transform is the coordinate frame the
/// tracked pose is composed with when building per-view offset matrices.
#[derive(Debug, Clone)]
pub struct Node {
    local_position: Vector3<f32>,
    local_rotation: UnitQuaternion<f32>,
    parent_transform: Isometry3<f32>,
}

impl Node {
    pub fn new() -> Self {
        Self {
            local_position: Vector3::zeros(),
            local_rotation: UnitQuaternion::identity(),
            parent_transform: Isometry3::identity(),
        }
    }

    pub fn local_position(&self) -> Vector3<f32> {
        self.local_position
    }

    pub fn local_rotation(&self) -> UnitQuaternion<f32> {
        self.local_rotation
    }

    pub fn set_local_position(&mut self, position: Vector3<f32>) {
        self.local_position = position;
    }

    pub fn set_local_rotation(&mut self, rotation: UnitQuaternion<f32>) {
        self.local_rotation = rotation;
    }

    pub fn parent_transform(&self) -> Isometry3<f32> {
        self.parent_transform
    }

    pub fn set_parent_transform(&mut self, transform: Isometry3<f32>) {
        self.parent_transform = transform;
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

/// The renderer-facing side of a camera.
///
/// `xr_driven` is the cross-reference the XR manager installs while it drives
/// this camera. It carries no ownership; it is set and cleared only by the
/// manager's attach/detach pair, symmetrically around the session window.
#[derive(Debug, Clone, Default)]
pub struct RenderCamera {
    xr_driven: bool,
}

impl RenderCamera {
    /// True while an active or starting XR session drives this camera.
    pub fn is_xr_driven(&self) -> bool {
        self.xr_driven
    }

    pub(crate) fn set_xr_driven(&mut self, driven: bool) {
        self.xr_driven = driven;
    }
}

/// Camera component bound into XR sessions.
pub struct Camera {
    pub node: Node,
    /// Clip-plane change notifications. The XR manager keeps one listener
    /// registered here for the lifetime of an active session.
    pub events: EventEmitter<CameraEvent>,
    render_camera: RenderCamera,
    near_clip: f32,
    far_clip: f32,
    depth_map_requests: u32,
}

impl Camera {
    pub fn new(near_clip: f32, far_clip: f32) -> Self {
        Self {
            node: Node::new(),
            events: EventEmitter::new(),
            render_camera: RenderCamera::default(),
            near_clip,
            far_clip,
            depth_map_requests: 0,
        }
    }

    pub fn near_clip(&self) -> f32 {
        self.near_clip
    }

    pub fn far_clip(&self) -> f32 {
        self.far_clip
    }

    pub fn set_near_clip(&mut self, value: f32) {
        self.near_clip = value;
        self.events.emit(&CameraEvent::NearClip(value));
    }

    pub fn set_far_clip(&mut self, value: f32) {
        self.far_clip = value;
        self.events.emit(&CameraEvent::FarClip(value));
    }

    pub fn render_camera(&self) -> &RenderCamera {
        &self.render_camera
    }

    pub(crate) fn render_camera_mut(&mut self) -> &mut RenderCamera {
        &mut self.render_camera
    }

    /// Accumulative scene depth map request.
    ///
    /// Each enable must be balanced by one disable; disabling more often than
    /// enabling saturates at zero instead of wrapping.
    pub fn request_scene_depth_map(&mut self, enable: bool) {
        if enable {
            self.depth_map_requests += 1;
        } else {
            debug_assert!(
                self.depth_map_requests > 0,
                "scene depth map disabled more times than it was enabled"
            );
            if self.depth_map_requests == 0 {
                warn!("scene depth map disabled while not requested");
                return;
            }
            self.depth_map_requests -= 1;
        }
    }

    pub fn scene_depth_map_requested(&self) -> bool {
        self.depth_map_requests > 0
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(0.1, 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_clip_changes_fire_events() {
        let mut camera = Camera::new(0.1, 1000.0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        camera.events.on(move |event: &CameraEvent| s.borrow_mut().push(*event));

        camera.set_near_clip(0.5);
        camera.set_far_clip(500.0);
        assert_eq!(
            *seen.borrow(),
            vec![CameraEvent::NearClip(0.5), CameraEvent::FarClip(500.0)]
        );
        assert_eq!(camera.near_clip(), 0.5);
        assert_eq!(camera.far_clip(), 500.0);
    }

    #[test]
    fn test_depth_map_counter_balances() {
        let mut camera = Camera::default();
        assert!(!camera.scene_depth_map_requested());
        camera.request_scene_depth_map(true);
        camera.request_scene_depth_map(true);
        camera.request_scene_depth_map(false);
        assert!(camera.scene_depth_map_requested());
        camera.request_scene_depth_map(false);
        assert!(!camera.scene_depth_map_requested());
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_depth_map_counter_never_underflows() {
        let mut camera = Camera::default();
        camera.request_scene_depth_map(false);
        camera.request_scene_depth_map(true);
        assert!(camera.scene_depth_map_requested());
    }

    #[test]
    fn test_render_camera_flag_defaults_off() {
        let camera = Camera::default();
        assert!(!camera.render_camera().is_xr_driven());
    }
}
