use super::host::XrViewPose;
use nalgebra::{Isometry3, Matrix3, Matrix4, Translation3, UnitQuaternion, Vector3};

/// Pixel rectangle of a view within the session render surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Render parameters of one eye/surface for the current frame.
///
/// Records are pooled: a view pulled from the free list still carries the
/// matrices of the frame it last served and is fully overwritten before it is
/// read again.
#[derive(Debug, Clone)]
pub struct XrView {
    pub viewport: Viewport,
    pub proj_mat: Matrix4<f32>,
    pub view_mat: Matrix4<f32>,
    pub view_inv_mat: Matrix4<f32>,
    pub view_off_mat: Matrix4<f32>,
    pub view_inv_off_mat: Matrix4<f32>,
    pub proj_view_off_mat: Matrix4<f32>,
    pub view_mat3: Matrix3<f32>,
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

impl XrView {
    fn blank() -> Self {
        Self {
            viewport: Viewport::default(),
            proj_mat: Matrix4::identity(),
            view_mat: Matrix4::identity(),
            view_inv_mat: Matrix4::identity(),
            view_off_mat: Matrix4::identity(),
            view_inv_off_mat: Matrix4::identity(),
            proj_view_off_mat: Matrix4::identity(),
            view_mat3: Matrix3::identity(),
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Overwrite every field from the device-reported per-view pose.
    ///
    /// The reported transform is the forward (view-inverse) matrix; the view
    /// matrix is its rigid inverse. Offset variants compose the camera node's
    /// parent transform for multi-view composition.
    pub(crate) fn write_from_pose(&mut self, pose: &XrViewPose, parent: &Isometry3<f32>) {
        let transform = Isometry3::from_parts(Translation3::from(pose.position), pose.rotation);
        let offset = parent * transform;
        let offset_inv = offset.inverse();

        self.proj_mat = pose.projection;
        self.view_inv_mat = transform.to_homogeneous();
        self.view_mat = transform.inverse().to_homogeneous();
        self.view_inv_off_mat = offset.to_homogeneous();
        self.view_off_mat = offset_inv.to_homogeneous();
        self.proj_view_off_mat = self.proj_mat * self.view_off_mat;
        self.view_mat3 = *offset_inv.rotation.to_rotation_matrix().matrix();
        self.position = offset.translation.vector;
        self.rotation = offset.rotation;
        self.viewport = pose.viewport;
    }
}

/// Arena of view records with an active list and a free list.
///
/// The pool persists across sessions and is never shrunk; resizing the active
/// list moves records between the two lists, allocating a fresh record only
/// when the free list is empty.
pub(crate) struct ViewPool {
    active: Vec<XrView>,
    free: Vec<XrView>,
    allocated: usize,
}

impl ViewPool {
    pub fn new() -> Self {
        Self {
            active: Vec::new(),
            free: Vec::new(),
            allocated: 0,
        }
    }

    pub fn active(&self) -> &[XrView] {
        &self.active
    }

    pub fn active_mut(&mut self) -> &mut [XrView] {
        &mut self.active
    }

    pub fn resize(&mut self, target: usize) {
        while self.active.len() < target {
            let view = self.free.pop().unwrap_or_else(|| {
                self.allocated += 1;
                XrView::blank()
            });
            self.active.push(view);
        }
        while self.active.len() > target {
            // Surplus records go back to the free list, never away.
            let view = match self.active.pop() {
                Some(view) => view,
                None => break,
            };
            self.free.push(view);
        }
    }

    /// Total records ever allocated.
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    pub fn free_len(&self) -> usize {
        self.free.len()
    }
}
