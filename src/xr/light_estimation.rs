use super::host::HostFrame;
use nalgebra::{UnitQuaternion, Vector3};

/// Ambient light estimate, refreshed once per AR frame.
pub struct XrLightEstimation {
    supported: bool,
    available: bool,
    intensity: f32,
    color: Vector3<f32>,
    rotation: UnitQuaternion<f32>,
}

impl XrLightEstimation {
    pub(crate) fn new(supported: bool) -> Self {
        Self {
            supported,
            available: false,
            intensity: 0.0,
            color: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
        }
    }

    pub fn supported(&self) -> bool {
        self.supported
    }

    /// True while the current frame produced an estimate.
    pub fn available(&self) -> bool {
        self.available
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn color(&self) -> Vector3<f32> {
        self.color
    }

    /// Dominant light direction as a rotation from -Z.
    pub fn rotation(&self) -> UnitQuaternion<f32> {
        self.rotation
    }

    pub(crate) fn update(&mut self, frame: &dyn HostFrame) {
        match frame.light_estimate() {
            Some(estimate) => {
                self.available = true;
                self.intensity = estimate.intensity;
                self.color = estimate.color;
                self.rotation = estimate.rotation;
            }
            None => self.available = false,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.available = false;
        self.intensity = 0.0;
        self.color = Vector3::zeros();
        self.rotation = UnitQuaternion::identity();
    }
}
