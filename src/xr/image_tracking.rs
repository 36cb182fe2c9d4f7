use super::host::HostFrame;
use nalgebra::{UnitQuaternion, Vector3};

/// An image configured for tracking, identified by an opaque asset id and its
/// expected physical width in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedImage {
    pub image_id: u64,
    pub width_m: f32,
}

/// Per-image tracking state for the current session.
#[derive(Debug, Clone)]
pub struct XrTrackedImageState {
    pub image: TrackedImage,
    pub tracked: bool,
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

/// Image tracking sub-module.
///
/// Images are configured before `start`; preparation runs asynchronously as a
/// pre-flight of session negotiation and gates `available`.
pub struct XrImageTracking {
    supported: bool,
    available: bool,
    images: Vec<TrackedImage>,
    states: Vec<XrTrackedImageState>,
}

impl XrImageTracking {
    pub(crate) fn new(supported: bool) -> Self {
        Self {
            supported,
            available: false,
            images: Vec::new(),
            states: Vec::new(),
        }
    }

    pub fn supported(&self) -> bool {
        self.supported
    }

    /// True once preparation succeeded for the current session.
    pub fn available(&self) -> bool {
        self.available
    }

    pub fn add_image(&mut self, image_id: u64, width_m: f32) {
        self.images.push(TrackedImage { image_id, width_m });
    }

    pub fn images(&self) -> &[TrackedImage] {
        &self.images
    }

    pub fn states(&self) -> &[XrTrackedImageState] {
        &self.states
    }

    pub(crate) fn on_prepared(&mut self, prepared: &Option<Vec<TrackedImage>>) {
        self.available = prepared.is_some();
        self.states = self
            .images
            .iter()
            .map(|image| XrTrackedImageState {
                image: *image,
                tracked: false,
                position: Vector3::zeros(),
                rotation: UnitQuaternion::identity(),
            })
            .collect();
    }

    pub(crate) fn update(&mut self, frame: &dyn HostFrame) {
        for sample in frame.tracked_images() {
            if let Some(state) = self.states.get_mut(sample.index) {
                state.tracked = sample.tracked;
                state.position = sample.position;
                state.rotation = sample.rotation;
            }
        }
    }

    pub(crate) fn reset(&mut self) {
        self.available = false;
        self.states.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xr::host::{TrackedImageSample, XrSpaceHandle, XrViewerPose};

    struct Frame {
        samples: Vec<TrackedImageSample>,
    }

    impl HostFrame for Frame {
        fn surface_size(&self) -> (u32, u32) {
            (0, 0)
        }
        fn viewer_pose(&self, _space: XrSpaceHandle) -> Option<XrViewerPose> {
            None
        }
        fn tracked_images(&self) -> Vec<TrackedImageSample> {
            self.samples.clone()
        }
    }

    #[test]
    fn test_preparation_gates_availability() {
        let mut tracking = XrImageTracking::new(true);
        tracking.add_image(7, 0.2);
        assert!(!tracking.available());
        tracking.on_prepared(&Some(vec![TrackedImage {
            image_id: 7,
            width_m: 0.2,
        }]));
        assert!(tracking.available());
        assert_eq!(tracking.states().len(), 1);
    }

    #[test]
    fn test_update_marks_tracked_images() {
        let mut tracking = XrImageTracking::new(true);
        tracking.add_image(7, 0.2);
        tracking.on_prepared(&Some(vec![]));
        tracking.update(&Frame {
            samples: vec![TrackedImageSample {
                index: 0,
                tracked: true,
                position: Vector3::new(0.0, 1.0, -2.0),
                rotation: UnitQuaternion::identity(),
            }],
        });
        assert!(tracking.states()[0].tracked);
        assert_eq!(tracking.states()[0].position.z, -2.0);
    }

    #[test]
    fn test_reset_clears_session_state_but_keeps_images() {
        let mut tracking = XrImageTracking::new(true);
        tracking.add_image(7, 0.2);
        tracking.on_prepared(&Some(vec![]));
        tracking.reset();
        assert!(!tracking.available());
        assert!(tracking.states().is_empty());
        assert_eq!(tracking.images().len(), 1);
    }
}
