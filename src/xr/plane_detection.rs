use super::host::HostFrame;
use nalgebra::{UnitQuaternion, Vector3};
use std::collections::HashMap;

/// A detected real-world plane.
#[derive(Debug, Clone)]
pub struct XrPlane {
    pub id: u64,
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

/// Plane detection sub-module. The reported plane set is diffed by id each
/// AR frame; planes that vanish are dropped, stable ids are updated in place.
pub struct XrPlaneDetection {
    supported: bool,
    planes: HashMap<u64, XrPlane>,
}

impl XrPlaneDetection {
    pub(crate) fn new(supported: bool) -> Self {
        Self {
            supported,
            planes: HashMap::new(),
        }
    }

    pub fn supported(&self) -> bool {
        self.supported
    }

    pub fn len(&self) -> usize {
        self.planes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&XrPlane> {
        self.planes.get(&id)
    }

    pub fn planes(&self) -> impl Iterator<Item = &XrPlane> {
        self.planes.values()
    }

    pub(crate) fn update(&mut self, frame: &dyn HostFrame) {
        let samples = frame.detected_planes();
        self.planes
            .retain(|id, _| samples.iter().any(|sample| sample.id == *id));
        for sample in samples {
            let plane = self.planes.entry(sample.id).or_insert(XrPlane {
                id: sample.id,
                position: sample.position,
                rotation: sample.rotation,
            });
            plane.position = sample.position;
            plane.rotation = sample.rotation;
        }
    }

    pub(crate) fn reset(&mut self) {
        self.planes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xr::host::{PlaneSample, XrSpaceHandle, XrViewerPose};

    struct Frame {
        samples: Vec<PlaneSample>,
    }

    impl HostFrame for Frame {
        fn surface_size(&self) -> (u32, u32) {
            (0, 0)
        }
        fn viewer_pose(&self, _space: XrSpaceHandle) -> Option<XrViewerPose> {
            None
        }
        fn detected_planes(&self) -> Vec<PlaneSample> {
            self.samples.clone()
        }
    }

    fn plane(id: u64, y: f32) -> PlaneSample {
        PlaneSample {
            id,
            position: Vector3::new(0.0, y, 0.0),
            rotation: UnitQuaternion::identity(),
        }
    }

    #[test]
    fn test_diffing_adds_updates_and_removes() {
        let mut detection = XrPlaneDetection::new(true);
        detection.update(&Frame {
            samples: vec![plane(1, 0.0), plane(2, 1.0)],
        });
        assert_eq!(detection.len(), 2);

        detection.update(&Frame {
            samples: vec![plane(2, 1.5)],
        });
        assert_eq!(detection.len(), 1);
        assert!(detection.get(1).is_none());
        assert_eq!(detection.get(2).unwrap().position.y, 1.5);
    }

    #[test]
    fn test_reset_clears_planes() {
        let mut detection = XrPlaneDetection::new(true);
        detection.update(&Frame {
            samples: vec![plane(1, 0.0)],
        });
        detection.reset();
        assert!(detection.is_empty());
    }
}
