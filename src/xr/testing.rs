//! Fakes for the host platform and graphics device boundaries.
//!
//! Each fake records the requests issued against it through a shared log so
//! tests can observe side effects (or their required absence) without a real
//! XR runtime.

use super::host::{
    DepthSample, HostCapabilities, HostFrame, HostSession, InputSourceSample, LightEstimate,
    PlaneSample, TrackedImageSample, XrHost, XrSpaceHandle, XrViewerPose, XrViewPose,
};
use super::image_tracking::TrackedImage;
use super::options::{RenderStateUpdate, SessionInit, XrSessionKind, XrSpaceKind, XrVisibility};
use super::view::Viewport;
use crate::gfx::{GraphicsDevice, RenderSurface, RenderSurfaceConfig};
use nalgebra::{Matrix4, UnitQuaternion, Vector3};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
pub(crate) struct HostLog {
    pub queries: Vec<XrSessionKind>,
    pub session_requests: Vec<(XrSessionKind, SessionInit)>,
    pub prepare_requests: Vec<Vec<TrackedImage>>,
}

pub(crate) struct FakeHost {
    pub supported: bool,
    pub caps: HostCapabilities,
    pub log: Rc<RefCell<HostLog>>,
}

impl FakeHost {
    pub fn new(caps: HostCapabilities) -> (Self, Rc<RefCell<HostLog>>) {
        let log = Rc::new(RefCell::new(HostLog::default()));
        (
            Self {
                supported: true,
                caps,
                log: log.clone(),
            },
            log,
        )
    }
}

impl XrHost for FakeHost {
    fn supported(&self) -> bool {
        self.supported
    }

    fn capabilities(&self) -> HostCapabilities {
        self.caps
    }

    fn query_availability(&mut self, kind: XrSessionKind) {
        self.log.borrow_mut().queries.push(kind);
    }

    fn request_session(&mut self, kind: XrSessionKind, init: SessionInit) {
        self.log.borrow_mut().session_requests.push((kind, init));
    }

    fn prepare_tracked_images(&mut self, images: Vec<TrackedImage>) {
        self.log.borrow_mut().prepare_requests.push(images);
    }
}

#[derive(Default)]
pub(crate) struct SessionLog {
    pub render_updates: Vec<RenderStateUpdate>,
    pub space_requests: Vec<XrSpaceKind>,
    pub end_requests: usize,
}

pub(crate) struct FakeSession {
    pub log: Rc<RefCell<SessionLog>>,
    pub visibility: XrVisibility,
}

impl FakeSession {
    pub fn new() -> (Self, Rc<RefCell<SessionLog>>) {
        let log = Rc::new(RefCell::new(SessionLog::default()));
        (
            Self {
                log: log.clone(),
                visibility: XrVisibility::Visible,
            },
            log,
        )
    }
}

impl HostSession for FakeSession {
    fn request_reference_space(&mut self, kind: XrSpaceKind) {
        self.log.borrow_mut().space_requests.push(kind);
    }

    fn update_render_state(&mut self, update: RenderStateUpdate) {
        self.log.borrow_mut().render_updates.push(update);
    }

    fn request_end(&mut self) {
        self.log.borrow_mut().end_requests += 1;
    }

    fn visibility(&self) -> XrVisibility {
        self.visibility
    }
}

#[derive(Default)]
pub(crate) struct DeviceLog {
    pub resizes: Vec<(u32, u32)>,
    pub surfaces: Vec<RenderSurfaceConfig>,
}

pub(crate) struct FakeDevice {
    pub resolution: (u32, u32),
    pub log: Rc<RefCell<DeviceLog>>,
    next_surface: u64,
}

impl FakeDevice {
    pub fn new(width: u32, height: u32) -> (Self, Rc<RefCell<DeviceLog>>) {
        let log = Rc::new(RefCell::new(DeviceLog::default()));
        (
            Self {
                resolution: (width, height),
                log: log.clone(),
                next_surface: 0,
            },
            log,
        )
    }
}

impl GraphicsDevice for FakeDevice {
    fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    fn set_resolution(&mut self, width: u32, height: u32) {
        self.resolution = (width, height);
        self.log.borrow_mut().resizes.push((width, height));
    }

    fn create_render_surface(&mut self, config: RenderSurfaceConfig) -> RenderSurface {
        self.log.borrow_mut().surfaces.push(config);
        self.next_surface += 1;
        RenderSurface(self.next_surface)
    }
}

/// A frame with a configurable pose and capability samples.
pub(crate) struct FakeFrame {
    pub size: (u32, u32),
    pub pose: Option<XrViewerPose>,
    pub inputs: Vec<InputSourceSample>,
    pub planes: Vec<PlaneSample>,
    pub light: Option<LightEstimate>,
    pub depth: Option<DepthSample>,
    pub images: Vec<TrackedImageSample>,
}

impl FakeFrame {
    /// A frame whose pose reports `count` side-by-side views.
    pub fn with_views(width: u32, height: u32, count: usize) -> Self {
        let view_width = if count > 0 { width / count as u32 } else { 0 };
        let views = (0..count)
            .map(|index| XrViewPose {
                projection: Matrix4::identity(),
                position: Vector3::zeros(),
                rotation: UnitQuaternion::identity(),
                viewport: Viewport {
                    x: index as u32 * view_width,
                    y: 0,
                    width: view_width,
                    height,
                },
            })
            .collect();
        Self {
            size: (width, height),
            pose: Some(XrViewerPose {
                position: Vector3::zeros(),
                rotation: UnitQuaternion::identity(),
                views,
            }),
            inputs: Vec::new(),
            planes: Vec::new(),
            light: None,
            depth: None,
            images: Vec::new(),
        }
    }

    /// A frame with no viewer pose (tracking loss).
    pub fn without_pose(width: u32, height: u32) -> Self {
        let mut frame = Self::with_views(width, height, 0);
        frame.pose = None;
        frame
    }
}

impl HostFrame for FakeFrame {
    fn surface_size(&self) -> (u32, u32) {
        self.size
    }

    fn viewer_pose(&self, _space: XrSpaceHandle) -> Option<XrViewerPose> {
        self.pose.clone()
    }

    fn input_sources(&self) -> Vec<InputSourceSample> {
        self.inputs.clone()
    }

    fn light_estimate(&self) -> Option<LightEstimate> {
        self.light.clone()
    }

    fn depth_sample(&self) -> Option<DepthSample> {
        self.depth
    }

    fn tracked_images(&self) -> Vec<TrackedImageSample> {
        self.images.clone()
    }

    fn detected_planes(&self) -> Vec<PlaneSample> {
        self.planes.clone()
    }
}
