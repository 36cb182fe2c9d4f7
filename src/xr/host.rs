//! Boundary to the host XR platform.
//!
//! The platform is an opaque asynchronous service: requests issued through
//! [`XrHost`] and [`HostSession`] return immediately, and their one-shot
//! completions come back as [`HostEvent`] messages the embedding application
//! forwards to [`XrManager::handle_host_event`](super::XrManager::handle_host_event).
//! Everything runs on the one event loop shared with rendering; nothing here
//! is cancellable once issued.

use super::image_tracking::TrackedImage;
use super::options::{RenderStateUpdate, SessionInit, XrSessionKind, XrSpaceKind, XrVisibility};
use super::view::Viewport;
use nalgebra::{Matrix4, UnitQuaternion, Vector3};

/// Opaque handle to a host-side reference space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XrSpaceHandle(pub u64);

/// Which optional capabilities the host can negotiate.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostCapabilities {
    pub hit_test: bool,
    pub light_estimation: bool,
    pub depth_sensing: bool,
    pub image_tracking: bool,
    pub plane_detection: bool,
    pub dom_overlay: bool,
    pub hand_tracking: bool,
}

/// Head pose for one frame, with one entry per view.
#[derive(Debug, Clone)]
pub struct XrViewerPose {
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub views: Vec<XrViewPose>,
}

/// Device-reported parameters of a single view.
///
/// `position`/`rotation` are the forward transform of the view; the view
/// matrix is its inverse.
#[derive(Debug, Clone)]
pub struct XrViewPose {
    pub projection: Matrix4<f32>,
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub viewport: Viewport,
}

#[derive(Debug, Clone)]
pub struct InputSourceSample {
    pub id: u64,
    pub origin: Vector3<f32>,
    pub direction: Vector3<f32>,
    pub selecting: bool,
}

#[derive(Debug, Clone)]
pub struct HitTestResult {
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

#[derive(Debug, Clone)]
pub struct LightEstimate {
    pub intensity: f32,
    pub color: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

#[derive(Debug, Clone, Copy)]
pub struct DepthSample {
    pub width: u32,
    pub height: u32,
    pub raw_value_to_meters: f32,
}

#[derive(Debug, Clone)]
pub struct TrackedImageSample {
    /// Index into the configured image set.
    pub index: usize,
    pub tracked: bool,
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

#[derive(Debug, Clone)]
pub struct PlaneSample {
    pub id: u64,
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

/// Entry point to the host XR platform.
pub trait XrHost {
    /// Whether the host exposes an XR system at all.
    fn supported(&self) -> bool;

    /// Capabilities the host can negotiate into sessions.
    fn capabilities(&self) -> HostCapabilities;

    /// Issue an asynchronous support query for a session kind.
    /// Completes as [`HostEvent::Availability`].
    fn query_availability(&mut self, kind: XrSessionKind);

    /// Ask the host to create a session.
    /// Completes as [`HostEvent::SessionCreated`].
    fn request_session(&mut self, kind: XrSessionKind, init: SessionInit);

    /// Prepare tracked images ahead of a session request.
    /// Completes as [`HostEvent::ImagesPrepared`].
    fn prepare_tracked_images(&mut self, images: Vec<TrackedImage>);
}

/// A live host session.
pub trait HostSession {
    /// Request the tracking reference space.
    /// Completes as [`HostEvent::ReferenceSpaceCreated`].
    fn request_reference_space(&mut self, kind: XrSpaceKind);

    /// Push a render-state update. Fire-and-forget.
    fn update_render_state(&mut self, update: RenderStateUpdate);

    /// Ask the host to terminate the session.
    /// Completes as [`HostEvent::SessionEnded`].
    fn request_end(&mut self);

    fn visibility(&self) -> XrVisibility;
}

/// Per-frame data handed to [`XrManager::update`](super::XrManager::update) by
/// the host's frame callback.
///
/// The capability accessors default to "nothing this frame" so hosts only
/// implement what they negotiate.
pub trait HostFrame {
    /// Current pixel dimensions of the session render surface.
    fn surface_size(&self) -> (u32, u32);

    /// Viewer pose for the given reference space. `None` is a normal
    /// condition (tracking loss), not an error.
    fn viewer_pose(&self, space: XrSpaceHandle) -> Option<XrViewerPose>;

    fn input_sources(&self) -> Vec<InputSourceSample> {
        Vec::new()
    }

    fn hit_test_results(&self, source: u64) -> Vec<HitTestResult> {
        let _ = source;
        Vec::new()
    }

    fn light_estimate(&self) -> Option<LightEstimate> {
        None
    }

    fn depth_sample(&self) -> Option<DepthSample> {
        None
    }

    fn tracked_images(&self) -> Vec<TrackedImageSample> {
        Vec::new()
    }

    fn detected_planes(&self) -> Vec<PlaneSample> {
        Vec::new()
    }
}

/// Completion and lifecycle messages from the host.
pub enum HostEvent {
    /// The set of attached XR devices changed; availability is re-queried.
    DeviceChanged,
    /// Completion of [`XrHost::query_availability`].
    Availability {
        kind: XrSessionKind,
        result: anyhow::Result<bool>,
    },
    /// Completion of [`XrHost::request_session`].
    SessionCreated(anyhow::Result<Box<dyn HostSession>>),
    /// Completion of [`XrHost::prepare_tracked_images`]. The payload is
    /// attached to the pending session request when present.
    ImagesPrepared(anyhow::Result<Option<Vec<TrackedImage>>>),
    /// Completion of [`HostSession::request_reference_space`].
    ReferenceSpaceCreated(anyhow::Result<XrSpaceHandle>),
    /// The session ended, whether through [`HostSession::request_end`] or by
    /// the device.
    SessionEnded,
    VisibilityChanged(XrVisibility),
}
