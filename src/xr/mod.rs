//! XR session and view management.
//!
//! [`XrManager`] coordinates the host XR platform through its full lifecycle:
//! - capability registry: which session kinds the device currently supports,
//!   refreshed on device changes;
//! - session negotiation: assembling the feature request and driving the
//!   asynchronous session start, including the tracked-image pre-flight;
//! - reference-space and render-state binding once a session exists;
//! - per-frame pose/view synchronization through a persistent view pool;
//! - teardown, from explicit `end`, device-driven end, or a failed bind.
//!
//! Session lifecycle: Idle -> Requesting -> Binding -> Active -> Ending -> Idle.
//! Requesting drops back to Idle on negotiation failure; Binding moves to
//! Ending (with the end notification suppressed) when the reference-space
//! request fails.
//!
//! The host platform is asynchronous but single-threaded: requests return
//! immediately and their completions arrive as [`HostEvent`] messages fed to
//! [`XrManager::handle_host_event`] by the embedding application's event loop.

pub mod depth_sensing;
pub mod dom_overlay;
mod error;
pub mod host;
pub mod image_tracking;
pub mod input;
pub mod light_estimation;
mod options;
pub mod plane_detection;
mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use error::XrError;
pub use options::{
    RenderStateUpdate, SessionFeature, SessionInit, StartOptions, XrSessionKind, XrSpaceKind,
    XrVisibility,
};
pub use view::{Viewport, XrView};

use crate::camera::{Camera, CameraEvent};
use crate::events::ListenerKey;
use crate::gfx::{GraphicsDevice, RenderSurface, RenderSurfaceConfig};
use depth_sensing::{DepthSensingConfig, XrDepthSensing};
use dom_overlay::XrDomOverlay;
use hit_test::XrHitTest;
use host::{HostEvent, HostFrame, HostSession, XrHost, XrSpaceHandle};
use image_tracking::XrImageTracking;
use input::XrInput;
use light_estimation::XrLightEstimation;
use log::{info, warn};
use nalgebra::{Isometry3, UnitQuaternion, Vector3};
use plane_detection::XrPlaneDetection;
use slotmap::SlotMap;
use std::cell::RefCell;
use std::rc::Rc;
use view::ViewPool;

/// Notifications broadcast by the manager. Dispatch is synchronous and
/// fire-and-forget.
pub enum XrEvent<'a> {
    /// A session kind's availability changed (fired on transitions only).
    Available {
        kind: XrSessionKind,
        available: bool,
    },
    /// A session became fully active.
    Start,
    /// The active session ended.
    End,
    /// A frame was processed; carries the raw frame for consumers that need
    /// per-frame host access.
    Update(&'a dyn HostFrame),
    /// A failure occurred; the same error was also delivered to the caller
    /// whose request triggered it.
    Error(&'a XrError),
}

struct Observer {
    callback: Box<dyn FnMut(&XrEvent)>,
    once: bool,
}

/// Listener registry for [`XrEvent`]. Kept separate from the generic emitter
/// because the payloads borrow per-frame data.
#[derive(Default)]
struct Observers {
    listeners: SlotMap<ListenerKey, Observer>,
}

impl Observers {
    fn insert(&mut self, callback: Box<dyn FnMut(&XrEvent)>, once: bool) -> ListenerKey {
        self.listeners.insert(Observer { callback, once })
    }

    fn remove(&mut self, key: ListenerKey) -> bool {
        self.listeners.remove(key).is_some()
    }

    fn emit(&mut self, event: &XrEvent) {
        let keys: Vec<ListenerKey> = self.listeners.keys().collect();
        for key in keys {
            let once = match self.listeners.get_mut(key) {
                Some(observer) => {
                    (observer.callback)(event);
                    observer.once
                }
                None => continue,
            };
            if once {
                self.listeners.remove(key);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionPhase {
    Idle,
    Requesting,
    Binding,
    Active,
    Ending,
}

/// The live session plus the depth range currently bound to it. Shared with
/// the camera clip-plane listener so incremental updates can reach the host
/// without re-entering the manager.
struct SessionHandle {
    api: Box<dyn HostSession>,
    depth_near: f32,
    depth_far: f32,
}

/// A start whose session request is deferred behind image preparation.
struct PendingStart {
    kind: XrSessionKind,
    init: SessionInit,
}

type StartCallback = Box<dyn FnOnce(Result<(), XrError>)>;

/// Manager for XR sessions, views and capability sub-modules.
pub struct XrManager {
    host: Box<dyn XrHost>,
    device: Rc<RefCell<dyn GraphicsDevice>>,
    supported: bool,
    available: [bool; 3],
    phase: SessionPhase,
    kind: Option<XrSessionKind>,
    space_kind: Option<XrSpaceKind>,
    session: Option<Rc<RefCell<SessionHandle>>>,
    reference_space: Option<XrSpaceHandle>,
    base_layer: Option<RenderSurface>,
    surface_size: (u32, u32),
    camera: Option<Rc<RefCell<Camera>>>,
    clip_listener: Option<ListenerKey>,
    views: ViewPool,
    local_position: Vector3<f32>,
    local_rotation: UnitQuaternion<f32>,
    visibility: XrVisibility,
    observers: Observers,
    start_callback: Option<StartCallback>,
    end_listeners: Vec<StartCallback>,
    pending: Option<PendingStart>,
    suppress_end_event: bool,
    wake_requested: bool,

    pub input: XrInput,
    pub hit_test: XrHitTest,
    pub light_estimation: XrLightEstimation,
    pub depth_sensing: XrDepthSensing,
    pub image_tracking: XrImageTracking,
    pub plane_detection: XrPlaneDetection,
    pub dom_overlay: XrDomOverlay,
}

impl XrManager {
    /// Create a manager bound to a host platform and a graphics device.
    ///
    /// If the host exposes XR at all, one availability query per session kind
    /// is issued immediately.
    pub fn new(mut host: Box<dyn XrHost>, device: Rc<RefCell<dyn GraphicsDevice>>) -> Self {
        let supported = host.supported();
        let caps = host.capabilities();
        if supported {
            for kind in &XrSessionKind::ALL {
                host.query_availability(*kind);
            }
        }
        Self {
            host,
            device,
            supported,
            available: [false; 3],
            phase: SessionPhase::Idle,
            kind: None,
            space_kind: None,
            session: None,
            reference_space: None,
            base_layer: None,
            surface_size: (0, 0),
            camera: None,
            clip_listener: None,
            views: ViewPool::new(),
            local_position: Vector3::zeros(),
            local_rotation: UnitQuaternion::identity(),
            visibility: XrVisibility::default(),
            observers: Observers::default(),
            start_callback: None,
            end_listeners: Vec::new(),
            pending: None,
            suppress_end_event: false,
            wake_requested: false,
            input: XrInput::new(),
            hit_test: XrHitTest::new(caps.hit_test),
            light_estimation: XrLightEstimation::new(caps.light_estimation),
            depth_sensing: XrDepthSensing::new(caps.depth_sensing),
            image_tracking: XrImageTracking::new(caps.image_tracking),
            plane_detection: XrPlaneDetection::new(caps.plane_detection),
            dom_overlay: XrDomOverlay::new(caps.dom_overlay),
        }
    }

    /// Whether the host exposes an XR system at all.
    pub fn supported(&self) -> bool {
        self.supported
    }

    /// Availability of a session kind, as of the last completed check.
    pub fn is_available(&self, kind: XrSessionKind) -> bool {
        self.available[kind.index()]
    }

    /// True while a session is fully active.
    pub fn active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    pub fn session_kind(&self) -> Option<XrSessionKind> {
        self.kind
    }

    pub fn space_kind(&self) -> Option<XrSpaceKind> {
        self.space_kind
    }

    /// True from session creation until teardown completes (includes the
    /// binding and ending phases).
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn camera(&self) -> Option<Rc<RefCell<Camera>>> {
        self.camera.clone()
    }

    pub fn visibility(&self) -> XrVisibility {
        self.visibility
    }

    pub fn base_layer(&self) -> Option<RenderSurface> {
        self.base_layer
    }

    /// Active per-view records for the current frame.
    pub fn views(&self) -> &[XrView] {
        self.views.active()
    }

    /// Tracked head position, local to the camera's parent.
    pub fn local_position(&self) -> Vector3<f32> {
        self.local_position
    }

    /// Tracked head rotation, local to the camera's parent.
    pub fn local_rotation(&self) -> UnitQuaternion<f32> {
        self.local_rotation
    }

    /// Register a notification listener.
    pub fn on<F>(&mut self, callback: F) -> ListenerKey
    where
        F: FnMut(&XrEvent) + 'static,
    {
        self.observers.insert(Box::new(callback), false)
    }

    /// Register a notification listener removed after its first invocation.
    pub fn once<F>(&mut self, callback: F) -> ListenerKey
    where
        F: FnOnce(&XrEvent) + 'static,
    {
        let mut callback = Some(callback);
        self.observers.insert(
            Box::new(move |event| {
                if let Some(callback) = callback.take() {
                    callback(event);
                }
            }),
            true,
        )
    }

    pub fn off(&mut self, key: ListenerKey) -> bool {
        self.observers.remove(key)
    }

    /// Re-issue one availability query per session kind. Also runs on
    /// device-change notifications.
    pub fn refresh_availability(&mut self) {
        if !self.host.supported() {
            return;
        }
        for kind in &XrSessionKind::ALL {
            self.host.query_availability(*kind);
        }
    }

    /// Drain the pending render-loop wake-up request. Set when a session
    /// becomes active or ends, since the host's own frame callback will not
    /// fire again until the loop ticks once.
    pub fn take_wake_request(&mut self) -> bool {
        std::mem::replace(&mut self.wake_requested, false)
    }

    /// Begin a session of the given kind against the given reference space.
    ///
    /// Preconditions are checked synchronously: the kind must be available
    /// and no session may be active or in flight. The callback fires exactly
    /// once, with `Ok` after the reference space is bound or with the error
    /// that stopped the attempt. Every failure is also broadcast as
    /// [`XrEvent::Error`].
    pub fn start<F>(
        &mut self,
        camera: &Rc<RefCell<Camera>>,
        kind: XrSessionKind,
        space_kind: XrSpaceKind,
        options: StartOptions,
        callback: F,
    ) where
        F: FnOnce(Result<(), XrError>) + 'static,
    {
        if !self.is_available(kind) {
            return self.report_failure(XrError::NotAvailable, callback);
        }
        if self.phase != SessionPhase::Idle || self.session.is_some() {
            return self.report_failure(XrError::AlreadyStarted, callback);
        }

        self.phase = SessionPhase::Requesting;
        self.kind = Some(kind);
        self.space_kind = Some(space_kind);
        self.attach_camera(camera);
        self.start_callback = Some(Box::new(callback));

        let init = self.assemble_init(kind, space_kind, &options);

        if self.image_tracking.supported() && !self.image_tracking.images().is_empty() {
            // Images must be prepared before the session request is issued;
            // a preparation failure aborts the start without touching the
            // host session API.
            info!(
                "preparing {} tracked images before session request",
                self.image_tracking.images().len()
            );
            self.pending = Some(PendingStart { kind, init });
            self.host
                .prepare_tracked_images(self.image_tracking.images().to_vec());
        } else {
            info!("requesting {} session", kind.as_str());
            self.host.request_session(kind, init);
        }
    }

    /// End the active session.
    ///
    /// Fails synchronously with [`XrError::NotInitialized`] when no session
    /// exists; otherwise the callback is queued to fire exactly once when the
    /// end notification occurs and host-level termination is requested.
    pub fn end<F>(&mut self, callback: F)
    where
        F: FnOnce(Result<(), XrError>) + 'static,
    {
        if self.session.is_none() {
            return self.report_failure(XrError::NotInitialized, callback);
        }
        self.end_listeners.push(Box::new(callback));
        self.phase = SessionPhase::Ending;
        if let Some(session) = &self.session {
            session.borrow_mut().api.request_end();
        }
        info!("XR session end requested");
    }

    /// Feed a host completion or lifecycle message into the state machine.
    pub fn handle_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::DeviceChanged => self.refresh_availability(),
            HostEvent::Availability { kind, result } => self.on_availability(kind, result),
            HostEvent::SessionCreated(result) => self.on_session_created(result),
            HostEvent::ImagesPrepared(result) => self.on_images_prepared(result),
            HostEvent::ReferenceSpaceCreated(result) => self.on_reference_space(result),
            HostEvent::SessionEnded => self.on_session_ended(),
            HostEvent::VisibilityChanged(visibility) => {
                self.visibility = visibility;
            }
        }
    }

    /// Synchronize pooled views and the bound camera with this frame's pose.
    ///
    /// Returns false without touching view state when no session is active or
    /// the device cannot produce a head pose (a normal condition, e.g.
    /// tracking loss).
    pub fn update(&mut self, frame: &dyn HostFrame) -> bool {
        if self.phase != SessionPhase::Active {
            return false;
        }

        // Frame-buffer size changes for XR rendering are only detected here.
        let (width, height) = frame.surface_size();
        if (width, height) != self.surface_size {
            self.surface_size = (width, height);
            self.device.borrow_mut().set_resolution(width, height);
        }

        let space = match self.reference_space {
            Some(space) => space,
            None => return false,
        };
        let pose = match frame.viewer_pose(space) {
            Some(pose) => pose,
            None => return false,
        };

        self.views.resize(pose.views.len());
        self.local_position = pose.position;
        self.local_rotation = pose.rotation;

        let parent = match &self.camera {
            Some(camera) => camera.borrow().node.parent_transform(),
            None => Isometry3::identity(),
        };
        for (view, view_pose) in self.views.active_mut().iter_mut().zip(pose.views.iter()) {
            view.write_from_pose(view_pose, &parent);
        }

        if let Some(camera) = &self.camera {
            let mut camera = camera.borrow_mut();
            camera.node.set_local_position(pose.position);
            camera.node.set_local_rotation(pose.rotation);
        }

        self.input.update(frame);

        if self.kind == Some(XrSessionKind::ImmersiveAr) {
            if self.hit_test.supported() {
                self.hit_test.update(frame);
            }
            if self.light_estimation.supported() {
                self.light_estimation.update(frame);
            }
            if self.depth_sensing.supported() {
                self.depth_sensing.update(frame, self.views.active().first());
            }
            if self.image_tracking.supported() {
                self.image_tracking.update(frame);
            }
            if self.plane_detection.supported() {
                self.plane_detection.update(frame);
            }
        }

        self.observers.emit(&XrEvent::Update(frame));
        true
    }

    fn assemble_init(
        &self,
        kind: XrSessionKind,
        space_kind: XrSpaceKind,
        options: &StartOptions,
    ) -> SessionInit {
        let required_features = vec![SessionFeature::ReferenceSpace(space_kind)];
        let mut optional_features = Vec::new();
        let mut dom_overlay_root = None;
        let mut depth_sensing = None;

        match kind {
            XrSessionKind::ImmersiveAr => {
                optional_features.push(SessionFeature::LightEstimation);
                optional_features.push(SessionFeature::HitTest);
                if options.image_tracking && self.image_tracking.supported() {
                    optional_features.push(SessionFeature::ImageTracking);
                }
                if options.plane_detection {
                    optional_features.push(SessionFeature::PlaneDetection);
                }
                if self.dom_overlay.supported() && self.dom_overlay.root().is_some() {
                    optional_features.push(SessionFeature::DomOverlay);
                    dom_overlay_root = self.dom_overlay.root().map(str::to_owned);
                }
                if let Some(depth_options) = &options.depth_sensing {
                    if self.depth_sensing.supported() {
                        optional_features.push(SessionFeature::DepthSensing);
                        depth_sensing = Some(DepthSensingConfig::from_options(depth_options));
                    }
                }
            }
            XrSessionKind::ImmersiveVr => {
                optional_features.push(SessionFeature::HandTracking);
            }
            XrSessionKind::Inline => {}
        }

        optional_features.extend(options.optional_features.iter().copied());

        SessionInit {
            required_features,
            optional_features,
            dom_overlay_root,
            depth_sensing,
            tracked_images: None,
        }
    }

    fn on_availability(&mut self, kind: XrSessionKind, result: anyhow::Result<bool>) {
        match result {
            Ok(available) => {
                if self.available[kind.index()] != available {
                    self.available[kind.index()] = available;
                    info!(
                        "{} sessions are now {}",
                        kind.as_str(),
                        if available { "available" } else { "unavailable" }
                    );
                    self.observers
                        .emit(&XrEvent::Available { kind, available });
                }
            }
            Err(err) => {
                let err = XrError::AvailabilityQuery(err.to_string());
                warn!("{}", err);
                self.observers.emit(&XrEvent::Error(&err));
            }
        }
    }

    fn on_images_prepared(&mut self, result: anyhow::Result<Option<Vec<image_tracking::TrackedImage>>>) {
        let pending = match self.pending.take() {
            Some(pending) => pending,
            None => return,
        };
        match result {
            Ok(prepared) => {
                self.image_tracking.on_prepared(&prepared);
                let mut init = pending.init;
                init.tracked_images = prepared;
                info!("requesting {} session", pending.kind.as_str());
                self.host.request_session(pending.kind, init);
            }
            Err(err) => {
                self.fail_start(XrError::ImagePreparationFailed(err.to_string()));
            }
        }
    }

    fn on_session_created(&mut self, result: anyhow::Result<Box<dyn HostSession>>) {
        if self.phase != SessionPhase::Requesting {
            // Stale completion, e.g. negotiation raced a teardown. The host
            // still created a session, so it must be shut down.
            if let Ok(mut api) = result {
                warn!("discarding session created outside negotiation");
                api.request_end();
            }
            return;
        }
        match result {
            Ok(api) => self.bind_session(api),
            Err(err) => self.fail_start(XrError::NegotiationFailed(err.to_string())),
        }
    }

    fn bind_session(&mut self, api: Box<dyn HostSession>) {
        self.phase = SessionPhase::Binding;
        self.visibility = api.visibility();

        let (depth_near, depth_far) = match &self.camera {
            Some(camera) => {
                let camera = camera.borrow();
                (camera.near_clip(), camera.far_clip())
            }
            None => (0.1, 1000.0),
        };

        let handle = Rc::new(RefCell::new(SessionHandle {
            api,
            depth_near,
            depth_far,
        }));

        // Clip-plane changes push incremental depth-range updates to the live
        // session, skipping values that match what is already bound.
        if let Some(camera) = &self.camera {
            let session = Rc::clone(&handle);
            let key = camera.borrow_mut().events.on(move |event: &CameraEvent| {
                let mut state = session.borrow_mut();
                let (near, far) = match *event {
                    CameraEvent::NearClip(value) => (value, state.depth_far),
                    CameraEvent::FarClip(value) => (state.depth_near, value),
                };
                if near == state.depth_near && far == state.depth_far {
                    return;
                }
                state.depth_near = near;
                state.depth_far = far;
                state.api.update_render_state(RenderStateUpdate {
                    base_layer: None,
                    depth_near: near,
                    depth_far: far,
                });
            });
            self.clip_listener = Some(key);
        }

        // Bind the render surface and the initial depth range.
        let (width, height) = self.device.borrow().resolution();
        let surface = self.device.borrow_mut().create_render_surface(RenderSurfaceConfig {
            alpha: true,
            depth: true,
            stencil: true,
            width,
            height,
        });
        self.base_layer = Some(surface);

        {
            let mut state = handle.borrow_mut();
            state.api.update_render_state(RenderStateUpdate {
                base_layer: Some(surface),
                depth_near,
                depth_far,
            });
            let space_kind = self.space_kind.unwrap_or(XrSpaceKind::Local);
            state.api.request_reference_space(space_kind);
        }

        self.session = Some(handle);
        info!("XR session created, binding reference space");
    }

    fn on_reference_space(&mut self, result: anyhow::Result<XrSpaceHandle>) {
        if self.phase != SessionPhase::Binding {
            return;
        }
        match result {
            Ok(space) => {
                self.reference_space = Some(space);
                self.phase = SessionPhase::Active;
                // The host's frame callback will not fire until the render
                // loop ticks once more.
                self.wake_requested = true;
                info!("XR session started");
                if let Some(callback) = self.start_callback.take() {
                    callback(Ok(()));
                }
                self.observers.emit(&XrEvent::Start);
            }
            Err(err) => {
                // The session exists but never fully started: roll it back
                // through the normal teardown, without the end notification.
                self.suppress_end_event = true;
                self.phase = SessionPhase::Ending;
                if let Some(session) = &self.session {
                    session.borrow_mut().api.request_end();
                }
                let err = XrError::ReferenceSpaceFailed(err.to_string());
                warn!("{}", err);
                if let Some(callback) = self.start_callback.take() {
                    callback(Err(err.clone()));
                }
                self.observers.emit(&XrEvent::Error(&err));
            }
        }
    }

    fn on_session_ended(&mut self) {
        if self.session.is_none() {
            return;
        }
        self.phase = SessionPhase::Ending;

        if let Some(camera) = &self.camera {
            if let Some(key) = self.clip_listener.take() {
                camera.borrow_mut().events.off(key);
            }
        }
        self.detach_camera();

        let suppress = std::mem::replace(&mut self.suppress_end_event, false);
        if !suppress {
            let listeners = std::mem::replace(&mut self.end_listeners, Vec::new());
            for callback in listeners {
                callback(Ok(()));
            }
            self.observers.emit(&XrEvent::End);
            info!("XR session ended");
        }

        self.session = None;
        self.reference_space = None;
        self.base_layer = None;
        self.surface_size = (0, 0);
        self.kind = None;
        self.space_kind = None;
        self.visibility = XrVisibility::default();
        self.pending = None;
        self.start_callback = None;
        self.views.resize(0);
        self.input.reset();
        self.hit_test.reset();
        self.light_estimation.reset();
        self.depth_sensing.reset();
        self.image_tracking.reset();
        self.plane_detection.reset();
        self.phase = SessionPhase::Idle;
        self.wake_requested = true;
    }

    fn attach_camera(&mut self, camera: &Rc<RefCell<Camera>>) {
        camera.borrow_mut().render_camera_mut().set_xr_driven(true);
        self.camera = Some(Rc::clone(camera));
    }

    fn detach_camera(&mut self) {
        if let Some(camera) = self.camera.take() {
            camera.borrow_mut().render_camera_mut().set_xr_driven(false);
        }
    }

    /// Roll back a start attempt that failed before a session existed.
    fn fail_start(&mut self, err: XrError) {
        self.detach_camera();
        self.kind = None;
        self.space_kind = None;
        self.pending = None;
        self.phase = SessionPhase::Idle;
        warn!("XR session start failed: {}", err);
        if let Some(callback) = self.start_callback.take() {
            callback(Err(err.clone()));
        }
        self.observers.emit(&XrEvent::Error(&err));
    }

    /// Report a synchronous precondition failure without touching state.
    fn report_failure<F>(&mut self, err: XrError, callback: F)
    where
        F: FnOnce(Result<(), XrError>),
    {
        callback(Err(err.clone()));
        self.observers.emit(&XrEvent::Error(&err));
    }
}
