use super::depth_sensing::{DepthSensingConfig, DepthSensingOptions};
use super::image_tracking::TrackedImage;
use crate::gfx::RenderSurface;

/// The kinds of session a host can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XrSessionKind {
    Inline,
    ImmersiveVr,
    ImmersiveAr,
}

impl XrSessionKind {
    pub const ALL: [XrSessionKind; 3] = [
        XrSessionKind::Inline,
        XrSessionKind::ImmersiveVr,
        XrSessionKind::ImmersiveAr,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            XrSessionKind::Inline => 0,
            XrSessionKind::ImmersiveVr => 1,
            XrSessionKind::ImmersiveAr => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            XrSessionKind::Inline => "inline",
            XrSessionKind::ImmersiveVr => "immersive-vr",
            XrSessionKind::ImmersiveAr => "immersive-ar",
        }
    }
}

/// Coordinate system convention poses are reported against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XrSpaceKind {
    Viewer,
    Local,
    LocalFloor,
    BoundedFloor,
    Unbounded,
}

impl XrSpaceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            XrSpaceKind::Viewer => "viewer",
            XrSpaceKind::Local => "local",
            XrSpaceKind::LocalFloor => "local-floor",
            XrSpaceKind::BoundedFloor => "bounded-floor",
            XrSpaceKind::Unbounded => "unbounded",
        }
    }
}

/// Session visibility as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrVisibility {
    Visible,
    VisibleBlurred,
    Hidden,
}

impl Default for XrVisibility {
    fn default() -> Self {
        XrVisibility::Visible
    }
}

/// Features negotiable with the host when a session is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFeature {
    ReferenceSpace(XrSpaceKind),
    LightEstimation,
    HitTest,
    ImageTracking,
    PlaneDetection,
    DomOverlay,
    DepthSensing,
    HandTracking,
}

/// Caller-supplied options for [`XrManager::start`](super::XrManager::start).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartOptions {
    /// Request image tracking (honored only if the capability is supported).
    pub image_tracking: bool,
    /// Request plane detection.
    pub plane_detection: bool,
    /// Request depth sensing with the given preferences.
    pub depth_sensing: Option<DepthSensingOptions>,
    /// Extra optional features, appended to the request verbatim.
    pub optional_features: Vec<SessionFeature>,
}

/// The assembled session request handed to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInit {
    pub required_features: Vec<SessionFeature>,
    pub optional_features: Vec<SessionFeature>,
    pub dom_overlay_root: Option<String>,
    pub depth_sensing: Option<DepthSensingConfig>,
    pub tracked_images: Option<Vec<TrackedImage>>,
}

/// Incremental render-state push to a live session.
///
/// `base_layer` is only set by the initial bind; clip-plane changes push
/// depth-range-only updates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStateUpdate {
    pub base_layer: Option<RenderSurface>,
    pub depth_near: f32,
    pub depth_far: f32,
}
