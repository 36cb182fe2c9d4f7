use super::host::{DepthSample, HostFrame};
use super::view::{Viewport, XrView};

/// Where depth data should be optimized to live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrDepthUsage {
    CpuOptimized,
    GpuOptimized,
}

/// On-the-wire encoding of depth data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrDepthFormat {
    LuminanceAlpha,
    Float32,
}

pub const DEFAULT_USAGE_PREFERENCE: [XrDepthUsage; 2] =
    [XrDepthUsage::CpuOptimized, XrDepthUsage::GpuOptimized];

pub const DEFAULT_DATA_FORMAT_PREFERENCE: [XrDepthFormat; 2] =
    [XrDepthFormat::LuminanceAlpha, XrDepthFormat::Float32];

/// Caller preferences for depth sensing, attached to
/// [`StartOptions`](super::StartOptions).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepthSensingOptions {
    pub usage_preference: Option<XrDepthUsage>,
    pub data_format_preference: Option<XrDepthFormat>,
}

/// Ordered preference lists negotiated with the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthSensingConfig {
    pub usage_preference: Vec<XrDepthUsage>,
    pub data_format_preference: Vec<XrDepthFormat>,
}

impl DepthSensingConfig {
    /// Build the negotiated lists: the fixed defaults, with any caller
    /// preference moved to the front of its list.
    pub fn from_options(options: &DepthSensingOptions) -> Self {
        let mut usage = DEFAULT_USAGE_PREFERENCE.to_vec();
        let mut format = DEFAULT_DATA_FORMAT_PREFERENCE.to_vec();
        promote(&mut usage, options.usage_preference);
        promote(&mut format, options.data_format_preference);
        Self {
            usage_preference: usage,
            data_format_preference: format,
        }
    }
}

fn promote<T: PartialEq + Copy>(list: &mut Vec<T>, preferred: Option<T>) {
    if let Some(preferred) = preferred {
        list.retain(|value| *value != preferred);
        list.insert(0, preferred);
    }
}

/// Depth sensing capability state, refreshed once per frame on AR sessions.
pub struct XrDepthSensing {
    supported: bool,
    available: bool,
    width: u32,
    height: u32,
    raw_value_to_meters: f32,
    hint_viewport: Viewport,
}

impl XrDepthSensing {
    pub(crate) fn new(supported: bool) -> Self {
        Self {
            supported,
            available: false,
            width: 0,
            height: 0,
            raw_value_to_meters: 0.0,
            hint_viewport: Viewport::default(),
        }
    }

    pub fn supported(&self) -> bool {
        self.supported
    }

    /// True while the current session produced a depth sample this frame.
    pub fn available(&self) -> bool {
        self.available
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn raw_value_to_meters(&self) -> f32 {
        self.raw_value_to_meters
    }

    /// Viewport of the view the depth map is aligned with.
    pub fn hint_viewport(&self) -> Viewport {
        self.hint_viewport
    }

    pub(crate) fn update(&mut self, frame: &dyn HostFrame, hint: Option<&XrView>) {
        match frame.depth_sample() {
            Some(DepthSample {
                width,
                height,
                raw_value_to_meters,
            }) => {
                self.available = true;
                self.width = width;
                self.height = height;
                self.raw_value_to_meters = raw_value_to_meters;
                if let Some(view) = hint {
                    self.hint_viewport = view.viewport;
                }
            }
            None => self.available = false,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.available = false;
        self.width = 0;
        self.height = 0;
        self.raw_value_to_meters = 0.0;
        self.hint_viewport = Viewport::default();
    }
}
