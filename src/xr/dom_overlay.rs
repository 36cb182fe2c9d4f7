/// Overlay-root configuration for AR sessions.
///
/// When supported and a root is configured before `start`, the root is
/// attached to the session request as the overlay target. There is no
/// per-frame work.
pub struct XrDomOverlay {
    supported: bool,
    root: Option<String>,
}

impl XrDomOverlay {
    pub(crate) fn new(supported: bool) -> Self {
        Self {
            supported,
            root: None,
        }
    }

    pub fn supported(&self) -> bool {
        self.supported
    }

    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    pub fn set_root(&mut self, root: impl Into<String>) {
        self.root = Some(root.into());
    }

    pub fn clear_root(&mut self) {
        self.root = None;
    }
}
