use super::host::HostFrame;
use crate::events::EventEmitter;
use nalgebra::Vector3;

/// Input source lifecycle and select-edge notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Added(u64),
    Removed(u64),
    SelectStart(u64),
    SelectEnd(u64),
}

/// One tracked input source (controller, hand, gaze).
#[derive(Debug, Clone)]
pub struct XrInputSource {
    pub id: u64,
    pub origin: Vector3<f32>,
    pub direction: Vector3<f32>,
    pub selecting: bool,
}

/// Input sub-module, updated unconditionally once per frame.
///
/// Sources are reconciled against the frame's reported set by id; select
/// transitions fire on edges only.
pub struct XrInput {
    sources: Vec<XrInputSource>,
    pub events: EventEmitter<InputEvent>,
}

impl XrInput {
    pub(crate) fn new() -> Self {
        Self {
            sources: Vec::new(),
            events: EventEmitter::new(),
        }
    }

    pub fn sources(&self) -> &[XrInputSource] {
        &self.sources
    }

    pub(crate) fn update(&mut self, frame: &dyn HostFrame) {
        let samples = frame.input_sources();

        let removed: Vec<u64> = self
            .sources
            .iter()
            .filter(|source| !samples.iter().any(|sample| sample.id == source.id))
            .map(|source| source.id)
            .collect();
        for id in removed {
            self.sources.retain(|source| source.id != id);
            self.events.emit(&InputEvent::Removed(id));
        }

        for sample in samples {
            match self
                .sources
                .iter_mut()
                .find(|source| source.id == sample.id)
            {
                Some(source) => {
                    let was_selecting = source.selecting;
                    source.origin = sample.origin;
                    source.direction = sample.direction;
                    source.selecting = sample.selecting;
                    if sample.selecting && !was_selecting {
                        self.events.emit(&InputEvent::SelectStart(sample.id));
                    } else if !sample.selecting && was_selecting {
                        self.events.emit(&InputEvent::SelectEnd(sample.id));
                    }
                }
                None => {
                    let selecting = sample.selecting;
                    let id = sample.id;
                    self.sources.push(XrInputSource {
                        id,
                        origin: sample.origin,
                        direction: sample.direction,
                        selecting,
                    });
                    self.events.emit(&InputEvent::Added(id));
                    if selecting {
                        self.events.emit(&InputEvent::SelectStart(id));
                    }
                }
            }
        }
    }

    pub(crate) fn reset(&mut self) {
        let ids: Vec<u64> = self.sources.iter().map(|source| source.id).collect();
        self.sources.clear();
        for id in ids {
            self.events.emit(&InputEvent::Removed(id));
        }
    }
}
