//! Scripted replay of recorded detector output
//!
//! A script is a JSON-lines file, one event per line:
//!
//! ```text
//! {"kind":"frame","at":0.00,"detections":[{"x":10,"y":10,"width":40,"height":30,"confidence":0.8,"class_id":2}]}
//! {"kind":"detector_error","at":0.05,"message":"inference timed out"}
//! {"kind":"disconnect","at":0.10}
//! {"kind":"control","command":"toggle_actuator"}
//! ```
//!
//! Timestamps are seconds from the start of the script and drive the
//! controller clock, so a replay is fully deterministic. Control events are
//! delivered on the first poll after the frame that precedes them.

use super::recorded::RecordedFrame;
use super::FrameRead;
use crate::bbox::{BBox, BBoxCollection};
use crate::traits::FrameSource;
use crate::Result;
use ledwatch_core::{ControlCommand, ControlInput};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Latest timestamp a script may use, in seconds (about 31 years).
pub const MAX_TIMESTAMP_SECS: f64 = 1.0e9;

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("failed to read replay script {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },

    #[error("line {line}: timestamp {at} is outside 0..={max} seconds", max = MAX_TIMESTAMP_SECS)]
    BadTimestamp { line: usize, at: f64 },
}

fn default_recover() -> bool {
    true
}

/// One line of a replay script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplayEvent {
    Frame {
        at: f64,
        #[serde(default)]
        detections: Vec<BBox>,
    },
    DetectorError {
        at: f64,
        message: String,
    },
    Disconnect {
        #[serde(default)]
        at: f64,
        /// Whether the following reconnect succeeds.
        #[serde(default = "default_recover")]
        recover: bool,
    },
    Control {
        #[serde(default)]
        at: f64,
        command: ControlCommand,
    },
}

impl ReplayEvent {
    fn at(&self) -> f64 {
        match self {
            ReplayEvent::Frame { at, .. }
            | ReplayEvent::DetectorError { at, .. }
            | ReplayEvent::Disconnect { at, .. }
            | ReplayEvent::Control { at, .. } => *at,
        }
    }
}

/// A parsed replay script
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayScript {
    events: Vec<ReplayEvent>,
}

impl ReplayScript {
    pub fn from_events(events: Vec<ReplayEvent>) -> Self {
        Self { events }
    }

    /// Load a script from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ReplayError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let script = Self::parse(&text)?;
        info!(path = %path.display(), events = script.len(), "loaded replay script");
        Ok(script)
    }

    /// Parse JSON lines; blank lines and `#` comments are ignored.
    pub fn parse(text: &str) -> std::result::Result<Self, ReplayError> {
        let mut events = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let event: ReplayEvent = serde_json::from_str(trimmed)
                .map_err(|source| ReplayError::Parse { line: line_no, source })?;
            let at = event.at();
            if !(0.0..=MAX_TIMESTAMP_SECS).contains(&at) {
                return Err(ReplayError::BadTimestamp { line: line_no, at });
            }
            events.push(event);
        }

        Ok(Self { events })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Split into the frame source and the control input it feeds.
    pub fn into_parts(self, start: Instant) -> (ReplaySource, ReplayControls) {
        let queue = Rc::new(RefCell::new(VecDeque::new()));
        let source = ReplaySource {
            events: self.events.into(),
            start,
            now: start,
            recover_next: true,
            controls: Rc::clone(&queue),
        };
        (source, ReplayControls { queue })
    }
}

/// Frame source over a [`ReplayScript`].
pub struct ReplaySource {
    events: VecDeque<ReplayEvent>,
    start: Instant,
    now: Instant,
    recover_next: bool,
    controls: Rc<RefCell<VecDeque<ControlCommand>>>,
}

impl ReplaySource {
    fn advance_to(&mut self, at: f64) {
        let now = Duration::try_from_secs_f64(at)
            .ok()
            .and_then(|offset| self.start.checked_add(offset));
        match now {
            Some(now) => self.now = now,
            None => warn!(at, "replay timestamp out of range, clock held"),
        }
    }

    /// Move control events sitting before the next frame into the control queue.
    fn drain_controls(&mut self) {
        while let Some(ReplayEvent::Control { .. }) = self.events.front() {
            if let Some(ReplayEvent::Control { command, .. }) = self.events.pop_front() {
                self.controls.borrow_mut().push_back(command);
            }
        }
    }
}

impl FrameSource for ReplaySource {
    type Frame = RecordedFrame;

    fn read_frame(&mut self) -> Result<FrameRead<RecordedFrame>> {
        self.drain_controls();

        let Some(event) = self.events.pop_front() else {
            return Ok(FrameRead::Finished);
        };

        let frame = match event {
            ReplayEvent::Frame { at, detections } => {
                self.advance_to(at);
                RecordedFrame::Detections(BBoxCollection::from_vec(detections))
            }
            ReplayEvent::DetectorError { at, message } => {
                self.advance_to(at);
                RecordedFrame::Failed(message)
            }
            ReplayEvent::Disconnect { at, recover } => {
                self.advance_to(at);
                self.recover_next = recover;
                return Ok(FrameRead::Lost);
            }
            ReplayEvent::Control { command, .. } => {
                self.controls.borrow_mut().push_back(command);
                return self.read_frame();
            }
        };

        self.drain_controls();
        Ok(FrameRead::Frame(frame))
    }

    fn reconnect(&mut self) -> Result<bool> {
        let recovered = std::mem::replace(&mut self.recover_next, true);
        debug!(recovered, "replay reconnect");
        Ok(recovered)
    }

    fn frame_time(&self) -> Instant {
        self.now
    }
}

/// Control commands scripted in a replay.
pub struct ReplayControls {
    queue: Rc<RefCell<VecDeque<ControlCommand>>>,
}

impl ControlInput for ReplayControls {
    fn poll(&mut self) -> Option<ControlCommand> {
        self.queue.borrow_mut().pop_front()
    }
}
