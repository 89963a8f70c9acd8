//! The frame loop: pull, detect, stabilize, control.

use crate::config::WatchConfig;
use anyhow::Result;
use ledwatch_core::{
    ActuatorLink, ConfidenceThreshold, ControlCommand, ControlInput, ControlSession,
    DetectionStabilizer, DetectorFailurePolicy, FpsMeter,
};
use ledwatch_cv::{Detector, FramePresence, FrameRead, FrameSource};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// The source ran out of frames.
    Finished,
    /// The operator asked to quit.
    Quit,
    /// The stop flag was raised (Ctrl-C).
    Interrupted,
    /// The stream dropped and could not be reconnected.
    StreamLost,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub exit: ExitReason,
    pub frames: u64,
    pub detector_failures: u64,
    pub reconnects: u64,
    pub activations: u64,
    pub deactivations: u64,
    pub actuator_enabled: bool,
    pub final_fps: f64,
    pub final_confidence: f64,
    pub final_stability: f64,
}

/// Loop parameters that are not owned by the stabilizer or controller
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub target_class: u32,
    pub target_name: String,
    pub confidence: ConfidenceThreshold,
    pub failure_policy: DetectorFailurePolicy,
    pub fps_interval: Duration,
    pub manual_test_pause: Duration,
    pub snapshot_dir: PathBuf,
    pub debug: bool,
}

impl PipelineSettings {
    pub fn from_config(config: &WatchConfig) -> Self {
        Self {
            target_class: config.detection.target_class,
            target_name: config.detection.target_name().to_string(),
            confidence: config.detection.confidence,
            failure_policy: config.controller.detector_failure_policy,
            fps_interval: config.runtime.fps_interval(),
            manual_test_pause: config.link.test_pause() / 2,
            snapshot_dir: config.runtime.snapshot_dir.clone(),
            debug: config.runtime.debug,
        }
    }
}

pub struct Pipeline<S, D, L, C>
where
    S: FrameSource,
    D: Detector<S::Frame>,
    L: ActuatorLink,
    C: ControlInput,
{
    source: S,
    detector: D,
    session: ControlSession<L>,
    controls: C,
    stabilizer: DetectionStabilizer,
    settings: PipelineSettings,
    fps: FpsMeter,
    frames: u64,
    detector_failures: u64,
    reconnects: u64,
}

impl<S, D, L, C> Pipeline<S, D, L, C>
where
    S: FrameSource,
    D: Detector<S::Frame>,
    L: ActuatorLink,
    C: ControlInput,
{
    pub fn new(
        source: S,
        detector: D,
        session: ControlSession<L>,
        controls: C,
        stabilizer: DetectionStabilizer,
        settings: PipelineSettings,
    ) -> Self {
        let fps = FpsMeter::new(settings.fps_interval);
        Self {
            source,
            detector,
            session,
            controls,
            stabilizer,
            settings,
            fps,
            frames: 0,
            detector_failures: 0,
            reconnects: 0,
        }
    }

    /// Run until the source ends, the operator quits or `stop` returns true.
    ///
    /// The actuator is turned OFF before returning. On an error return the
    /// same happens when the session is dropped.
    pub fn run<F: Fn() -> bool>(mut self, stop: F) -> Result<RunSummary> {
        info!(class = %self.settings.target_name, confidence = %self.settings.confidence, "starting detection");

        let exit = loop {
            if stop() {
                info!("interrupted");
                break ExitReason::Interrupted;
            }
            if let Some(reason) = self.step()? {
                break reason;
            }
        };

        info!(?exit, "cleaning up");
        self.session.shutdown();

        let controller = self.session.controller();
        Ok(RunSummary {
            exit,
            frames: self.frames,
            detector_failures: self.detector_failures,
            reconnects: self.reconnects,
            activations: controller.activations(),
            deactivations: controller.deactivations(),
            actuator_enabled: controller.is_enabled(),
            final_fps: self.fps.fps(),
            final_confidence: self.settings.confidence.value(),
            final_stability: self.stabilizer.stability_ratio(),
        })
    }

    /// Process one frame. Returns `Some` when the loop should stop.
    fn step(&mut self) -> Result<Option<ExitReason>> {
        let frame = match self.source.read_frame()? {
            FrameRead::Frame(frame) => frame,
            FrameRead::Finished => return Ok(Some(ExitReason::Finished)),
            FrameRead::Lost => {
                warn!("lost connection to stream, reconnecting");
                self.reconnects += 1;
                if self.source.reconnect()? {
                    return Ok(None);
                }
                warn!("could not reconnect to stream");
                return Ok(Some(ExitReason::StreamLost));
            }
        };

        self.frames += 1;
        let now = self.source.frame_time();
        if let Some(fps) = self.fps.tick(now) {
            debug!(fps = format_args!("{fps:.1}"), "frame rate");
        }

        let confidence = self.settings.confidence.value();
        match self.detector.detect(&frame, confidence) {
            Ok(detections) => {
                let presence =
                    FramePresence::assess(&detections, self.settings.target_class, confidence);
                self.stabilizer.record(presence.is_present());
                if self.settings.debug && presence.is_present() {
                    info!(
                        targets = presence.targets,
                        stability = format_args!("{:.2}", self.stabilizer.stability_ratio()),
                        "debug"
                    );
                }
            }
            Err(err) => {
                self.detector_failures += 1;
                warn!(error = %err, "detection error");
                match self.settings.failure_policy {
                    DetectorFailurePolicy::Skip => return Ok(None),
                    DetectorFailurePolicy::TreatAsAbsent => self.stabilizer.record(false),
                }
            }
        }

        self.session.evaluate(self.stabilizer.is_stable(), now);

        match self.controls.poll() {
            Some(command) => self.handle(command, &frame, now),
            None => Ok(None),
        }
    }

    fn handle(
        &mut self,
        command: ControlCommand,
        frame: &S::Frame,
        now: Instant,
    ) -> Result<Option<ExitReason>> {
        match command {
            ControlCommand::Quit => {
                info!("quitting");
                return Ok(Some(ExitReason::Quit));
            }
            ControlCommand::ToggleActuator => {
                self.session.toggle(now);
            }
            ControlCommand::TestLink => {
                let ok = self.session.probe(self.settings.manual_test_pause);
                info!(ok, "link test finished");
            }
            ControlCommand::ToggleDebug => {
                self.settings.debug = !self.settings.debug;
                info!(
                    "debug mode: {}",
                    if self.settings.debug { "ON" } else { "OFF" }
                );
            }
            ControlCommand::RaiseConfidence => {
                let value = self.settings.confidence.raise();
                info!("confidence threshold: {value:.2}");
            }
            ControlCommand::LowerConfidence => {
                let value = self.settings.confidence.lower();
                info!("confidence threshold: {value:.2}");
            }
            ControlCommand::Snapshot => {
                let stamp = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or_default();
                let path = self
                    .settings
                    .snapshot_dir
                    .join(format!("{}_detection_{stamp}.jpg", self.settings.target_name));
                if self.source.snapshot(frame, &path)? {
                    info!(path = %path.display(), "saved snapshot");
                } else {
                    info!("this source cannot save snapshots");
                }
            }
        }
        Ok(None)
    }
}
