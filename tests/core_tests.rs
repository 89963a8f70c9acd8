// tests/core_tests.rs
use ledwatch::{ExitReason, Pipeline, PipelineSettings, RunSummary, WatchConfig};
use ledwatch_core::actuator::RecordingLink;
use ledwatch_core::{
    ActuatorController, ActuatorState, Command, ControlSession, DetectionStabilizer,
    DetectorFailurePolicy,
};
use ledwatch_cv::source::{RecordedDetector, ReplayScript};
use std::time::Instant;

const HIT: &str = r#"[{"x":4,"y":4,"width":20,"height":20,"confidence":0.8,"class_id":2,"label":"hat"}]"#;
const WEAK: &str = r#"[{"x":4,"y":4,"width":20,"height":20,"confidence":0.1,"class_id":2}]"#;
const OTHER: &str = r#"[{"x":4,"y":4,"width":20,"height":20,"confidence":0.9,"class_id":0}]"#;

fn frame(at: f64, detections: &str) -> String {
    format!(r#"{{"kind":"frame","at":{at},"detections":{detections}}}"#)
}

fn script(lines: &[String]) -> String {
    lines.join("\n")
}

fn replay(text: &str, config: WatchConfig) -> (RunSummary, RecordingLink) {
    let (source, controls) = ReplayScript::parse(text).unwrap().into_parts(Instant::now());
    let link = RecordingLink::new();
    let session = ControlSession::new(ActuatorController::new(&config.controller), link.clone());

    let pipeline = Pipeline::new(
        source,
        RecordedDetector,
        session,
        controls,
        DetectionStabilizer::from_config(&config.controller),
        PipelineSettings::from_config(&config),
    );
    (pipeline.run(|| false).unwrap(), link)
}

fn quiet_config() -> WatchConfig {
    let mut config = WatchConfig::default();
    config.link.test_pause_ms = 0;
    config
}

#[test]
fn stabilizer_window_properties() {
    let mut stabilizer = DetectionStabilizer::default();
    assert_eq!(stabilizer.stability_ratio(), 0.0);

    for event in [true, true, true, true, false, false, false, false, false, false] {
        stabilizer.record(event);
    }
    assert_eq!(stabilizer.stability_ratio(), 0.4);
    assert!(stabilizer.is_stable_at(0.3));

    let mut stabilizer = DetectionStabilizer::default();
    for event in [true, true, true, false, false, false, false, false, false, false] {
        stabilizer.record(event);
    }
    assert_eq!(stabilizer.stability_ratio(), 0.3);
    assert!(!stabilizer.is_stable_at(0.3));

    for _ in 0..100 {
        stabilizer.record(true);
        assert!(stabilizer.history().len() <= 10);
    }
}

#[test]
fn detections_switch_led_on_then_off_after_cooldown() {
    // 10 hit frames then 40 empty frames at 10 fps
    let mut lines: Vec<String> = (0..10).map(|i| frame(i as f64 * 0.1, HIT)).collect();
    lines.extend((10..50).map(|i| frame(i as f64 * 0.1, "[]")));

    let (summary, link) = replay(&script(&lines), quiet_config());

    assert_eq!(summary.exit, ExitReason::Finished);
    assert_eq!(summary.frames, 50);
    assert_eq!(link.commands(), vec![Command::Activate, Command::Deactivate]);
    assert_eq!(summary.activations, 1);
    assert_eq!(summary.deactivations, 1);
}

#[test]
fn weak_and_foreign_detections_do_not_count() {
    let lines: Vec<String> = (0..20)
        .map(|i| frame(i as f64 * 0.1, if i % 2 == 0 { WEAK } else { OTHER }))
        .collect();

    let (summary, link) = replay(&script(&lines), quiet_config());
    assert!(link.commands().is_empty());
    assert_eq!(summary.final_stability, 0.0);
}

#[test]
fn lone_false_positive_is_filtered() {
    // a single hit among ten frames never clears 0.3
    let mut lines = vec![frame(0.0, "[]"), frame(0.1, "[]"), frame(0.2, "[]")];
    lines.push(frame(0.3, HIT));
    lines.extend((4..10).map(|i| frame(i as f64 * 0.1, "[]")));

    let (_, link) = replay(&script(&lines), quiet_config());
    assert!(link.commands().is_empty());
}

#[test]
fn detector_failures_skip_frames_by_default() {
    let lines = vec![
        frame(0.0, "[]"),
        frame(0.1, "[]"),
        r#"{"kind":"detector_error","at":0.2,"message":"timeout"}"#.to_string(),
        r#"{"kind":"detector_error","at":0.3,"message":"timeout"}"#.to_string(),
        frame(0.4, HIT),
    ];

    let (summary, link) = replay(&script(&lines), quiet_config());
    assert_eq!(summary.detector_failures, 2);
    // window is [false, false, true] -> 0.33 > 0.3
    assert_eq!(link.commands(), vec![Command::Activate, Command::Deactivate]);
}

#[test]
fn detector_failures_can_count_as_absent() {
    let lines = vec![
        frame(0.0, "[]"),
        frame(0.1, "[]"),
        r#"{"kind":"detector_error","at":0.2,"message":"timeout"}"#.to_string(),
        r#"{"kind":"detector_error","at":0.3,"message":"timeout"}"#.to_string(),
        frame(0.4, HIT),
    ];
    let mut config = quiet_config();
    config.controller.detector_failure_policy = DetectorFailurePolicy::TreatAsAbsent;

    let (summary, link) = replay(&script(&lines), config);
    // window is [false, false, false, false, true] -> 0.2
    assert!(link.commands().is_empty());
    assert_eq!(summary.final_stability, 0.2);
}

#[test]
fn manual_toggle_overrides_stability() {
    let lines = vec![
        frame(0.0, "[]"),
        r#"{"kind":"control","command":"toggle_actuator"}"#.to_string(),
        frame(0.1, "[]"),
        frame(1.0, "[]"),
        frame(2.2, "[]"),
    ];

    let (summary, link) = replay(&script(&lines), quiet_config());
    // forced ON at t=0.0, held through the 2s off-cooldown, released at t=2.2
    assert_eq!(link.commands(), vec![Command::Activate, Command::Deactivate]);
    assert_eq!(summary.deactivations, 1);
}

#[test]
fn quit_control_stops_and_turns_led_off() {
    let lines = vec![
        frame(0.0, HIT),
        r#"{"kind":"control","command":"quit"}"#.to_string(),
        frame(0.1, HIT),
        frame(0.2, HIT),
    ];

    let (summary, link) = replay(&script(&lines), quiet_config());
    assert_eq!(summary.exit, ExitReason::Quit);
    assert_eq!(summary.frames, 1);
    assert_eq!(link.count(Command::Deactivate), 1);
}

#[test]
fn unrecoverable_disconnect_ends_run_with_led_off() {
    let lines = vec![
        frame(0.0, HIT),
        frame(0.1, HIT),
        r#"{"kind":"disconnect","at":0.2}"#.to_string(),
        frame(0.3, HIT),
        r#"{"kind":"disconnect","at":0.4,"recover":false}"#.to_string(),
        frame(0.5, HIT),
    ];

    let (summary, link) = replay(&script(&lines), quiet_config());
    assert_eq!(summary.exit, ExitReason::StreamLost);
    assert_eq!(summary.reconnects, 2);
    assert_eq!(summary.frames, 3);
    assert_eq!(link.commands(), vec![Command::Activate, Command::Deactivate]);
}

#[test]
fn failed_sends_still_flip_state_optimistically() {
    let (source, controls) = ReplayScript::parse(&frame(0.0, HIT))
        .unwrap()
        .into_parts(Instant::now());
    let link = RecordingLink::new();
    link.set_failing(true);
    let config = quiet_config();
    let mut session = ControlSession::new(ActuatorController::new(&config.controller), link.clone());
    session.evaluate(true, Instant::now());
    assert_eq!(session.state(), ActuatorState::On);

    let pipeline = Pipeline::new(
        source,
        RecordedDetector,
        session,
        controls,
        DetectionStabilizer::default(),
        PipelineSettings::from_config(&config),
    );
    let summary = pipeline.run(|| false).unwrap();

    // activate from the direct call, one teardown deactivate
    assert_eq!(link.commands(), vec![Command::Activate, Command::Deactivate]);
    assert_eq!(summary.deactivations, 1);
}

#[test]
fn bundled_demo_runs_to_quit() {
    let dir = env!("CARGO_MANIFEST_DIR");
    let mut config = WatchConfig::load(format!("{dir}/demos/ledwatch.json")).unwrap();
    config.validate().unwrap();
    config.link.test_pause_ms = 0;

    let text = std::fs::read_to_string(format!("{dir}/demos/hat_walkby.jsonl")).unwrap();
    let (summary, link) = replay(&text, config);

    assert_eq!(summary.exit, ExitReason::Quit);
    assert_eq!(summary.detector_failures, 1);
    assert_eq!(link.commands(), vec![Command::Activate, Command::Deactivate]);
}
