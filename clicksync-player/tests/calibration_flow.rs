//! Player-side calibration flow over the wire format
//!
//! Tests cover:
//! - Tuned values leave the player as intrinsic corrections
//! - A calibration response restores them on another player
//! - Restored values drive playback compensation
//! - A local copy is restored before asking the server

use clicksync_common::clock::ManualClock;
use clicksync_common::protocol::{CalibrationResponse, ScheduledClick};
use clicksync_player::{
    CalibrationStep, JsonFileStore, LocalCalibrationStore, PlaybackCompensator, SoundType,
    SyncReport,
};
use serde_json::json;

fn report(value: serde_json::Value) -> SyncReport {
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_save_then_restore_on_new_player() {
    let mut player = PlaybackCompensator::new();
    player.on_sync_report(&report(json!({
        "status": "sync",
        "connection": "online",
        "travelDuration": 0.004,
        "travelDurationMax": 0.02
    })));
    assert!(player.ready_to_save());

    player.navigate(CalibrationStep::Delay);
    player.calibration_mut().set_delay_compensation_ms(-12.0);
    player.navigate(CalibrationStep::Gain);
    player.calibration_mut().set_gain_compensation_db(3.0);
    player.navigate(CalibrationStep::Validation);

    let request = player.save_request("Mozilla/5.0 (A)");
    let wire = serde_json::to_value(&request).unwrap();
    assert_eq!(wire["identifier"], "Mozilla/5.0 (A)");
    assert!((wire["audio"]["internal"]["delay"].as_f64().unwrap() - 0.012).abs() < 1e-9);
    assert!((wire["audio"]["internal"]["gain"].as_f64().unwrap() + 3.0).abs() < 1e-9);
    assert_eq!(wire["network"], json!({"delay": 0.004, "delayMax": 0.02}));

    // Server answers with the stored values
    let response: CalibrationResponse = serde_json::from_value(json!({
        "audio": {"internal": {"delay": 0.012, "gain": -3}},
        "network": {"delay": 0.5, "delayMax": 0.9}
    }))
    .unwrap();

    let mut fresh = PlaybackCompensator::new();
    fresh.on_sync_report(&report(json!({"status": "training"})));
    fresh.restore(&response);
    fresh.navigate(CalibrationStep::Delay);

    assert!((fresh.calibration().delay_compensation_ms() + 12.0).abs() < 1e-9);
    assert!((fresh.calibration().gain_compensation_db() - 3.0).abs() < 1e-9);
    assert_eq!(fresh.calibration().network(), None);

    let clock = ManualClock::new(4.0);
    let decision = fresh
        .decide(&ScheduledClick::new(5.0), &clock, &clock)
        .unwrap();
    assert_eq!(decision.sound, SoundType::Click);
    assert!((decision.start_local - 4.988).abs() < 1e-9);
    assert!((decision.gain_db - 3.0).abs() < 1e-9);
}

#[test]
fn test_click_message_from_server() {
    let click: ScheduledClick = serde_json::from_str(r#"{"start": 12.5}"#).unwrap();
    let mut player = PlaybackCompensator::new();
    player.on_sync_report(&report(json!({"status": "sync"})));

    let clock = ManualClock::new(13.0);
    let decision = player.decide(&click, &clock, &clock).unwrap();
    assert_eq!(decision.sound, SoundType::Noise);
    assert_eq!(decision.duration, Some(0.1));
}

#[test]
fn test_local_copy_is_restored_before_server() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("calibration.json");

    let mut player = PlaybackCompensator::new();
    player.on_sync_report(&report(json!({
        "status": "sync",
        "connection": "online",
        "travelDuration": 0.004
    })));
    player.navigate(CalibrationStep::Delay);
    player.calibration_mut().set_delay_compensation_ms(-20.0);
    let request = player.save("Mozilla/5.0 (A)", &mut JsonFileStore::new(&path));
    assert!((request.audio.unwrap()["internal"].delay - 0.02).abs() < 1e-9);

    let local = JsonFileStore::new(&path);
    let saved = local.load().unwrap().unwrap();
    assert_eq!(saved.network.unwrap().delay, 0.004);

    let mut restarted = PlaybackCompensator::new();
    assert!(restarted.restore_local(&local));
    assert!((restarted.calibration().delay_compensation_ms() + 20.0).abs() < 1e-9);
    assert_eq!(restarted.calibration().network(), None);
}

#[test]
fn test_server_is_asked_without_local_copy() {
    let dir = tempfile::tempdir().unwrap();
    let local = JsonFileStore::new(dir.path().join("calibration.json"));

    let mut player = PlaybackCompensator::new();
    assert!(!player.restore_local(&local));

    // Falls back to the server response
    let response: CalibrationResponse =
        serde_json::from_value(json!({"audio": {"internal": {"delay": 0.008, "gain": 0}}}))
            .unwrap();
    player.restore(&response);
    assert!((player.calibration().delay_compensation_ms() + 8.0).abs() < 1e-9);
}
