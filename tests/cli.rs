use assert_cmd::prelude::*;
use predicates::str::contains;
use std::process::Command;

#[test]
fn headless_run_prints_final_session_state() {
    let mut cmd = Command::cargo_bin("stagekit").expect("binary exists");
    cmd.arg("--headless").arg("--ticks").arg("240");
    cmd.assert()
        .success()
        .stdout(contains("Starting headless session 800x600 for 240 ticks"))
        .stdout(contains(" - frames rendered: 240"))
        // Platform ratio 3 is capped at 2, and the surface saw the same
        // values as the viewport bookkeeping.
        .stdout(contains(" - viewport: 1920x1080 @2x"))
        .stdout(contains(" - surface: 1920x1080 @2x"))
        // The in-range sample stuck; the out-of-range x was rejected while
        // its y component still landed on the centerline.
        .stdout(contains(" - pointer: (0.0625, 0.0000)"))
        .stdout(contains(" - fullscreen: false"));
}

#[test]
fn short_headless_run_counts_every_tick() {
    let mut cmd = Command::cargo_bin("stagekit").expect("binary exists");
    cmd.arg("--headless")
        .arg("--ticks")
        .arg("5")
        .arg("--width")
        .arg("1024")
        .arg("--height")
        .arg("768");
    cmd.assert()
        .success()
        .stdout(contains("Starting headless session 1024x768 for 5 ticks"))
        .stdout(contains(" - frames rendered: 5"))
        .stdout(contains(" - viewport: 1024x768 @1x"));
}

#[test]
fn unknown_arguments_are_rejected() {
    let mut cmd = Command::cargo_bin("stagekit").expect("binary exists");
    cmd.arg("--bogus");
    cmd.assert().failure();
}
