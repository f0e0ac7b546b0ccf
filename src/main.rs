//! Tilt Dodge entry point
//!
//! Runs a headless demo session: a synthetic gyroscope sways the player left
//! and right while obstacles rain down, and the session outcome is logged.
//! Real hosts replace the producer thread with platform sensor plumbing and
//! draw the entities each frame.

use std::path::Path;
use std::thread;
use std::time::Duration;

use crossbeam_channel::unbounded;

use tilt_dodge::consts::{SENSOR_INTERVAL_MS, TICK_MS};
use tilt_dodge::input::SensorSample;
use tilt_dodge::settings::Settings;
use tilt_dodge::sim::{GameSession, Phase};

/// Demo length cap; most runs end on a collision well before this
const DEMO_CAP_MS: f64 = 30_000.0;

fn main() {
    env_logger::init();

    let settings = Settings::load_or_default(Path::new("tilt-dodge.json"));
    log::info!("Tilt Dodge (headless demo) starting...");

    let (sample_tx, sample_rx) = unbounded();
    let producer = thread::spawn(move || {
        let mut at_ms = 0.0f64;
        loop {
            // gentle sway on the steering axis
            let rate = (at_ms / 400.0).sin() as f32 * 0.8;
            let sample = SensorSample {
                x: 0.0,
                y: rate,
                z: 0.0,
                at_ms,
            };
            if sample_tx.send(sample).is_err() {
                break; // session torn down
            }
            thread::sleep(Duration::from_millis(SENSOR_INTERVAL_MS as u64));
            at_ms += SENSOR_INTERVAL_MS;
        }
    });

    let mut session = GameSession::from_settings(&settings);
    if let Err(err) = session.start(Some(sample_rx)) {
        log::error!("session start failed: {}", err);
        std::process::exit(1);
    }

    let mut elapsed_ms = 0.0;
    while session.phase() == Phase::Running && elapsed_ms < DEMO_CAP_MS {
        session.tick(TICK_MS);
        elapsed_ms += TICK_MS;
        thread::sleep(Duration::from_micros((TICK_MS * 1000.0) as u64));
    }
    session.stop();

    println!(
        "survived {:.1} s, final score {}",
        session.clock_ms() / 1000.0,
        session.score()
    );

    let _ = producer.join();
}
