//! Sensor input bridge
//!
//! Converts a stream of orientation/acceleration samples into control
//! commands. The platform producer sends samples into a channel at its own
//! cadence (reference: 16 ms); the session drains the channel at the start of
//! each tick and applies only the newest sample, so rapid repeats collapse to
//! last-sample-wins and nothing blocks the tick path.

use crossbeam_channel::{Receiver, TryRecvError};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{GYRO_GRAVITY_GAIN, GYRO_STEER_GAIN};

/// One timestamped sensor reading (orientation rate or linear acceleration)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Producer timestamp (ms)
    pub at_ms: f64,
}

/// How sensor axes drive the game (variant policy)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ControlMapping {
    /// Gyro y-rate slides the player horizontally
    #[default]
    GyroToVelocity,
    /// Gyro rates tilt the world gravity vector
    GyroToGravity,
}

/// Control command mapped from the newest sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlCommand {
    /// Direct horizontal velocity override for the player body (px/s)
    SteerVelocity(f32),
    /// World gravity direction override
    TiltGravity(Vec2),
}

/// Subscription wrapper around a sample channel
#[derive(Debug)]
pub struct SensorBridge {
    receiver: Option<Receiver<SensorSample>>,
    mapping: ControlMapping,
}

impl SensorBridge {
    /// Subscribe to a sample stream with the given axis mapping
    pub fn subscribe(receiver: Receiver<SensorSample>, mapping: ControlMapping) -> Self {
        Self {
            receiver: Some(receiver),
            mapping,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.receiver.is_some()
    }

    /// Drop the stream; no further samples can reach the session
    pub fn unsubscribe(&mut self) {
        self.receiver = None;
    }

    /// Drain pending samples and map the newest one.
    ///
    /// A disconnected producer stalls the control input (the bridge
    /// unsubscribes itself) instead of erroring: gameplay stays valid
    /// without input.
    pub fn latest_command(&mut self) -> Option<ControlCommand> {
        let receiver = self.receiver.as_ref()?;
        let mut newest = None;
        loop {
            match receiver.try_recv() {
                Ok(sample) => newest = Some(sample),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("sensor stream disconnected; control input stalled");
                    self.receiver = None;
                    break;
                }
            }
        }
        newest.map(|sample| self.map(sample))
    }

    fn map(&self, sample: SensorSample) -> ControlCommand {
        match self.mapping {
            ControlMapping::GyroToVelocity => {
                ControlCommand::SteerVelocity(sample.y * GYRO_STEER_GAIN)
            }
            // axis swap as on the tilt screen: device y rate pulls along x
            ControlMapping::GyroToGravity => {
                ControlCommand::TiltGravity(Vec2::new(sample.y, -sample.x) * GYRO_GRAVITY_GAIN)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn sample(x: f32, y: f32, at_ms: f64) -> SensorSample {
        SensorSample { x, y, z: 0.0, at_ms }
    }

    #[test]
    fn test_empty_stream_yields_no_command() {
        let (_tx, rx) = unbounded();
        let mut bridge = SensorBridge::subscribe(rx, ControlMapping::GyroToVelocity);
        assert_eq!(bridge.latest_command(), None);
    }

    #[test]
    fn test_last_sample_wins() {
        let (tx, rx) = unbounded();
        let mut bridge = SensorBridge::subscribe(rx, ControlMapping::GyroToVelocity);
        tx.send(sample(0.0, 0.1, 0.0)).unwrap();
        tx.send(sample(0.0, 0.2, 16.0)).unwrap();
        tx.send(sample(0.0, -0.5, 32.0)).unwrap();

        let command = bridge.latest_command();
        assert_eq!(command, Some(ControlCommand::SteerVelocity(-0.5 * GYRO_STEER_GAIN)));
        // queue fully drained
        assert_eq!(bridge.latest_command(), None);
    }

    #[test]
    fn test_gravity_mapping_swaps_axes() {
        let (tx, rx) = unbounded();
        let mut bridge = SensorBridge::subscribe(rx, ControlMapping::GyroToGravity);
        tx.send(sample(0.3, 0.4, 0.0)).unwrap();

        match bridge.latest_command() {
            Some(ControlCommand::TiltGravity(vec)) => {
                assert!((vec.x - 0.4 * GYRO_GRAVITY_GAIN).abs() < 1e-6);
                assert!((vec.y + 0.3 * GYRO_GRAVITY_GAIN).abs() < 1e-6);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_disconnect_applies_final_sample_then_stalls() {
        let (tx, rx) = unbounded();
        let mut bridge = SensorBridge::subscribe(rx, ControlMapping::GyroToVelocity);
        tx.send(sample(0.0, 1.0, 0.0)).unwrap();
        drop(tx);

        assert!(bridge.latest_command().is_some());
        assert!(!bridge.is_subscribed());
        assert_eq!(bridge.latest_command(), None);
    }

    #[test]
    fn test_unsubscribe_blocks_pending_samples() {
        let (tx, rx) = unbounded();
        let mut bridge = SensorBridge::subscribe(rx, ControlMapping::GyroToVelocity);
        tx.send(sample(0.0, 1.0, 0.0)).unwrap();
        bridge.unsubscribe();
        assert_eq!(bridge.latest_command(), None);
    }
}
