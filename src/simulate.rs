//! Deterministic stand-in for the vendor interface.
//!
//! Produces the same shapes a handheld force/acceleration interface would:
//! slow oscillation on the force channel, quadrature sine/cosine on the
//! acceleration axes. Scripted instances play back a fixed list of readings
//! and then end the stream, which is how the tests exercise a run without
//! hardware or sleeps.

use std::f64::consts::TAU;

use log::info;

use crate::{Connection, OpenError, ReadError, SensorDevice};

/// Channel catalog of the simulated interface.
fn channel_info(id: u8) -> Option<(&'static str, &'static str)> {
    match id {
        1 => Some(("Force", "N")),
        2 => Some(("X-axis acceleration", "m/s²")),
        3 => Some(("Y-axis acceleration", "m/s²")),
        4 => Some(("Z-axis acceleration", "m/s²")),
        _ => None,
    }
}

/// Signal reported by a channel at nominal sample time `t` seconds.
fn signal(channel: u8, t: f64) -> f64 {
    match channel {
        1 => 5.0 + 2.5 * (TAU * t / 10.0).sin(),
        2 => (TAU * t / 4.0).sin(),
        3 => (TAU * t / 4.0).cos(),
        4 => 9.81 + 0.05 * (TAU * t).sin(),
        _ => 0.0,
    }
}

/// A [SensorDevice] that needs no hardware.
///
/// Generated readings advance one nominal period per read, so the produced
/// waveform depends only on the sampling period and the read count, never on
/// wall-clock jitter. Call counts for stop/close are kept so callers can
/// verify release behavior.
pub struct SimulatedDevice {
    name: String,
    selected: Vec<u8>,
    period_ms: u32,
    sampling: bool,
    closed: bool,
    reads: u32,
    read_budget: Option<u32>,
    script: Option<Vec<Vec<f64>>>,
    stop_calls: u32,
    close_calls: u32,
}

impl SimulatedDevice {
    /// Opens the named simulated interface over the given transport.
    /// Mirrors the vendor open(connection, device) call; the name must be
    /// non-empty, standing in for "a matching device was found".
    pub fn open(connection: Connection, name: &str) -> Result<Self, OpenError> {
        if name.trim().is_empty() {
            return Err(OpenError::NoDevice(format!("<unnamed> over {}", connection)));
        }
        info!("opened {} over {}", name, connection);
        Ok(Self::with_name(name))
    }

    /// An already-open device that plays back the given readings in order
    /// and then ends the stream. Each inner vector is one reading, one value
    /// per selected channel.
    pub fn scripted(readings: Vec<Vec<f64>>) -> Self {
        let mut device = Self::with_name("scripted");
        device.script = Some(readings);
        device
    }

    /// Caps generated output at this many reads, after which the device
    /// signals end of stream. Scripted devices end with their script instead.
    pub fn with_read_budget(mut self, reads: u32) -> Self {
        self.read_budget = Some(reads);
        self
    }

    fn with_name(name: &str) -> Self {
        Self {
            name: name.to_string(),
            selected: Vec::new(),
            period_ms: 0,
            sampling: false,
            closed: false,
            reads: 0,
            read_budget: None,
            script: None,
            stop_calls: 0,
            close_calls: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of successful reads so far.
    pub fn reads(&self) -> u32 {
        self.reads
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// How many times stop was called on this handle.
    pub fn stop_calls(&self) -> u32 {
        self.stop_calls
    }

    /// How many times close was called on this handle.
    pub fn close_calls(&self) -> u32 {
        self.close_calls
    }
}

impl SensorDevice for SimulatedDevice {
    fn select_sensors(&mut self, channels: &[u8]) -> Result<(), OpenError> {
        if self.closed {
            return Err(OpenError::Closed);
        }
        for &channel in channels {
            if channel_info(channel).is_none() {
                return Err(OpenError::UnknownChannel(channel));
            }
        }
        self.selected = channels.to_vec();
        Ok(())
    }

    fn start(&mut self, period_ms: u32) -> Result<(), OpenError> {
        if self.closed {
            return Err(OpenError::Closed);
        }
        if self.selected.is_empty() {
            // vendor behavior: starting with no explicit selection enables
            // the interface's default channel
            self.selected = vec![1];
        }
        self.period_ms = period_ms;
        self.sampling = true;
        Ok(())
    }

    fn read(&mut self) -> Result<Option<Vec<f64>>, ReadError> {
        if !self.sampling {
            return Err(ReadError::NotSampling);
        }

        if let Some(script) = &mut self.script {
            if script.is_empty() {
                return Ok(None);
            }
            self.reads += 1;
            return Ok(Some(script.remove(0)));
        }

        if let Some(budget) = self.read_budget {
            if self.reads >= budget {
                return Ok(None);
            }
        }

        let t = f64::from(self.reads) * f64::from(self.period_ms) / 1000.0;
        let values = self.selected.iter().map(|&ch| signal(ch, t)).collect();
        self.reads += 1;
        Ok(Some(values))
    }

    fn stop(&mut self) {
        self.sampling = false;
        self.stop_calls += 1;
    }

    fn close(&mut self) {
        self.closed = true;
        self.close_calls += 1;
    }

    fn enabled_sensor_info(&self) -> String {
        self.selected
            .iter()
            .filter_map(|&ch| channel_info(ch))
            .map(|(name, unit)| format!("{} ({})", name, unit))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_requires_a_device_name() {
        assert!(SimulatedDevice::open(Connection::Usb, "GDX-HD 15600161").is_ok());
        assert!(matches!(
            SimulatedDevice::open(Connection::Usb, "  "),
            Err(OpenError::NoDevice(_))
        ));
    }

    #[test]
    fn unknown_channel_is_rejected() {
        let mut device = SimulatedDevice::open(Connection::Usb, "sim").unwrap();
        assert!(matches!(
            device.select_sensors(&[1, 99]),
            Err(OpenError::UnknownChannel(99))
        ));
    }

    #[test]
    fn read_before_start_is_an_error() {
        let mut device = SimulatedDevice::open(Connection::Usb, "sim").unwrap();
        assert!(matches!(device.read(), Err(ReadError::NotSampling)));
    }

    #[test]
    fn generated_readings_cover_every_selected_channel() {
        let mut device = SimulatedDevice::open(Connection::Ble, "sim").unwrap();
        device.select_sensors(&[1, 2, 3]).unwrap();
        device.start(250).unwrap();

        let values = device.read().unwrap().expect("generates readings");
        assert_eq!(values.len(), 3);
        // t = 0 for the first read
        assert_eq!(values[0], 5.0);
        assert_eq!(values[1], 0.0);
        assert_eq!(values[2], 1.0);
    }

    #[test]
    fn read_budget_ends_the_stream() {
        let mut device = SimulatedDevice::open(Connection::Usb, "sim")
            .unwrap()
            .with_read_budget(2);
        device.start(100).unwrap();

        assert!(device.read().unwrap().is_some());
        assert!(device.read().unwrap().is_some());
        assert!(device.read().unwrap().is_none());
        assert!(device.read().unwrap().is_none());
        assert_eq!(device.reads(), 2);
    }

    #[test]
    fn start_without_selection_enables_the_default_channel() {
        let mut device = SimulatedDevice::open(Connection::Usb, "sim").unwrap();
        device.start(1000).unwrap();
        assert_eq!(device.enabled_sensor_info(), "Force (N)");
    }

    #[test]
    fn closed_device_cannot_be_reconfigured() {
        let mut device = SimulatedDevice::open(Connection::Usb, "sim").unwrap();
        device.close();
        assert!(matches!(device.select_sensors(&[1]), Err(OpenError::Closed)));
        assert!(matches!(device.start(100), Err(OpenError::Closed)));
    }
}
