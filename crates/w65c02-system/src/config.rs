//! Declarative system configuration: how the CPU should be paced and which
//! devices to wire up, without the caller hand-writing [`crate::System`]
//! construction code.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a [`crate::System`] should pace cycle execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ExecutionMode {
    /// Run cycles as fast as the host can, with no pacing — the default for
    /// headless use (tests, batch trace generation).
    Unthrottled,
    /// Pace cycle execution to a wall-clock rate derived from `clock_hz`, so
    /// a host driving a UI observes real-time behavior.
    RealTime {
        /// Master clock rate in Hz to pace against.
        clock_hz: u64,
    },
}

impl Default for ExecutionMode {
    fn default() -> Self {
        Self::Unthrottled
    }
}

/// One device to be mapped when a [`SystemConfig`] is built into a
/// [`crate::System`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceDescriptor {
    /// Mapping name; must be unique within the system.
    pub name: String,
    /// First address of the device's window.
    pub start: u16,
    /// Last address (inclusive) of the device's window.
    pub end: u16,
    /// Whether writes to this device's window are rejected.
    #[cfg_attr(feature = "serde", serde(default))]
    pub read_only: bool,
}

impl DeviceDescriptor {
    /// Number of addresses this descriptor covers.
    #[must_use]
    pub fn size(&self) -> u32 {
        u32::from(self.end) - u32::from(self.start) + 1
    }
}

/// Declarative description of a complete system: pacing mode plus the
/// address map. Device *instances* are still supplied by the caller (a
/// `RAM` array has to come from somewhere) — `SystemConfig` only records
/// where each one goes, the way a linker script records segments without
/// containing their bytes.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SystemConfig {
    /// How the system should pace cycle execution.
    #[cfg_attr(feature = "serde", serde(default))]
    pub execution_mode: ExecutionMode,
    /// Declared device placements, validated against each other (but not
    /// against the devices actually supplied at build time) by
    /// [`Self::validate`].
    #[cfg_attr(feature = "serde", serde(default))]
    pub devices: Vec<DeviceDescriptor>,
}

impl SystemConfig {
    /// Check the declared device map for internal consistency: no zero-sized
    /// devices, no overlapping ranges, no duplicate names.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ConfigError`] describing the first problem
    /// found.
    pub fn validate(&self) -> Result<(), crate::error::ConfigError> {
        use crate::error::{BusError, ConfigError};

        let mut seen_names = std::collections::HashSet::new();
        for device in &self.devices {
            if device.start > device.end {
                return Err(ConfigError::Bus(BusError::InvalidRange {
                    start: device.start,
                    end: device.end,
                }));
            }
            if device.size() == 0 {
                return Err(ConfigError::ZeroSizedDevice(device.name.clone()));
            }
            if !seen_names.insert(device.name.clone()) {
                return Err(ConfigError::Bus(BusError::NameConflict(device.name.clone())));
            }
        }

        for (i, a) in self.devices.iter().enumerate() {
            for b in &self.devices[i + 1..] {
                let overlap = !(a.end < b.start || a.start > b.end);
                if overlap {
                    return Err(ConfigError::Bus(BusError::Overlap {
                        new_name: b.name.clone(),
                        new_start: b.start,
                        new_end: b.end,
                        existing_name: a.name.clone(),
                        existing_start: a.start,
                        existing_end: a.end,
                    }));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_execution_mode_is_unthrottled() {
        assert_eq!(ExecutionMode::default(), ExecutionMode::Unthrottled);
    }

    #[test]
    fn validate_rejects_overlapping_devices() {
        let config = SystemConfig {
            execution_mode: ExecutionMode::Unthrottled,
            devices: vec![
                DeviceDescriptor { name: "a".into(), start: 0x0000, end: 0x00FF, read_only: false },
                DeviceDescriptor { name: "b".into(), start: 0x00F0, end: 0x01FF, read_only: false },
            ],
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_disjoint_devices() {
        let config = SystemConfig {
            execution_mode: ExecutionMode::Unthrottled,
            devices: vec![
                DeviceDescriptor { name: "a".into(), start: 0x0000, end: 0x00FF, read_only: false },
                DeviceDescriptor { name: "b".into(), start: 0x0100, end: 0x01FF, read_only: false },
            ],
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_sized_device() {
        let config = SystemConfig {
            execution_mode: ExecutionMode::Unthrottled,
            devices: vec![DeviceDescriptor { name: "a".into(), start: 0x10, end: 0x00, read_only: false }],
        };
        assert!(config.validate().is_err());
    }
}
