use bilge::prelude::*;

const NOMINAL_BATTERY_VOLTAGE: f64 = 12.0;

/// Largest value of a 15-bit disable counter.
const MAX_DISABLE_COUNT: u16 = 0x7FFF;

/// One flag per user voltage rail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RailFlags {
    pub user_3v3: bool,
    pub user_5v: bool,
    pub user_6v: bool,
}

impl RailFlags {
    pub const ALL: RailFlags = RailFlags {
        user_3v3: true,
        user_5v: true,
        user_6v: true,
    };
}

/// Overcurrent fault counters per user rail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RailFaultCounts {
    pub overcurrent_3v3: u8,
    pub overcurrent_5v: u8,
    pub overcurrent_6v: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Power {
    status: RailFlags,
    fault_counts: RailFaultCounts,
    disabled: RailFlags,
    vin_voltage: f64,
}

impl Default for Power {
    fn default() -> Self {
        Self::new()
    }
}

impl Power {
    pub fn new() -> Self {
        Self {
            status: RailFlags::ALL,
            fault_counts: RailFaultCounts::default(),
            disabled: RailFlags::default(),
            vin_voltage: NOMINAL_BATTERY_VOLTAGE,
        }
    }

    /// Rails currently up.
    pub fn status(&self) -> RailFlags {
        self.status
    }

    pub fn set_status(&mut self, status: RailFlags) {
        self.status = status;
    }

    pub fn fault_counts(&self) -> RailFaultCounts {
        self.fault_counts
    }

    pub fn set_fault_counts(&mut self, counts: RailFaultCounts) {
        self.fault_counts = counts;
    }

    /// Rails software has switched off.
    pub fn disabled(&self) -> RailFlags {
        self.disabled
    }

    pub fn set_disabled(&mut self, disabled: RailFlags) {
        self.disabled = disabled;
    }

    pub fn vin_voltage(&self) -> f64 {
        self.vin_voltage
    }

    pub fn set_vin_voltage(&mut self, volts: f64) {
        self.vin_voltage = volts;
    }
}

/// System watchdog status word.
#[bitsize(32)]
#[derive(FromBits, DebugBits, Clone, Copy, PartialEq, Eq)]
pub struct WatchdogStatus {
    pub system_active: bool,
    pub alive: bool,
    pub sys_disable_count: u15,
    pub power_disable_count: u15,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SysWatchdog {
    status: WatchdogStatus,
}

impl Default for SysWatchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl SysWatchdog {
    /// Comes up active and alive: a fresh controller is not tripped.
    pub fn new() -> Self {
        let mut status = WatchdogStatus::from(0u32);
        status.set_system_active(true);
        status.set_alive(true);
        Self { status }
    }

    pub fn status(&self) -> WatchdogStatus {
        self.status
    }

    pub fn set_status(&mut self, status: WatchdogStatus) {
        self.status = status;
    }

    pub fn is_tripped(&self) -> bool {
        !self.status.alive()
    }

    /// Marks the watchdog expired and counts the resulting system disable.
    /// The counter saturates at its 15-bit maximum.
    pub fn trip(&mut self) {
        self.status.set_alive(false);
        self.status.set_system_active(false);
        let count = self.status.sys_disable_count().value().saturating_add(1).min(MAX_DISABLE_COUNT);
        self.status.set_sys_disable_count(u15::new(count));
    }

    pub fn feed(&mut self) {
        self.status.set_alive(true);
        self.status.set_system_active(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_rest_state() {
        let power = Power::new();
        assert_eq!(power.status(), RailFlags::ALL);
        assert_eq!(power.disabled(), RailFlags::default());
        assert_eq!(power.fault_counts(), RailFaultCounts::default());
    }

    #[test]
    fn test_watchdog_trip_and_feed() {
        let mut watchdog = SysWatchdog::new();
        assert!(!watchdog.is_tripped());

        watchdog.trip();
        assert!(watchdog.is_tripped());
        assert_eq!(watchdog.status().sys_disable_count().value(), 1);

        watchdog.feed();
        assert!(!watchdog.is_tripped());
        assert_eq!(watchdog.status().sys_disable_count().value(), 1);
    }

    #[test]
    fn test_disable_count_saturates() {
        let mut watchdog = SysWatchdog::new();
        let mut status = watchdog.status();
        status.set_sys_disable_count(u15::new(MAX_DISABLE_COUNT - 1));
        watchdog.set_status(status);

        watchdog.trip();
        assert_eq!(watchdog.status().sys_disable_count().value(), MAX_DISABLE_COUNT);
        watchdog.feed();
        watchdog.trip();
        assert_eq!(watchdog.status().sys_disable_count().value(), MAX_DISABLE_COUNT);
        assert_eq!(watchdog.status().power_disable_count().value(), 0);
    }

    #[test]
    fn test_watchdog_word_layout() {
        let status = SysWatchdog::new().status();
        assert_eq!(u32::from(status), 0b11);
    }
}
