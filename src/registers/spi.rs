use bilge::prelude::*;

#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoTriggerConfig {
    pub trigger_channel: u4,
    pub external_clock_source: bool,
    pub rising_edge: bool,
    pub falling_edge: bool,
    pub reserved: u1,
}

#[bitsize(16)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoByteCount {
    pub tx_byte_count: u4,
    pub zero_byte_count: u7,
    pub reserved: u5,
}

#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChipSelectActiveHigh {
    pub hdr: u4,
    pub mxp: bool,
    pub reserved: u3,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpiSystem {
    auto_trigger_config: AutoTriggerConfig,
    auto_byte_count: AutoByteCount,
    chip_select_active_high: ChipSelectActiveHigh,
    auto_chip_select: u8,
    auto_spi_1_select: bool,
    auto_rate: u32,
    enabled_dio: u8,
}

impl SpiSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auto_trigger_config(&self) -> AutoTriggerConfig {
        self.auto_trigger_config
    }

    pub fn set_auto_trigger_config(&mut self, config: AutoTriggerConfig) {
        self.auto_trigger_config = config;
    }

    pub fn auto_byte_count(&self) -> AutoByteCount {
        self.auto_byte_count
    }

    pub fn set_auto_byte_count(&mut self, count: AutoByteCount) {
        self.auto_byte_count = count;
    }

    pub fn chip_select_active_high(&self) -> ChipSelectActiveHigh {
        self.chip_select_active_high
    }

    pub fn set_chip_select_active_high(&mut self, value: ChipSelectActiveHigh) {
        self.chip_select_active_high = value;
    }

    pub fn auto_chip_select(&self) -> u8 {
        self.auto_chip_select
    }

    pub fn set_auto_chip_select(&mut self, chip_select: u8) {
        self.auto_chip_select = chip_select;
    }

    pub fn auto_spi_1_select(&self) -> bool {
        self.auto_spi_1_select
    }

    pub fn set_auto_spi_1_select(&mut self, select: bool) {
        self.auto_spi_1_select = select;
    }

    pub fn auto_rate(&self) -> u32 {
        self.auto_rate
    }

    pub fn set_auto_rate(&mut self, rate: u32) {
        self.auto_rate = rate;
    }

    pub fn enabled_dio(&self) -> u8 {
        self.enabled_dio
    }

    pub fn set_enabled_dio(&mut self, enabled: u8) {
        self.enabled_dio = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_count_layout() {
        let mut count = AutoByteCount::from(0u16);
        count.set_tx_byte_count(u4::new(0xF));
        count.set_zero_byte_count(u7::new(0x7F));
        assert_eq!(u16::from(count), 0x07FF);

        let mut spi = SpiSystem::new();
        spi.set_auto_byte_count(count);
        assert_eq!(spi.auto_byte_count().zero_byte_count().value(), 0x7F);
    }

    #[test]
    fn test_chip_select_active_high() {
        let value = ChipSelectActiveHigh::from(0b0001_0101u8);
        assert_eq!(value.hdr().value(), 0b0101);
        assert!(value.mxp());
    }
}
