//! Configuration surface (§6) and the per-group/per-channel option records (§3).

use crate::error::CoreError;
use crate::format::DataFormat;

/// Edge-trigger policy for one channel (§3 `Trigger Configuration`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerMode {
    #[default]
    NoTrigger,
    RisingEdge,
    FallingEdge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressWidth {
    Seven,
    Eight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstBit {
    Msb,
    Lsb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SsActiveLevel {
    Low,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartPolarity {
    Standard,
    Inverted,
}

/// One I²C group (§3 `I²C Group`). Channels are 1-indexed, matching the
/// wire-level trigger mask convention (bit *i* == channel *i+1*).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cGroupConfig {
    pub sda_channel: u8,
    pub scl_channel: u8,
    pub address_width: AddressWidth,
    pub data_format: DataFormat,
    pub enabled: bool,
}

impl I2cGroupConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(1..=8).contains(&self.sda_channel) || !(1..=8).contains(&self.scl_channel) {
            return Err(CoreError::ConfigError(
                "i2c channel out of range 1..=8".into(),
            ));
        }
        if self.sda_channel == self.scl_channel {
            return Err(CoreError::ConfigError(
                "i2c group sda_channel must not equal scl_channel".into(),
            ));
        }
        Ok(())
    }
}

impl Default for I2cGroupConfig {
    fn default() -> Self {
        Self {
            sda_channel: 1,
            scl_channel: 2,
            address_width: AddressWidth::Seven,
            data_format: DataFormat::default(),
            enabled: false,
        }
    }
}

/// One SPI group (§3 `SPI Group`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiGroupConfig {
    pub ss_channel: u8,
    pub clk_channel: u8,
    pub mosi_channel: u8,
    pub miso_channel: u8,
    pub bits: u8,
    pub first_bit: FirstBit,
    pub ss_active: SsActiveLevel,
    pub data_format: DataFormat,
    pub enabled: bool,
}

impl SpiGroupConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        for ch in [
            self.ss_channel,
            self.clk_channel,
            self.mosi_channel,
            self.miso_channel,
        ] {
            if !(1..=8).contains(&ch) {
                return Err(CoreError::ConfigError(
                    "spi channel out of range 1..=8".into(),
                ));
            }
        }
        if !(1..=32).contains(&self.bits) {
            return Err(CoreError::ConfigError("spi bits out of range 1..=32".into()));
        }
        Ok(())
    }
}

impl Default for SpiGroupConfig {
    fn default() -> Self {
        Self {
            ss_channel: 1,
            clk_channel: 2,
            mosi_channel: 3,
            miso_channel: 4,
            bits: 8,
            first_bit: FirstBit::Msb,
            ss_active: SsActiveLevel::Low,
            data_format: DataFormat::default(),
            enabled: false,
        }
    }
}

/// One UART channel (§3 `UART Channel`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartChannelConfig {
    pub data_channel: u8,
    pub polarity: UartPolarity,
    pub stop_bits: u8,
    pub data_format: DataFormat,
    pub enabled: bool,
}

impl UartChannelConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(1..=8).contains(&self.data_channel) {
            return Err(CoreError::ConfigError(
                "uart data_channel out of range 1..=8".into(),
            ));
        }
        if !(0..=3).contains(&self.stop_bits) {
            return Err(CoreError::ConfigError(
                "uart stop_bits out of range 0..=3".into(),
            ));
        }
        Ok(())
    }
}

impl Default for UartChannelConfig {
    fn default() -> Self {
        Self {
            data_channel: 1,
            polarity: UartPolarity::Standard,
            stop_bits: 1,
            data_format: DataFormat::default(),
            enabled: false,
        }
    }
}

/// The supported UART baud rates (§6).
pub const SUPPORTED_BAUD_RATES: [u32; 10] = [
    300, 1200, 2400, 4800, 9600, 19200, 38400, 57600, 74880, 115200,
];

/// Flat configuration value for the whole core (§9 "Deep class hierarchies
/// in the source ... the core carries only a small, flat `CoreConfig`
/// value").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub buffer_capacity: usize,
    pub sample_rate_hz: u32,
    pub num_samples: u16,
    pub baud_rate: u32,
    pub trigger_mode: [TriggerMode; 8],
    pub i2c_groups: [I2cGroupConfig; 4],
    pub spi_groups: [SpiGroupConfig; 2],
    pub uart_channels: [UartChannelConfig; 8],
    pub default_data_format: DataFormat,
    /// Whether a call to [`crate::supervisor::Supervisor::configure`] with
    /// this config should also clear the ring buffer and decoder state.
    pub clears_history: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 4096,
            sample_rate_hz: 1000,
            num_samples: 300,
            baud_rate: 9600,
            trigger_mode: [TriggerMode::default(); 8],
            i2c_groups: [I2cGroupConfig::default(); 4],
            spi_groups: [SpiGroupConfig::default(); 2],
            uart_channels: [UartChannelConfig::default(); 8],
            default_data_format: DataFormat::default(),
            clears_history: false,
        }
    }
}

impl CoreConfig {
    /// Validate the whole configuration, matching §7's `ConfigError`
    /// "surfaced synchronously ... leaves state unchanged" policy.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.buffer_capacity == 0 {
            return Err(CoreError::ConfigError(
                "buffer_capacity must be positive".into(),
            ));
        }
        if !(1..=5_000_000).contains(&self.sample_rate_hz) {
            return Err(CoreError::ConfigError(
                "sample_rate_hz out of range 1..=5_000_000".into(),
            ));
        }
        if !(1..=1023).contains(&self.num_samples) {
            return Err(CoreError::ConfigError(
                "num_samples out of range 1..=1023".into(),
            ));
        }
        if !SUPPORTED_BAUD_RATES.contains(&self.baud_rate) {
            return Err(CoreError::ConfigError(format!(
                "unsupported baud_rate {}",
                self.baud_rate
            )));
        }
        for g in &self.i2c_groups {
            g.validate()?;
        }
        for g in &self.spi_groups {
            g.validate()?;
        }
        for c in &self.uart_channels {
            c.validate()?;
        }
        Ok(())
    }
}
