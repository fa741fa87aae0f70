//! The three streaming protocol decoders (§4.E, §4.F, §4.G), each an owned,
//! sample-driven state machine.

pub mod i2c;
pub mod spi;
pub mod uart;

pub use i2c::I2cDecoder;
pub use spi::SpiDecoder;
pub use uart::UartDecoder;
