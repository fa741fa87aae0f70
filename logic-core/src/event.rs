//! Decoded events emitted by the protocol decoders (§3 `DecodedEvent`).

/// One decoded event, tagged with the group/channel it came from and the
/// sample index at which it occurred (§4.E/F/G "Sample-index policy").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedEvent {
    I2c {
        group: usize,
        kind: I2cEventKind,
        sample_index: u64,
    },
    Spi {
        group: usize,
        kind: SpiEventKind,
        sample_index: u64,
    },
    Uart {
        channel: usize,
        kind: UartEventKind,
        sample_index: u64,
    },
}

impl DecodedEvent {
    pub fn sample_index(&self) -> u64 {
        match self {
            DecodedEvent::I2c { sample_index, .. } => *sample_index,
            DecodedEvent::Spi { sample_index, .. } => *sample_index,
            DecodedEvent::Uart { sample_index, .. } => *sample_index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I2cEventKind {
    Start,
    /// `rw` is only meaningful for 7-bit addressing; `None` for 8-bit width.
    Address { value: u8, rw: Option<bool> },
    Ack(bool),
    Data(u8),
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiEventKind {
    SsActive,
    Data { mosi: u32, miso: u32 },
    SsInactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartEventKind {
    FrameByte(u8),
    FrameError,
}
