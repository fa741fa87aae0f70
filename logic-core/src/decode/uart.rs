//! UART Decoder (§4.G): one 16x-oversampling state machine per enabled
//! [`UartChannelConfig`].
//!
//! Assumes the host configured `sample_rate = baud_rate * 16`; if violated,
//! output is undefined, per spec.

use std::collections::VecDeque;

use crate::config::{UartChannelConfig, UartPolarity};
use crate::event::{DecodedEvent, UartEventKind};

const OVERSAMPLE: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    StartBit,
    DataBits,
    StopBits,
}

#[derive(Debug, Clone)]
pub struct UartDecoder {
    channel: usize,
    config: UartChannelConfig,
    state: State,
    /// last up to 16 polarity-adjusted samples, oldest first.
    window: VecDeque<u8>,
    counter: u32,
    current_byte: u8,
    bit_index: u8,
    /// sample index at which STOP_BITS was entered — the byte boundary
    /// (§4.G "Sample-index: the sample at which the stop state was
    /// entered").
    byte_sample_index: u64,
    stop_bit_mismatch: bool,
}

impl UartDecoder {
    pub fn new(channel: usize, config: UartChannelConfig) -> Self {
        Self {
            channel,
            config,
            state: State::Idle,
            window: VecDeque::with_capacity(OVERSAMPLE as usize),
            counter: 0,
            current_byte: 0,
            bit_index: 0,
            byte_sample_index: 0,
            stop_bit_mismatch: false,
        }
    }

    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.window.clear();
        self.counter = 0;
        self.current_byte = 0;
        self.bit_index = 0;
        self.stop_bit_mismatch = false;
    }

    fn push_window(&mut self, bit: u8) {
        if self.window.len() >= OVERSAMPLE as usize {
            self.window.pop_front();
        }
        self.window.push_back(bit);
    }

    /// Majority vote of the three mid-bit samples (indices 7..9) of the
    /// current 16-sample window.
    fn mid_bit_majority(&self) -> u8 {
        let sum: u32 = self.window.iter().skip(7).take(3).map(|&b| b as u32).sum();
        if sum >= 2 {
            1
        } else {
            0
        }
    }

    /// Feed one sample; emits 0 or more events.
    pub fn step(&mut self, sample_index: u64, sample: u8) -> Vec<DecodedEvent> {
        let mut bit = (sample >> (self.config.data_channel - 1)) & 1;
        if matches!(self.config.polarity, UartPolarity::Inverted) {
            bit ^= 1;
        }
        self.push_window(bit);

        let mut events = Vec::new();

        match self.state {
            State::Idle => {
                if bit == 0 {
                    self.state = State::StartBit;
                    self.counter = 1;
                }
            }
            State::StartBit => {
                self.counter += 1;
                if self.counter >= OVERSAMPLE {
                    if self.mid_bit_majority() == 0 {
                        self.state = State::DataBits;
                        self.counter = 0;
                        self.current_byte = 0;
                        self.bit_index = 0;
                    } else {
                        // false start bit
                        self.state = State::Idle;
                    }
                }
            }
            State::DataBits => {
                self.counter += 1;
                if self.counter % OVERSAMPLE == 0 {
                    let bit_value = self.mid_bit_majority();
                    self.current_byte |= bit_value << self.bit_index;
                    self.bit_index += 1;
                    if self.bit_index >= 8 {
                        self.byte_sample_index = sample_index;
                        self.stop_bit_mismatch = false;
                        self.state = State::StopBits;
                        self.counter = 0;
                    }
                }
            }
            State::StopBits => {
                self.counter += 1;
                if self.counter % OVERSAMPLE == 0 && self.mid_bit_majority() != 1 {
                    self.stop_bit_mismatch = true;
                }
                if self.counter >= OVERSAMPLE * self.config.stop_bits as u32 {
                    let kind = if self.stop_bit_mismatch {
                        UartEventKind::FrameError
                    } else {
                        UartEventKind::FrameByte(self.current_byte)
                    };
                    events.push(DecodedEvent::Uart {
                        channel: self.channel,
                        kind,
                        sample_index: self.byte_sample_index,
                    });
                    self.state = State::Idle;
                    self.counter = 0;
                }
            }
        }

        events
    }
}
