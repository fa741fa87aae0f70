//! SPI Decoder (§4.F): one state machine per enabled [`SpiGroupConfig`].
//!
//! Assumes CPOL=0, CPHA=0 (sample on the rising CLK edge) — the only mode
//! the original tool supported (§9 open question).

use crate::config::{FirstBit, SpiGroupConfig, SsActiveLevel};
use crate::event::{DecodedEvent, SpiEventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Receive,
}

#[derive(Debug, Clone)]
pub struct SpiDecoder {
    group: usize,
    config: SpiGroupConfig,
    state: State,
    mosi_bits: u32,
    miso_bits: u32,
    bit_count: u8,
    prev_clk: u8,
    prev_ss: u8,
}

impl SpiDecoder {
    pub fn new(group: usize, config: SpiGroupConfig) -> Self {
        Self {
            group,
            config,
            state: State::Idle,
            mosi_bits: 0,
            miso_bits: 0,
            bit_count: 0,
            prev_clk: 0,
            prev_ss: 1,
        }
    }

    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.mosi_bits = 0;
        self.miso_bits = 0;
        self.bit_count = 0;
    }

    fn active_level(&self) -> u8 {
        match self.config.ss_active {
            SsActiveLevel::Low => 0,
            SsActiveLevel::High => 1,
        }
    }

    fn append_bit(&mut self, mosi: u8, miso: u8) {
        match self.config.first_bit {
            FirstBit::Msb => {
                self.mosi_bits = (self.mosi_bits << 1) | mosi as u32;
                self.miso_bits = (self.miso_bits << 1) | miso as u32;
            }
            FirstBit::Lsb => {
                self.mosi_bits |= (mosi as u32) << self.bit_count;
                self.miso_bits |= (miso as u32) << self.bit_count;
            }
        }
        self.bit_count += 1;
    }

    fn flush(&mut self, sample_index: u64) -> Option<DecodedEvent> {
        if self.bit_count == 0 {
            return None;
        }
        let event = DecodedEvent::Spi {
            group: self.group,
            kind: SpiEventKind::Data {
                mosi: self.mosi_bits,
                miso: self.miso_bits,
            },
            sample_index,
        };
        self.mosi_bits = 0;
        self.miso_bits = 0;
        self.bit_count = 0;
        Some(event)
    }

    /// Feed one sample; emits 0 or more events.
    pub fn step(&mut self, sample_index: u64, sample: u8) -> Vec<DecodedEvent> {
        let ss = (sample >> (self.config.ss_channel - 1)) & 1;
        let clk = (sample >> (self.config.clk_channel - 1)) & 1;
        let mosi = (sample >> (self.config.mosi_channel - 1)) & 1;
        let miso = (sample >> (self.config.miso_channel - 1)) & 1;

        let clk_rising = clk == 1 && self.prev_clk == 0;
        let active = self.active_level();
        let ss_became_active = ss == active && self.prev_ss != active;
        let ss_became_inactive = ss != active && self.prev_ss == active;

        let mut events = Vec::new();

        match self.state {
            State::Idle => {
                if ss_became_active {
                    self.state = State::Receive;
                    self.mosi_bits = 0;
                    self.miso_bits = 0;
                    self.bit_count = 0;
                    events.push(DecodedEvent::Spi {
                        group: self.group,
                        kind: SpiEventKind::SsActive,
                        sample_index,
                    });
                }
            }
            State::Receive => {
                if ss_became_inactive {
                    if let Some(event) = self.flush(sample_index) {
                        events.push(event);
                    }
                    events.push(DecodedEvent::Spi {
                        group: self.group,
                        kind: SpiEventKind::SsInactive,
                        sample_index,
                    });
                    self.state = State::Idle;
                } else if clk_rising {
                    self.append_bit(mosi, miso);
                    if self.bit_count as u32 >= self.config.bits as u32 {
                        if let Some(event) = self.flush(sample_index) {
                            events.push(event);
                        }
                    }
                }
            }
        }

        self.prev_clk = clk;
        self.prev_ss = ss;
        events
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::DataFormat;

    fn group() -> SpiGroupConfig {
        SpiGroupConfig {
            ss_channel: 1,
            clk_channel: 2,
            mosi_channel: 3,
            miso_channel: 4,
            bits: 8,
            first_bit: FirstBit::Msb,
            ss_active: SsActiveLevel::Low,
            data_format: DataFormat::Hexadecimal,
            enabled: true,
        }
    }

    fn build_trace(mosi_byte: u8, miso_byte: u8) -> Vec<u8> {
        const SS: u8 = 1 << 0;
        const CLK: u8 = 1 << 1;
        const MOSI: u8 = 1 << 2;
        const MISO: u8 = 1 << 3;

        let mut trace = vec![SS]; // idle, ss inactive (high)
        trace.push(0); // ss active (low), starts RECEIVE

        for i in (0..8).rev() {
            let mosi_bit = if (mosi_byte >> i) & 1 != 0 { MOSI } else { 0 };
            let miso_bit = if (miso_byte >> i) & 1 != 0 { MISO } else { 0 };
            trace.push(mosi_bit | miso_bit); // clk low, data settles
            trace.push(mosi_bit | miso_bit | CLK); // clk rises, sampled
            trace.push(mosi_bit | miso_bit); // clk falls
        }

        trace.push(SS); // ss inactive again
        trace
    }

    fn run(trace: &[u8]) -> Vec<SpiEventKind> {
        let mut decoder = SpiDecoder::new(0, group());
        let mut kinds = Vec::new();
        for (i, &sample) in trace.iter().enumerate() {
            for event in decoder.step(i as u64, sample) {
                if let DecodedEvent::Spi { kind, .. } = event {
                    kinds.push(kind);
                }
            }
        }
        kinds
    }

    #[test]
    fn scenario_3_spi_8bit_msb() {
        let trace = build_trace(0b1011_0010, 0b0000_1111);
        let kinds = run(&trace);
        assert_eq!(
            kinds,
            vec![
                SpiEventKind::SsActive,
                SpiEventKind::Data {
                    mosi: 0xB2,
                    miso: 0x0F
                },
                SpiEventKind::SsInactive,
            ]
        );
    }

    #[test]
    fn data_only_occurs_between_ss_active_and_inactive() {
        let trace = build_trace(0xAA, 0x55);
        let mut decoder = SpiDecoder::new(0, group());
        let mut active = false;
        for (i, &sample) in trace.iter().enumerate() {
            for event in decoder.step(i as u64, sample) {
                match event {
                    DecodedEvent::Spi {
                        kind: SpiEventKind::SsActive,
                        ..
                    } => active = true,
                    DecodedEvent::Spi {
                        kind: SpiEventKind::SsInactive,
                        ..
                    } => active = false,
                    DecodedEvent::Spi {
                        kind: SpiEventKind::Data { .. },
                        ..
                    } => assert!(active, "Data event outside of SSActive/SSInactive"),
                    _ => unreachable!(),
                }
            }
        }
    }

    #[test]
    fn partial_byte_flushed_when_ss_deasserts_early() {
        const SS: u8 = 1 << 0;
        const CLK: u8 = 1 << 1;
        const MOSI: u8 = 1 << 2;
        let trace = [SS, 0, MOSI, MOSI | CLK, MOSI, SS];
        let mut decoder = SpiDecoder::new(0, group());
        let mut kinds = Vec::new();
        for (i, &s) in trace.iter().enumerate() {
            for e in decoder.step(i as u64, s) {
                if let DecodedEvent::Spi { kind, .. } = e {
                    kinds.push(kind);
                }
            }
        }
        assert_eq!(
            kinds,
            vec![
                SpiEventKind::SsActive,
                SpiEventKind::Data { mosi: 1, miso: 0 },
                SpiEventKind::SsInactive,
            ]
        );
    }
}
