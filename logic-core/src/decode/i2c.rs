//! I²C Decoder (§4.E): one state machine per enabled [`I2cGroupConfig`].

use crate::config::{AddressWidth, I2cGroupConfig};
use crate::event::{DecodedEvent, I2cEventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    AfterStart,
    Ack,
    Data,
    Ack2,
}

/// Owned decoder state for one I²C group. The supervisor holds one of
/// these per configured group and dispatches every sample into it (§9
/// "give each decoder an owned state block").
#[derive(Debug, Clone)]
pub struct I2cDecoder {
    group: usize,
    config: I2cGroupConfig,
    state: State,
    prev_sda: u8,
    prev_scl: u8,
    accumulator: u8,
    bit_count: u8,
    /// sample index at which the bit currently being shifted in began.
    field_start: u64,
}

impl I2cDecoder {
    pub fn new(group: usize, config: I2cGroupConfig) -> Self {
        Self {
            group,
            config,
            state: State::Idle,
            prev_sda: 1,
            prev_scl: 1,
            accumulator: 0,
            bit_count: 0,
            field_start: 0,
        }
    }

    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.accumulator = 0;
        self.bit_count = 0;
    }

    fn address_width_bits(&self) -> u8 {
        // both widths shift in 8 bits; 7-bit addressing folds the R/W bit
        // into the low bit of those 8 (§4.E).
        8
    }

    /// Feed one sample (the whole 8-channel byte); emits 0 or more events.
    pub fn step(&mut self, sample_index: u64, sample: u8) -> Vec<DecodedEvent> {
        let sda = (sample >> (self.config.sda_channel - 1)) & 1;
        let scl = (sample >> (self.config.scl_channel - 1)) & 1;

        let scl_rising = scl == 1 && self.prev_scl == 0;
        let sda_falling_scl_high = sda == 0 && self.prev_sda == 1 && scl == 1;
        let sda_rising_scl_high = sda == 1 && self.prev_sda == 0 && scl == 1;

        let mut events = Vec::new();

        if sda_falling_scl_high {
            // a Start (or, mid-frame, a silent restart per §9's open question)
            events.push(DecodedEvent::I2c {
                group: self.group,
                kind: I2cEventKind::Start,
                sample_index,
            });
            self.accumulator = 0;
            self.bit_count = 0;
            self.state = State::AfterStart;
        } else if sda_rising_scl_high && self.state != State::Idle {
            events.push(DecodedEvent::I2c {
                group: self.group,
                kind: I2cEventKind::Stop,
                sample_index,
            });
            self.state = State::Idle;
        } else if scl_rising {
            match self.state {
                State::Idle => {}
                State::AfterStart => {
                    if self.bit_count == 0 {
                        self.field_start = sample_index;
                    }
                    self.accumulator = (self.accumulator << 1) | sda;
                    self.bit_count += 1;
                    if self.bit_count >= self.address_width_bits() {
                        let (value, rw) = match self.config.address_width {
                            AddressWidth::Seven => {
                                let rw_bit = self.accumulator & 1;
                                (self.accumulator >> 1, Some(rw_bit != 0))
                            }
                            AddressWidth::Eight => (self.accumulator, None),
                        };
                        events.push(DecodedEvent::I2c {
                            group: self.group,
                            kind: I2cEventKind::Address { value, rw },
                            sample_index: self.field_start,
                        });
                        self.bit_count = 0;
                        self.accumulator = 0;
                        self.state = State::Ack;
                    }
                }
                State::Ack | State::Ack2 => {
                    events.push(DecodedEvent::I2c {
                        group: self.group,
                        kind: I2cEventKind::Ack(sda != 0),
                        sample_index,
                    });
                    self.state = State::Data;
                }
                State::Data => {
                    if self.bit_count == 0 {
                        self.field_start = sample_index;
                    }
                    self.accumulator = (self.accumulator << 1) | sda;
                    self.bit_count += 1;
                    if self.bit_count >= 8 {
                        events.push(DecodedEvent::I2c {
                            group: self.group,
                            kind: I2cEventKind::Data(self.accumulator),
                            sample_index: self.field_start,
                        });
                        self.bit_count = 0;
                        self.accumulator = 0;
                        self.state = State::Ack2;
                    }
                }
            }
        }

        self.prev_sda = sda;
        self.prev_scl = scl;
        events
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::DataFormat;

    fn group(width: AddressWidth) -> I2cGroupConfig {
        I2cGroupConfig {
            sda_channel: 1,
            scl_channel: 2,
            address_width: width,
            data_format: DataFormat::Hexadecimal,
            enabled: true,
        }
    }

    /// Build a sample trace for Start -> address byte (MSB first) -> ACK ->
    /// data byte (MSB first) -> NACK -> Stop, holding each bit for 2
    /// samples (one to set SDA, one SCL rising edge).
    fn build_trace(address_byte: u8, data_byte: u8, ack_bit: u8, nack_bit: u8) -> Vec<u8> {
        const SDA: u8 = 1 << 0;
        const SCL: u8 = 1 << 1;
        let mut trace = Vec::new();

        // idle: both high
        trace.push(SDA | SCL);
        // start: sda falls while scl high
        trace.push(SCL);

        let mut push_bit = |trace: &mut Vec<u8>, bit: u8| {
            let sda_bit = if bit != 0 { SDA } else { 0 };
            trace.push(sda_bit); // scl low, sda settles
            trace.push(sda_bit | SCL); // scl rises, sda sampled
            trace.push(sda_bit); // scl falls again
        };

        for i in (0..8).rev() {
            push_bit(&mut trace, (address_byte >> i) & 1);
        }
        push_bit(&mut trace, ack_bit);
        for i in (0..8).rev() {
            push_bit(&mut trace, (data_byte >> i) & 1);
        }
        push_bit(&mut trace, nack_bit);

        // stop: sda rises while scl high
        trace.push(0);
        trace.push(SDA);
        trace.push(SDA | SCL);

        trace
    }

    fn run(group_cfg: I2cGroupConfig, trace: &[u8]) -> Vec<I2cEventKind> {
        let mut decoder = I2cDecoder::new(0, group_cfg);
        let mut kinds = Vec::new();
        for (i, &sample) in trace.iter().enumerate() {
            for event in decoder.step(i as u64, sample) {
                if let DecodedEvent::I2c { kind, .. } = event {
                    kinds.push(kind);
                }
            }
        }
        kinds
    }

    #[test]
    fn scenario_1_seven_bit_write() {
        // 0x50 address with rw=0 packed as 7-bit addr<<1 | rw
        let address_byte = (0x50 << 1) | 0;
        let trace = build_trace(address_byte, 0xA5, 0, 1);
        let kinds = run(group(AddressWidth::Seven), &trace);
        assert_eq!(
            kinds,
            vec![
                I2cEventKind::Start,
                I2cEventKind::Address {
                    value: 0x50,
                    rw: Some(false)
                },
                I2cEventKind::Ack(false),
                I2cEventKind::Data(0xA5),
                I2cEventKind::Ack(true),
                I2cEventKind::Stop,
            ]
        );
    }

    #[test]
    fn scenario_2_eight_bit_combined() {
        let trace = build_trace(0xA0, 0xA5, 0, 1);
        let kinds = run(group(AddressWidth::Eight), &trace);
        assert_eq!(
            kinds,
            vec![
                I2cEventKind::Start,
                I2cEventKind::Address {
                    value: 0xA0,
                    rw: None
                },
                I2cEventKind::Ack(false),
                I2cEventKind::Data(0xA5),
                I2cEventKind::Ack(true),
                I2cEventKind::Stop,
            ]
        );
    }

    #[test]
    fn restart_terminates_frame_without_stop() {
        let mut decoder = I2cDecoder::new(0, group(AddressWidth::Eight));
        const SDA: u8 = 1;
        const SCL: u8 = 2;
        // start, then immediately another start (sda falls while scl high twice)
        let trace = [SDA | SCL, SCL, 0, SDA, SDA | SCL];
        let mut kinds = Vec::new();
        for (i, &s) in trace.iter().enumerate() {
            for e in decoder.step(i as u64, s) {
                if let DecodedEvent::I2c { kind, .. } = e {
                    kinds.push(kind);
                }
            }
        }
        assert_eq!(kinds, vec![I2cEventKind::Start, I2cEventKind::Start]);
    }

    #[test]
    fn event_sample_index_always_precedes_total_samples() {
        let trace = build_trace(0xA0, 0xA5, 0, 1);
        let mut decoder = I2cDecoder::new(0, group(AddressWidth::Eight));
        let total = trace.len() as u64;
        for (i, &s) in trace.iter().enumerate() {
            for e in decoder.step(i as u64, s) {
                assert!(e.sample_index() < total);
            }
        }
    }
}
