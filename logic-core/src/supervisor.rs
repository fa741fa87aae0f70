//! Core Supervisor (§4.H): owns the transport, ring buffer, trigger
//! evaluator, the three decoder sets, and configuration; fans samples out
//! to all of them and exposes an event stream.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use log::{debug, warn};

use crate::buffer::RingBuffers;
use crate::command::{
    sample_timer_period, trigger_edge_command, trigger_pins_command,
    trigger_timer_period_and_prescaler, CommandCodec,
};
use crate::config::CoreConfig;
use crate::decode::{I2cDecoder, SpiDecoder, UartDecoder};
use crate::error::CoreError;
use crate::event::DecodedEvent;
use crate::framer::LineFramer;
use crate::trigger::{BitSet8, TriggerEvaluator};

struct SharedState {
    config: CoreConfig,
    buffers: RingBuffers,
    trigger: TriggerEvaluator,
    i2c: Vec<I2cDecoder>,
    spi: Vec<SpiDecoder>,
    uart: Vec<UartDecoder>,
    last_sample: Option<u8>,
    /// `false` means single-capture: the ingest thread stops itself (and
    /// emits the stop command) once every channel buffer is full, instead
    /// of clearing and continuing (§4.H "Continuous vs single").
    continuous: bool,
}

impl SharedState {
    fn new(config: CoreConfig) -> Self {
        Self::build(&config)
    }

    fn build(config: &CoreConfig) -> Self {
        let i2c = config
            .i2c_groups
            .iter()
            .enumerate()
            .map(|(i, g)| I2cDecoder::new(i, *g))
            .collect();
        let spi = config
            .spi_groups
            .iter()
            .enumerate()
            .map(|(i, g)| SpiDecoder::new(i, *g))
            .collect();
        let uart = config
            .uart_channels
            .iter()
            .enumerate()
            .map(|(i, c)| UartDecoder::new(i, *c))
            .collect();

        Self {
            trigger: TriggerEvaluator::new(config.trigger_mode),
            buffers: RingBuffers::new(config.buffer_capacity),
            i2c,
            spi,
            uart,
            last_sample: None,
            continuous: true,
            config: config.clone(),
        }
    }

    fn reset_decoders(&mut self) {
        for d in &mut self.i2c {
            d.reset();
        }
        for d in &mut self.spi {
            d.reset();
        }
        for d in &mut self.uart {
            d.reset();
        }
    }

    fn clear(&mut self) {
        self.buffers.clear();
        self.last_sample = None;
        self.reset_decoders();
    }

    /// Process one accepted sample: append to the ring buffer, evaluate
    /// the trigger, and run every enabled decoder over it.
    fn ingest_sample(
        &mut self,
        sample: u8,
        events_tx: &mpsc::Sender<DecodedEvent>,
        triggers_tx: &mpsc::Sender<(u64, BitSet8)>,
    ) {
        let sample_index = self.buffers.total_samples();
        if let Some(prev) = self.last_sample {
            let fired = self.trigger.evaluate(prev, sample);
            if !fired.is_empty() {
                let _ = triggers_tx.send((sample_index, fired));
            }
        }
        self.buffers.append(sample);
        self.last_sample = Some(sample);

        for (i, group) in self.config.i2c_groups.iter().enumerate() {
            if !group.enabled {
                continue;
            }
            for event in self.i2c[i].step(sample_index, sample) {
                let _ = events_tx.send(event);
            }
        }
        for (i, group) in self.config.spi_groups.iter().enumerate() {
            if !group.enabled {
                continue;
            }
            for event in self.spi[i].step(sample_index, sample) {
                let _ = events_tx.send(event);
            }
        }
        for (i, ch) in self.config.uart_channels.iter().enumerate() {
            if !ch.enabled {
                continue;
            }
            for event in self.uart[i].step(sample_index, sample) {
                let _ = events_tx.send(event);
            }
        }
    }
}

/// Owns a transport and drives the acquisition/decode pipeline over it.
///
/// `R` and `W` are a split reader/writer pair over the same underlying
/// transport (e.g. `serialport`'s `try_clone()`), since the ingest task
/// and the command codec write concurrently (§5).
pub struct Supervisor<R, W> {
    state: Arc<Mutex<SharedState>>,
    reader: Option<R>,
    reader_return_rx: mpsc::Receiver<R>,
    reader_return_tx: mpsc::Sender<R>,
    codec: Arc<Mutex<CommandCodec<W>>>,
    events_rx: mpsc::Receiver<DecodedEvent>,
    events_tx: mpsc::Sender<DecodedEvent>,
    errors_rx: mpsc::Receiver<CoreError>,
    errors_tx: mpsc::Sender<CoreError>,
    triggers_rx: mpsc::Receiver<(u64, BitSet8)>,
    triggers_tx: mpsc::Sender<(u64, BitSet8)>,
    shutdown: Arc<AtomicBool>,
    acquiring: Arc<AtomicBool>,
    ingest_handle: Option<JoinHandle<()>>,
}

impl<R, W> Supervisor<R, W>
where
    R: Read + Send + 'static,
    W: Write + Send + 'static,
{
    pub fn new(reader: R, writer: W, config: CoreConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let (events_tx, events_rx) = mpsc::channel();
        let (errors_tx, errors_rx) = mpsc::channel();
        let (triggers_tx, triggers_rx) = mpsc::channel();
        let (reader_return_tx, reader_return_rx) = mpsc::channel();

        Ok(Self {
            state: Arc::new(Mutex::new(SharedState::new(config))),
            reader: Some(reader),
            reader_return_rx,
            reader_return_tx,
            codec: Arc::new(Mutex::new(CommandCodec::new(writer))),
            events_rx,
            events_tx,
            errors_rx,
            errors_tx,
            triggers_rx,
            triggers_tx,
            shutdown: Arc::new(AtomicBool::new(false)),
            acquiring: Arc::new(AtomicBool::new(false)),
            ingest_handle: None,
        })
    }

    /// Observable ordered sequence of decoded events (§4.H).
    pub fn events(&self) -> &mpsc::Receiver<DecodedEvent> {
        &self.events_rx
    }

    /// Side channel for transport errors (§7 "reported on a side channel").
    pub fn errors(&self) -> &mpsc::Receiver<CoreError> {
        &self.errors_rx
    }

    /// Fired trigger masks, one per sample transition that fired at least
    /// one channel's configured edge (§4.C: the evaluator only reports —
    /// this is where a caller implements pre-roll/stop/ignore policy).
    pub fn triggers(&self) -> &mpsc::Receiver<(u64, BitSet8)> {
        &self.triggers_rx
    }

    pub fn is_acquiring(&self) -> bool {
        self.acquiring.load(Ordering::Acquire)
    }

    pub fn total_samples(&self) -> u64 {
        self.state.lock().unwrap().buffers.total_samples()
    }

    /// Current contents of one channel's ring buffer, oldest first.
    /// `channel` is 0-indexed.
    pub fn snapshot(&self, channel: usize) -> Vec<bool> {
        self.state.lock().unwrap().buffers.snapshot(channel)
    }

    /// Install new configuration. Resets every decoder; only clears the
    /// ring buffer if `cfg.clears_history` is set (§4.H `configure`).
    pub fn configure(&mut self, cfg: CoreConfig) -> Result<(), CoreError> {
        cfg.validate()?;
        let mut state = self.state.lock().unwrap();

        state.i2c = cfg
            .i2c_groups
            .iter()
            .enumerate()
            .map(|(i, g)| I2cDecoder::new(i, *g))
            .collect();
        state.spi = cfg
            .spi_groups
            .iter()
            .enumerate()
            .map(|(i, g)| SpiDecoder::new(i, *g))
            .collect();
        state.uart = cfg
            .uart_channels
            .iter()
            .enumerate()
            .map(|(i, c)| UartDecoder::new(i, *c))
            .collect();
        state.trigger = TriggerEvaluator::new(cfg.trigger_mode);

        if cfg.clears_history {
            state.buffers = RingBuffers::new(cfg.buffer_capacity);
            state.last_sample = None;
        }
        state.config = cfg;
        Ok(())
    }

    /// Drop all ring buffer contents and reset every decoder (§3
    /// `Lifecycle`). Queued cursor associations are a front-end concern and
    /// have no representation in the core.
    pub fn clear_buffers(&mut self) {
        self.state.lock().unwrap().clear();
    }

    /// Emit op 0 and start the ingest task.
    pub fn start(&mut self) -> Result<(), CoreError> {
        if self.ingest_handle.is_some() {
            return Ok(());
        }
        if self.reader.is_none() {
            if let Ok(reader) = self.reader_return_rx.try_recv() {
                self.reader = Some(reader);
            }
        }
        if self.reader.is_none() {
            return Err(CoreError::ConfigError(
                "transport reader is not available (already running or never supplied)".into(),
            ));
        }

        // only take the reader once op 0 has actually been written; a failed
        // write must leave `self.reader` intact so the next `start()` call
        // can retry instead of permanently losing the read half.
        if let Err(err) = self.codec.lock().unwrap().start() {
            return Err(err);
        }
        let reader = self.reader.take().expect("checked Some above");
        self.shutdown.store(false, Ordering::Release);
        self.acquiring.store(true, Ordering::Release);

        let state = Arc::clone(&self.state);
        let codec = Arc::clone(&self.codec);
        let events_tx = self.events_tx.clone();
        let errors_tx = self.errors_tx.clone();
        let triggers_tx = self.triggers_tx.clone();
        let shutdown = Arc::clone(&self.shutdown);
        let acquiring = Arc::clone(&self.acquiring);
        let reader_return_tx = self.reader_return_tx.clone();

        self.ingest_handle = Some(std::thread::spawn(move || {
            ingest_loop(
                reader,
                state,
                codec,
                events_tx,
                errors_tx,
                triggers_tx,
                shutdown,
                acquiring,
                reader_return_tx,
            );
        }));
        Ok(())
    }

    /// Signal the ingest task to stop, emit op 1, and join it.
    pub fn stop(&mut self) -> Result<(), CoreError> {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.ingest_handle.take() {
            let _ = handle.join();
        }
        if self.reader.is_none() {
            if let Ok(reader) = self.reader_return_rx.try_recv() {
                self.reader = Some(reader);
            }
        }
        self.acquiring.store(false, Ordering::Release);
        self.codec.lock().unwrap().stop()
    }

    /// Clear buffers, run a single-shot capture: the ingest task stops
    /// itself (and emits op 1) once every channel buffer fills.
    pub fn single_capture(&mut self) -> Result<(), CoreError> {
        {
            let mut state = self.state.lock().unwrap();
            state.clear();
            state.continuous = false;
        }
        self.start()
    }

    /// Resume continuous mode: buffers clear and wrap instead of stopping
    /// the ingest task when full.
    pub fn set_continuous(&mut self, continuous: bool) {
        self.state.lock().unwrap().continuous = continuous;
    }

    /// Compute the sample period (§4.D) and emit ops 5+6.
    pub fn set_sample_rate(&mut self, sample_rate_hz: u32) -> Result<(), CoreError> {
        if !(1..=5_000_000).contains(&sample_rate_hz) {
            return Err(CoreError::ConfigError(
                "sample_rate_hz out of range 1..=5_000_000".into(),
            ));
        }
        let period = sample_timer_period(sample_rate_hz);
        self.codec.lock().unwrap().set_sample_timer_period(period)?;
        self.state.lock().unwrap().config.sample_rate_hz = sample_rate_hz;
        debug!("sample rate set to {sample_rate_hz} Hz (period {period})");
        Ok(())
    }

    /// Recompute the trigger timer period/prescaler and emit ops 4+7.
    pub fn set_num_samples(&mut self, num_samples: u16) -> Result<(), CoreError> {
        if !(1..=1023).contains(&num_samples) {
            return Err(CoreError::ConfigError(
                "num_samples out of range 1..=1023".into(),
            ));
        }
        let sample_rate_hz = self.state.lock().unwrap().config.sample_rate_hz;
        let (period, prescaler) = trigger_timer_period_and_prescaler(sample_rate_hz, num_samples);
        {
            let mut codec = self.codec.lock().unwrap();
            codec.set_trigger_timer_period(period)?;
            codec.set_trigger_timer_prescaler(prescaler)?;
        }
        self.state.lock().unwrap().config.num_samples = num_samples;
        Ok(())
    }

    /// Recompute the trigger timer period/prescaler and emit ops 4+7
    /// (§4.H groups this with `set_num_samples`).
    pub fn set_baud_rate(&mut self, baud_rate: u32) -> Result<(), CoreError> {
        if !crate::config::SUPPORTED_BAUD_RATES.contains(&baud_rate) {
            return Err(CoreError::ConfigError(format!(
                "unsupported baud_rate {baud_rate}"
            )));
        }
        let (sample_rate_hz, num_samples) = {
            let mut state = self.state.lock().unwrap();
            state.config.baud_rate = baud_rate;
            (state.config.sample_rate_hz, state.config.num_samples)
        };
        let (period, prescaler) = trigger_timer_period_and_prescaler(sample_rate_hz, num_samples);
        let mut codec = self.codec.lock().unwrap();
        codec.set_trigger_timer_period(period)?;
        codec.set_trigger_timer_prescaler(prescaler)
    }

    /// Emit ops 2+3 for the current trigger configuration.
    pub fn send_trigger_masks(&mut self) -> Result<(), CoreError> {
        let modes = self.state.lock().unwrap().trigger.modes;
        let edge = trigger_edge_command(&modes);
        let pins = trigger_pins_command(&modes);
        let mut codec = self.codec.lock().unwrap();
        codec.set_trigger_edge(edge)?;
        codec.set_trigger_pins(pins)
    }
}

#[allow(clippy::too_many_arguments)]
fn ingest_loop<R, W>(
    mut reader: R,
    state: Arc<Mutex<SharedState>>,
    codec: Arc<Mutex<CommandCodec<W>>>,
    events_tx: mpsc::Sender<DecodedEvent>,
    errors_tx: mpsc::Sender<CoreError>,
    triggers_tx: mpsc::Sender<(u64, BitSet8)>,
    shutdown: Arc<AtomicBool>,
    acquiring: Arc<AtomicBool>,
    reader_return_tx: mpsc::Sender<R>,
) where
    R: Read,
    W: Write,
{
    let mut framer = LineFramer::new();
    let mut chunk = [0u8; 4096];

    'ingest: while !shutdown.load(Ordering::Acquire) {
        let amt = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(amt) => amt,
            Err(err) => {
                warn!("transport read failed: {err}");
                let _ = errors_tx.send(CoreError::TransportReadError(err));
                break;
            }
        };

        let samples = framer.feed(&chunk[..amt]);
        for sample in samples {
            let mut guard = state.lock().unwrap();
            guard.ingest_sample(sample, &events_tx, &triggers_tx);

            if guard.buffers.is_full() {
                if guard.continuous {
                    debug!("ring buffer full, clearing and continuing (continuous mode)");
                    guard.clear();
                } else {
                    debug!("ring buffer full, stopping single capture");
                    drop(guard);
                    if let Err(err) = codec.lock().unwrap().stop() {
                        warn!("failed to send stop command: {err}");
                    }
                    acquiring.store(false, Ordering::Release);
                    break 'ingest;
                }
            }
        }
    }

    acquiring.store(false, Ordering::Release);
    let _ = reader_return_tx.send(reader);
}
