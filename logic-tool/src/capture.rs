use std::time::Duration;

use logic_core::{CoreConfig, Supervisor};

#[derive(clap::Args, Debug)]
pub struct CaptureOpts {
    #[command(flatten)]
    port: crate::common::SerialPortArgs,

    /// Run until interrupted instead of stopping once the buffer fills.
    #[arg(long)]
    continuous: bool,

    /// Ring buffer capacity, in samples.
    #[arg(long, default_value_t = 4096)]
    buffer_capacity: usize,

    /// Sample rate, in Hz.
    #[arg(long, default_value_t = 1000)]
    sample_rate_hz: u32,

    /// Number of samples per single-shot capture.
    #[arg(long, default_value_t = 300)]
    num_samples: u16,
}

impl crate::ToolRun for CaptureOpts {
    fn run(&self) -> anyhow::Result<()> {
        let (reader, writer) = self.port.open()?;

        let mut cfg = CoreConfig::default();
        cfg.buffer_capacity = self.buffer_capacity;
        cfg.sample_rate_hz = self.sample_rate_hz;
        cfg.num_samples = self.num_samples;

        let mut supervisor = Supervisor::new(reader, writer, cfg)?;
        supervisor.send_trigger_masks()?;

        if self.continuous {
            supervisor.set_continuous(true);
            supervisor.start()?;
        } else {
            supervisor.single_capture()?;
        }

        loop {
            while let Ok(event) = supervisor.events().try_recv() {
                println!("{:?}", event);
            }
            while let Ok(err) = supervisor.errors().try_recv() {
                log::warn!("transport error: {err}");
            }
            while let Ok((sample_index, fired)) = supervisor.triggers().try_recv() {
                println!("trigger @ {sample_index}: {fired:?}");
            }

            if !supervisor.is_acquiring() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        Ok(())
    }
}
