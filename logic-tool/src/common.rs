use std::io::{Read, Write};

/// USB VID/PID pair the acquisition device enumerates under (§6 "Transport
/// discovery"). Used only by `--auto`; the core has no opinion about it.
pub const DEVICE_VID: u16 = 1155;
pub const DEVICE_PID: u16 = 22336;

#[derive(clap::Args, Debug, Clone)]
pub struct SerialPortArgs {
    #[arg(default_value_t = default_serial_port())]
    port: String,
    #[arg(short, long, default_value_t = 9600)]
    baud: u32,
    #[arg(long)]
    plain_file: bool,
}

pub fn default_serial_port() -> String {
    if let Ok(infos) = serialport::available_ports() {
        for info in &infos {
            if let serialport::SerialPortType::UsbPort(usb) = &info.port_type {
                if usb.vid == DEVICE_VID && usb.pid == DEVICE_PID {
                    return info.port_name.clone();
                }
            }
        }
        if let Some(info) = infos.into_iter().next() {
            return info.port_name;
        }
    }
    "/dev/ttyUSB0".to_owned()
}

#[derive(Debug)]
pub enum TransportReader {
    Serial(Box<dyn serialport::SerialPort>),
    File(std::fs::File),
}

impl Read for TransportReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::Serial(port) => port.read(buf),
            Self::File(file) => file.read(buf),
        }
    }
}

#[derive(Debug)]
pub enum TransportWriter {
    Serial(Box<dyn serialport::SerialPort>),
    File(std::fs::File),
}

impl Write for TransportWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::Serial(port) => port.write(buf),
            Self::File(file) => file.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::Serial(port) => port.flush(),
            Self::File(file) => file.flush(),
        }
    }
}

impl SerialPortArgs {
    /// Open the configured transport and split it into an independent
    /// reader/writer pair, since the ingest task and the command codec
    /// write concurrently (§5).
    pub fn open(&self) -> anyhow::Result<(TransportReader, TransportWriter)> {
        if self.plain_file {
            let file = std::fs::File::options()
                .read(true)
                .write(true)
                .open(&self.port)?;
            let writer = file.try_clone()?;
            Ok((TransportReader::File(file), TransportWriter::File(writer)))
        } else {
            let mut port = serialport::new(&self.port, self.baud).open()?;
            port.set_timeout(std::time::Duration::from_secs(1))?;
            let writer = port.try_clone()?;
            Ok((
                TransportReader::Serial(port),
                TransportWriter::Serial(writer),
            ))
        }
    }
}
