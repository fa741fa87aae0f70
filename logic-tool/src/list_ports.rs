use crate::common::{DEVICE_PID, DEVICE_VID};

#[derive(clap::Args, Debug)]
pub struct ListPortsOpts {
    /// Only show the port matching the acquisition device's USB VID/PID.
    #[arg(long)]
    auto: bool,
}

impl crate::ToolRun for ListPortsOpts {
    fn run(&self) -> anyhow::Result<()> {
        for port in serialport::available_ports()? {
            let is_device = matches!(
                &port.port_type,
                serialport::SerialPortType::UsbPort(usb)
                    if usb.vid == DEVICE_VID && usb.pid == DEVICE_PID
            );
            if self.auto && !is_device {
                continue;
            }

            if is_device {
                println!("* {}", port.port_name);
            } else {
                println!("  {}", port.port_name);
            }
            if let serialport::SerialPortType::UsbPort(usb) = port.port_type {
                println!("    - USB {:x}:{:x}", usb.vid, usb.pid);
                if let Some(serial_number) = usb.serial_number {
                    println!("    - S/N: {}", serial_number);
                }
                if let Some(product) = usb.product {
                    println!("    - {}", product);
                }
            }
        }
        Ok(())
    }
}
