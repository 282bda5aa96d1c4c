//! Serial port enumeration and Pico auto-detection.

use tokio_serial::SerialPortType;

use crate::error::{Error, Result};
use crate::tracing::prelude::*;

/// USB vendor ID assigned to Raspberry Pi; every Pico enumerates with it.
pub const PICO_USB_VID: u16 = 0x2E8A;

/// A serial port found on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Device path, e.g. "/dev/ttyACM0" or "COM5"
    pub name: String,
    pub description: String,
    /// USB vendor ID, for USB ports only
    pub usb_vid: Option<u16>,
}

impl std::fmt::Display for PortInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.name, self.description)
    }
}

/// List the serial ports the OS knows about.
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let ports = tokio_serial::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|p| {
            let (description, usb_vid) = describe(&p.port_type);
            PortInfo {
                name: p.port_name,
                description,
                usb_vid,
            }
        })
        .collect())
}

/// Pick the port a Pico is attached to.
pub fn detect_port() -> Result<String> {
    let ports = list_ports()?;
    match find_pico(&ports) {
        Some(port) => {
            info!(port = %port.name, "Auto-detected Pico");
            Ok(port.name.clone())
        }
        None => Err(Error::NoPortFound),
    }
}

/// First port whose USB vendor ID is the Raspberry Pi one.
pub fn find_pico(ports: &[PortInfo]) -> Option<&PortInfo> {
    ports.iter().find(|p| p.usb_vid == Some(PICO_USB_VID))
}

fn describe(port_type: &SerialPortType) -> (String, Option<u16>) {
    match port_type {
        SerialPortType::UsbPort(info) => {
            let description = info
                .product
                .clone()
                .or_else(|| info.manufacturer.clone())
                .unwrap_or_else(|| format!("USB VID:PID={:04x}:{:04x}", info.vid, info.pid));
            (description, Some(info.vid))
        }
        SerialPortType::PciPort => ("PCI".to_string(), None),
        SerialPortType::BluetoothPort => ("Bluetooth".to_string(), None),
        SerialPortType::Unknown => ("n/a".to_string(), None),
    }
}
