// src/serial.rs
//! Serial port transports for the GPS receiver and notification link

use crate::error::{GeofenceError, Result};
use std::time::Duration;
use tokio_serial::{SerialPortBuilderExt, SerialStream};

/// Open a serial port for async reading and writing
pub fn open_port(port: &str, baudrate: u32) -> Result<SerialStream> {
    log::info!("Opening {} at {} baud", port, baudrate);

    tokio_serial::new(port, baudrate)
        .timeout(Duration::from_millis(1000))
        .open_native_async()
        .map_err(|e| GeofenceError::Connection(format!("Failed to open serial port {}: {}", port, e)))
}

/// List available serial ports
pub fn list_serial_ports() -> Result<()> {
    let ports = tokio_serial::available_ports()?;

    if ports.is_empty() {
        println!("No serial ports found.");
    } else {
        println!("Available serial ports:");
        for port in ports {
            println!("  {} - {:?}", port.port_name, port.port_type);
        }
    }

    Ok(())
}
