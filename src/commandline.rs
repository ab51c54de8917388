use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use socomec_lib::bus;
use std::path::PathBuf;
use std::time::Duration;

fn default_device_name() -> String {
    if cfg!(target_os = "windows") {
        String::from("COM1")
    } else {
        String::from("/dev/ttyUSB0")
    }
}

fn parse_address(s: &str) -> Result<bus::SlaveAddress, String> {
    let address_val =
        clap_num::maybe_hex::<u8>(s).map_err(|e| format!("Invalid address format: {e}"))?;
    bus::SlaveAddress::try_from(address_val).map_err(|e| e.to_string())
}

fn parse_baud_rate(s: &str) -> Result<bus::BaudRate, String> {
    let rate_val = s
        .parse::<u32>()
        .map_err(|e| format!("Invalid baud rate number format: {e}"))?;
    bus::BaudRate::try_from(rate_val).map_err(|e| e.to_string())
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum CliConnection {
    /// Connect to a meter via Modbus TCP.
    Tcp {
        /// The IP address or hostname and port of the Modbus TCP device or gateway.
        /// Example: "192.168.1.100:502".
        #[clap(verbatim_doc_comment)]
        address: String,

        /// The Modbus unit id of the meter behind the gateway.
        #[arg(short, long, default_value_t = bus::SlaveAddress::default(), value_parser = parse_address)]
        unit_id: bus::SlaveAddress,

        #[command(subcommand)]
        command: CliCommands,
    },
    /// Connect to a meter via Modbus RTU (Serial).
    Rtu {
        /// Serial port device name.
        /// Examples: "/dev/ttyUSB0" (Linux), "COM3" (Windows).
        #[arg(short, long, default_value_t = default_device_name(), verbatim_doc_comment)]
        device: String,

        /// Baud rate for serial communication.
        /// Supported values: 4800, 9600, 19200, 38400.
        #[arg(long, default_value_t = bus::BaudRate::default(), value_parser = parse_baud_rate, verbatim_doc_comment)]
        baud_rate: bus::BaudRate,

        /// The Modbus RTU device address (1 to 247, decimal or hexadecimal).
        #[arg(short, long, default_value_t = bus::SlaveAddress::default(), value_parser = parse_address)]
        address: bus::SlaveAddress,

        #[command(subcommand)]
        command: CliCommands,
    },
    /// Take the connection settings from a YAML configuration file.
    Config {
        /// Path of the configuration file.
        file: PathBuf,

        #[command(subcommand)]
        command: CliCommands,
    },
    /// Print the register ranges polled from the meter without connecting.
    Describe,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum CliCommands {
    /// Poll the meter once and print every channel.
    Read,

    /// Poll the meter once and print the generic meter roles.
    Roles,

    /// Run in daemon mode: continuously poll the meter and print every channel.
    Daemon {
        /// Interval between poll cycles (e.g., "10s", "1m")
        #[arg(value_parser = humantime::parse_duration, short, long, default_value = "2sec")]
        poll_interval: Duration,
    },
}

const fn about_text() -> &'static str {
    "Socomec meter poller - Read power and energy values from Socomec meters via Modbus RTU/TCP."
}

#[derive(Parser, Debug)]
#[command(name="meterpoll", author, version, about=about_text(), long_about = None, propagate_version = true)]
pub struct CliArgs {
    /// Configure verbosity of logging output.
    /// -v for info, -vv for debug, -vvv for trace.
    #[command(flatten)]
    pub verbose: Verbosity<WarnLevel>,

    /// Specifies the connection method and the command to run.
    #[command(subcommand)]
    pub connection: CliConnection,

    /// Identifier of the meter, used in log output.
    #[arg(global = true, long, default_value = "meter0")]
    pub id: String,

    /// Modbus I/O timeout for read operations.
    /// Examples: "1s", "500ms".
    #[arg(global = true, long, default_value = "500ms", value_parser = humantime::parse_duration, verbatim_doc_comment)]
    pub timeout: Duration,

    /// Minimum delay between two poll cycles sent to the same device.
    /// Important for Modbus RTU, especially with USB-to-RS485 converters that need
    /// time to switch between transmitting (TX) and receiving (RX) modes.
    #[arg(global = true, long, default_value = "50ms", value_parser = humantime::parse_duration, verbatim_doc_comment)]
    pub delay: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rtu_read() {
        let args = CliArgs::try_parse_from([
            "meterpoll",
            "rtu",
            "--baud-rate",
            "19200",
            "--address",
            "0x05",
            "read",
        ])
        .unwrap();
        assert_eq!(
            args.connection,
            CliConnection::Rtu {
                device: default_device_name(),
                baud_rate: bus::BaudRate::B19200,
                address: bus::SlaveAddress::try_from(5).unwrap(),
                command: CliCommands::Read,
            }
        );
        assert_eq!(args.timeout, Duration::from_millis(500));
    }

    #[test]
    fn rejects_invalid_bus_settings() {
        assert!(CliArgs::try_parse_from(["meterpoll", "rtu", "--baud-rate", "1200", "read"]).is_err());
        assert!(CliArgs::try_parse_from(["meterpoll", "rtu", "--address", "0", "read"]).is_err());
    }
}
