//! Socomec Meter Poller CLI
//!
//! A command-line interface (CLI) application for reading power and energy
//! values from Socomec energy meters using Modbus RTU (serial) or Modbus TCP.
//!
//! This tool allows users to:
//! - Print the register ranges polled from the meter.
//! - Poll the meter once and print every decoded channel.
//! - Poll the meter once and print the generic meter roles.
//! - Run in a continuous daemon mode printing every poll cycle to the console.
//!
//! The CLI leverages the `socomec_lib` crate for the register map and client operations.

use anyhow::{bail, Context, Result};
use clap::Parser;
use flexi_logger::{Logger, LoggerHandle};
use log::*;
use socomec_lib::{
    bus,
    nature::{DeviceNature, MeterNature, MeterRole},
    protocol::PollReport,
    socomec::SocomecMeter,
    tokio_common::Error,
    tokio_sync_safe_client::SafeClient,
};
use std::{panic, time::Duration};

mod commandline;
mod config;

fn logging_init(loglevel: LevelFilter) -> LoggerHandle {
    let log_handle = Logger::try_with_env_or_str(loglevel.as_str())
        .expect("Cannot init logging")
        .start()
        .expect("Cannot start logging");

    panic::set_hook(Box::new(|panic_info| {
        let (filename, line, column) = panic_info
            .location()
            .map(|loc| (loc.file(), loc.line(), loc.column()))
            .unwrap_or(("<unknown_file>", 0, 0));

        let cause_str = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            *s
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.as_str()
        } else {
            "<unknown_panic_cause>"
        };

        error!(
            target: "panic",
            "Thread '{}' panicked at '{}': {}:{} - Cause: {}",
            std::thread::current().name().unwrap_or("<unnamed>"),
            filename,
            line,
            column,
            cause_str
        );
    }));
    log_handle
}

/// Calculates the minimum recommended delay for Modbus RTU based on baud rate.
/// This is typically 3.5 character times.
fn minimum_rtu_delay(baud_rate: &bus::BaudRate) -> Duration {
    // Modbus assumes 11 bits per character (start + 8 data + parity/stop + stop).
    let bits_per_char = 11.0;
    let rate = u32::from(*baud_rate) as f64;

    let char_time_secs = bits_per_char / rate;
    let inter_frame_delay_secs = 3.5 * char_time_secs;
    let delay_micros = (inter_frame_delay_secs * 1_000_000.0) as u64;

    // Modbus fixes the silence interval at 1.75ms for baud rates above 19200.
    const PRACTICAL_MIN_INTER_FRAME_DELAY_MICROS: u64 = 1_750;
    Duration::from_micros(delay_micros.max(PRACTICAL_MIN_INTER_FRAME_DELAY_MICROS))
}

/// Checks if the user-provided RTU delay is sufficient; if not, uses the calculated minimum.
fn check_rtu_delay(user_delay: Duration, baud_rate: &bus::BaudRate) -> Duration {
    let min_rtu_delay = minimum_rtu_delay(baud_rate);
    if user_delay < min_rtu_delay {
        warn!(
            "User-defined RTU delay of {user_delay:?} is below the recommended minimum of {min_rtu_delay:?} for {baud_rate} baud. Using minimum."
        );
        min_rtu_delay
    } else {
        user_delay
    }
}

fn connect_tcp(address: &str, unit_id: bus::SlaveAddress) -> Result<tokio_modbus::client::sync::Context> {
    let socket_addr = address
        .parse()
        .with_context(|| format!("Invalid TCP address format: '{address}'"))?;
    info!("Attempting to connect via TCP to {socket_addr} (Unit id: {unit_id})...");
    tokio_modbus::client::sync::tcp::connect_slave(socket_addr, tokio_modbus::Slave(*unit_id))
        .with_context(|| format!("Failed to connect to Modbus TCP device at {socket_addr}"))
}

fn connect_rtu(
    device: &str,
    baud_rate: &bus::BaudRate,
    address: bus::SlaveAddress,
) -> Result<tokio_modbus::client::sync::Context> {
    info!("Attempting to connect via RTU to device {device} (Address: {address}, Baud: {baud_rate})...");
    tokio_modbus::client::sync::rtu::connect_slave(
        &socomec_lib::tokio_common::serial_port_builder(device, baud_rate),
        tokio_modbus::Slave(*address),
    )
    .with_context(|| format!("Cannot open serial port {device} at baud {baud_rate}"))
}

/// Creates a polling client based on the provided command-line arguments.
///
/// Returns the client, the command to run and the effective delay between poll cycles.
fn create_client<'a>(
    args: &'a commandline::CliArgs,
) -> Result<(SafeClient<SocomecMeter>, &'a commandline::CliCommands, Duration)> {
    let mut id = args.id.clone();
    let mut timeout = args.timeout;
    let mut delay = args.delay;

    let (ctx, command) = match &args.connection {
        commandline::CliConnection::Tcp {
            address,
            unit_id,
            command,
        } => (connect_tcp(address, *unit_id)?, command),
        commandline::CliConnection::Rtu {
            device,
            baud_rate,
            address,
            command,
        } => {
            delay = check_rtu_delay(delay, baud_rate);
            (connect_rtu(device, baud_rate, *address)?, command)
        }
        commandline::CliConnection::Config { file, command } => {
            let config = config::MeterConfig::load(file)?;
            trace!("Config: {config:?}");
            if let Some(config_id) = config.id {
                id = config_id;
            }
            timeout = config.timeout;
            delay = config.delay;
            let ctx = match &config.modbus {
                config::ModbusConfig::Tcp { address, unit_id } => connect_tcp(address, *unit_id)?,
                config::ModbusConfig::Rtu {
                    device,
                    baud_rate,
                    address,
                } => {
                    delay = check_rtu_delay(delay, baud_rate);
                    connect_rtu(device, baud_rate, *address)?
                }
            };
            (ctx, command)
        }
        commandline::CliConnection::Describe => {
            unreachable!("Describe should be handled earlier.")
        }
    };

    let meter = SocomecMeter::new(id).context("Invalid meter definition")?;
    let client = SafeClient::new(ctx, meter);
    client.set_timeout(timeout);
    Ok((client, command, delay))
}

/// Prints the ranges a poll cycle reads.
fn handle_describe(id: &str) -> Result<()> {
    let meter = SocomecMeter::new(id).context("Invalid meter definition")?;
    for range in meter.protocol().ranges() {
        println!(
            "Range {:#06x}: {} registers ({} bytes)",
            range.address(),
            range.len(),
            range.byte_len()
        );
        for element in range.elements() {
            match element.channel() {
                Some(channel) => println!(
                    "  {:#06x} +{} {} [{}] x{}",
                    element.address(),
                    element.len(),
                    channel.name(),
                    channel.unit_str(),
                    channel.scale()
                ),
                None => println!("  {:#06x} +{} reserved", element.address(), element.len()),
            }
        }
    }
    Ok(())
}

/// Logs the failed ranges and fails if nothing could be read at all.
fn check_report(report: &PollReport<Error>) -> Result<()> {
    for failure in &report.failures {
        println!(
            "Range {:#06x} ({} registers) could not be read: {}",
            failure.address, failure.length, failure.error
        );
    }
    if report.decoded.is_empty() {
        bail!("No register range of the meter could be read");
    }
    Ok(())
}

fn print_roles(meter: &SocomecMeter) {
    for role in MeterRole::ALL {
        match meter.channel_for(role) {
            Some(channel) => match channel.get() {
                Some(value) => println!("{role}: {value} {}", channel.unit_str()),
                None => println!("{role}: no data"),
            },
            None => println!("{role}: unsupported"),
        }
    }
}

fn main() -> Result<()> {
    let args = commandline::CliArgs::parse();

    // 1. Initialize logging as early as possible
    let _log_handle = logging_init(args.verbose.log_level_filter());
    info!(
        "Socomec meter CLI started. Log level: {}",
        args.verbose.log_level_filter()
    );

    // 2. Describe needs no connection
    if let commandline::CliConnection::Describe = &args.connection {
        return handle_describe(&args.id);
    }

    // 3. Setup for TCP/RTU commands
    let (client, command_to_execute, delay) = create_client(&args)?;

    // 4. Execute the command
    match command_to_execute {
        commandline::CliCommands::Read => {
            info!("Executing: Read");
            let report = client.poll();
            print!("{}", client.snapshot());
            check_report(&report)?;
        }
        commandline::CliCommands::Roles => {
            info!("Executing: Roles");
            let report = client.poll();
            client.with_nature(print_roles);
            check_report(&report)?;
        }
        commandline::CliCommands::Daemon { poll_interval } => {
            info!("Starting daemon mode: interval={poll_interval:?}");
            loop {
                debug!("Daemon: polling '{}'", client.nature().id());
                let report = client.poll();
                print!("{}", client.snapshot());
                if let Err(error) = check_report(&report) {
                    error!("{error}");
                }
                std::thread::sleep(delay.max(*poll_interval));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimum_rtu_delay_calculation() {
        // 3.5 char times = 38.5 / baud
        assert_eq!(minimum_rtu_delay(&bus::BaudRate::B4800).as_micros(), 8020);
        assert_eq!(minimum_rtu_delay(&bus::BaudRate::B9600).as_micros(), 4010);
        assert_eq!(minimum_rtu_delay(&bus::BaudRate::B19200).as_micros(), 2005);
        // 38.5 / 38400 = 1002us, clamped to the 1.75ms floor.
        assert_eq!(minimum_rtu_delay(&bus::BaudRate::B38400).as_micros(), 1750);
    }

    #[test]
    fn test_check_rtu_delay() {
        let br_9600 = bus::BaudRate::B9600;
        let min_delay_9600 = minimum_rtu_delay(&br_9600);

        assert_eq!(
            check_rtu_delay(Duration::from_millis(3), &br_9600),
            min_delay_9600
        );
        assert_eq!(
            check_rtu_delay(Duration::from_millis(5), &br_9600),
            Duration::from_millis(5)
        );
        assert_eq!(check_rtu_delay(min_delay_9600, &br_9600), min_delay_9600);
    }
}
