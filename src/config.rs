use anyhow::{Context, Result};
use serde::Deserialize;
use socomec_lib::bus::{BaudRate, SlaveAddress};
use std::fs::File;
use std::path::Path;
use std::time::Duration;

/// How the meter is reached.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ModbusConfig {
    Tcp {
        address: String,
        #[serde(default)]
        unit_id: SlaveAddress,
    },
    Rtu {
        #[serde(default = "default_device")]
        device: String,
        #[serde(default)]
        baud_rate: BaudRate,
        #[serde(default)]
        address: SlaveAddress,
    },
}

fn default_device() -> String {
    String::from("/dev/ttyUSB0")
}

fn default_timeout() -> Duration {
    Duration::from_millis(500)
}

fn default_delay() -> Duration {
    Duration::from_millis(50)
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MeterConfig {
    pub id: Option<String>,
    pub modbus: ModbusConfig,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
    #[serde(default = "default_delay", with = "humantime_serde")]
    pub delay: Duration,
}

impl MeterConfig {
    pub fn load(path: &Path) -> Result<Self> {
        log::debug!("Loading config file from {path:?}");
        let file = File::open(path).with_context(|| format!("Cannot open config file {path:?}"))?;
        serde_yaml::from_reader(file).with_context(|| format!("Invalid config file {path:?}"))
    }
}
