use crate::listing::{ListingFlags, ListingOptions};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(toml::de::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "unable to read profile: {}", e),
            ConfigError::Parse(e) => write!(f, "invalid profile: {}", e),
        }
    }
}

impl Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Listing settings read from a TOML file. Missing keys keep the defaults.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ListingProfile {
    addresses: Option<bool>,
    bytes: Option<bool>,
    color: Option<bool>,
}

impl ListingProfile {
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| e.into())
    }

    pub fn load<P: AsRef<Path>>(p: P) -> Result<Self, ConfigError> {
        let s = fs::read_to_string(p)?;
        Self::from_toml(&s)
    }

    pub fn apply(&self, options: &mut ListingOptions) {
        let settings = [
            (ListingFlags::ADDRESSES, self.addresses),
            (ListingFlags::BYTES, self.bytes),
            (ListingFlags::COLOR, self.color),
        ];
        for (flag, value) in settings {
            if let Some(enabled) = value {
                options.set(flag, enabled);
            }
        }
    }

    pub fn options(&self) -> ListingOptions {
        let mut options = ListingOptions::new();
        self.apply(&mut options);
        options
    }
}
