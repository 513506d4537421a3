//! TOML run configuration for the `build` subcommand.
//!
//! A run file lists the reports to ingest, in order, each with the vantage
//! node it was scanned from:
//!
//! ```toml
//! output = "output.json"
//!
//! [[input]]
//! path = "xml/office.xml"
//! vantage = { id = "10.12.189.18", os = "Linux" }
//!
//! [[input]]
//! path = "xml/lab.xml"
//! vantage = { id = "192.168.40.193", hostname = "scanner.lab" }
//! ```
//!
//! Relative paths are resolved against the directory holding the run file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use topograph_core::{Node, OpenPort};
use topograph_ingest::SourceSpec;

/// Errors loading a run file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("config {} lists no inputs", path.display())]
    NoInputs { path: PathBuf },
}

/// Attributes of the node a report was scanned from. Anything omitted takes
/// the usual node default, except `state`, which defaults to `up`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VantageConfig {
    pub id: String,
    pub kind: Option<String>,
    pub state: Option<String>,
    pub hostname: Option<String>,
    pub reverse_dns: Option<String>,
    pub mac_address: Option<String>,
    pub vendor: Option<String>,
    pub os: Option<String>,
    #[serde(default)]
    pub open_ports: Vec<OpenPort>,
}

impl VantageConfig {
    /// Vantage built from an address alone (the `--source` flag).
    pub fn from_id(id: impl Into<String>) -> Self {
        VantageConfig {
            id: id.into(),
            kind: None,
            state: None,
            hostname: None,
            reverse_dns: None,
            mac_address: None,
            vendor: None,
            os: None,
            open_ports: Vec::new(),
        }
    }

    pub fn to_node(&self) -> Node {
        let mut node = Node::new(self.id.clone());
        node.state = self.state.clone().unwrap_or_else(|| "up".to_string());
        node.hostname = self.hostname.clone();
        node.os = self.os.clone();
        node.open_ports = self.open_ports.clone();
        if let Some(kind) = &self.kind {
            node.kind = kind.clone();
        }
        if let Some(reverse_dns) = &self.reverse_dns {
            node.reverse_dns = reverse_dns.clone();
        }
        if let Some(mac) = &self.mac_address {
            node.mac_address = mac.clone();
        }
        if let Some(vendor) = &self.vendor {
            node.vendor = vendor.clone();
        }
        node
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    pub path: PathBuf,
    pub vantage: VantageConfig,
}

/// A parsed run file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub output: Option<PathBuf>,
    #[serde(default, rename = "input")]
    pub inputs: Vec<InputConfig>,
}

impl RunConfig {
    /// Loads a run file and resolves its relative paths.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::Missing {
                path: path.to_path_buf(),
            },
            _ => ConfigError::Read {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&text, base).map_err(|e| match e {
            ParseFailure::Toml(source) => ConfigError::Invalid {
                path: path.to_path_buf(),
                source,
            },
            ParseFailure::Empty => ConfigError::NoInputs {
                path: path.to_path_buf(),
            },
        })
    }

    fn parse(text: &str, base: &Path) -> Result<Self, ParseFailure> {
        let mut config: RunConfig = toml::from_str(text).map_err(ParseFailure::Toml)?;
        if config.inputs.is_empty() {
            return Err(ParseFailure::Empty);
        }
        for input in &mut config.inputs {
            input.path = base.join(&input.path);
        }
        config.output = config.output.map(|out| base.join(out));
        Ok(config)
    }

    pub fn sources(&self) -> Vec<SourceSpec> {
        self.inputs
            .iter()
            .map(|input| SourceSpec::new(input.path.clone(), input.vantage.to_node()))
            .collect()
    }
}

enum ParseFailure {
    Toml(toml::de::Error),
    Empty,
}
