//! Nmap XML report reader.
//!
//! Streams the report with `xml-rs` and builds one [`HostRecord`] per
//! `<host>` element. Only the parts of the report the graph needs are read:
//!
//! - first non-MAC `<address>` as the host id
//! - `<status state>`
//! - first `<hostnames>/<hostname name>`
//! - MAC `<address addrtype="mac" addr vendor>`
//! - first `<os>/<osmatch name>`
//! - `<ports>/<port>` with nested `<state>` and `<service>`
//! - `<trace>/<hop ttl ipaddr>`
//!
//! Elements outside `<host>` (including `<hosthint>`, which repeats some of
//! the same child names) are ignored. A host without any usable address is
//! skipped with a warning.

use std::io::{BufReader, Read};
use std::path::Path;

use thiserror::Error;
use xml::attribute::OwnedAttribute;
use xml::reader::{EventReader, XmlEvent};

use topograph_core::{Hop, HostRecord, PortObservation};

use crate::error::{open_input, IngestError};

/// Address type marking a hardware address.
const ADDRTYPE_MAC: &str = "mac";

/// Structural problems found while reading a report.
#[derive(Debug, Error)]
pub enum NmapParseError {
    /// The document is not well-formed XML.
    #[error("{0}")]
    Xml(#[from] xml::reader::Error),

    /// A numeric attribute held something else.
    #[error("invalid {attribute} on <{element}>: '{value}'")]
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
        value: String,
    },
}

/// Reads and parses an Nmap XML report from disk.
///
/// Returns [`IngestError::MissingInput`] if the file is absent and
/// [`IngestError::MalformedInput`] if it cannot be parsed. On error no
/// records are returned at all.
pub fn read_nmap_file(path: &Path) -> Result<Vec<HostRecord>, IngestError> {
    let file = open_input(path)?;
    parse_nmap(BufReader::new(file)).map_err(|e| IngestError::malformed(path, e))
}

/// Parses an Nmap XML report into host records, in document order.
pub fn parse_nmap<R: Read>(reader: R) -> Result<Vec<HostRecord>, NmapParseError> {
    let mut hosts = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut current: Option<HostBuilder> = None;

    for event in EventReader::new(reader) {
        match event? {
            XmlEvent::StartElement {
                name, attributes, ..
            } => {
                let local = name.local_name;
                let parent = stack.last().map(String::as_str);
                match current.as_mut() {
                    Some(host) => host.start(&local, parent, &attributes)?,
                    None if local == "host" => current = Some(HostBuilder::default()),
                    None => {}
                }
                stack.push(local);
            }
            XmlEvent::EndElement { name } => {
                stack.pop();
                match name.local_name.as_str() {
                    "port" => {
                        if let Some(host) = current.as_mut() {
                            host.finish_port();
                        }
                    }
                    "host" => {
                        if let Some(record) = current.take().and_then(HostBuilder::build) {
                            hosts.push(record);
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    Ok(hosts)
}

fn attr<'a>(attributes: &'a [OwnedAttribute], key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|a| a.name.local_name == key)
        .map(|a| a.value.as_str())
}

fn owned_attr(attributes: &[OwnedAttribute], key: &str) -> Option<String> {
    attr(attributes, key).map(String::from)
}

// ---------------------------------------------------------------------------
// Per-host state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct PortBuilder {
    port: u16,
    protocol: String,
    state: Option<String>,
    service: Option<String>,
    version: Option<String>,
}

#[derive(Debug, Default)]
struct HostBuilder {
    address: Option<String>,
    state: Option<String>,
    hostname: Option<String>,
    mac_address: Option<String>,
    vendor: Option<String>,
    os: Option<String>,
    ports: Vec<PortObservation>,
    port: Option<PortBuilder>,
    trace: Option<Vec<Hop>>,
}

impl HostBuilder {
    /// Handles an element opening somewhere inside the current `<host>`.
    fn start(
        &mut self,
        element: &str,
        parent: Option<&str>,
        attributes: &[OwnedAttribute],
    ) -> Result<(), NmapParseError> {
        match (element, parent) {
            ("status", Some("host")) => {
                self.state = owned_attr(attributes, "state");
            }
            ("address", Some("host")) => {
                if attr(attributes, "addrtype") == Some(ADDRTYPE_MAC) {
                    self.mac_address = owned_attr(attributes, "addr");
                    self.vendor = owned_attr(attributes, "vendor");
                } else if self.address.is_none() {
                    self.address = owned_attr(attributes, "addr");
                }
            }
            ("hostname", Some("hostnames")) => {
                if self.hostname.is_none() {
                    self.hostname = owned_attr(attributes, "name");
                }
            }
            ("osmatch", Some("os")) => {
                if self.os.is_none() {
                    self.os = owned_attr(attributes, "name");
                }
            }
            ("port", Some("ports")) => {
                let raw = attr(attributes, "portid").unwrap_or_default();
                let port = raw.parse().map_err(|_| NmapParseError::InvalidAttribute {
                    element: "port",
                    attribute: "portid",
                    value: raw.to_string(),
                })?;
                self.port = Some(PortBuilder {
                    port,
                    protocol: owned_attr(attributes, "protocol")
                        .unwrap_or_else(|| "unknown".to_string()),
                    ..Default::default()
                });
            }
            ("state", Some("port")) => {
                if let Some(port) = self.port.as_mut() {
                    port.state = owned_attr(attributes, "state");
                }
            }
            ("service", Some("port")) => {
                if let Some(port) = self.port.as_mut() {
                    port.service = owned_attr(attributes, "name");
                    port.version = owned_attr(attributes, "version");
                }
            }
            ("trace", Some("host")) => {
                self.trace.get_or_insert_with(Vec::new);
            }
            ("hop", Some("trace")) => {
                // A hop without a ttl attribute counts as ttl 0.
                let ttl = match attr(attributes, "ttl") {
                    Some(raw) => raw.parse().map_err(|_| NmapParseError::InvalidAttribute {
                        element: "hop",
                        attribute: "ttl",
                        value: raw.to_string(),
                    })?,
                    None => 0,
                };
                let ip = owned_attr(attributes, "ipaddr").filter(|ip| !ip.is_empty());
                self.trace.get_or_insert_with(Vec::new).push(Hop { ttl, ip });
            }
            _ => {}
        }
        Ok(())
    }

    fn finish_port(&mut self) {
        if let Some(port) = self.port.take() {
            self.ports.push(PortObservation {
                port: port.port,
                protocol: port.protocol,
                state: port.state.unwrap_or_else(|| "unknown".to_string()),
                service: port.service,
                version: port.version,
            });
        }
    }

    fn build(self) -> Option<HostRecord> {
        let Some(address) = self.address else {
            tracing::warn!(
                mac = ?self.mac_address,
                "skipping host without an address"
            );
            return None;
        };
        Some(HostRecord {
            address,
            state: self.state,
            hostname: self.hostname,
            mac_address: self.mac_address,
            vendor: self.vendor,
            os: self.os,
            ports: self.ports,
            trace: self.trace,
        })
    }
}
