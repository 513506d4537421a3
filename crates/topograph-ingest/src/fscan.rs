//! fscan (2.0) text report reader.
//!
//! fscan writes one finding per line, prefixed by a marker and a localized
//! label. Each recognized line is matched by pattern and filed under the IP
//! it concerns; unrecognized lines are ignored. Hosts come out in the order
//! their IP was first mentioned.

use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use topograph_core::{Fingerprint, MergedHost, Vulnerability, Website};

use crate::error::{open_input, IngestError};

const PORT_OPEN: &str = "[+] 端口开放";
const WEB_TITLE: &str = "[*] 网站标题";
const NETBIOS: &str = "[*] NetBios";
const OS_INFO: &str = "[*] OsInfo";
const FINGERPRINT: &str = "[+] 发现指纹";
const VULN_FOUND: &str = "[+] [发现漏洞]";
const VULN_DETECTED: &str = "[+] 检测到漏洞";
const SERVICE_FINDINGS: [&str; 5] = [
    "[+] MongoDB",
    "[+] Memcached",
    "[+] MySQL",
    "[+] ftp",
    "[+] Redis",
];

/// Page title fscan prints when a site has none.
const NO_TITLE: &str = "无标题";
const REDIRECT_LABEL: &str = "重定向地址:";

static WEB_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"状态码:(\d+).*长度:(\d+).*标题:(.*?)(重定向地址:|$)").expect("valid regex")
});
static NETBIOS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"NetBios (\S+)\s+(.*)").expect("valid regex"));
static OS_INFO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"OsInfo (\S+)\s+\((.*?)\)").expect("valid regex"));
static SERVICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\S+)\s+(\S+):(\d+)(.*)").expect("valid regex"));
static FINGERPRINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"目标:\s+(\S+)\s+指纹:\s+\[(.*?)\]").expect("valid regex"));
static VULN_FOUND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"目标:\s+(\S+)\s+漏洞类型:\s+(.*?)\s+漏洞名称:\s+(.*?)\s+详细信息:\s+(.*?)$")
        .expect("valid regex")
});
static VULN_DETECTED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"检测到漏洞 (\S+) (\S+) 参数:\[(.*?)\]").expect("valid regex")
});

/// Reads and parses an fscan report from disk.
pub fn read_fscan_file(path: &Path) -> Result<Vec<MergedHost>, IngestError> {
    let file = open_input(path)?;
    parse_fscan(BufReader::new(file)).map_err(|e| match e.kind() {
        std::io::ErrorKind::InvalidData => IngestError::malformed(path, e),
        _ => IngestError::io(path, e),
    })
}

/// Parses an fscan report into per-IP records.
pub fn parse_fscan<R: BufRead>(reader: R) -> std::io::Result<Vec<MergedHost>> {
    let mut results = FscanResults::default();
    for line in reader.lines() {
        results.feed(line?.trim());
    }
    Ok(results.finish())
}

/// Extracts the bare host from `scheme://host:port/path` or `host:port`.
fn host_of(target: &str) -> &str {
    let rest = target.rsplit("://").next().unwrap_or(target);
    let rest = rest.split('/').next().unwrap_or(rest);
    rest.split(':').next().unwrap_or(rest)
}

#[derive(Debug, Default)]
struct FscanResults {
    hosts: IndexMap<String, MergedHost>,
}

impl FscanResults {
    fn host(&mut self, ip: &str) -> &mut MergedHost {
        self.hosts
            .entry(ip.to_string())
            .or_insert_with(|| MergedHost::new(ip))
    }

    fn finish(self) -> Vec<MergedHost> {
        self.hosts.into_values().collect()
    }

    fn feed(&mut self, line: &str) {
        if line.starts_with(PORT_OPEN) {
            self.port_open(line);
        } else if line.starts_with(WEB_TITLE) {
            self.web_title(line);
        } else if line.starts_with(NETBIOS) {
            if let Some(caps) = NETBIOS_RE.captures(line) {
                let info = caps[2].trim().to_string();
                self.host(&caps[1]).netbios.push(info);
            }
        } else if line.starts_with(OS_INFO) {
            if let Some(caps) = OS_INFO_RE.captures(line) {
                let os = caps[2].trim().to_string();
                self.host(&caps[1]).osinfo.push(os);
            }
        } else if SERVICE_FINDINGS.iter().any(|p| line.starts_with(p)) {
            self.service_finding(line);
        } else if line.starts_with(FINGERPRINT) {
            if let Some(caps) = FINGERPRINT_RE.captures(line) {
                let target = caps[1].to_string();
                let fingerprint = Fingerprint {
                    fingerprint: caps[2].to_string(),
                    target: target.clone(),
                };
                self.host(host_of(&target)).fingerprints.push(fingerprint);
            }
        } else if line.starts_with(VULN_FOUND) {
            if let Some(caps) = VULN_FOUND_RE.captures(line) {
                let target = caps[1].to_string();
                let vuln = Vulnerability {
                    kind: caps[2].to_string(),
                    name: Some(caps[3].trim().to_string()),
                    details: Some(caps[4].trim().to_string()),
                    params: None,
                    target: target.clone(),
                };
                self.host(host_of(&target)).vulnerabilities.push(vuln);
            }
        } else if line.starts_with(VULN_DETECTED) {
            if let Some(caps) = VULN_DETECTED_RE.captures(line) {
                let target = caps[1].to_string();
                let vuln = Vulnerability {
                    kind: caps[2].to_string(),
                    name: None,
                    details: None,
                    params: Some(caps[3].trim().to_string()),
                    target: target.clone(),
                };
                self.host(host_of(&target)).vulnerabilities.push(vuln);
            }
        }
    }

    fn port_open(&mut self, line: &str) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 3 {
            return;
        }
        let Some((ip, port)) = parts[2].rsplit_once(':') else {
            return;
        };
        match port.parse::<u16>() {
            Ok(port) => self.host(ip).open_ports.push(port),
            Err(_) => tracing::debug!(line, "ignoring open-port line with bad port"),
        }
    }

    fn web_title(&mut self, line: &str) {
        let Some(caps) = WEB_TITLE_RE.captures(line) else {
            return;
        };
        let (Ok(status_code), Ok(length)) = (caps[1].parse::<u16>(), caps[2].parse::<u64>()) else {
            tracing::debug!(line, "ignoring web title line with bad numbers");
            return;
        };
        let Some(url) = line.split_whitespace().nth(2) else {
            return;
        };
        let title = caps[3].trim();
        let redirect = line
            .rsplit_once(REDIRECT_LABEL)
            .map(|(_, target)| target.trim().to_string());

        let website = Website {
            url: url.to_string(),
            status_code,
            length,
            title: (title != NO_TITLE).then(|| title.to_string()),
            redirect,
        };
        self.host(host_of(url)).websites.push(website);
    }

    fn service_finding(&mut self, line: &str) {
        let Some(caps) = SERVICE_RE.captures(line) else {
            return;
        };
        let ip = caps[2].to_string();
        let vuln = Vulnerability {
            target: format!("{}:{}", ip, &caps[3]),
            kind: caps[1].to_string(),
            name: None,
            details: Some(caps[4].trim().to_string()),
            params: None,
        };
        self.host(&ip).vulnerabilities.push(vuln);
    }
}
