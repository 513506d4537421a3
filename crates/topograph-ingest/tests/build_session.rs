//! End-to-end tests for the multi-source build driver.
//!
//! Each test writes Nmap reports into a fresh temp directory, runs
//! `build_graph` over them, and inspects the finished document.

use std::path::PathBuf;

use tempfile::TempDir;

use topograph_core::trace::placeholder_id;
use topograph_core::{Edge, GraphAccumulator, Node};
use topograph_ingest::{build_graph, read_graph, write_json, SourceSpec, SourceStatus};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const OFFICE_SCAN: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE nmaprun>
<nmaprun scanner="nmap" args="nmap -O --traceroute 10.20.0.0/24" version="7.94">
  <host starttime="1700000000" endtime="1700000100">
    <status state="up" reason="echo-reply" reason_ttl="61"/>
    <address addr="10.20.0.15" addrtype="ipv4"/>
    <hostnames><hostname name="files.office.lan" type="PTR"/></hostnames>
    <ports>
      <port protocol="tcp" portid="22"><state state="open"/><service name="ssh" version="8.9p1"/></port>
      <port protocol="tcp" portid="445"><state state="open"/><service name="microsoft-ds"/></port>
      <port protocol="tcp" portid="3389"><state state="closed"/><service name="ms-wbt-server"/></port>
    </ports>
    <os><osmatch name="Linux 5.0 - 5.14" accuracy="96"/></os>
    <trace port="22" proto="tcp">
      <hop ttl="1" ipaddr="192.168.1.1" rtt="0.40"/>
      <hop ttl="4" ipaddr="10.20.0.15" rtt="3.10"/>
    </trace>
  </host>
  <host>
    <status state="up" reason="echo-reply"/>
    <address addr="10.20.0.99" addrtype="ipv4"/>
    <trace port="80" proto="tcp">
      <hop ttl="1" ipaddr="192.168.1.1" rtt="0.41"/>
    </trace>
  </host>
  <host>
    <status state="up" reason="arp-response"/>
    <address addr="10.20.0.50" addrtype="ipv4"/>
  </host>
</nmaprun>
"#;

const LAB_SCAN: &str = r#"<?xml version="1.0"?>
<nmaprun>
  <host>
    <status state="down"/>
    <address addr="10.20.0.15" addrtype="ipv4"/>
    <ports>
      <port protocol="tcp" portid="8080"><state state="open"/><service name="http-proxy"/></port>
    </ports>
    <os><osmatch name="Linux 5.0 - 5.14" accuracy="90"/></os>
    <trace><hop ttl="1" ipaddr="172.16.0.1"/><hop ttl="2" ipaddr="10.20.0.15"/></trace>
  </host>
  <host>
    <status state="up"/>
    <address addr="172.16.5.5" addrtype="ipv4"/>
    <trace><hop ttl="1" ipaddr="172.16.0.1"/><hop ttl="2" ipaddr="172.16.5.5"/></trace>
  </host>
</nmaprun>
"#;

fn write_report(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn vantage(id: &str) -> Node {
    let mut node = Node::new(id);
    node.state = "up".into();
    node.os = Some("Linux".into());
    node
}

fn pair(edge: &Edge) -> (&str, &str) {
    (edge.from.as_str(), edge.to.as_str())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn single_source_reconstructs_paths() {
    let dir = tempfile::tempdir().unwrap();
    let office = write_report(&dir, "office.xml", OFFICE_SCAN);

    let mut acc = GraphAccumulator::new();
    let report = build_graph(&mut acc, &[SourceSpec::new(&office, vantage("192.168.1.20"))]);
    assert_eq!(report.ingested(), 1);

    let doc = acc.finalize();
    let ids: Vec<&str> = doc.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["192.168.1.20", "10.20.0.15", "10.20.0.99", "10.20.0.50"]);

    let files = &doc.nodes[1];
    assert_eq!(files.hostname.as_deref(), Some("files.office.lan"));
    assert_eq!(files.port_numbers().collect::<Vec<_>>(), vec![22, 445]);

    let p2 = placeholder_id("192.168.1.1", 2);
    let p3 = placeholder_id("192.168.1.1", 3);
    let pairs: Vec<(&str, &str)> = doc.edges.iter().map(pair).collect();
    assert_eq!(
        pairs,
        vec![
            ("192.168.1.20", "192.168.1.1"),
            ("192.168.1.1", p2.as_str()),
            (p2.as_str(), p3.as_str()),
            (p3.as_str(), "10.20.0.15"),
            // 10.20.0.99: shared first hop deduplicated, then stitched.
            ("192.168.1.1", "10.20.0.99"),
        ]
    );
}

#[test]
fn later_sources_share_the_accumulator() {
    let dir = tempfile::tempdir().unwrap();
    let office = write_report(&dir, "office.xml", OFFICE_SCAN);
    let lab = write_report(&dir, "lab.xml", LAB_SCAN);

    let mut acc = GraphAccumulator::new();
    let report = build_graph(
        &mut acc,
        &[
            SourceSpec::new(&office, vantage("192.168.1.20")),
            SourceSpec::new(&lab, vantage("172.16.0.10")),
        ],
    );
    assert_eq!(report.ingested(), 2);

    let SourceStatus::Ingested(lab_stats) = &report.sources[1].status else {
        panic!("lab source was skipped");
    };
    // 10.20.0.15 was already seen with the same identity key.
    assert_eq!(lab_stats.hosts_duplicate, 1);
    assert_eq!(lab_stats.hosts_added, 1);

    let doc = acc.finalize();
    let files = doc.nodes.iter().find(|n| n.id == "10.20.0.15").unwrap();
    assert_eq!(files.state, "up");
    assert!(!doc.edges.iter().any(|e| e.to == "10.20.0.15" && e.from == "172.16.0.1"));
    assert!(doc.edges.iter().any(|e| e.to == "172.16.5.5"));
}

#[test]
fn missing_and_malformed_sources_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let office = write_report(&dir, "office.xml", OFFICE_SCAN);
    let broken = write_report(&dir, "broken.xml", "<nmaprun><host><address addr=");
    let absent = dir.path().join("absent.xml");

    let mut acc = GraphAccumulator::new();
    let report = build_graph(
        &mut acc,
        &[
            SourceSpec::new(&absent, vantage("10.9.9.9")),
            SourceSpec::new(&broken, vantage("10.8.8.8")),
            SourceSpec::new(&office, vantage("192.168.1.20")),
        ],
    );

    assert_eq!(report.ingested(), 1);
    assert_eq!(report.skipped(), 2);
    assert!(matches!(report.sources[0].status, SourceStatus::Skipped { .. }));
    assert!(matches!(report.sources[1].status, SourceStatus::Skipped { .. }));

    // Skipped sources did not even seed their vantage node.
    let doc = acc.finalize();
    assert!(doc.nodes.iter().all(|n| n.id != "10.9.9.9" && n.id != "10.8.8.8"));
    assert_eq!(doc.nodes.len(), 4);
}

#[test]
fn processing_a_source_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let office = write_report(&dir, "office.xml", OFFICE_SCAN);
    let spec = SourceSpec::new(&office, vantage("192.168.1.20"));

    let mut once = GraphAccumulator::new();
    build_graph(&mut once, std::slice::from_ref(&spec));

    let mut twice = GraphAccumulator::new();
    build_graph(&mut twice, &[spec.clone(), spec]);

    assert_eq!(once.finalize(), twice.finalize());
}

#[test]
fn built_document_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let office = write_report(&dir, "office.xml", OFFICE_SCAN);

    let mut acc = GraphAccumulator::new();
    build_graph(&mut acc, &[SourceSpec::new(&office, vantage("192.168.1.20"))]);
    let doc = acc.finalize();

    let out = dir.path().join("output.json");
    write_json(&out, &doc).unwrap();
    assert_eq!(read_graph(&out).unwrap(), doc);

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(value["nodes"][1]["reverseDNS"], "10.20.0.15");
    assert_eq!(value["nodes"][3]["os"], serde_json::Value::Null);
    assert_eq!(value["edges"][0]["edgeType"], "traceroute");
}
