//! Traceroute path reconstruction.
//!
//! [`reconstruct`] turns one host's sparse, TTL-indexed hop list into an
//! ordered chain of `traceroute` edges from the scan vantage point to the
//! host. Two kinds of synthetic edges are produced:
//!
//! - **Gap fill**: when consecutive hop TTLs jump by more than one, a
//!   placeholder node id is synthesized for every missing TTL so the chain
//!   stays connected. Placeholders are named after the last real hop (or
//!   the source) and the missing TTL, so the same prefix always produces the
//!   same ids across runs and across hosts.
//! - **Target stitch**: when the last responding hop is not the target, one
//!   closing edge links it to the target.
//!
//! A hop listed without an address is skipped outright. Only numeric TTL
//! gaps produce placeholders.
//!
//! The reconstructor does not deduplicate; callers feed its output through
//! [`crate::accumulator::GraphAccumulator::add_edge`].

use crate::host::Hop;
use crate::model::Edge;

/// Reserved prefix marking a synthesized (inferred, unobserved) hop id.
pub const PLACEHOLDER_PREFIX: &str = "pre-";

/// Returns the placeholder id for the hop missing at `ttl` after `anchor`.
pub fn placeholder_id(anchor: &str, ttl: u32) -> String {
    format!("{PLACEHOLDER_PREFIX}{anchor}-missing-ttl-{ttl}")
}

/// Returns `true` if `id` was produced by [`placeholder_id`].
pub fn is_placeholder(id: &str) -> bool {
    id.starts_with(PLACEHOLDER_PREFIX) && id.contains("-missing-ttl-")
}

/// Reconstructs the best-effort path from `source` to `target`.
///
/// `hops` is expected in ascending TTL order; it is sorted (stably) anyway
/// so a reordered report yields the same chain.
pub fn reconstruct(source: &str, target: &str, hops: &[Hop]) -> Vec<Edge> {
    let mut ordered: Vec<&Hop> = hops.iter().collect();
    ordered.sort_by_key(|hop| hop.ttl);

    let mut edges = Vec::new();
    let mut prev_hop = source.to_string();
    // Last real hop; placeholders are named after it.
    let mut anchor = source.to_string();
    let mut prev_ttl: u32 = 0;
    let mut last_responding: Option<String> = None;

    for hop in ordered {
        let hop_ttl = u32::from(hop.ttl);

        while prev_ttl + 1 < hop_ttl {
            let missing_ttl = prev_ttl + 1;
            let placeholder = placeholder_id(&anchor, missing_ttl);
            edges.push(Edge::traceroute(prev_hop, placeholder.clone()));
            prev_hop = placeholder;
            prev_ttl = missing_ttl;
        }

        if let Some(ip) = &hop.ip {
            edges.push(Edge::traceroute(prev_hop, ip.clone()));
            prev_hop = ip.clone();
            anchor = ip.clone();
            prev_ttl = hop_ttl;
            last_responding = Some(ip.clone());
        }
    }

    if last_responding.as_deref() != Some(target) {
        let from = last_responding.unwrap_or(prev_hop);
        edges.push(Edge::traceroute(from, target));
    }

    tracing::trace!(source, target, edges = edges.len(), "reconstructed trace");
    edges
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn pairs(edges: &[Edge]) -> Vec<(String, String)> {
        edges
            .iter()
            .map(|e| (e.from.clone(), e.to.clone()))
            .collect()
    }

    fn pair(from: &str, to: &str) -> (String, String) {
        (from.to_string(), to.to_string())
    }

    #[test]
    fn gap_fill_between_responding_hops() {
        let hops = vec![Hop::new(1, "A"), Hop::new(4, "B")];
        let edges = reconstruct("S", "B", &hops);

        let p2 = placeholder_id("A", 2);
        let p3 = placeholder_id("A", 3);
        assert_eq!(
            pairs(&edges),
            vec![
                pair("S", "A"),
                pair("A", &p2),
                pair(&p2, &p3),
                pair(&p3, "B"),
            ]
        );
    }

    #[test]
    fn unreached_target_is_stitched() {
        let hops = vec![Hop::new(1, "A")];
        let edges = reconstruct("S", "Z", &hops);
        assert_eq!(pairs(&edges), vec![pair("S", "A"), pair("A", "Z")]);
    }

    #[test]
    fn only_hop_is_target() {
        let hops = vec![Hop::new(1, "T")];
        let edges = reconstruct("S", "T", &hops);
        assert_eq!(pairs(&edges), vec![pair("S", "T")]);
    }

    #[test]
    fn empty_trace_stitches_source_to_target() {
        let edges = reconstruct("S", "T", &[]);
        assert_eq!(pairs(&edges), vec![pair("S", "T")]);
    }

    #[test]
    fn leading_gap_is_named_after_source() {
        let hops = vec![Hop::new(3, "T")];
        let edges = reconstruct("S", "T", &hops);
        let p1 = placeholder_id("S", 1);
        let p2 = placeholder_id("S", 2);
        assert_eq!(
            pairs(&edges),
            vec![pair("S", &p1), pair(&p1, &p2), pair(&p2, "T")]
        );
    }

    #[test]
    fn silent_hop_is_skipped_without_placeholder() {
        let hops = vec![Hop::new(1, "A"), Hop::silent(2), Hop::new(2, "B")];
        let edges = reconstruct("S", "B", &hops);
        assert_eq!(pairs(&edges), vec![pair("S", "A"), pair("A", "B")]);
    }

    #[test]
    fn silent_hop_followed_by_gap_still_fills() {
        // ttl 2 is listed but silent; the jump to 4 still fills 2 and 3.
        let hops = vec![Hop::new(1, "A"), Hop::silent(2), Hop::new(4, "B")];
        let edges = reconstruct("S", "B", &hops);
        assert_eq!(edges.len(), 4);
        assert_eq!(edges[1].to, placeholder_id("A", 2));
        assert_eq!(edges[2].to, placeholder_id("A", 3));
    }

    #[test]
    fn no_responding_hop_stitches_from_last_placeholder() {
        let hops = vec![Hop::silent(3)];
        let edges = reconstruct("S", "T", &hops);
        let p1 = placeholder_id("S", 1);
        let p2 = placeholder_id("S", 2);
        assert_eq!(
            pairs(&edges),
            vec![pair("S", &p1), pair(&p1, &p2), pair(&p2, "T")]
        );
    }

    #[test]
    fn stitch_starts_from_last_responding_hop() {
        // The silent tail fills placeholders, but the stitch edge still
        // leaves from the last hop that actually answered.
        let hops = vec![Hop::new(1, "A"), Hop::silent(3)];
        let edges = reconstruct("S", "T", &hops);
        let last = edges.last().unwrap();
        assert_eq!(last.from, "A");
        assert_eq!(last.to, "T");
    }

    #[test]
    fn out_of_order_hops_are_sorted() {
        let ordered = vec![Hop::new(1, "A"), Hop::new(2, "B")];
        let shuffled = vec![Hop::new(2, "B"), Hop::new(1, "A")];
        assert_eq!(
            reconstruct("S", "B", &ordered),
            reconstruct("S", "B", &shuffled)
        );
    }

    #[test]
    fn all_edges_are_layer3_icmp_traceroute() {
        let hops = vec![Hop::new(2, "A")];
        for edge in reconstruct("S", "Z", &hops) {
            assert_eq!(edge.edge_type, "traceroute");
            assert_eq!(edge.protocol, "ICMP");
            assert_eq!(edge.layer, "Layer 3");
        }
    }

    #[test]
    fn shared_prefix_yields_identical_placeholders() {
        let to_b = reconstruct("S", "B", &[Hop::new(1, "A"), Hop::new(3, "B")]);
        let to_c = reconstruct("S", "C", &[Hop::new(1, "A"), Hop::new(3, "C")]);
        assert_eq!(to_b[1], to_c[1]);
    }

    #[test]
    fn placeholder_ids_are_recognizable() {
        let id = placeholder_id("10.0.0.1", 4);
        assert_eq!(id, "pre-10.0.0.1-missing-ttl-4");
        assert!(is_placeholder(&id));
        assert!(!is_placeholder("10.0.0.1"));
    }

    fn hop_strategy() -> impl Strategy<Value = Hop> {
        (1u8..=30, proptest::option::of(0u8..6)).prop_map(|(ttl, ip)| Hop {
            ttl,
            ip: ip.map(|n| format!("10.0.0.{n}")),
        })
    }

    proptest! {
        #[test]
        fn reconstruction_is_deterministic(hops in proptest::collection::vec(hop_strategy(), 0..12)) {
            let first = reconstruct("192.168.0.1", "10.0.0.5", &hops);
            let second = reconstruct("192.168.0.1", "10.0.0.5", &hops);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn path_starts_at_source_and_reaches_target(hops in proptest::collection::vec(hop_strategy(), 0..12)) {
            let edges = reconstruct("192.168.0.1", "10.0.0.5", &hops);
            prop_assert!(!edges.is_empty());
            prop_assert_eq!(edges[0].from.as_str(), "192.168.0.1");
            prop_assert!(edges.iter().any(|e| e.to == "10.0.0.5"));
        }

        #[test]
        fn synthetic_ids_are_placeholders(hops in proptest::collection::vec(hop_strategy(), 0..12)) {
            let edges = reconstruct("192.168.0.1", "10.0.0.5", &hops);
            for edge in &edges {
                let real = edge.to == "10.0.0.5" || edge.to.starts_with("10.0.0.");
                prop_assert!(real || is_placeholder(&edge.to));
            }
        }
    }
}
