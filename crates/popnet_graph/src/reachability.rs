// SPDX-License-Identifier: MIT OR Apache-2.0
//! Signal reachability derived from the connection graph.
//!
//! Built from scratch on every read in O(E). POP graphs stay in the low
//! thousands of edges, so there is no incremental maintenance.

use crate::connection::Connection;
use crate::equipment::Olt;
use crate::graph::ConnectionGraph;
use crate::port::PortRef;
use std::collections::{HashMap, HashSet};

/// Label used when a patched OLT port has no matching OLT record
pub const FALLBACK_OLT_NAME: &str = "OLT";

/// Which ports carry OLT signal, and which are spliced
#[derive(Debug, Clone, Default)]
pub struct ReachabilityIndex {
    active_olt_info: HashMap<PortRef, String>,
    fiber_fusions: HashMap<PortRef, Connection>,
    dio_ports_with_splice: HashSet<PortRef>,
}

impl ReachabilityIndex {
    /// Derive the index from a graph and the OLTs of the POP
    pub fn build<'a>(graph: &ConnectionGraph, olts: impl IntoIterator<Item = &'a Olt>) -> Self {
        let olts: Vec<&Olt> = olts.into_iter().collect();
        let mut index = Self::default();

        for connection in graph.connections() {
            let [a, b] = connection.endpoints();
            for (port, partner) in [(a, b), (b, a)] {
                if port.is_dio() {
                    if let Some(label) = olt_label(partner, &olts) {
                        index.active_olt_info.insert(port.clone(), label);
                    }
                    if partner.is_fiber() {
                        index.dio_ports_with_splice.insert(port.clone());
                    }
                }
                if port.is_fiber() {
                    index.fiber_fusions.insert(port.clone(), connection.clone());
                }
            }
        }

        index
    }

    /// Check if a DIO port is patched to an OLT
    pub fn is_active(&self, port: &PortRef) -> bool {
        self.active_olt_info.contains_key(port)
    }

    /// Upstream label of a DIO port, e.g. `"OLT1: S1 / P1"`
    pub fn olt_label(&self, port: &PortRef) -> Option<&str> {
        self.active_olt_info.get(port).map(String::as_str)
    }

    /// All active DIO ports with their labels
    pub fn active_olt_info(&self) -> &HashMap<PortRef, String> {
        &self.active_olt_info
    }

    /// Splice holding a fiber strand
    pub fn fusion_for(&self, fiber: &PortRef) -> Option<&Connection> {
        self.fiber_fusions.get(fiber)
    }

    /// All spliced fibers
    pub fn fiber_fusions(&self) -> &HashMap<PortRef, Connection> {
        &self.fiber_fusions
    }

    /// Check if a DIO port has a fiber spliced on its rear
    pub fn has_fiber_splice(&self, port: &PortRef) -> bool {
        self.dio_ports_with_splice.contains(port)
    }

    /// Check if a fiber is spliced to a DIO port that is patched to an OLT
    pub fn is_fiber_powered(&self, fiber: &PortRef) -> bool {
        self.fusion_for(fiber)
            .and_then(|c| c.partner_of(fiber))
            .is_some_and(|partner| self.is_active(partner))
    }
}

/// Label of the equipment side of a patch, if `port` is equipment-owned.
///
/// Parsed OLT ports get slot and port numbers. Opaque ids that start with a
/// known OLT id are treated as equipment ports with the name alone.
fn olt_label(port: &PortRef, olts: &[&Olt]) -> Option<String> {
    match port {
        PortRef::Olt { olt_id, slot, port: number } => {
            let name = olts
                .iter()
                .find(|o| o.id == *olt_id)
                .map_or(FALLBACK_OLT_NAME, |o| o.name.as_str());
            Some(format!("{name}: S{slot} / P{number}"))
        }
        PortRef::Other(raw) => olts
            .iter()
            .find(|o| !o.id.is_empty() && raw.starts_with(&o.id))
            .map(|o| o.name.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equipment::OltStructure;

    fn olt1() -> Olt {
        Olt::with_id("olt1", "OLT1", OltStructure::uniform(2, 8))
    }

    #[test]
    fn test_active_port_label() {
        let mut graph = ConnectionGraph::new();
        graph.connect_fiber_to_port(&PortRef::fiber("cbl1", 0), &PortRef::dio("dioA", 0), None);
        graph.connect_olt_to_port(&PortRef::olt("olt1", 1, 1), &PortRef::dio("dioA", 0), None);

        let olt = olt1();
        let index = ReachabilityIndex::build(&graph, [&olt]);
        assert!(index.is_active(&PortRef::dio("dioA", 0)));
        assert_eq!(index.olt_label(&PortRef::dio("dioA", 0)), Some("OLT1: S1 / P1"));
        assert!(!index.is_active(&PortRef::dio("dioA", 1)));
        assert!(index.has_fiber_splice(&PortRef::dio("dioA", 0)));
        assert!(index.is_fiber_powered(&PortRef::fiber("cbl1", 0)));
    }

    #[test]
    fn test_stale_olt_falls_back() {
        let mut graph = ConnectionGraph::new();
        graph.connect_olt_to_port(&PortRef::olt("gone", 3, 7), &PortRef::dio("dioA", 4), None);

        let index = ReachabilityIndex::build(&graph, []);
        assert_eq!(index.olt_label(&PortRef::dio("dioA", 4)), Some("OLT: S3 / P7"));
    }

    #[test]
    fn test_unparsed_equipment_port_uses_name() {
        let graph = ConnectionGraph::from_connections(vec![Connection::new(
            PortRef::Other("olt1-uplink".into()),
            PortRef::dio("dioA", 2),
        )]);
        let olt = olt1();
        let index = ReachabilityIndex::build(&graph, [&olt]);
        assert_eq!(index.olt_label(&PortRef::dio("dioA", 2)), Some("OLT1"));
    }

    #[test]
    fn test_splice_only_is_not_active() {
        let mut graph = ConnectionGraph::new();
        graph.connect_fiber_to_port(&PortRef::fiber("cbl1", 5), &PortRef::dio("dioA", 5), None);

        let index = ReachabilityIndex::build(&graph, []);
        assert!(!index.is_active(&PortRef::dio("dioA", 5)));
        assert!(!index.is_fiber_powered(&PortRef::fiber("cbl1", 5)));
        let fusion = index.fusion_for(&PortRef::fiber("cbl1", 5)).unwrap();
        assert_eq!(fusion.target, PortRef::dio("dioA", 5));
    }
}
