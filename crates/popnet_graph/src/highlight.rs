// SPDX-License-Identifier: MIT OR Apache-2.0
//! Projection of fault-locator results onto the graph.
//!
//! The lit-port set comes from an external visual fault locator; this module
//! only reads it. OTDR distances are validated and handed to an external
//! recorder.

use crate::connection::Connection;
use crate::graph::ConnectionGraph;
use crate::port::PortRef;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Read-only view of the visual fault locator state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultLocatorView {
    /// Ports the injected light reaches
    pub lit_ports: HashSet<PortRef>,
    /// Port the light is injected at
    pub vfl_source: Option<PortRef>,
}

impl FaultLocatorView {
    /// Create a view from a lit-port set
    pub fn new(lit_ports: impl IntoIterator<Item = PortRef>, vfl_source: Option<PortRef>) -> Self {
        Self {
            lit_ports: lit_ports.into_iter().collect(),
            vfl_source,
        }
    }

    /// Check if a port is lit
    pub fn is_lit(&self, port: &PortRef) -> bool {
        self.lit_ports.contains(port)
    }

    /// Connections with a lit endpoint
    pub fn lit_connections<'a>(&self, graph: &'a ConnectionGraph) -> Vec<&'a Connection> {
        lit_connections(graph, &self.lit_ports)
    }
}

/// Connections with at least one endpoint in `lit_ports`
pub fn lit_connections<'a>(
    graph: &'a ConnectionGraph,
    lit_ports: &HashSet<PortRef>,
) -> Vec<&'a Connection> {
    graph
        .connections()
        .filter(|c| lit_ports.contains(&c.source) || lit_ports.contains(&c.target))
        .collect()
}

/// External sink for OTDR distance annotations
pub trait OtdrRecorder {
    /// Record a measured distance to a fault, in meters
    fn record(&mut self, port: &PortRef, distance_m: f64);
}

/// A recorded OTDR annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtdrReading {
    /// Port the measurement was taken from
    pub port: PortRef,
    /// Distance in meters
    pub distance_m: f64,
}

/// In-memory recorder
#[derive(Debug, Clone, Default)]
pub struct OtdrLog {
    /// Readings in arrival order
    pub readings: Vec<OtdrReading>,
}

impl OtdrRecorder for OtdrLog {
    fn record(&mut self, port: &PortRef, distance_m: f64) {
        self.readings.push(OtdrReading {
            port: port.clone(),
            distance_m,
        });
    }
}

/// Forward an OTDR annotation typed by the user.
///
/// Returns `false` and drops the call if `raw_distance` is not a finite
/// number.
pub fn forward_otdr(recorder: &mut dyn OtdrRecorder, port: &PortRef, raw_distance: &str) -> bool {
    match raw_distance.trim().parse::<f64>() {
        Ok(distance) if distance.is_finite() => {
            recorder.record(port, distance);
            true
        }
        _ => {
            tracing::debug!("Dropped OTDR reading {raw_distance:?} for {port}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lit_connections() {
        let mut graph = ConnectionGraph::new();
        graph.connect_fiber_to_port(&PortRef::fiber("c", 0), &PortRef::dio("d", 0), None);
        graph.connect_fiber_to_port(&PortRef::fiber("c", 1), &PortRef::dio("d", 1), None);
        graph.connect_olt_to_port(&PortRef::olt("o", 1, 1), &PortRef::dio("d", 1), None);

        let view = FaultLocatorView::new([PortRef::dio("d", 1)], Some(PortRef::olt("o", 1, 1)));
        let lit = view.lit_connections(&graph);
        assert_eq!(lit.len(), 2);
        assert!(lit.iter().all(|c| c.involves(&PortRef::dio("d", 1))));

        assert!(lit_connections(&graph, &HashSet::new()).is_empty());
    }

    #[test]
    fn test_otdr_validation() {
        let mut log = OtdrLog::default();
        let port = PortRef::fiber("c", 2);

        assert!(forward_otdr(&mut log, &port, " 1250.5 "));
        assert!(!forward_otdr(&mut log, &port, "far"));
        assert!(!forward_otdr(&mut log, &port, ""));
        assert!(!forward_otdr(&mut log, &port, "NaN"));
        assert!(!forward_otdr(&mut log, &port, "inf"));

        assert_eq!(log.readings.len(), 1);
        assert_eq!(log.readings[0].distance_m, 1250.5);
    }
}
