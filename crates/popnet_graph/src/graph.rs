// SPDX-License-Identifier: MIT OR Apache-2.0
//! The connection graph of a POP.
//!
//! A single ordered edge list over all ports of the room. Mutations never
//! fail: a request that would be invalid (self-connection, wrong port kind,
//! same-device link) leaves the graph untouched. Conflicting edges are moved
//! or overwritten instead of stacking up, which keeps these invariants:
//!
//! - a fiber strand is an endpoint of at most one edge
//! - an OLT port is an endpoint of at most one edge
//! - a DIO port holds at most one edge per slot: splice, patch and link
//!
//! Every mutation reports a [`GraphDelta`] with exactly what it removed and
//! added.

use crate::connection::{Connection, ConnectionId};
use crate::port::{PortRef, PortSlot};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What a mutation changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphDelta {
    /// Connections removed, in graph order
    pub removed: Vec<Connection>,
    /// Connection appended, if any
    pub added: Option<ConnectionId>,
}

impl GraphDelta {
    /// Check if nothing changed
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_none()
    }

    /// Ids of the removed connections
    pub fn removed_ids(&self) -> impl Iterator<Item = &ConnectionId> {
        self.removed.iter().map(|c| &c.id)
    }

    fn merge(&mut self, other: GraphDelta) {
        self.removed.extend(other.removed);
        if other.added.is_some() {
            self.added = other.added;
        }
    }
}

/// Undirected edge list over string-addressed ports
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionGraph {
    connections: Vec<Connection>,
}

impl ConnectionGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from an existing edge list without checking invariants
    pub fn from_connections(connections: Vec<Connection>) -> Self {
        Self { connections }
    }

    /// Splice a fiber strand onto a port.
    ///
    /// The fiber is moved off any previous edge. A splice already on the
    /// target is overwritten while a patch cord on it is kept.
    pub fn connect_fiber_to_port(
        &mut self,
        fiber: &PortRef,
        target: &PortRef,
        color: Option<String>,
    ) -> GraphDelta {
        if !fiber.is_fiber() || fiber == target {
            tracing::debug!("Rejected splice {fiber} -> {target}");
            return GraphDelta::default();
        }
        self.attach(fiber, target, color)
    }

    /// Patch an OLT port onto a port.
    ///
    /// The OLT port is moved off any previous edge. A patch already on the
    /// target is overwritten while a splice on it is kept.
    pub fn connect_olt_to_port(
        &mut self,
        olt_port: &PortRef,
        target: &PortRef,
        color: Option<String>,
    ) -> GraphDelta {
        if !olt_port.is_olt() || olt_port == target {
            tracing::debug!("Rejected patch {olt_port} -> {target}");
            return GraphDelta::default();
        }
        self.attach(olt_port, target, color)
    }

    /// Generic canvas connect from the editor of `active_dio`.
    ///
    /// Only cross-device links are accepted: exactly one endpoint must belong
    /// to the active DIO.
    pub fn connect_across_devices(
        &mut self,
        a: &PortRef,
        b: &PortRef,
        active_dio: &str,
        color: Option<String>,
    ) -> GraphDelta {
        if a == b || a.belongs_to(active_dio) == b.belongs_to(active_dio) {
            tracing::debug!("Rejected link {a} -> {b} from editor of {active_dio}");
            return GraphDelta::default();
        }
        self.attach(a, b, color)
    }

    /// Remove every edge touching `port`
    pub fn disconnect_port(&mut self, port: &PortRef) -> GraphDelta {
        self.remove_where(|c| c.involves(port))
    }

    /// Remove a single connection
    pub fn remove_connection(&mut self, id: &ConnectionId) -> Option<Connection> {
        let index = self.connections.iter().position(|c| c.id == *id)?;
        Some(self.connections.remove(index))
    }

    /// Drop edges on ports of `device_id` that are not in `surviving`
    pub fn prune_to_port_set(
        &mut self,
        device_id: &str,
        surviving: &HashSet<PortRef>,
    ) -> GraphDelta {
        let stale = |p: &PortRef| p.belongs_to(device_id) && !surviving.contains(p);
        self.remove_where(|c| stale(&c.source) || stale(&c.target))
    }

    /// Drop edges touching any of `removed`
    pub fn prune_ports(&mut self, removed: &HashSet<PortRef>) -> GraphDelta {
        if removed.is_empty() {
            return GraphDelta::default();
        }
        self.remove_where(|c| removed.contains(&c.source) || removed.contains(&c.target))
    }

    /// Drop every edge touching a port of `device_id`
    pub fn remove_device(&mut self, device_id: &str) -> GraphDelta {
        self.remove_where(|c| c.involves_device(device_id))
    }

    /// Remove edges matching a predicate
    pub fn remove_where(&mut self, mut doomed: impl FnMut(&Connection) -> bool) -> GraphDelta {
        let mut delta = GraphDelta::default();
        let mut kept = Vec::with_capacity(self.connections.len());
        for connection in self.connections.drain(..) {
            if doomed(&connection) {
                delta.removed.push(connection);
            } else {
                kept.push(connection);
            }
        }
        self.connections = kept;
        delta
    }

    /// Get a connection by ID
    pub fn connection(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == *id)
    }

    /// Get all connections
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter()
    }

    /// Connections touching a port
    pub fn connections_at<'a, 'p>(
        &'a self,
        port: &'p PortRef,
    ) -> impl Iterator<Item = &'a Connection> + 'p
    where
        'a: 'p,
    {
        self.connections.iter().filter(move |c| c.involves(port))
    }

    /// Edge occupying `slot` of a DIO port
    pub fn slot_edge(&self, port: &PortRef, slot: PortSlot) -> Option<&Connection> {
        self.connections.iter().find(|c| c.slot_at(port) == Some(slot))
    }

    /// Edge in the splice slot of a DIO port
    pub fn splice_at(&self, port: &PortRef) -> Option<&Connection> {
        self.slot_edge(port, PortSlot::Splice)
    }

    /// Edge in the patch slot of a DIO port
    pub fn patch_at(&self, port: &PortRef) -> Option<&Connection> {
        self.slot_edge(port, PortSlot::Patch)
    }

    /// Get the number of connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Check if the graph has no connections
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Clear the way on both endpoints, then append the edge
    fn attach(&mut self, from: &PortRef, to: &PortRef, color: Option<String>) -> GraphDelta {
        let mut delta = self.release(from, to);
        delta.merge(self.release(to, from));

        let connection = Connection::new(from.clone(), to.clone()).with_color(color);
        tracing::debug!(
            "Connected {from} -> {to} as {:?} ({})",
            connection.kind(),
            connection.id
        );
        delta.added = Some(connection.id.clone());
        self.connections.push(connection);
        delta
    }

    /// Remove the edges on `port` that a new edge to `partner` would displace
    fn release(&mut self, port: &PortRef, partner: &PortRef) -> GraphDelta {
        if port.is_exclusive() {
            return self.disconnect_port(port);
        }
        let slot = PortSlot::for_partner(partner);
        self.remove_where(|c| c.slot_at(port) == Some(slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fiber(i: u32) -> PortRef {
        PortRef::fiber("cbl1", i)
    }

    fn dio(i: u32) -> PortRef {
        PortRef::dio("dioA", i)
    }

    fn olt(s: u32, p: u32) -> PortRef {
        PortRef::olt("olt1", s, p)
    }

    #[test]
    fn test_splice_moves_fiber() {
        let mut graph = ConnectionGraph::new();
        graph.connect_fiber_to_port(&fiber(0), &dio(0), None);
        let delta = graph.connect_fiber_to_port(&fiber(0), &dio(1), None);

        assert_eq!(delta.removed.len(), 1);
        assert_eq!(graph.len(), 1);
        assert!(graph.splice_at(&dio(0)).is_none());
        assert_eq!(graph.splice_at(&dio(1)).map(|c| &c.source), Some(&fiber(0)));
    }

    #[test]
    fn test_splice_keeps_patch() {
        let mut graph = ConnectionGraph::new();
        graph.connect_olt_to_port(&olt(1, 1), &dio(0), Some("#0000FF".into()));
        graph.connect_fiber_to_port(&fiber(0), &dio(0), None);
        graph.connect_fiber_to_port(&fiber(1), &dio(0), None);

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.splice_at(&dio(0)).map(|c| &c.source), Some(&fiber(1)));
        let patch = graph.patch_at(&dio(0)).unwrap();
        assert_eq!(patch.source, olt(1, 1));
        assert_eq!(patch.color.as_deref(), Some("#0000FF"));
    }

    #[test]
    fn test_patch_overwrites_patch_only() {
        let mut graph = ConnectionGraph::new();
        graph.connect_fiber_to_port(&fiber(0), &dio(0), None);
        graph.connect_olt_to_port(&olt(1, 1), &dio(0), None);
        let delta = graph.connect_olt_to_port(&olt(1, 2), &dio(0), None);

        assert_eq!(delta.removed.len(), 1);
        assert_eq!(delta.removed[0].source, olt(1, 1));
        assert_eq!(graph.len(), 2);
        assert!(graph.splice_at(&dio(0)).is_some());
    }

    #[test]
    fn test_olt_port_moves() {
        let mut graph = ConnectionGraph::new();
        graph.connect_olt_to_port(&olt(1, 1), &dio(0), None);
        graph.connect_olt_to_port(&olt(1, 1), &dio(1), None);

        assert_eq!(graph.len(), 1);
        assert!(graph.patch_at(&dio(0)).is_none());
        assert!(graph.patch_at(&dio(1)).is_some());
    }

    #[test]
    fn test_invalid_requests_are_noops() {
        let mut graph = ConnectionGraph::new();
        assert!(graph.connect_fiber_to_port(&fiber(0), &fiber(0), None).is_empty());
        assert!(graph.connect_fiber_to_port(&dio(0), &dio(1), None).is_empty());
        assert!(graph.connect_olt_to_port(&fiber(0), &dio(1), None).is_empty());
        assert!(graph.connect_olt_to_port(&olt(1, 1), &olt(1, 1), None).is_empty());
        assert!(graph.is_empty());
    }

    #[test]
    fn test_cross_device_only() {
        let mut graph = ConnectionGraph::new();
        assert!(graph
            .connect_across_devices(&dio(0), &dio(1), "dioA", None)
            .is_empty());
        assert!(graph
            .connect_across_devices(&fiber(0), &olt(1, 1), "dioA", None)
            .is_empty());

        let delta = graph.connect_across_devices(&dio(0), &PortRef::dio("dioB", 0), "dioA", None);
        let id = delta.added.unwrap();
        assert!(id.as_str().starts_with("link-"));

        let delta = graph.connect_across_devices(&fiber(4), &dio(0), "dioA", None);
        assert!(delta.removed.is_empty());
        assert!(delta.added.unwrap().as_str().starts_with("fusion-"));
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_splice_keeps_cross_device_link() {
        let mut graph = ConnectionGraph::new();
        let dio_b = PortRef::dio("dioB", 0);
        graph.connect_across_devices(&dio(0), &dio_b, "dioA", None);

        let delta = graph.connect_fiber_to_port(&fiber(0), &dio(0), None);

        assert!(delta.removed.is_empty());
        assert_eq!(graph.len(), 2);
        assert_eq!(
            graph.slot_edge(&dio(0), PortSlot::Link).map(|c| &c.target),
            Some(&dio_b)
        );
        assert_eq!(graph.splice_at(&dio(0)).map(|c| &c.source), Some(&fiber(0)));
    }

    #[test]
    fn test_link_overwrites_link_only() {
        let mut graph = ConnectionGraph::new();
        graph.connect_fiber_to_port(&fiber(0), &dio(0), None);
        graph.connect_across_devices(&dio(0), &PortRef::dio("dioB", 0), "dioA", None);
        let delta = graph.connect_across_devices(&dio(0), &PortRef::dio("dioC", 5), "dioA", None);

        assert_eq!(delta.removed.len(), 1);
        assert_eq!(delta.removed[0].target, PortRef::dio("dioB", 0));
        assert!(graph.splice_at(&dio(0)).is_some());
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_cross_device_olt_patch() {
        let mut graph = ConnectionGraph::new();
        graph.connect_fiber_to_port(&fiber(0), &dio(0), None);
        graph.connect_olt_to_port(&olt(1, 1), &dio(0), None);

        let delta = graph.connect_across_devices(&olt(1, 2), &dio(0), "dioA", None);
        assert_eq!(delta.removed.len(), 1);
        assert_eq!(delta.removed[0].source, olt(1, 1));
        assert!(delta.added.unwrap().as_str().starts_with("patch-"));
        assert_eq!(graph.patch_at(&dio(0)).map(|c| &c.source), Some(&olt(1, 2)));
        assert_eq!(graph.splice_at(&dio(0)).map(|c| &c.source), Some(&fiber(0)));

        // the OLT port moves rather than fanning out
        graph.connect_across_devices(&dio(1), &olt(1, 2), "dioA", None);
        assert!(graph.patch_at(&dio(0)).is_none());
        assert_eq!(graph.patch_at(&dio(1)).map(|c| &c.target), Some(&olt(1, 2)));
        assert_eq!(graph.connections_at(&olt(1, 2)).count(), 1);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_cross_device_keeps_exclusive_ports() {
        let mut graph = ConnectionGraph::new();
        graph.connect_fiber_to_port(&fiber(0), &dio(0), None);
        graph.connect_across_devices(&fiber(0), &PortRef::dio("dioB", 3), "dioB", None);

        assert_eq!(graph.connections_at(&fiber(0)).count(), 1);
        assert!(graph.splice_at(&dio(0)).is_none());
    }

    #[test]
    fn test_disconnect_port() {
        let mut graph = ConnectionGraph::new();
        graph.connect_fiber_to_port(&fiber(0), &dio(0), None);
        graph.connect_olt_to_port(&olt(1, 1), &dio(0), None);
        graph.connect_fiber_to_port(&fiber(1), &dio(1), None);

        let delta = graph.disconnect_port(&dio(0));
        assert_eq!(delta.removed.len(), 2);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_prune_to_port_set() {
        let mut graph = ConnectionGraph::new();
        graph.connect_fiber_to_port(&fiber(0), &dio(0), None);
        graph.connect_fiber_to_port(&fiber(1), &dio(15), None);
        graph.connect_fiber_to_port(&fiber(2), &PortRef::dio("dioA2", 20), None);

        let surviving: HashSet<_> = (0..12).map(dio).collect();
        let delta = graph.prune_to_port_set("dioA", &surviving);

        assert_eq!(delta.removed.len(), 1);
        assert_eq!(delta.removed[0].target, dio(15));
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_remove_device() {
        let mut graph = ConnectionGraph::new();
        graph.connect_olt_to_port(&olt(1, 1), &dio(0), None);
        graph.connect_olt_to_port(&olt(2, 4), &dio(1), None);
        graph.connect_olt_to_port(&PortRef::olt("olt10", 1, 1), &dio(2), None);

        let delta = graph.remove_device("olt1");
        assert_eq!(delta.removed.len(), 2);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_remove_connection() {
        let mut graph = ConnectionGraph::new();
        let id = graph
            .connect_fiber_to_port(&fiber(0), &dio(0), None)
            .added
            .unwrap();
        assert!(graph.connection(&id).is_some());
        assert!(graph.remove_connection(&id).is_some());
        assert!(graph.remove_connection(&id).is_none());
    }
}
