// SPDX-License-Identifier: MIT OR Apache-2.0
//! The POP document: equipment, cables and the connection graph of one room.
//!
//! All edits go through this type so the graph never references a port that
//! does not exist. Connect requests naming unknown ports are dropped, and
//! structural edits prune the edges of the ports they remove.

use crate::cable::{self, Cable, LinkOutcome};
use crate::connection::{Connection, ConnectionId};
use crate::equipment::{derive_dio_ports, derive_olt_ports, fresh_id, Dio, Olt, OltStructure};
use crate::graph::{ConnectionGraph, GraphDelta};
use crate::highlight::FaultLocatorView;
use crate::palette::{ColorStandard, FiberPalette};
use crate::port::{PortRef, PortSlot};
use crate::reachability::ReachabilityIndex;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Canvas position of a device
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutPosition {
    /// Horizontal position
    pub x: f32,
    /// Vertical position
    pub y: f32,
}

/// One equipment room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pop {
    /// Unique id
    pub id: String,
    /// Display name
    pub name: String,
    /// Standard used for tray colors
    #[serde(default)]
    pub color_standard: ColorStandard,
    #[serde(default)]
    olts: IndexMap<String, Olt>,
    #[serde(default)]
    dios: IndexMap<String, Dio>,
    #[serde(default)]
    cables: IndexMap<String, Cable>,
    #[serde(default)]
    connections: ConnectionGraph,
    /// Canvas positions by device id
    #[serde(default)]
    pub layout: IndexMap<String, LayoutPosition>,
}

impl Pop {
    /// Create an empty POP
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: fresh_id("pop"),
            name: name.into(),
            color_standard: ColorStandard::default(),
            olts: IndexMap::new(),
            dios: IndexMap::new(),
            cables: IndexMap::new(),
            connections: ConnectionGraph::new(),
            layout: IndexMap::new(),
        }
    }

    // ---- Lookup ----

    /// Get an OLT by ID
    pub fn olt(&self, id: &str) -> Option<&Olt> {
        self.olts.get(id)
    }

    /// Get a DIO by ID
    pub fn dio(&self, id: &str) -> Option<&Dio> {
        self.dios.get(id)
    }

    /// Get a cable by ID
    pub fn cable(&self, id: &str) -> Option<&Cable> {
        self.cables.get(id)
    }

    /// Get all OLTs
    pub fn olts(&self) -> impl Iterator<Item = &Olt> {
        self.olts.values()
    }

    /// Get all DIOs
    pub fn dios(&self) -> impl Iterator<Item = &Dio> {
        self.dios.values()
    }

    /// Get all cables
    pub fn cables(&self) -> impl Iterator<Item = &Cable> {
        self.cables.values()
    }

    /// The connection graph
    pub fn graph(&self) -> &ConnectionGraph {
        &self.connections
    }

    /// Check if a port exists on a device or cable of this POP
    pub fn port_exists(&self, port: &PortRef) -> bool {
        match port {
            PortRef::Fiber { cable_id, .. } => {
                self.cables.get(cable_id).is_some_and(|c| c.has_fiber(port))
            }
            PortRef::Dio { dio_id, .. } => self.dios.get(dio_id).is_some_and(|d| d.has_port(port)),
            PortRef::Olt { olt_id, .. } => self.olts.get(olt_id).is_some_and(|o| o.has_port(port)),
            PortRef::Other(_) => false,
        }
    }

    // ---- Connections ----

    /// Splice a fiber onto a port
    pub fn connect_fiber_to_port(
        &mut self,
        fiber: &PortRef,
        target: &PortRef,
        palette: &dyn FiberPalette,
    ) -> GraphDelta {
        if !self.ports_exist(fiber, target) {
            return GraphDelta::default();
        }
        let color = self.splice_color(fiber, palette);
        self.connections.connect_fiber_to_port(fiber, target, color)
    }

    /// Patch an OLT port onto a port, colored by the target's tray
    pub fn connect_olt_to_port(
        &mut self,
        olt_port: &PortRef,
        target: &PortRef,
        palette: &dyn FiberPalette,
    ) -> GraphDelta {
        if !self.ports_exist(olt_port, target) {
            return GraphDelta::default();
        }
        let color = self.tray_color(target, palette);
        self.connections.connect_olt_to_port(olt_port, target, color)
    }

    /// Canvas connect from the editor of `active_dio`
    pub fn connect_across_devices(
        &mut self,
        a: &PortRef,
        b: &PortRef,
        active_dio: &str,
        palette: &dyn FiberPalette,
    ) -> GraphDelta {
        if !self.ports_exist(a, b) {
            return GraphDelta::default();
        }
        let color = if a.is_fiber() {
            self.splice_color(a, palette)
        } else if b.is_fiber() {
            self.splice_color(b, palette)
        } else if a.is_olt() {
            self.tray_color(b, palette)
        } else if b.is_olt() {
            self.tray_color(a, palette)
        } else {
            None
        };
        self.connections.connect_across_devices(a, b, active_dio, color)
    }

    /// Remove every edge touching a port
    pub fn disconnect_port(&mut self, port: &PortRef) -> GraphDelta {
        self.connections.disconnect_port(port)
    }

    /// Remove a single connection
    pub fn remove_connection(&mut self, id: &ConnectionId) -> Option<Connection> {
        self.connections.remove_connection(id)
    }

    fn ports_exist(&self, a: &PortRef, b: &PortRef) -> bool {
        for port in [a, b] {
            if !self.port_exists(port) {
                tracing::debug!("Ignoring connect request: unknown port {port}");
                return false;
            }
        }
        true
    }

    fn splice_color(&self, fiber: &PortRef, palette: &dyn FiberPalette) -> Option<String> {
        match fiber {
            PortRef::Fiber { cable_id, index } => self
                .cables
                .get(cable_id)
                .map(|c| c.fiber_color(*index, palette)),
            _ => None,
        }
    }

    fn tray_color(&self, port: &PortRef, palette: &dyn FiberPalette) -> Option<String> {
        port.tray_index()
            .map(|tray| palette.fiber_color(tray as usize, self.color_standard))
    }

    // ---- Equipment ----

    /// Add an OLT, regenerating its ports from its structure
    pub fn add_olt(&mut self, mut olt: Olt) -> Result<String, PopError> {
        if self.olts.contains_key(&olt.id) {
            return Err(PopError::DuplicateId(olt.id));
        }
        olt.port_ids = derive_olt_ports(&olt.id, &olt.structure);
        let id = olt.id.clone();
        tracing::info!("Added OLT {} ({} ports)", olt.name, olt.port_ids.len());
        self.olts.insert(id.clone(), olt);
        Ok(id)
    }

    /// Create an OLT with uniform slots
    pub fn create_olt(
        &mut self,
        name: impl Into<String>,
        slots: u32,
        ports_per_slot: u32,
    ) -> String {
        let olt = Olt::new(name, slots, ports_per_slot);
        let id = olt.id.clone();
        tracing::info!("Created OLT {} ({} ports)", olt.name, olt.port_ids.len());
        self.olts.insert(id.clone(), olt);
        id
    }

    /// Change the structure of an OLT and prune edges on removed ports
    pub fn resize_olt(
        &mut self,
        id: &str,
        structure: OltStructure,
    ) -> Result<GraphDelta, PopError> {
        let olt = self
            .olts
            .get_mut(id)
            .ok_or_else(|| PopError::OltNotFound(id.to_string()))?;
        let removed = olt.restructure(structure);
        let delta = self.connections.prune_ports(&removed);
        tracing::info!(
            "Resized OLT {id}: {} ports removed, {} connections pruned",
            removed.len(),
            delta.removed.len()
        );
        Ok(delta)
    }

    /// Rename an OLT
    pub fn rename_olt(&mut self, id: &str, name: impl Into<String>) -> Result<(), PopError> {
        let olt = self
            .olts
            .get_mut(id)
            .ok_or_else(|| PopError::OltNotFound(id.to_string()))?;
        olt.name = name.into();
        Ok(())
    }

    /// Delete an OLT and every edge on its ports
    pub fn delete_olt(&mut self, id: &str) -> Result<(Olt, GraphDelta), PopError> {
        let olt = self
            .olts
            .shift_remove(id)
            .ok_or_else(|| PopError::OltNotFound(id.to_string()))?;
        self.layout.shift_remove(id);
        let delta = self.connections.remove_device(id);
        tracing::info!("Deleted OLT {id}, {} connections removed", delta.removed.len());
        Ok((olt, delta))
    }

    /// Add a DIO, regenerating its ports from its port count
    pub fn add_dio(&mut self, mut dio: Dio) -> Result<String, PopError> {
        if self.dios.contains_key(&dio.id) {
            return Err(PopError::DuplicateId(dio.id));
        }
        dio.port_ids = derive_dio_ports(&dio.id, dio.port_count);
        let id = dio.id.clone();
        tracing::info!("Added DIO {} ({} ports)", dio.name, dio.port_count);
        self.dios.insert(id.clone(), dio);
        Ok(id)
    }

    /// Create a DIO
    pub fn create_dio(&mut self, name: impl Into<String>, port_count: u32) -> String {
        let dio = Dio::new(name, port_count);
        let id = dio.id.clone();
        tracing::info!("Created DIO {} ({port_count} ports)", dio.name);
        self.dios.insert(id.clone(), dio);
        id
    }

    /// Change the port count of a DIO and prune edges on removed ports
    pub fn resize_dio(&mut self, id: &str, port_count: u32) -> Result<GraphDelta, PopError> {
        let dio = self
            .dios
            .get_mut(id)
            .ok_or_else(|| PopError::DioNotFound(id.to_string()))?;
        let removed = dio.resize(port_count);
        let delta = self.connections.prune_ports(&removed);
        tracing::info!(
            "Resized DIO {id} to {port_count} ports, {} connections pruned",
            delta.removed.len()
        );
        Ok(delta)
    }

    /// Rename a DIO
    pub fn rename_dio(&mut self, id: &str, name: impl Into<String>) -> Result<(), PopError> {
        let dio = self
            .dios
            .get_mut(id)
            .ok_or_else(|| PopError::DioNotFound(id.to_string()))?;
        dio.name = name.into();
        Ok(())
    }

    /// Delete a DIO, its cable links and every edge on its ports
    pub fn delete_dio(&mut self, id: &str) -> Result<(Dio, GraphDelta), PopError> {
        let dio = self
            .dios
            .shift_remove(id)
            .ok_or_else(|| PopError::DioNotFound(id.to_string()))?;
        self.layout.shift_remove(id);
        let delta = self.connections.remove_device(id);
        tracing::info!("Deleted DIO {id}, {} connections removed", delta.removed.len());
        Ok((dio, delta))
    }

    // ---- Cables ----

    /// Add a cable routed into the room
    pub fn add_cable(&mut self, cable: Cable) -> Result<String, PopError> {
        if self.cables.contains_key(&cable.id) {
            return Err(PopError::DuplicateId(cable.id));
        }
        let id = cable.id.clone();
        self.cables.insert(id.clone(), cable);
        Ok(id)
    }

    /// Remove a cable, its splices and its DIO link
    pub fn remove_cable(&mut self, id: &str) -> Result<(Cable, GraphDelta), PopError> {
        let cable = self
            .cables
            .shift_remove(id)
            .ok_or_else(|| PopError::CableNotFound(id.to_string()))?;
        for dio in self.dios.values_mut() {
            dio.input_cable_ids.retain(|c| c != id);
        }
        let delta = self.connections.remove_device(id);
        tracing::info!("Removed cable {id}, {} splices removed", delta.removed.len());
        Ok((cable, delta))
    }

    /// Toggle the link between a cable and a DIO.
    ///
    /// A cable linked to another DIO is left alone and reported as
    /// [`LinkOutcome::AlreadyLinkedElsewhere`].
    pub fn link_cable(&mut self, dio_id: &str, cable_id: &str) -> Result<LinkOutcome, PopError> {
        if !self.cables.contains_key(cable_id) {
            return Err(PopError::CableNotFound(cable_id.to_string()));
        }
        cable::link_cable(&mut self.dios, dio_id, cable_id)
            .ok_or_else(|| PopError::DioNotFound(dio_id.to_string()))
    }

    /// DIO a cable is linked to
    pub fn cable_owner(&self, cable_id: &str) -> Option<&Dio> {
        cable::owner_of(cable_id, self.dios.values())
    }

    // ---- Derived state ----

    /// Derive signal reachability
    pub fn reachability(&self) -> ReachabilityIndex {
        ReachabilityIndex::build(&self.connections, self.olts.values())
    }

    /// Connections lit by the fault locator
    pub fn lit_connections(&self, view: &FaultLocatorView) -> Vec<&Connection> {
        view.lit_connections(&self.connections)
    }

    // ---- Integrity ----

    /// List every invariant violation in the document
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        let mut exclusive: HashMap<&PortRef, usize> = HashMap::new();
        let mut slots: HashMap<(&PortRef, PortSlot), usize> = HashMap::new();

        for connection in self.connections.connections() {
            if connection.source == connection.target {
                violations.push(Violation::SelfLoop(connection.id.clone()));
                continue;
            }
            for (port, partner) in [
                (&connection.source, &connection.target),
                (&connection.target, &connection.source),
            ] {
                if !self.port_exists(port) {
                    violations.push(Violation::DanglingPort {
                        connection: connection.id.clone(),
                        port: port.clone(),
                    });
                }
                if port.is_exclusive() {
                    *exclusive.entry(port).or_default() += 1;
                } else {
                    *slots.entry((port, PortSlot::for_partner(partner))).or_default() += 1;
                }
            }
        }

        for (port, count) in exclusive {
            if count > 1 {
                violations.push(Violation::PortOverloaded {
                    port: port.clone(),
                    count,
                });
            }
        }
        for ((port, slot), count) in slots {
            if count > 1 {
                violations.push(Violation::SlotOverloaded {
                    port: port.clone(),
                    slot,
                    count,
                });
            }
        }

        let mut cable_links: IndexMap<&str, Vec<String>> = IndexMap::new();
        for dio in self.dios.values() {
            for cable_id in &dio.input_cable_ids {
                cable_links.entry(cable_id.as_str()).or_default().push(dio.id.clone());
            }
        }
        for (cable_id, dios) in cable_links {
            if dios.len() > 1 {
                violations.push(Violation::CableLinkedTwice {
                    cable_id: cable_id.to_string(),
                    dios,
                });
            }
        }

        violations
    }

    /// Rebuild every device's `port_ids` from its structure.
    ///
    /// Stored port lists are never trusted: a document may omit them or
    /// carry stale ones. Returns the ids of devices whose list changed.
    pub fn rederive_ports(&mut self) -> Vec<String> {
        let mut changed = Vec::new();
        for olt in self.olts.values_mut() {
            if olt.rederive_ports() {
                changed.push(olt.id.clone());
            }
        }
        for dio in self.dios.values_mut() {
            if dio.rederive_ports() {
                changed.push(dio.id.clone());
            }
        }
        if !changed.is_empty() {
            tracing::debug!("Rebuilt port ids of {}", changed.join(", "));
        }
        changed
    }

    /// Bring a loaded document back within its invariants.
    ///
    /// Port ids are rebuilt first. Dangling and self-looped edges are
    /// dropped. Among edges competing for the same port or slot the most
    /// recent one wins. A cable linked to several DIOs stays with the first.
    pub fn repair(&mut self) -> RepairReport {
        self.rederive_ports();

        let mut doomed: HashSet<ConnectionId> = HashSet::new();
        let mut occupied: HashSet<(PortRef, Option<PortSlot>)> = HashSet::new();

        let oldest_first: Vec<&Connection> = self.connections.connections().collect();
        for connection in oldest_first.into_iter().rev() {
            let looped = connection.source == connection.target;
            let dangling =
                !self.port_exists(&connection.source) || !self.port_exists(&connection.target);
            let keys = [
                occupancy_key(&connection.source, &connection.target),
                occupancy_key(&connection.target, &connection.source),
            ];
            if looped || dangling || keys.iter().any(|k| occupied.contains(k)) {
                doomed.insert(connection.id.clone());
            } else {
                occupied.extend(keys);
            }
        }
        let removed = self.connections.remove_where(|c| doomed.contains(&c.id)).removed;

        let mut seen: HashSet<String> = HashSet::new();
        let mut released_links = Vec::new();
        for dio in self.dios.values_mut() {
            let dio_id = dio.id.clone();
            dio.input_cable_ids.retain(|cable_id| {
                if seen.insert(cable_id.clone()) {
                    true
                } else {
                    released_links.push((dio_id.clone(), cable_id.clone()));
                    false
                }
            });
        }

        let report = RepairReport {
            removed,
            released_links,
        };
        if !report.is_clean() {
            tracing::warn!(
                "Repaired POP {}: {} connections removed, {} cable links released",
                self.id,
                report.removed.len(),
                report.released_links.len()
            );
        }
        report
    }
}

impl Default for Pop {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

fn occupancy_key(port: &PortRef, partner: &PortRef) -> (PortRef, Option<PortSlot>) {
    if port.is_exclusive() {
        (port.clone(), None)
    } else {
        (port.clone(), Some(PortSlot::for_partner(partner)))
    }
}

/// A broken invariant found by [`Pop::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Connection references a port that does not exist
    DanglingPort {
        /// Offending connection
        connection: ConnectionId,
        /// Missing port
        port: PortRef,
    },
    /// Connection starts and ends on the same port
    SelfLoop(ConnectionId),
    /// Fiber or OLT port with more than one edge
    PortOverloaded {
        /// Port
        port: PortRef,
        /// Number of edges
        count: usize,
    },
    /// DIO port slot with more than one edge
    SlotOverloaded {
        /// Port
        port: PortRef,
        /// Slot
        slot: PortSlot,
        /// Number of edges
        count: usize,
    },
    /// Cable linked to several DIOs
    CableLinkedTwice {
        /// Cable
        cable_id: String,
        /// DIOs holding it
        dios: Vec<String>,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingPort { connection, port } => {
                write!(f, "{connection} references missing port {port}")
            }
            Self::SelfLoop(connection) => write!(f, "{connection} connects a port to itself"),
            Self::PortOverloaded { port, count } => {
                write!(f, "{port} is an endpoint of {count} connections")
            }
            Self::SlotOverloaded { port, slot, count } => {
                write!(f, "{port} holds {count} {slot:?} connections")
            }
            Self::CableLinkedTwice { cable_id, dios } => {
                write!(f, "cable {cable_id} is linked to {}", dios.join(", "))
            }
        }
    }
}

/// What [`Pop::repair`] changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepairReport {
    /// Connections dropped
    pub removed: Vec<Connection>,
    /// `(dio_id, cable_id)` links released
    pub released_links: Vec<(String, String)>,
}

impl RepairReport {
    /// Check if nothing needed repair
    pub fn is_clean(&self) -> bool {
        self.removed.is_empty() && self.released_links.is_empty()
    }
}

/// Error for structural POP edits
#[derive(Debug, thiserror::Error)]
pub enum PopError {
    /// OLT not found
    #[error("OLT not found: {0}")]
    OltNotFound(String),

    /// DIO not found
    #[error("DIO not found: {0}")]
    DioNotFound(String),

    /// Cable not found
    #[error("Cable not found: {0}")]
    CableNotFound(String),

    /// Id already in use
    #[error("Id already in use: {0}")]
    DuplicateId(String),
}
