// SPDX-License-Identifier: MIT OR Apache-2.0
//! OLTs and DIOs, and the port sets derived from their structure.
//!
//! Port ids are never edited directly. They are regenerated from the
//! structure whenever it changes, and [`removed_ports`] gives the diff the
//! connection graph has to prune.

use crate::port::PortRef;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Generate a fresh device id
pub fn fresh_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

/// Kind of active equipment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EquipmentKind {
    /// Optical line terminal
    #[default]
    Olt,
    /// Switch
    Switch,
    /// Router
    Router,
}

/// Configuration of one chassis slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotConfig {
    /// Whether a card is installed
    pub active: bool,
    /// Ports on the card
    pub port_count: u32,
}

/// Chassis layout of an OLT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OltStructure {
    /// Number of slots
    pub slots: u32,
    /// Ports per slot when no per-slot config is given
    pub ports_per_slot: u32,
    /// Per-slot configuration, overrides `slots × ports_per_slot`
    #[serde(default)]
    pub slots_config: Vec<SlotConfig>,
}

impl OltStructure {
    /// Uniform structure with every slot active
    pub fn uniform(slots: u32, ports_per_slot: u32) -> Self {
        Self {
            slots,
            ports_per_slot,
            slots_config: (0..slots)
                .map(|_| SlotConfig {
                    active: true,
                    port_count: ports_per_slot,
                })
                .collect(),
        }
    }

    /// Structure without per-slot config
    pub fn bare(slots: u32, ports_per_slot: u32) -> Self {
        Self {
            slots,
            ports_per_slot,
            slots_config: Vec::new(),
        }
    }
}

/// Derive the port ids of an OLT, slots and ports numbered from 1
pub fn derive_olt_ports(olt_id: &str, structure: &OltStructure) -> Vec<PortRef> {
    if structure.slots_config.is_empty() {
        return (1..=structure.slots)
            .flat_map(|slot| (1..=structure.ports_per_slot).map(move |port| (slot, port)))
            .map(|(slot, port)| PortRef::olt(olt_id, slot, port))
            .collect();
    }

    structure
        .slots_config
        .iter()
        .zip(1..)
        .filter(|(config, _)| config.active)
        .flat_map(|(config, slot)| (1..=config.port_count).map(move |port| (slot, port)))
        .map(|(slot, port)| PortRef::olt(olt_id, slot, port))
        .collect()
}

/// Derive the port ids of a DIO, numbered from 0
pub fn derive_dio_ports(dio_id: &str, port_count: u32) -> Vec<PortRef> {
    (0..port_count).map(|i| PortRef::dio(dio_id, i)).collect()
}

/// Ports present in `old` but not in `new`
pub fn removed_ports(old: &[PortRef], new: &[PortRef]) -> HashSet<PortRef> {
    let new: HashSet<&PortRef> = new.iter().collect();
    old.iter().filter(|p| !new.contains(p)).cloned().collect()
}

/// Active equipment (OLT, switch or router)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Olt {
    /// Unique id, prefix of every port id
    pub id: String,
    /// Display name
    pub name: String,
    /// Equipment kind
    #[serde(default)]
    pub kind: EquipmentKind,
    /// Chassis layout
    pub structure: OltStructure,
    /// Ports derived from `structure`
    #[serde(default)]
    pub port_ids: Vec<PortRef>,
}

impl Olt {
    /// Create an OLT with a fresh id and `slots` uniform slots
    pub fn new(name: impl Into<String>, slots: u32, ports_per_slot: u32) -> Self {
        Self::with_id(fresh_id("olt"), name, OltStructure::uniform(slots, ports_per_slot))
    }

    /// Create an OLT with a known id
    pub fn with_id(
        id: impl Into<String>,
        name: impl Into<String>,
        structure: OltStructure,
    ) -> Self {
        let id = id.into();
        let port_ids = derive_olt_ports(&id, &structure);
        Self {
            id,
            name: name.into(),
            kind: EquipmentKind::Olt,
            structure,
            port_ids,
        }
    }

    /// Set the equipment kind
    pub fn with_kind(mut self, kind: EquipmentKind) -> Self {
        self.kind = kind;
        self
    }

    /// Replace the structure, returning the ports that disappeared
    pub fn restructure(&mut self, structure: OltStructure) -> HashSet<PortRef> {
        let new_ports = derive_olt_ports(&self.id, &structure);
        let removed = removed_ports(&self.port_ids, &new_ports);
        self.structure = structure;
        self.port_ids = new_ports;
        removed
    }

    /// Rebuild `port_ids` from the structure. Returns whether they changed.
    pub fn rederive_ports(&mut self) -> bool {
        let derived = derive_olt_ports(&self.id, &self.structure);
        let changed = derived != self.port_ids;
        self.port_ids = derived;
        changed
    }

    /// Check if a port currently exists on this OLT
    pub fn has_port(&self, port: &PortRef) -> bool {
        self.port_ids.contains(port)
    }
}

/// Distribution panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dio {
    /// Unique id, prefix of every port id
    pub id: String,
    /// Display name
    pub name: String,
    /// Number of ports
    pub port_count: u32,
    /// Ports derived from `port_count`
    #[serde(default)]
    pub port_ids: Vec<PortRef>,
    /// Cables physically routed to this panel
    #[serde(default)]
    pub input_cable_ids: Vec<String>,
}

impl Dio {
    /// Create a DIO with a fresh id
    pub fn new(name: impl Into<String>, port_count: u32) -> Self {
        Self::with_id(fresh_id("dio"), name, port_count)
    }

    /// Create a DIO with a known id
    pub fn with_id(id: impl Into<String>, name: impl Into<String>, port_count: u32) -> Self {
        let id = id.into();
        let port_ids = derive_dio_ports(&id, port_count);
        Self {
            id,
            name: name.into(),
            port_count,
            port_ids,
            input_cable_ids: Vec::new(),
        }
    }

    /// Change the port count, returning the ports that disappeared
    pub fn resize(&mut self, port_count: u32) -> HashSet<PortRef> {
        let new_ports = derive_dio_ports(&self.id, port_count);
        let removed = removed_ports(&self.port_ids, &new_ports);
        self.port_count = port_count;
        self.port_ids = new_ports;
        removed
    }

    /// Rebuild `port_ids` from the port count. Returns whether they changed.
    pub fn rederive_ports(&mut self) -> bool {
        let derived = derive_dio_ports(&self.id, self.port_count);
        let changed = derived != self.port_ids;
        self.port_ids = derived;
        changed
    }

    /// Check if a port currently exists on this DIO
    pub fn has_port(&self, port: &PortRef) -> bool {
        match port {
            PortRef::Dio { dio_id, index } => *dio_id == self.id && *index < self.port_count,
            _ => false,
        }
    }

    /// Number of trays
    pub fn tray_count(&self) -> u32 {
        self.port_count.div_ceil(crate::port::PORTS_PER_TRAY)
    }
}
