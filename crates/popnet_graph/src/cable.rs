// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cables and their assignment to DIOs.
//!
//! A cable can be routed into at most one DIO of a POP.

use crate::equipment::{fresh_id, Dio};
use crate::palette::{ColorStandard, FiberPalette};
use crate::port::PortRef;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Fiber optic cable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cable {
    /// Unique id, prefix of every fiber port id
    pub id: String,
    /// Display name
    pub name: String,
    /// Number of strands
    pub fiber_count: u32,
    /// Number of loose tubes
    pub loose_tube_count: u32,
    /// Color code standard
    #[serde(default)]
    pub color_standard: ColorStandard,
}

impl Cable {
    /// Create a cable with a fresh id
    pub fn new(name: impl Into<String>, fiber_count: u32, loose_tube_count: u32) -> Self {
        Self::with_id(fresh_id("cbl"), name, fiber_count, loose_tube_count)
    }

    /// Create a cable with a known id
    pub fn with_id(
        id: impl Into<String>,
        name: impl Into<String>,
        fiber_count: u32,
        loose_tube_count: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            fiber_count,
            loose_tube_count,
            color_standard: ColorStandard::default(),
        }
    }

    /// Set the color standard
    pub fn with_standard(mut self, standard: ColorStandard) -> Self {
        self.color_standard = standard;
        self
    }

    /// Strands per loose tube (at least 1)
    pub fn fibers_per_tube(&self) -> u32 {
        if self.loose_tube_count == 0 {
            return self.fiber_count.max(1);
        }
        (self.fiber_count / self.loose_tube_count).max(1)
    }

    /// `(tube, offset within tube)` of a strand
    pub fn tube_of(&self, index: u32) -> (u32, u32) {
        let per_tube = self.fibers_per_tube();
        (index / per_tube, index % per_tube)
    }

    /// Port id of strand `index`, if it exists
    pub fn fiber_port(&self, index: u32) -> Option<PortRef> {
        (index < self.fiber_count).then(|| PortRef::fiber(&self.id, index))
    }

    /// All strand ports
    pub fn fiber_ports(&self) -> impl Iterator<Item = PortRef> + '_ {
        (0..self.fiber_count).map(|i| PortRef::fiber(&self.id, i))
    }

    /// Check if a port is one of this cable's strands
    pub fn has_fiber(&self, port: &PortRef) -> bool {
        match port {
            PortRef::Fiber { cable_id, index } => *cable_id == self.id && *index < self.fiber_count,
            _ => false,
        }
    }

    /// Color of a strand (by position inside its tube)
    pub fn fiber_color(&self, index: u32, palette: &dyn FiberPalette) -> String {
        let (_, offset) = self.tube_of(index);
        palette.fiber_color(offset as usize, self.color_standard)
    }

    /// Color of a strand's loose tube
    pub fn tube_color(&self, index: u32, palette: &dyn FiberPalette) -> String {
        let (tube, _) = self.tube_of(index);
        palette.fiber_color(tube as usize, self.color_standard)
    }
}

/// Result of toggling a cable link on a DIO
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Cable now routed to the DIO
    Linked,
    /// Cable was routed to the DIO and has been released
    Unlinked,
    /// Cable is routed to another DIO; nothing changed
    AlreadyLinkedElsewhere(String),
}

impl LinkOutcome {
    /// Whether the DIO changed
    pub fn changed(&self) -> bool {
        !matches!(self, Self::AlreadyLinkedElsewhere(_))
    }
}

/// DIO currently holding `cable_id`
pub fn owner_of<'a>(cable_id: &str, dios: impl IntoIterator<Item = &'a Dio>) -> Option<&'a Dio> {
    dios.into_iter()
        .find(|d| d.input_cable_ids.iter().any(|c| c == cable_id))
}

/// Toggle the link between `cable_id` and DIO `dio_id`.
///
/// Returns `None` if the DIO does not exist.
pub fn link_cable(
    dios: &mut IndexMap<String, Dio>,
    dio_id: &str,
    cable_id: &str,
) -> Option<LinkOutcome> {
    let owner = owner_of(cable_id, dios.values()).map(|d| d.id.clone());
    let dio = dios.get_mut(dio_id)?;

    let outcome = match owner {
        Some(owner) if owner == dio.id => {
            dio.input_cable_ids.retain(|c| c != cable_id);
            LinkOutcome::Unlinked
        }
        Some(owner) => {
            tracing::debug!("Cable {cable_id} already linked to {owner}, not linking to {dio_id}");
            LinkOutcome::AlreadyLinkedElsewhere(owner)
        }
        None => {
            dio.input_cable_ids.push(cable_id.to_string());
            LinkOutcome::Linked
        }
    };
    Some(outcome)
}
