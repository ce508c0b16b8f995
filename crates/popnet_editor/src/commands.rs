// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor commands.
//!
//! Every UI operation on a POP is a command. The session runs commands
//! against the document and records the result in the undo history.

use crate::history::HistoryError;
use popnet_graph::{
    Cable, FiberPalette, GraphDelta, LinkOutcome, OltStructure, Pop, PopError, PortRef,
};
use serde::{Deserialize, Serialize};

/// Trait for editor commands
pub trait EditorCommand {
    /// Get a description of this command
    fn description(&self) -> String;

    /// Execute the command against a document
    fn execute(&self, doc: &mut Pop, palette: &dyn FiberPalette)
        -> Result<CommandOutcome, CommandError>;
}

/// Error type for command execution
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Structural edit failed
    #[error(transparent)]
    Pop(#[from] PopError),

    /// History error
    #[error("History error: {0}")]
    History(#[from] HistoryError),

    /// No DIO editor is open
    #[error("No active DIO")]
    NoActiveDio,

    /// No drag in progress
    #[error("No drag in progress")]
    NoDrag,
}

/// What a command did
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// Graph edges changed
    Graph(GraphDelta),
    /// Device created
    Created(String),
    /// Device renamed
    Renamed(String),
    /// Device structure changed; edges on removed ports were pruned
    Restructured(GraphDelta),
    /// Device or cable removed along with its edges
    Removed {
        /// Removed id
        id: String,
        /// Edges removed with it
        delta: GraphDelta,
    },
    /// Cable link toggled or refused
    Link(LinkOutcome),
}

impl CommandOutcome {
    /// Whether the document changed
    pub fn changed(&self) -> bool {
        match self {
            Self::Graph(delta) => !delta.is_empty(),
            Self::Link(outcome) => outcome.changed(),
            Self::Created(_)
            | Self::Renamed(_)
            | Self::Restructured(_)
            | Self::Removed { .. } => true,
        }
    }
}

/// Splice a fiber onto a port
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectFiberCommand {
    /// Fiber strand
    pub fiber: PortRef,
    /// Target port
    pub target: PortRef,
}

impl EditorCommand for ConnectFiberCommand {
    fn description(&self) -> String {
        format!("Splice {} to {}", self.fiber, self.target)
    }

    fn execute(
        &self,
        doc: &mut Pop,
        palette: &dyn FiberPalette,
    ) -> Result<CommandOutcome, CommandError> {
        Ok(CommandOutcome::Graph(doc.connect_fiber_to_port(&self.fiber, &self.target, palette)))
    }
}

/// Patch an OLT port onto a port
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectOltCommand {
    /// OLT port
    pub olt_port: PortRef,
    /// Target port
    pub target: PortRef,
}

impl EditorCommand for ConnectOltCommand {
    fn description(&self) -> String {
        format!("Patch {} to {}", self.olt_port, self.target)
    }

    fn execute(
        &self,
        doc: &mut Pop,
        palette: &dyn FiberPalette,
    ) -> Result<CommandOutcome, CommandError> {
        Ok(CommandOutcome::Graph(doc.connect_olt_to_port(&self.olt_port, &self.target, palette)))
    }
}

/// Canvas connect inside a DIO editor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectAcrossCommand {
    /// First endpoint
    pub a: PortRef,
    /// Second endpoint
    pub b: PortRef,
    /// DIO whose editor is open
    pub active_dio: String,
}

impl EditorCommand for ConnectAcrossCommand {
    fn description(&self) -> String {
        format!("Connect {} to {}", self.a, self.b)
    }

    fn execute(
        &self,
        doc: &mut Pop,
        palette: &dyn FiberPalette,
    ) -> Result<CommandOutcome, CommandError> {
        Ok(CommandOutcome::Graph(doc.connect_across_devices(
            &self.a,
            &self.b,
            &self.active_dio,
            palette,
        )))
    }
}

/// Unplug everything from a port
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisconnectPortCommand {
    /// Port to clear
    pub port: PortRef,
}

impl EditorCommand for DisconnectPortCommand {
    fn description(&self) -> String {
        format!("Disconnect {}", self.port)
    }

    fn execute(
        &self,
        doc: &mut Pop,
        _palette: &dyn FiberPalette,
    ) -> Result<CommandOutcome, CommandError> {
        Ok(CommandOutcome::Graph(doc.disconnect_port(&self.port)))
    }
}

/// Toggle a cable link on a DIO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkCableCommand {
    /// DIO
    pub dio_id: String,
    /// Cable
    pub cable_id: String,
}

impl EditorCommand for LinkCableCommand {
    fn description(&self) -> String {
        format!("Toggle cable {} on {}", self.cable_id, self.dio_id)
    }

    fn execute(
        &self,
        doc: &mut Pop,
        _palette: &dyn FiberPalette,
    ) -> Result<CommandOutcome, CommandError> {
        Ok(CommandOutcome::Link(doc.link_cable(&self.dio_id, &self.cable_id)?))
    }
}

/// Create an OLT with uniform slots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOltCommand {
    /// Display name
    pub name: String,
    /// Number of slots
    pub slots: u32,
    /// Ports per slot
    pub ports_per_slot: u32,
}

impl EditorCommand for CreateOltCommand {
    fn description(&self) -> String {
        format!("Create OLT {}", self.name)
    }

    fn execute(
        &self,
        doc: &mut Pop,
        _palette: &dyn FiberPalette,
    ) -> Result<CommandOutcome, CommandError> {
        Ok(CommandOutcome::Created(doc.create_olt(
            self.name.clone(),
            self.slots,
            self.ports_per_slot,
        )))
    }
}

/// Change the structure of an OLT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResizeOltCommand {
    /// OLT
    pub olt_id: String,
    /// New structure
    pub structure: OltStructure,
}

impl EditorCommand for ResizeOltCommand {
    fn description(&self) -> String {
        format!("Edit OLT {}", self.olt_id)
    }

    fn execute(
        &self,
        doc: &mut Pop,
        _palette: &dyn FiberPalette,
    ) -> Result<CommandOutcome, CommandError> {
        let delta = doc.resize_olt(&self.olt_id, self.structure.clone())?;
        Ok(CommandOutcome::Restructured(delta))
    }
}

/// Rename an OLT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameOltCommand {
    /// OLT
    pub olt_id: String,
    /// New display name
    pub name: String,
}

impl EditorCommand for RenameOltCommand {
    fn description(&self) -> String {
        format!("Rename OLT {} to {}", self.olt_id, self.name)
    }

    fn execute(
        &self,
        doc: &mut Pop,
        _palette: &dyn FiberPalette,
    ) -> Result<CommandOutcome, CommandError> {
        doc.rename_olt(&self.olt_id, self.name.clone())?;
        Ok(CommandOutcome::Renamed(self.olt_id.clone()))
    }
}

/// Delete an OLT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteOltCommand {
    /// OLT
    pub olt_id: String,
}

impl EditorCommand for DeleteOltCommand {
    fn description(&self) -> String {
        format!("Delete OLT {}", self.olt_id)
    }

    fn execute(
        &self,
        doc: &mut Pop,
        _palette: &dyn FiberPalette,
    ) -> Result<CommandOutcome, CommandError> {
        let (olt, delta) = doc.delete_olt(&self.olt_id)?;
        Ok(CommandOutcome::Removed { id: olt.id, delta })
    }
}

/// Create a DIO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDioCommand {
    /// Display name
    pub name: String,
    /// Number of ports
    pub port_count: u32,
}

impl EditorCommand for CreateDioCommand {
    fn description(&self) -> String {
        format!("Create DIO {}", self.name)
    }

    fn execute(
        &self,
        doc: &mut Pop,
        _palette: &dyn FiberPalette,
    ) -> Result<CommandOutcome, CommandError> {
        Ok(CommandOutcome::Created(doc.create_dio(self.name.clone(), self.port_count)))
    }
}

/// Change the port count of a DIO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResizeDioCommand {
    /// DIO
    pub dio_id: String,
    /// New port count
    pub port_count: u32,
}

impl EditorCommand for ResizeDioCommand {
    fn description(&self) -> String {
        format!("Resize DIO {} to {} ports", self.dio_id, self.port_count)
    }

    fn execute(
        &self,
        doc: &mut Pop,
        _palette: &dyn FiberPalette,
    ) -> Result<CommandOutcome, CommandError> {
        let delta = doc.resize_dio(&self.dio_id, self.port_count)?;
        Ok(CommandOutcome::Restructured(delta))
    }
}

/// Rename a DIO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameDioCommand {
    /// DIO
    pub dio_id: String,
    /// New display name
    pub name: String,
}

impl EditorCommand for RenameDioCommand {
    fn description(&self) -> String {
        format!("Rename DIO {} to {}", self.dio_id, self.name)
    }

    fn execute(
        &self,
        doc: &mut Pop,
        _palette: &dyn FiberPalette,
    ) -> Result<CommandOutcome, CommandError> {
        doc.rename_dio(&self.dio_id, self.name.clone())?;
        Ok(CommandOutcome::Renamed(self.dio_id.clone()))
    }
}

/// Delete a DIO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteDioCommand {
    /// DIO
    pub dio_id: String,
}

impl EditorCommand for DeleteDioCommand {
    fn description(&self) -> String {
        format!("Delete DIO {}", self.dio_id)
    }

    fn execute(
        &self,
        doc: &mut Pop,
        _palette: &dyn FiberPalette,
    ) -> Result<CommandOutcome, CommandError> {
        let (dio, delta) = doc.delete_dio(&self.dio_id)?;
        Ok(CommandOutcome::Removed { id: dio.id, delta })
    }
}

/// Route a cable into the room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCableCommand {
    /// Cable to add
    pub cable: Cable,
}

impl EditorCommand for AddCableCommand {
    fn description(&self) -> String {
        format!("Add cable {}", self.cable.name)
    }

    fn execute(
        &self,
        doc: &mut Pop,
        _palette: &dyn FiberPalette,
    ) -> Result<CommandOutcome, CommandError> {
        Ok(CommandOutcome::Created(doc.add_cable(self.cable.clone())?))
    }
}

/// Remove a cable from the room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveCableCommand {
    /// Cable
    pub cable_id: String,
}

impl EditorCommand for RemoveCableCommand {
    fn description(&self) -> String {
        format!("Remove cable {}", self.cable_id)
    }

    fn execute(
        &self,
        doc: &mut Pop,
        _palette: &dyn FiberPalette,
    ) -> Result<CommandOutcome, CommandError> {
        let (cable, delta) = doc.remove_cable(&self.cable_id)?;
        Ok(CommandOutcome::Removed { id: cable.id, delta })
    }
}
