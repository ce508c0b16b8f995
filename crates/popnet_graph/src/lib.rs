// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection graph for PON equipment rooms.
//!
//! This crate models a POP (point of presence): cables, distribution panels
//! (DIOs), active equipment (OLTs) and the connections between their ports:
//! - Fusion splices between fiber strands and DIO ports
//! - Patch cords between OLT ports and DIO ports
//!
//! ## Architecture
//!
//! The [`ConnectionGraph`] is the single source of truth. Everything else is
//! derived from it on read:
//! - Typed port addressing ([`PortRef`])
//! - Move/overwrite connect semantics instead of multi-connect
//! - Signal reachability ([`ReachabilityIndex`])
//! - Cable-to-DIO exclusivity
//! - Structural edits that prune the graph ([`Pop`])
//! - Fault-locator highlighting

pub mod port;
pub mod connection;
pub mod graph;
pub mod palette;
pub mod equipment;
pub mod cable;
pub mod reachability;
pub mod highlight;
pub mod pop;

pub use port::{PortRef, PortKind, PortSlot};
pub use connection::{Connection, ConnectionId, ConnectionKind};
pub use graph::{ConnectionGraph, GraphDelta};
pub use palette::{ColorStandard, FiberPalette, StandardPalette};
pub use equipment::{Dio, Olt, OltStructure, SlotConfig, EquipmentKind};
pub use cable::{Cable, LinkOutcome};
pub use reachability::ReachabilityIndex;
pub use highlight::{forward_otdr, FaultLocatorView, OtdrLog, OtdrReading, OtdrRecorder};
pub use pop::{LayoutPosition, Pop, PopError, RepairReport, Violation};
