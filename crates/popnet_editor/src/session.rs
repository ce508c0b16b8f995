// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editing session over one POP document.
//!
//! The session owns the document, the undo history and the transient UI
//! state (the DIO editor that is open and any edge being dragged).

use crate::commands::{CommandError, CommandOutcome, EditorCommand};
use crate::history::{History, StateSnapshot};
use crate::project::ProjectSettings;
use popnet_graph::{
    ConnectionId, FaultLocatorView, FiberPalette, GraphDelta, Pop, PortRef, ReachabilityIndex,
    StandardPalette,
};

/// Which end of an edge the user grabbed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEnd {
    /// The source end moves
    Source,
    /// The target end moves
    Target,
}

/// Edge detached by a drag that has not been dropped yet
#[derive(Debug, Clone)]
pub struct DragState {
    /// End that stays put
    pub anchor: PortRef,
    /// Document before the edge was detached
    before: StateSnapshot,
}

/// An editing session
pub struct EditorSession {
    document: Pop,
    history: History,
    palette: Box<dyn FiberPalette>,
    active_dio: Option<String>,
    drag: Option<DragState>,
    dirty: bool,
}

impl EditorSession {
    /// Open a session on a document with the standard palette
    pub fn new(document: Pop) -> Self {
        Self::with_palette(document, Box::new(StandardPalette))
    }

    /// Open a session with a custom palette
    pub fn with_palette(document: Pop, palette: Box<dyn FiberPalette>) -> Self {
        Self {
            document,
            history: History::new(),
            palette,
            active_dio: None,
            drag: None,
            dirty: false,
        }
    }

    /// Open a session using a project's palette and history depth
    pub fn from_settings(document: Pop, settings: &ProjectSettings) -> Self {
        Self::with_palette(document, Box::new(StandardPalette))
            .with_history_depth(settings.history_depth)
    }

    /// Replace the history with one of the given depth
    pub fn with_history_depth(mut self, depth: usize) -> Self {
        self.history = History::with_max_depth(depth);
        self
    }

    /// The document
    pub fn document(&self) -> &Pop {
        &self.document
    }

    /// Take the document out of the session
    pub fn into_document(self) -> Pop {
        self.document
    }

    /// The undo history
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Whether the document changed since it was opened or last saved
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the document as saved
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// DIO whose editor is open
    pub fn active_dio(&self) -> Option<&str> {
        self.active_dio.as_deref()
    }

    /// Open the editor of a DIO, or close it with `None`
    pub fn set_active_dio(&mut self, dio_id: Option<String>) {
        if let Some(id) = &dio_id {
            if self.document.dio(id).is_none() {
                tracing::debug!("Ignoring unknown DIO {id}");
                return;
            }
        }
        self.active_dio = dio_id;
    }

    /// Run a command and record it in the history.
    ///
    /// A pending drag is settled first, leaving its edge deleted.
    pub fn execute(
        &mut self,
        command: &dyn EditorCommand,
    ) -> Result<CommandOutcome, CommandError> {
        self.settle_drag()?;
        let before = StateSnapshot::from_value(&self.document)?;
        let outcome = command.execute(&mut self.document, self.palette.as_ref())?;
        self.record(command.description(), before)?;
        if let Some(id) = self.active_dio.clone() {
            if self.document.dio(&id).is_none() {
                self.active_dio = None;
            }
        }
        Ok(outcome)
    }

    /// Undo the last edit
    pub fn undo(&mut self) -> Result<(), CommandError> {
        self.drag = None;
        let entry = self.history.undo()?;
        self.document = entry.before.to_value()?;
        self.dirty = true;
        tracing::debug!("Undo: {}", entry.description);
        Ok(())
    }

    /// Redo the last undone edit
    pub fn redo(&mut self) -> Result<(), CommandError> {
        self.drag = None;
        let entry = self.history.redo()?;
        self.document = entry.after.to_value()?;
        self.dirty = true;
        tracing::debug!("Redo: {}", entry.description);
        Ok(())
    }

    /// Pick up one end of an edge. The edge is detached until the drop.
    pub fn begin_drag(&mut self, id: &ConnectionId, grabbed: DragEnd) -> Result<(), CommandError> {
        if self.active_dio.is_none() {
            return Err(CommandError::NoActiveDio);
        }
        self.settle_drag()?;
        let before = StateSnapshot::from_value(&self.document)?;
        let Some(connection) = self.document.remove_connection(id) else {
            tracing::debug!("No connection {id} to drag");
            return Ok(());
        };
        let anchor = match grabbed {
            DragEnd::Source => connection.target,
            DragEnd::Target => connection.source,
        };
        self.drag = Some(DragState { anchor, before });
        Ok(())
    }

    /// The edge being dragged, if any
    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    /// Drop the dragged end on a port, or on empty canvas with `None`.
    ///
    /// Dropping on nothing leaves the edge deleted. The whole drag is one
    /// undo step.
    pub fn drop_on(&mut self, port: Option<&PortRef>) -> Result<GraphDelta, CommandError> {
        let active = self.active_dio.clone().ok_or(CommandError::NoActiveDio)?;
        let drag = self.drag.take().ok_or(CommandError::NoDrag)?;
        let delta = match port {
            Some(port) => self.document.connect_across_devices(
                &drag.anchor,
                port,
                &active,
                self.palette.as_ref(),
            ),
            None => GraphDelta::default(),
        };
        let description = match port {
            Some(port) => format!("Reconnect {} to {}", drag.anchor, port),
            None => format!("Disconnect {}", drag.anchor),
        };
        self.record(description, drag.before)?;
        Ok(delta)
    }

    /// Signal reachability of the current document
    pub fn reachability(&self) -> ReachabilityIndex {
        self.document.reachability()
    }

    /// Connections lit by the fault locator
    pub fn lit_connections(&self, view: &FaultLocatorView) -> Vec<ConnectionId> {
        self.document
            .lit_connections(view)
            .into_iter()
            .map(|c| c.id.clone())
            .collect()
    }

    /// Commit a pending drag as a deletion of its edge
    fn settle_drag(&mut self) -> Result<(), CommandError> {
        if let Some(drag) = self.drag.take() {
            self.record(format!("Disconnect {}", drag.anchor), drag.before)?;
        }
        Ok(())
    }

    fn record(&mut self, description: String, before: StateSnapshot) -> Result<(), CommandError> {
        let after = StateSnapshot::from_value(&self.document)?;
        if self.history.commit(description, before, after).is_some() {
            self.dirty = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{ConnectFiberCommand, ConnectOltCommand, DeleteDioCommand};
    use popnet_graph::{Cable, Dio, Olt, OltStructure};

    fn session() -> EditorSession {
        let mut pop = Pop::new("Test");
        pop.add_olt(Olt::with_id("olt1", "OLT1", OltStructure::uniform(1, 8)))
            .unwrap();
        pop.add_dio(Dio::with_id("dioA", "A", 12)).unwrap();
        pop.add_dio(Dio::with_id("dioB", "B", 12)).unwrap();
        pop.add_cable(Cable::with_id("cbl1", "Feeder", 12, 1)).unwrap();
        let mut session = EditorSession::new(pop);
        session.set_active_dio(Some("dioA".into()));
        session
    }

    fn splice(session: &mut EditorSession, fiber: u32, port: u32) {
        session
            .execute(&ConnectFiberCommand {
                fiber: PortRef::fiber("cbl1", fiber),
                target: PortRef::dio("dioA", port),
            })
            .unwrap();
    }

    #[test]
    fn test_execute_undo_redo() {
        let mut session = session();
        splice(&mut session, 0, 0);
        assert_eq!(session.document().graph().len(), 1);
        assert!(session.is_dirty());

        session.undo().unwrap();
        assert!(session.document().graph().is_empty());
        session.redo().unwrap();
        assert_eq!(session.document().graph().len(), 1);
    }

    #[test]
    fn test_rejected_edit_is_not_recorded() {
        let mut session = session();
        session
            .execute(&ConnectOltCommand {
                olt_port: PortRef::olt("olt1", 9, 9),
                target: PortRef::dio("dioA", 0),
            })
            .unwrap();
        assert!(!session.history().can_undo());
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_drop_on_nothing_deletes_edge() {
        let mut session = session();
        splice(&mut session, 0, 0);
        let id = session.document().graph().connections().next().unwrap().id.clone();

        session.begin_drag(&id, DragEnd::Target).unwrap();
        assert!(session.document().graph().is_empty());
        session.drop_on(None).unwrap();

        assert!(session.document().graph().is_empty());
        assert_eq!(session.history().stats().undo_count, 2);
        session.undo().unwrap();
        assert_eq!(session.document().graph().len(), 1);
    }

    #[test]
    fn test_drop_on_port_reconnects() {
        let mut session = session();
        splice(&mut session, 0, 0);
        let id = session.document().graph().connections().next().unwrap().id.clone();

        session.begin_drag(&id, DragEnd::Target).unwrap();
        let delta = session.drop_on(Some(&PortRef::dio("dioA", 5))).unwrap();

        assert!(delta.added.is_some());
        let graph = session.document().graph();
        assert!(graph.splice_at(&PortRef::dio("dioA", 5)).is_some());
        assert!(graph.splice_at(&PortRef::dio("dioA", 0)).is_none());
    }

    #[test]
    fn test_drop_without_drag() {
        let mut session = session();
        assert!(matches!(session.drop_on(None), Err(CommandError::NoDrag)));
    }

    #[test]
    fn test_deleting_active_dio_closes_editor() {
        let mut session = session();
        session
            .execute(&DeleteDioCommand {
                dio_id: "dioA".into(),
            })
            .unwrap();
        assert_eq!(session.active_dio(), None);
    }

    #[test]
    fn test_execute_during_drag_keeps_history_linear() {
        let mut session = session();
        splice(&mut session, 0, 0);
        let id = session.document().graph().connections().next().unwrap().id.clone();

        session.begin_drag(&id, DragEnd::Target).unwrap();
        splice(&mut session, 5, 3);
        assert!(session.drag().is_none());
        assert!(matches!(session.drop_on(None), Err(CommandError::NoDrag)));
        assert_eq!(session.history().stats().undo_count, 3);

        session.undo().unwrap();
        assert!(session.document().graph().is_empty());
        session.undo().unwrap();
        let graph = session.document().graph();
        assert_eq!(
            graph.splice_at(&PortRef::dio("dioA", 0)).map(|c| &c.source),
            Some(&PortRef::fiber("cbl1", 0))
        );
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_second_drag_settles_the_first() {
        let mut session = session();
        splice(&mut session, 0, 0);
        splice(&mut session, 1, 1);
        let ids: Vec<_> = session
            .document()
            .graph()
            .connections()
            .map(|c| c.id.clone())
            .collect();

        session.begin_drag(&ids[0], DragEnd::Target).unwrap();
        session.begin_drag(&ids[1], DragEnd::Source).unwrap();
        assert_eq!(session.drag().map(|d| &d.anchor), Some(&PortRef::dio("dioA", 1)));
        assert_eq!(session.history().undo_description(), Some("Disconnect cbl1-fiber-0"));
    }

    #[test]
    fn test_history_depth_from_settings() {
        let mut settings = ProjectSettings::new("Central");
        settings.history_depth = 3;
        let mut session = EditorSession::from_settings(Pop::new("Central"), &settings);
        assert_eq!(session.history().stats().max_depth, 3);

        for i in 0..5 {
            session
                .execute(&crate::commands::CreateDioCommand {
                    name: format!("DIO {i}"),
                    port_count: 12,
                })
                .unwrap();
        }
        assert_eq!(session.history().stats().undo_count, 3);
    }
}
