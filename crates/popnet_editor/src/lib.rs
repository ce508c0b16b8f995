// SPDX-License-Identifier: MIT OR Apache-2.0
//! POP patch-panel editor.
//!
//! Wraps a [`popnet_graph::Pop`] document in an editing session:
//! - Commands for every UI operation
//! - Full undo/redo support
//! - Drag-to-reconnect of existing edges
//! - RON project settings and JSON documents

pub mod cli;
pub mod commands;
pub mod history;
pub mod project;
pub mod session;

pub use commands::{CommandError, CommandOutcome, EditorCommand};
pub use history::{History, HistoryError, StateSnapshot};
pub use project::{load_document, save_document, ProjectError, ProjectSettings};
pub use session::{DragEnd, EditorSession};
