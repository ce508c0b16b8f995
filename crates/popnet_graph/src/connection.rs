// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions for the graph.

use crate::port::{PortRef, PortSlot};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// What an edge physically is, derived from its endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionKind {
    /// Fusion splice (one side is a fiber strand)
    Fusion,
    /// Patch cord (one side is an OLT port)
    Patch,
    /// Any other cross-connect
    Link,
}

impl ConnectionKind {
    /// Classify an edge by its endpoints
    pub fn between(a: &PortRef, b: &PortRef) -> Self {
        if a.is_fiber() || b.is_fiber() {
            Self::Fusion
        } else if a.is_olt() || b.is_olt() {
            Self::Patch
        } else {
            Self::Link
        }
    }

    /// Id prefix used for new connections of this kind
    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::Fusion => "fusion",
            Self::Patch => "patch",
            Self::Link => "link",
        }
    }
}

/// Unique identifier for a connection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    /// Create a fresh id prefixed with the connection kind
    pub fn new(kind: ConnectionKind) -> Self {
        Self(format!("{}-{}", kind.id_prefix(), Uuid::new_v4().simple()))
    }

    /// Raw id string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// An undirected connection between two ports.
///
/// `source`/`target` only record the order the edge was drawn in; every
/// lookup treats both ends alike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Endpoint the edge was drawn from
    #[serde(rename = "sourceId")]
    pub source: PortRef,
    /// Endpoint the edge was drawn to
    #[serde(rename = "targetId")]
    pub target: PortRef,
    /// Display color
    #[serde(default)]
    pub color: Option<String>,
    /// Intermediate drawing points
    #[serde(default)]
    pub points: Vec<[f32; 2]>,
}

impl Connection {
    /// Create a new connection with a fresh id
    pub fn new(source: PortRef, target: PortRef) -> Self {
        let kind = ConnectionKind::between(&source, &target);
        Self {
            id: ConnectionId::new(kind),
            source,
            target,
            color: None,
            points: Vec::new(),
        }
    }

    /// Set the display color
    pub fn with_color(mut self, color: Option<String>) -> Self {
        self.color = color;
        self
    }

    /// Kind derived from the endpoints
    pub fn kind(&self) -> ConnectionKind {
        ConnectionKind::between(&self.source, &self.target)
    }

    /// Check if this connection touches a port
    pub fn involves(&self, port: &PortRef) -> bool {
        self.source == *port || self.target == *port
    }

    /// Check if either endpoint belongs to a device
    pub fn involves_device(&self, device_id: &str) -> bool {
        self.source.belongs_to(device_id) || self.target.belongs_to(device_id)
    }

    /// The endpoint opposite to `port`
    pub fn partner_of(&self, port: &PortRef) -> Option<&PortRef> {
        if self.source == *port {
            Some(&self.target)
        } else if self.target == *port {
            Some(&self.source)
        } else {
            None
        }
    }

    /// Slot this edge occupies on `port`, if `port` is an endpoint
    pub fn slot_at(&self, port: &PortRef) -> Option<PortSlot> {
        self.partner_of(port).map(PortSlot::for_partner)
    }

    /// Both endpoints
    pub fn endpoints(&self) -> [&PortRef; 2] {
        [&self.source, &self.target]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_prefix_follows_kind() {
        let splice = Connection::new(PortRef::fiber("c", 0), PortRef::dio("d", 0));
        let patch = Connection::new(PortRef::olt("o", 1, 1), PortRef::dio("d", 0));
        let link = Connection::new(PortRef::dio("d", 0), PortRef::dio("e", 0));
        assert!(splice.id.as_str().starts_with("fusion-"));
        assert!(patch.id.as_str().starts_with("patch-"));
        assert!(link.id.as_str().starts_with("link-"));
        assert_ne!(splice.id, Connection::new(PortRef::fiber("c", 0), PortRef::dio("d", 0)).id);
    }

    #[test]
    fn test_partner_is_undirected() {
        let fiber = PortRef::fiber("c", 3);
        let port = PortRef::dio("d", 5);
        let conn = Connection::new(port.clone(), fiber.clone());
        assert_eq!(conn.partner_of(&fiber), Some(&port));
        assert_eq!(conn.partner_of(&port), Some(&fiber));
        assert_eq!(conn.partner_of(&PortRef::dio("d", 6)), None);
        assert_eq!(conn.slot_at(&port), Some(PortSlot::Splice));
    }

    #[test]
    fn test_wire_field_names() {
        let conn = Connection::new(PortRef::olt("o", 1, 2), PortRef::dio("d", 0))
            .with_color(Some("#0000FF".into()));
        let json = serde_json::to_value(&conn).unwrap();
        assert_eq!(json["sourceId"], "o-s1-p2");
        assert_eq!(json["targetId"], "d-p-0");
        assert_eq!(json["color"], "#0000FF");

        let raw = r#"{"id":"fusion-1700000000","sourceId":"c-fiber-0","targetId":"d-p-1"}"#;
        let back: Connection = serde_json::from_str(raw).unwrap();
        assert_eq!(back.kind(), ConnectionKind::Fusion);
        assert!(back.points.is_empty());
    }
}
