// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port addressing for equipment-room ports.
//!
//! Every port in a POP is addressed by a string with one of these shapes:
//!
//! | Kind         | Shape                         | Index base |
//! |--------------|-------------------------------|------------|
//! | Fiber strand | `{cable_id}-fiber-{index}`    | 0-based    |
//! | DIO port     | `{dio_id}-p-{index}`          | 0-based    |
//! | OLT port     | `{olt_id}-s{slot}-p{port}`    | 1-based    |
//!
//! Anything else (splitter inputs, legacy ids) is kept verbatim as
//! [`PortRef::Other`]. A [`PortRef`] is parsed once and carried as a tagged
//! value; its string form is only used at the serialization boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of DIO ports grouped into one tray.
pub const PORTS_PER_TRAY: u32 = 12;

/// Structural kind of a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortKind {
    /// Strand of a cable
    Fiber,
    /// Port on a distribution panel
    DioPort,
    /// Port on active equipment
    OltPort,
    /// Unrecognized shape
    Unknown,
}

/// Which independent slot of a DIO port an edge occupies.
///
/// Splices and patch cords never displace each other, and neither
/// displaces a cross-device link to another panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortSlot {
    /// Rear side: fusion splice to a fiber strand
    Splice,
    /// Front side: patch cord to an OLT port
    Patch,
    /// Jumper to another DIO or an opaque port
    Link,
}

impl PortSlot {
    /// Slot an edge occupies on a DIO port, given the edge's other endpoint
    pub fn for_partner(partner: &PortRef) -> Self {
        match partner {
            PortRef::Fiber { .. } => Self::Splice,
            PortRef::Olt { .. } => Self::Patch,
            PortRef::Dio { .. } | PortRef::Other(_) => Self::Link,
        }
    }
}

/// A parsed port identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PortRef {
    /// Fiber strand `index` of cable `cable_id`
    Fiber {
        /// Owning cable
        cable_id: String,
        /// 0-based strand index
        index: u32,
    },
    /// Port `index` of DIO `dio_id`
    Dio {
        /// Owning DIO
        dio_id: String,
        /// 0-based port index
        index: u32,
    },
    /// Port `port` of slot `slot` on OLT `olt_id`
    Olt {
        /// Owning OLT
        olt_id: String,
        /// 1-based slot number
        slot: u32,
        /// 1-based port number
        port: u32,
    },
    /// Opaque identifier
    Other(String),
}

impl PortRef {
    /// Fiber strand port
    pub fn fiber(cable_id: impl Into<String>, index: u32) -> Self {
        Self::Fiber {
            cable_id: cable_id.into(),
            index,
        }
    }

    /// DIO port
    pub fn dio(dio_id: impl Into<String>, index: u32) -> Self {
        Self::Dio {
            dio_id: dio_id.into(),
            index,
        }
    }

    /// OLT port
    pub fn olt(olt_id: impl Into<String>, slot: u32, port: u32) -> Self {
        Self::Olt {
            olt_id: olt_id.into(),
            slot,
            port,
        }
    }

    /// Parse a port identifier.
    ///
    /// Shapes are tried in order fiber, OLT, DIO. A candidate is only
    /// accepted when it prints back to exactly `raw`, so ids with leading
    /// zeros or empty owners stay [`PortRef::Other`] and keep their identity.
    pub fn parse(raw: &str) -> Self {
        let candidate = raw
            .rsplit_once("-fiber-")
            .and_then(|(cable, index)| Some(Self::fiber(cable, index.parse().ok()?)))
            .or_else(|| {
                parse_olt_label(raw).map(|(olt_id, slot, port)| Self::olt(olt_id, slot, port))
            })
            .or_else(|| {
                raw.rsplit_once("-p-")
                    .and_then(|(dio, index)| Some(Self::dio(dio, index.parse().ok()?)))
            });

        let canonical = |port: &Self| {
            port.owner().is_some_and(|o| !o.is_empty()) && port.to_string() == raw
        };
        match candidate {
            Some(port) if canonical(&port) => port,
            _ => Self::Other(raw.to_string()),
        }
    }

    /// Structural kind
    pub fn kind(&self) -> PortKind {
        match self {
            Self::Fiber { .. } => PortKind::Fiber,
            Self::Dio { .. } => PortKind::DioPort,
            Self::Olt { .. } => PortKind::OltPort,
            Self::Other(_) => PortKind::Unknown,
        }
    }

    /// Check if this is a fiber strand
    pub fn is_fiber(&self) -> bool {
        matches!(self, Self::Fiber { .. })
    }

    /// Check if this is a DIO port
    pub fn is_dio(&self) -> bool {
        matches!(self, Self::Dio { .. })
    }

    /// Check if this is an OLT port
    pub fn is_olt(&self) -> bool {
        matches!(self, Self::Olt { .. })
    }

    /// Id of the cable or device owning this port, if the shape is known
    pub fn owner(&self) -> Option<&str> {
        match self {
            Self::Fiber { cable_id, .. } => Some(cable_id),
            Self::Dio { dio_id, .. } => Some(dio_id),
            Self::Olt { olt_id, .. } => Some(olt_id),
            Self::Other(_) => None,
        }
    }

    /// Check if this port belongs to `device_id`.
    ///
    /// Opaque ids fall back to a prefix test.
    pub fn belongs_to(&self, device_id: &str) -> bool {
        match self {
            Self::Other(raw) => !device_id.is_empty() && raw.starts_with(device_id),
            _ => self.owner() == Some(device_id),
        }
    }

    /// Whether the port accepts a single edge in total.
    ///
    /// DIO ports are the only ports with two independent slots.
    pub fn is_exclusive(&self) -> bool {
        !self.is_dio()
    }

    /// Tray (group of 12 ports) of a DIO port
    pub fn tray_index(&self) -> Option<u32> {
        match self {
            Self::Dio { index, .. } => Some(index / PORTS_PER_TRAY),
            _ => None,
        }
    }
}

/// Parse the `-s{slot}-p{port}` suffix of an OLT port id.
///
/// Returns `(olt_id, slot, port)`, or `None` when the suffix is absent so
/// the caller can fall back to a generic label.
pub fn parse_olt_label(raw: &str) -> Option<(&str, u32, u32)> {
    let (head, port) = raw.rsplit_once("-p")?;
    let (olt_id, slot) = head.rsplit_once("-s")?;
    Some((olt_id, parse_digits(slot)?, parse_digits(port)?))
}

/// Classify a raw port id
pub fn classify(raw: &str) -> PortKind {
    PortRef::parse(raw).kind()
}

fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fiber { cable_id, index } => write!(f, "{cable_id}-fiber-{index}"),
            Self::Dio { dio_id, index } => write!(f, "{dio_id}-p-{index}"),
            Self::Olt { olt_id, slot, port } => write!(f, "{olt_id}-s{slot}-p{port}"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

impl From<String> for PortRef {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<&str> for PortRef {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<PortRef> for String {
    fn from(port: PortRef) -> Self {
        port.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shapes() {
        assert_eq!(PortRef::parse("cbl1-fiber-0"), PortRef::fiber("cbl1", 0));
        assert_eq!(PortRef::parse("dioA-p-23"), PortRef::dio("dioA", 23));
        assert_eq!(PortRef::parse("olt1-s2-p16"), PortRef::olt("olt1", 2, 16));
        assert_eq!(
            PortRef::parse("splitter-in"),
            PortRef::Other("splitter-in".to_string())
        );
    }

    #[test]
    fn test_ids_with_dashes() {
        let port = PortRef::parse("dio-3f2a-p-4");
        assert_eq!(port, PortRef::dio("dio-3f2a", 4));
        assert_eq!(port.owner(), Some("dio-3f2a"));

        // An OLT-looking id can still own DIO ports
        assert_eq!(PortRef::parse("x-s1-p2-p-3"), PortRef::dio("x-s1-p2", 3));
    }

    #[test]
    fn test_non_canonical_ids_stay_opaque() {
        assert_eq!(PortRef::parse("dio-p-01").kind(), PortKind::Unknown);
        assert_eq!(PortRef::parse("-p-1").kind(), PortKind::Unknown);
        assert_eq!(PortRef::parse("cbl-fiber-x").kind(), PortKind::Unknown);
        assert_eq!(PortRef::parse("dio-p-01").to_string(), "dio-p-01");
    }

    #[test]
    fn test_olt_label() {
        assert_eq!(parse_olt_label("olt1-s1-p1"), Some(("olt1", 1, 1)));
        assert_eq!(parse_olt_label("olt1-s03-p12"), Some(("olt1", 3, 12)));
        assert_eq!(parse_olt_label("olt1-uplink"), None);
        assert_eq!(parse_olt_label("dioA-p-0"), None);
    }

    #[test]
    fn test_ownership() {
        assert!(PortRef::dio("dio1", 0).belongs_to("dio1"));
        assert!(!PortRef::dio("dio10", 0).belongs_to("dio1"));
        assert!(PortRef::Other("olt1-uplink".into()).belongs_to("olt1"));
        assert!(!PortRef::Other("olt1-uplink".into()).belongs_to(""));
    }

    #[test]
    fn test_slots_and_trays() {
        assert_eq!(PortSlot::for_partner(&PortRef::olt("o", 1, 1)), PortSlot::Patch);
        assert_eq!(PortSlot::for_partner(&PortRef::fiber("c", 1)), PortSlot::Splice);
        assert_eq!(PortSlot::for_partner(&PortRef::dio("d", 1)), PortSlot::Link);
        assert_eq!(PortSlot::for_partner(&PortRef::Other("spl-1".into())), PortSlot::Link);
        assert_eq!(PortRef::dio("d", 11).tray_index(), Some(0));
        assert_eq!(PortRef::dio("d", 12).tray_index(), Some(1));
        assert_eq!(PortRef::fiber("c", 12).tray_index(), None);
        assert!(!PortRef::dio("d", 0).is_exclusive());
        assert!(PortRef::olt("o", 1, 1).is_exclusive());
    }

    #[test]
    fn test_serde_uses_string_form() {
        let json = serde_json::to_string(&PortRef::olt("olt1", 1, 8)).unwrap();
        assert_eq!(json, "\"olt1-s1-p8\"");
        let back: PortRef = serde_json::from_str("\"cbl-fiber-7\"").unwrap();
        assert_eq!(back, PortRef::fiber("cbl", 7));
    }
}
