//! Finger segments and joint roles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum number of joint points per segment (base, two joints, tip).
pub const JOINTS_PER_SEGMENT: usize = 4;

/// One annotated finger.
///
/// The declaration order is the stable display and serialization order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Segment {
    pub const COUNT: usize = 5;

    pub const ALL: [Segment; Segment::COUNT] = [
        Segment::Thumb,
        Segment::Index,
        Segment::Middle,
        Segment::Ring,
        Segment::Pinky,
    ];

    /// Exact lookup of the persisted identifier; no case folding.
    pub fn from_wire(s: &str) -> Option<Self> {
        Segment::ALL.into_iter().find(|seg| seg.as_str() == s)
    }

    /// Position in [`Segment::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Lowercase identifier used in persisted documents (`"thumb"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Segment::Thumb => "thumb",
            Segment::Index => "index",
            Segment::Middle => "middle",
            Segment::Ring => "ring",
            Segment::Pinky => "pinky",
        }
    }

    /// Human-readable label (`"Thumb"`, ...).
    pub fn label(self) -> &'static str {
        match self {
            Segment::Thumb => "Thumb",
            Segment::Index => "Index",
            Segment::Middle => "Middle",
            Segment::Ring => "Ring",
            Segment::Pinky => "Pinky",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown segment {0:?} (expected one of thumb, index, middle, ring, pinky)")]
pub struct ParseSegmentError(pub String);

impl FromStr for Segment {
    type Err = ParseSegmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Segment::ALL
            .into_iter()
            .find(|seg| seg.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseSegmentError(s.to_owned()))
    }
}

/// Anatomical role of a joint point, implied by its index in the segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointRole {
    Start,
    Joint1,
    Joint2,
    End,
}

impl JointRole {
    pub const ALL: [JointRole; JOINTS_PER_SEGMENT] = [
        JointRole::Start,
        JointRole::Joint1,
        JointRole::Joint2,
        JointRole::End,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            JointRole::Start => "Start",
            JointRole::Joint1 => "Joint 1",
            JointRole::Joint2 => "Joint 2",
            JointRole::End => "End",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_identifiers_case_insensitively() {
        assert_eq!("ring".parse::<Segment>(), Ok(Segment::Ring));
        assert_eq!("Pinky".parse::<Segment>(), Ok(Segment::Pinky));
        assert!("wrist".parse::<Segment>().is_err());
    }

    #[test]
    fn wire_lookup_is_exact() {
        for seg in Segment::ALL {
            assert_eq!(Segment::from_wire(seg.as_str()), Some(seg));
        }
        assert_eq!(Segment::from_wire("Thumb"), None);
        assert_eq!(Segment::from_wire("RING"), None);
        assert_eq!(Segment::from_wire(" index"), None);
    }

    #[test]
    fn display_matches_serde_name() {
        for seg in Segment::ALL {
            let json = serde_json::to_string(&seg).expect("serialize");
            assert_eq!(json, format!("\"{seg}\""));
        }
    }

    #[test]
    fn joint_roles_follow_index_order() {
        assert_eq!(JointRole::from_index(0), Some(JointRole::Start));
        assert_eq!(JointRole::from_index(3), Some(JointRole::End));
        assert_eq!(JointRole::from_index(4), None);
        assert_eq!(JointRole::Joint2.label(), "Joint 2");
    }
}
