//! Fixed per-segment colours used when drawing points and skeleton lines.

use handmeasure_core::Segment;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// `#RRGGBB`.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Saturated colour for points and lines drawn over the image.
pub fn overlay(segment: Segment) -> Rgb {
    match segment {
        Segment::Thumb => Rgb(0, 0, 255),
        Segment::Index => Rgb(0, 255, 0),
        Segment::Middle => Rgb(255, 0, 0),
        Segment::Ring => Rgb(0, 255, 255),
        Segment::Pinky => Rgb(255, 0, 255),
    }
}

/// Lighter tint for panel headers and legends.
pub fn header(segment: Segment) -> Rgb {
    match segment {
        Segment::Thumb => Rgb(0x66, 0x66, 0xFF),
        Segment::Index => Rgb(0x66, 0xFF, 0x66),
        Segment::Middle => Rgb(0xFF, 0x66, 0x66),
        Segment::Ring => Rgb(0xFF, 0xFF, 0x66),
        Segment::Pinky => Rgb(0xFF, 0x66, 0xFF),
    }
}
