//! Pointer events produced by the capture source.
//!
//! A [`PointerEvent`] is the unit that flows through the whole pipeline:
//! captured on the host, broadcast by the hub, decoded by the receiver,
//! mapped into target space, and finally rendered or tapped.
//!
//! Coordinates are always expressed in the pixel space of whoever emitted
//! the event.  The mapper produces a *new* event in target space rather than
//! mutating the original.

use std::fmt;

/// A 2-D integer pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// What kind of pointer activity an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    /// The pointer moved to an absolute position.
    Move,
    /// The primary button was clicked at a position.
    Click,
}

impl PointerKind {
    /// Wire name of the kind (`"move"` / `"click"`).
    pub fn as_str(self) -> &'static str {
        match self {
            PointerKind::Move => "move",
            PointerKind::Click => "click",
        }
    }
}

/// An immutable pointer event in the emitter's pixel space.
///
/// Fields are private so an event cannot be altered after construction;
/// use [`PointerEvent::with_position`] to derive a relocated copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerEvent {
    kind: PointerKind,
    position: Point,
}

impl PointerEvent {
    pub const fn new(kind: PointerKind, x: i32, y: i32) -> Self {
        Self {
            kind,
            position: Point::new(x, y),
        }
    }

    pub const fn moved(x: i32, y: i32) -> Self {
        Self::new(PointerKind::Move, x, y)
    }

    pub const fn click(x: i32, y: i32) -> Self {
        Self::new(PointerKind::Click, x, y)
    }

    pub fn kind(&self) -> PointerKind {
        self.kind
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn x(&self) -> i32 {
        self.position.x
    }

    pub fn y(&self) -> i32 {
        self.position.y
    }

    pub fn is_click(&self) -> bool {
        self.kind == PointerKind::Click
    }

    /// Returns a copy of this event of the same kind at `position`.
    pub fn with_position(&self, position: Point) -> Self {
        Self {
            kind: self.kind,
            position,
        }
    }
}

impl fmt::Display for PointerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.kind.as_str(), self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moved_constructor_sets_kind_and_position() {
        let ev = PointerEvent::moved(10, 20);
        assert_eq!(ev.kind(), PointerKind::Move);
        assert_eq!(ev.position(), Point::new(10, 20));
        assert!(!ev.is_click());
    }

    #[test]
    fn test_with_position_keeps_kind() {
        // Arrange
        let ev = PointerEvent::click(1, 2);

        // Act
        let moved = ev.with_position(Point::new(30, 40));

        // Assert
        assert_eq!(moved.kind(), PointerKind::Click);
        assert_eq!((moved.x(), moved.y()), (30, 40));
        assert_eq!(ev.position(), Point::new(1, 2), "original is unchanged");
    }

    #[test]
    fn test_display_uses_wire_kind_name() {
        assert_eq!(PointerEvent::click(5, 6).to_string(), "click at (5, 6)");
    }
}
