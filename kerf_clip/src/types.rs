// Copyright 2025 the Kerf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public identifier and flag types.

/// Narrow an arena position to the 32 bits identifiers store.
///
/// Arenas are never expected to reach `u32::MAX` entries; past that the
/// value saturates, and debug builds stop at the first overflow.
pub(crate) fn narrow(idx: usize) -> u32 {
    let narrowed = u32::try_from(idx);
    debug_assert!(narrowed.is_ok(), "arena index {idx} overflows u32");
    narrowed.unwrap_or(u32::MAX)
}

/// Identifier for a half-edge in a [`Mesh`](crate::Mesh).
///
/// Half-edges are created in symmetric pairs: the forward edge has an even
/// index and its reversed twin the following odd index. Identifiers are never
/// reused within a session; an edge replaced by its split pieces stays in the
/// arena as a dead entry until [`Clipper::reset`](crate::Clipper::reset).
///
/// The derived order follows creation order and is used only as a
/// deterministic tie-break.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(pub(crate) u32);

impl EdgeId {
    pub(crate) fn new(idx: usize) -> Self {
        Self(narrow(idx))
    }

    /// Position of this edge in the mesh arena.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier for an immutable source segment shared by a half-edge pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentId(pub(crate) u32);

impl SegmentId {
    pub(crate) fn new(idx: usize) -> Self {
        Self(narrow(idx))
    }

    /// Position of this segment in the mesh arena.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier for a strip or loop.
///
/// Contours are rebuilt when a crossing rewires them, so an id may go stale
/// after any call that resolves intersections against it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContourId(pub(crate) u32);

impl ContourId {
    pub(crate) fn new(idx: usize) -> Self {
        Self(narrow(idx))
    }

    /// Position of this contour in the mesh arena.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Contour state.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ContourFlags: u8 {
        /// The chain is a loop: its end links back to its begin.
        const CLOSED    = 0b0000_0001;
        /// The contour was rebuilt after a crossing was resolved through it.
        const CROSSED   = 0b0000_0010;
        /// The contour was split off a self-intersecting cubic.
        const SELF_LOOP = 0b0000_0100;
    }
}
