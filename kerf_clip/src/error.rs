// Copyright 2025 the Kerf Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use thiserror::Error;

use crate::types::{ContourId, EdgeId};

/// Broad classification of a [`ClipError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller passed a malformed path. The rejected sub-path left no trace.
    Input,
    /// The kernel's own state is inconsistent. This is a bug.
    Invariant,
}

/// Failure returned by [`Clipper::add_path`](crate::Clipper::add_path).
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ClipError {
    /// A path element other than `MoveTo` started a path.
    #[error("path element {index} draws before any MoveTo")]
    MissingMoveTo {
        /// Position of the element in the input.
        index: usize,
    },
    /// A coordinate is NaN or infinite.
    #[error("path element {index} has a non-finite coordinate")]
    NonFiniteCoordinate {
        /// Position of the element in the input.
        index: usize,
    },
    /// A drawing command follows `ClosePath` without a new `MoveTo`.
    #[error("path element {index} draws after ClosePath without a MoveTo")]
    DrawAfterClose {
        /// Position of the element in the input.
        index: usize,
    },
    /// Internal corruption.
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

impl ClipError {
    /// Whether the caller or the kernel is at fault.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingMoveTo { .. }
            | Self::NonFiniteCoordinate { .. }
            | Self::DrawAfterClose { .. } => ErrorKind::Input,
            Self::Invariant(_) => ErrorKind::Invariant,
        }
    }
}

/// A structural defect in the mesh or its index.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum InvariantViolation {
    /// `sym(sym(e)) != e`, or the twin's origin is not this edge's destination.
    #[error("edge {0:?} and its twin disagree")]
    AsymmetricEdge(EdgeId),
    /// `prev`/`next` links do not mirror each other or do not meet at a point.
    #[error("edge {edge:?} has a broken {link} link")]
    BrokenLink {
        /// The edge whose link is wrong.
        edge: EdgeId,
        /// `"prev"` or `"next"`.
        link: &'static str,
    },
    /// A live edge links to a dead one.
    #[error("edge {0:?} links to a replaced edge")]
    DeadLink(EdgeId),
    /// A live forward edge has no entry in the index.
    #[error("edge {0:?} is missing from the index")]
    MissingIndexEntry(EdgeId),
    /// The index holds a dead, reversed, duplicated or misplaced entry.
    #[error("index entry for edge {0:?} is stale")]
    StaleIndexEntry(EdgeId),
    /// A contour's begin and end are not the two ends of one chain.
    #[error("contour {0:?} is malformed")]
    MalformedContour(ContourId),
    /// Walking a chain did not terminate.
    #[error("chain through edge {0:?} does not terminate")]
    UnterminatedChain(EdgeId),
    /// Two edges that were resolved against each other still cross.
    #[error("edges {first:?} and {second:?} cross without being split")]
    UnresolvedCrossing {
        /// The older edge.
        first: EdgeId,
        /// The newer edge.
        second: EdgeId,
    },
    /// A point produced by the kernel is NaN or infinite.
    #[error("non-finite point produced for edge {0:?}")]
    NonFinite(EdgeId),
    /// The R-tree itself is corrupt.
    #[error(transparent)]
    Index(#[from] kerf_index::InvariantError),
}
