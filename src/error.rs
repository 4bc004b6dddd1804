// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors surfaced by the sampler.  Configuration problems are caught
//! before any thread is started; the only runtime failures are a
//! cancelled run and a producer that died.

use failure::Fail;
use std::io;

/// Returned by a [`Channel`](crate::queue::Channel) operation once the
/// channel has been cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Fail)]
#[fail(display = "the channel was cancelled")]
pub struct Cancelled;

/// Everything that can go wrong while configuring or running a render.
#[derive(Debug, Fail)]
pub enum BuddhaError {
    /// A bounded queue needs room for at least one item.
    #[fail(display = "queue capacity must be at least 1, got {}", _0)]
    InvalidCapacity(usize),

    /// The pipeline needs at least one producer.
    #[fail(display = "worker count must be at least 1, got {}", _0)]
    InvalidWorkers(usize),

    /// The output grid must have at least one row and one column.
    #[fail(display = "grid must be at least 1x1, got {}x{}", _0, _1)]
    InvalidGrid(usize, usize),

    /// Each trajectory needs an iteration budget of at least one step.
    #[fail(display = "iteration budget must be at least 1")]
    InvalidIterations,

    /// A rectangle on the complex plane whose corners are swapped or
    /// which has no area.
    #[fail(display = "{}: left lower corner must be strictly left of and below the right upper corner", _0)]
    InvalidPlane(&'static str),

    /// `normalize` was asked to map onto an inverted range.
    #[fail(display = "normalization bounds are inverted: min {} > max {}", min, max)]
    InvertedRange {
        /// Lower bound supplied.
        min: f64,
        /// Upper bound supplied.
        max: f64,
    },

    /// The output file extension does not name a supported format.
    #[fail(display = "unsupported output format: {}", _0)]
    UnsupportedFormat(String),

    /// A producer thread could not be started.
    #[fail(display = "could not spawn producer thread: {}", _0)]
    Spawn(#[cause] io::Error),

    /// A producer thread panicked.  Its sentinel was still delivered, so
    /// the run terminated, but the image is incomplete.
    #[fail(display = "producer {} panicked", _0)]
    WorkerPanicked(usize),

    /// The run was cancelled before every producer finished.
    #[fail(display = "the render was cancelled")]
    Cancelled,

    /// Writing the image failed.
    #[fail(display = "could not write image: {}", _0)]
    Io(#[cause] io::Error),

    /// The image encoder rejected the raster.
    #[fail(display = "could not encode image: {}", _0)]
    Encode(String),
}

impl From<Cancelled> for BuddhaError {
    fn from(_: Cancelled) -> Self {
        BuddhaError::Cancelled
    }
}

impl From<io::Error> for BuddhaError {
    fn from(err: io::Error) -> Self {
        BuddhaError::Io(err)
    }
}
