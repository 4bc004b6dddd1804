#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Buddhabrot renderer
//!
//! The Buddhabrot is a variant of the Mandelbrot set that, instead of
//! colouring each point by how quickly it escapes, plots the orbits of
//! the points that do escape.  Each iteration creates a new complex
//! number that itself may be used as a coordinate on the complex plane.
//! By mapping that coordinate to the nearest integral pixel and
//! incrementing that pixel by one, we build up a histogram of where
//! escaping orbits travel.  The resulting image is called a Buddhabrot.
//!
//! Starting points are chosen at random.  A number of producer threads
//! sample and iterate them in parallel and pass the escaping orbits
//! through a bounded queue to a single aggregator, which owns the
//! histogram.  Each producer finishes by sending a sentinel; once the
//! aggregator has seen one per producer, the render is complete.
//!
//! ```no_run
//! use buddhabrot::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig {
//!     width: 256,
//!     height: 256,
//!     total_points: 100_000,
//!     workers: 4,
//!     ..PipelineConfig::default()
//! };
//! let render = Pipeline::new(config)?.run()?;
//! buddhabrot::render::write_pgm(&render.grid, std::io::stdout())?;
//! # Ok::<(), buddhabrot::BuddhaError>(())
//! ```

pub mod aggregator;
pub mod error;
pub mod grid;
pub mod pipeline;
pub mod planes;
pub mod producer;
pub mod queue;
pub mod render;
pub mod trajectory;

pub use aggregator::{Aggregator, Summary};
pub use error::{BuddhaError, Cancelled};
pub use grid::Grid;
pub use pipeline::{Canceller, Pipeline, PipelineConfig, Render};
pub use planes::{ComplexPlane, Pixel, PlaneMapper};
pub use producer::{Message, Producer, WorkerReport};
pub use queue::{BoundedQueue, Channel};
pub use trajectory::{iterate, Trajectory};
