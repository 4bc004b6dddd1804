// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The controller.  A render moves through four phases:
//!
//! 1. *Spawning*: one producer thread per worker, all sharing one
//!    bounded queue.
//! 2. *Consuming*: the controlling thread is the sole consumer, and
//!    plots trajectories until it has seen one sentinel per producer.
//! 3. *Joining*: every producer thread is joined, even though each has
//!    already said it was done.
//! 4. *Done*: the grid is handed back to the caller.
//!
//! Because histogram accumulation is commutative, the grid depends only
//! on which trajectories were produced, never on how the producers'
//! messages interleaved.

use crate::aggregator::{Aggregator, Summary};
use crate::error::BuddhaError;
use crate::grid::Grid;
use crate::planes::{ComplexPlane, PlaneMapper};
use crate::producer::{produce, Message, Producer};
use crate::queue::BoundedQueue;
use crate::trajectory::Trajectory;
use log::{log, warn, Level};
use std::fmt;
use std::panic;
use std::sync::Arc;
use std::thread;

/// Everything needed to run a render.  Checked by `validate` before any
/// thread is started.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Grid columns.
    pub width: usize,
    /// Grid rows.
    pub height: usize,
    /// Starting points to sample across all producers.
    pub total_points: usize,
    /// Iteration budget per starting point.
    pub max_iterations: usize,
    /// Number of producer threads.
    pub workers: usize,
    /// How many messages may wait in the queue at once.
    pub queue_capacity: usize,
    /// The rectangle starting points are drawn from.
    pub domain: ComplexPlane,
    /// The rectangle mapped onto the grid.
    pub window: ComplexPlane,
    /// Fixed base seed; `None` seeds every producer from the OS.
    pub seed: Option<u64>,
    /// Log lifecycle messages at `info` rather than `debug`.
    pub verbose: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            width: 512,
            height: 512,
            total_points: 1_000_000,
            max_iterations: 1000,
            workers: num_cpus::get(),
            queue_capacity: 100,
            domain: ComplexPlane::mandelbrot(),
            window: ComplexPlane::mandelbrot(),
            seed: None,
            verbose: false,
        }
    }
}

impl PipelineConfig {
    /// Reject configurations that cannot produce an image.
    pub fn validate(&self) -> Result<(), BuddhaError> {
        if self.width == 0 || self.height == 0 || self.width.checked_mul(self.height).is_none() {
            return Err(BuddhaError::InvalidGrid(self.width, self.height));
        }
        if self.workers == 0 {
            return Err(BuddhaError::InvalidWorkers(self.workers));
        }
        if self.queue_capacity == 0 {
            return Err(BuddhaError::InvalidCapacity(self.queue_capacity));
        }
        if self.max_iterations == 0 {
            return Err(BuddhaError::InvalidIterations);
        }
        self.domain.validate("sampling domain")?;
        self.window.validate("visualization window")?;
        Ok(())
    }

    /// Starting points each producer samples.  Rounded up, so the run may
    /// examine up to `workers - 1` more points than asked for.
    pub fn quota(&self) -> usize {
        quota(self.total_points, self.workers)
    }

    fn level(&self) -> Level {
        if self.verbose {
            Level::Info
        } else {
            Level::Debug
        }
    }
}

/// `ceil(total / workers)`.
pub fn quota(total: usize, workers: usize) -> usize {
    if workers == 0 {
        return 0;
    }
    total / workers + if total % workers == 0 { 0 } else { 1 }
}

/// Where the controller is in a run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Starting producers.
    Spawning,
    /// Draining the queue.
    Consuming,
    /// Waiting for producer threads to exit.
    Joining,
    /// The grid is complete.
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Phase::Spawning => "spawning",
            Phase::Consuming => "consuming",
            Phase::Joining => "joining",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

/// A finished render.
#[derive(Clone, Debug)]
pub struct Render {
    /// The accumulated histogram.
    pub grid: Grid,
    /// What the aggregator saw.
    pub summary: Summary,
}

/// Stops a running pipeline from another thread, e.g. a signal handler.
#[derive(Clone)]
pub struct Canceller {
    queue: Arc<BoundedQueue<Message>>,
}

impl Canceller {
    /// Wake every producer and the consumer; the run returns
    /// `BuddhaError::Cancelled`.
    pub fn cancel(&self) {
        self.queue.cancel();
    }
}

// Cancels the queue if the consuming thread unwinds, so producers parked
// on a full queue can exit and be joined.
struct CancelOnUnwind<'a>(&'a BoundedQueue<Message>);

impl<'a> Drop for CancelOnUnwind<'a> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.cancel();
        }
    }
}

/// One render: the configuration and the single queue shared by every
/// participant.
pub struct Pipeline {
    config: PipelineConfig,
    queue: Arc<BoundedQueue<Message>>,
}

impl Pipeline {
    /// Validate `config` and build the queue.  Nothing runs yet.
    pub fn new(config: PipelineConfig) -> Result<Self, BuddhaError> {
        config.validate()?;
        let queue = Arc::new(BoundedQueue::new(config.queue_capacity)?);
        Ok(Pipeline { config, queue })
    }

    /// The configuration this pipeline runs with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// A handle that can cancel this pipeline while it runs.
    pub fn canceller(&self) -> Canceller {
        Canceller {
            queue: self.queue.clone(),
        }
    }

    /// Run the render with `config.workers` random producers, each
    /// sampling `config.quota()` starting points.
    pub fn run(self) -> Result<Render, BuddhaError> {
        let quota = self.config.quota();
        let producers: Vec<Producer> = (0..self.config.workers)
            .map(|id| Producer {
                id,
                quota,
                max_iterations: self.config.max_iterations,
                domain: self.config.domain,
                seed: self.config.seed,
            })
            .collect();
        log!(
            self.config.level(),
            "{} producers x {} points, {} iterations max, queue capacity {}",
            producers.len(),
            quota,
            self.config.max_iterations,
            self.config.queue_capacity
        );
        self.run_sources(producers.iter().map(Producer::trajectories).collect())
    }

    /// Run the render with one producer per element of `sources`, each
    /// putting the escaped trajectories of its stream.  The worker count
    /// is `sources.len()`; `config.workers` and the sampling settings are
    /// not consulted.
    pub fn run_sources<I>(self, sources: Vec<I>) -> Result<Render, BuddhaError>
    where
        I: IntoIterator<Item = Trajectory> + Send,
    {
        let workers = sources.len();
        if workers == 0 {
            return Err(BuddhaError::InvalidWorkers(0));
        }
        let level = self.config.level();
        let window = self.config.window;
        let mapper = PlaneMapper::new(self.config.width, self.config.height, window.0, window.1)?;
        let queue: &BoundedQueue<Message> = &self.queue;

        // Producer panics are collected by the explicit joins below, so a
        // panic reaching the scope came from the consuming side: a broken
        // sentinel protocol.  That is fatal and is re-raised as is.
        let outcome = crossbeam::scope(|scope| {
            log!(level, "phase: {}", Phase::Spawning);
            let mut handles = Vec::with_capacity(workers);
            for (id, source) in sources.into_iter().enumerate() {
                let spawned = scope
                    .builder()
                    .name(format!("producer-{}", id))
                    .spawn(move |_| produce(id, source, queue));
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(err) => {
                        queue.cancel();
                        return Err(BuddhaError::Spawn(err));
                    }
                }
            }

            log!(level, "phase: {}", Phase::Consuming);
            let mut aggregator = Aggregator::new(mapper, workers).log_level(level);
            let consumed = {
                let _guard = CancelOnUnwind(queue);
                aggregator.consume(queue)
            };
            if consumed.is_ok() {
                // Every producer puts its sentinel last, so nothing may
                // follow the final one.
                assert!(
                    queue.try_get().is_none(),
                    "messages left in the queue after every producer finished"
                );
            }

            log!(level, "phase: {}", Phase::Joining);
            let mut panicked = None;
            for (id, handle) in handles.into_iter().enumerate() {
                if handle.join().is_err() {
                    warn!("producer {} panicked", id);
                    panicked = panicked.or(Some(id));
                }
            }
            if let Some(id) = panicked {
                return Err(BuddhaError::WorkerPanicked(id));
            }
            consumed?;
            Ok(aggregator.finish())
        })
        .unwrap_or_else(|payload| panic::resume_unwind(payload));

        let (grid, summary) = outcome?;
        log!(
            level,
            "phase: {}: {} sampled, {} escaped, {} points plotted, {} outside the window",
            Phase::Done,
            summary.sampled(),
            summary.trajectories,
            summary.plotted,
            summary.discarded
        );
        Ok(Render { grid, summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::WorkerReport;
    use crate::queue::Channel;
    use crossbeam::channel;
    use num::Complex;
    use std::time::Duration;

    #[test]
    fn quota_rounds_up() {
        assert_eq!(quota(0, 2), 0);
        assert_eq!(quota(10, 2), 5);
        assert_eq!(quota(10, 3), 4);
        assert_eq!(quota(1, 8), 1);
        // Over-sampling stays below the worker count.
        for workers in 1..10 {
            for total in 0..50 {
                let sampled = quota(total, workers) * workers;
                assert!(sampled >= total && sampled - total < workers);
            }
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn invalid_configs_are_rejected_before_running() {
        let bad = vec![
            PipelineConfig {
                workers: 0,
                ..PipelineConfig::default()
            },
            PipelineConfig {
                queue_capacity: 0,
                ..PipelineConfig::default()
            },
            PipelineConfig {
                width: 0,
                ..PipelineConfig::default()
            },
            PipelineConfig {
                width: usize::max_value(),
                height: 2,
                ..PipelineConfig::default()
            },
            PipelineConfig {
                max_iterations: 0,
                ..PipelineConfig::default()
            },
            PipelineConfig {
                window: ComplexPlane(Complex::new(1.0, 1.5), Complex::new(-2.0, -1.5)),
                ..PipelineConfig::default()
            },
            PipelineConfig {
                domain: ComplexPlane(Complex::new(0.0, 0.0), Complex::new(0.0, 1.0)),
                ..PipelineConfig::default()
            },
        ];
        for config in bad {
            assert!(Pipeline::new(config).is_err());
        }
    }

    #[test]
    fn cancelled_pipeline_reports_cancellation() {
        let pipeline = Pipeline::new(PipelineConfig {
            width: 16,
            height: 16,
            total_points: 1_000_000,
            max_iterations: 100,
            workers: 2,
            queue_capacity: 1,
            ..PipelineConfig::default()
        })
        .unwrap();
        pipeline.canceller().cancel();
        match pipeline.run() {
            Err(BuddhaError::Cancelled) => {}
            other => panic!("expected cancellation, got {:?}", other.map(|r| r.summary)),
        }
    }

    #[test]
    fn cancelling_a_running_pipeline_releases_blocked_producers() {
        let pipeline = Pipeline::new(PipelineConfig {
            width: 16,
            height: 16,
            total_points: usize::max_value() / 2,
            max_iterations: 50,
            workers: 4,
            queue_capacity: 1,
            seed: Some(11),
            ..PipelineConfig::default()
        })
        .unwrap();
        let canceller = pipeline.canceller();
        let (done_tx, done_rx) = channel::bounded(1);
        crossbeam::scope(|s| {
            s.spawn(move |_| {
                let result = pipeline.run().map(|r| r.summary);
                done_tx.send(result).unwrap();
            });
            // Long enough for the producers to fill the queue and park.
            let early = done_rx.recv_timeout(Duration::from_millis(200));
            canceller.cancel();
            assert!(early.is_err(), "run ended before it was cancelled");
            match done_rx.recv_timeout(Duration::from_secs(10)) {
                Ok(Err(BuddhaError::Cancelled)) => {}
                other => panic!("expected cancellation, got {:?}", other),
            }
        })
        .unwrap();
    }

    #[test]
    #[should_panic(expected = "sentinel from producer 7 but only 1 were started")]
    fn broken_sentinel_protocol_is_fatal() {
        let pipeline = Pipeline::new(PipelineConfig {
            width: 8,
            height: 8,
            queue_capacity: 4,
            ..PipelineConfig::default()
        })
        .unwrap();
        pipeline
            .queue
            .put(Message::Finished(WorkerReport {
                worker: 7,
                ..WorkerReport::default()
            }))
            .unwrap();
        let _ = pipeline.run_sources(vec![Vec::<Trajectory>::new()]);
    }
}
