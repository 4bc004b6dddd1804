// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The consuming side of the pipeline.  Only the thread that owns the
//! `Aggregator` ever touches the grid, so plotting needs no locking.

use crate::error::Cancelled;
use crate::grid::Grid;
use crate::planes::PlaneMapper;
use crate::producer::{Message, WorkerReport};
use crate::queue::Channel;
use crate::trajectory::Trajectory;
use log::{log, Level};

/// What the aggregator saw while consuming.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Summary {
    /// Every producer's sentinel report, ordered by worker id.
    pub reports: Vec<WorkerReport>,
    /// Escaped trajectories received.
    pub trajectories: u64,
    /// Visited points that landed in the visualization window.
    pub plotted: u64,
    /// Visited points outside the window.
    pub discarded: u64,
}

impl Summary {
    /// Starting points examined across all producers.
    pub fn sampled(&self) -> usize {
        self.reports.iter().map(|r| r.sampled).sum()
    }
}

/// Pulls messages off a channel until every producer has finished, and
/// plots each trajectory's orbit into its grid.
pub struct Aggregator {
    mapper: PlaneMapper,
    grid: Grid,
    reports: Vec<Option<WorkerReport>>,
    finished: usize,
    summary: Summary,
    level: Level,
}

impl Aggregator {
    /// An aggregator expecting one sentinel from each of `workers`
    /// producers, plotting onto a grid the size of `mapper`.
    pub fn new(mapper: PlaneMapper, workers: usize) -> Self {
        Aggregator {
            grid: Grid::new(mapper.width, mapper.height),
            mapper,
            reports: vec![None; workers],
            finished: 0,
            summary: Summary::default(),
            level: Level::Debug,
        }
    }

    /// Log producer completions at `level` instead of `Debug`.
    pub fn log_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Number of producers that have sent their sentinel.
    pub fn finished(&self) -> usize {
        self.finished
    }

    /// Whether every expected producer has finished.
    pub fn is_done(&self) -> bool {
        self.finished == self.reports.len()
    }

    /// Take messages from `channel`, in the order it returns them, until
    /// every producer's sentinel has arrived.
    ///
    /// # Panics
    ///
    /// A second sentinel from the same producer, or one from a producer
    /// that was never started, means the protocol is broken and the image
    /// cannot be trusted.
    pub fn consume<C>(&mut self, channel: &C) -> Result<(), Cancelled>
    where
        C: Channel<Message> + ?Sized,
    {
        while !self.is_done() {
            match channel.get()? {
                Message::Trajectory(trajectory) => {
                    self.project(&trajectory);
                }
                Message::Finished(report) => self.finish_worker(report),
            }
        }
        Ok(())
    }

    fn finish_worker(&mut self, report: WorkerReport) {
        let expected = self.reports.len();
        let slot = self.reports.get_mut(report.worker).unwrap_or_else(|| {
            panic!(
                "sentinel from producer {} but only {} were started",
                report.worker, expected
            )
        });
        assert!(
            slot.is_none(),
            "producer {} sent a second sentinel",
            report.worker
        );
        log!(
            self.level,
            "producer {} finished ({} of {}): {} sampled, {} escaped",
            report.worker,
            self.finished + 1,
            expected,
            report.sampled,
            report.escaped
        );
        *slot = Some(report);
        self.finished += 1;
    }

    /// Plot every visited point of `trajectory` that falls inside the
    /// window; points outside it are skipped.  Returns how many cells
    /// were incremented.
    pub fn project(&mut self, trajectory: &Trajectory) -> usize {
        let mut plotted = 0;
        for point in &trajectory.path {
            match self.mapper.point_to_pixel(point) {
                Some(pixel) if self.grid.increment(pixel) => plotted += 1,
                _ => self.summary.discarded += 1,
            }
        }
        self.summary.trajectories += 1;
        self.summary.plotted += plotted as u64;
        plotted
    }

    /// The grid as it stands.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Hand over the finished grid and what was seen on the way.
    pub fn finish(self) -> (Grid, Summary) {
        let mut summary = self.summary;
        summary.reports = self.reports.into_iter().flatten().collect();
        (self.grid, summary)
    }
}
