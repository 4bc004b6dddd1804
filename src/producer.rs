// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Producer workers.  Each one draws random starting points from the
//! sampling domain, iterates them, and pushes the trajectories that
//! escape onto the shared channel.  When it is done, for whatever
//! reason, it pushes exactly one `Finished` sentinel.

use crate::planes::ComplexPlane;
use crate::queue::Channel;
use crate::trajectory::{iterate, Trajectory};
use log::trace;
use num::Complex;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// What travels from the producers to the aggregator.
#[derive(Debug)]
pub enum Message {
    /// An escaped trajectory to plot.
    Trajectory(Trajectory),
    /// The sentinel: this producer will send nothing else.
    Finished(WorkerReport),
}

/// A producer's account of its own work, carried by its sentinel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkerReport {
    /// Which producer this is, `0..workers`.
    pub worker: usize,
    /// Starting points examined.
    pub sampled: usize,
    /// Trajectories that escaped and were handed to the channel.
    pub escaped: usize,
}

/// An endless stream of trajectories from uniformly distributed random
/// starting points.  The generator is private to the sampler.
pub struct Sampler<R: Rng> {
    rng: R,
    re: Uniform<f64>,
    im: Uniform<f64>,
    max_iterations: usize,
}

impl<R: Rng> Sampler<R> {
    /// Sample from `domain`, which must already have been validated.
    pub fn new(rng: R, domain: ComplexPlane, max_iterations: usize) -> Self {
        Sampler {
            rng,
            re: Uniform::new(domain.0.re, domain.1.re),
            im: Uniform::new(domain.0.im, domain.1.im),
            max_iterations,
        }
    }
}

impl<R: Rng> Iterator for Sampler<R> {
    type Item = Trajectory;

    fn next(&mut self) -> Option<Trajectory> {
        let c = Complex {
            re: self.re.sample(&mut self.rng),
            im: self.im.sample(&mut self.rng),
        };
        Some(iterate(c, self.max_iterations, true))
    }
}

/// One producer's share of a render.
#[derive(Clone, Debug)]
pub struct Producer {
    /// Index of this producer.
    pub id: usize,
    /// How many starting points to examine.
    pub quota: usize,
    /// Iteration budget per starting point.
    pub max_iterations: usize,
    /// Where starting points are drawn from.
    pub domain: ComplexPlane,
    /// Fixed seed for reproducible runs.  Each producer offsets it by its
    /// id; without one, every producer seeds itself from the OS.
    pub seed: Option<u64>,
}

impl Producer {
    /// The random number generator this producer samples with.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(self.id as u64)),
            None => StdRng::from_entropy(),
        }
    }

    /// The trajectories this producer will examine, quota included.
    pub fn trajectories(&self) -> std::iter::Take<Sampler<StdRng>> {
        Sampler::new(self.rng(), self.domain, self.max_iterations).take(self.quota)
    }

    /// Sample the quota and feed the escaped trajectories to `channel`.
    pub fn run<C>(&self, channel: &C) -> WorkerReport
    where
        C: Channel<Message> + ?Sized,
    {
        produce(self.id, self.trajectories(), channel)
    }
}

/// Puts the sentinel when dropped, so that a producer that unwinds still
/// accounts for itself.
struct Finisher<'a, C: Channel<Message> + ?Sized> {
    channel: &'a C,
    report: WorkerReport,
}

impl<'a, C: Channel<Message> + ?Sized> Drop for Finisher<'a, C> {
    fn drop(&mut self) {
        // A cancelled channel has nobody left to count sentinels.
        let _ = self.channel.put(Message::Finished(self.report.clone()));
    }
}

/// Walk `trajectories`, handing every escaped one to `channel`, then put
/// this worker's sentinel.  Stops early if the channel is cancelled.
/// The sentinel is put exactly once, even when `trajectories` is empty or
/// panics.
pub fn produce<I, C>(worker: usize, trajectories: I, channel: &C) -> WorkerReport
where
    I: IntoIterator<Item = Trajectory>,
    C: Channel<Message> + ?Sized,
{
    let mut finisher = Finisher {
        channel,
        report: WorkerReport {
            worker,
            ..WorkerReport::default()
        },
    };
    let mut trajectories = trajectories.into_iter();
    while !channel.is_cancelled() {
        let trajectory = match trajectories.next() {
            Some(trajectory) => trajectory,
            None => break,
        };
        finisher.report.sampled += 1;
        if !trajectory.escaped {
            continue;
        }
        if channel.put(Message::Trajectory(trajectory)).is_err() {
            break;
        }
        finisher.report.escaped += 1;
    }
    trace!(
        "producer {} done: {} sampled, {} escaped",
        worker,
        finisher.report.sampled,
        finisher.report.escaped
    );
    finisher.report.clone()
}
