// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time iteration itself.  Everything here is pure: given a
//! starting point and a budget, `iterate` always returns the same
//! trajectory.

use num::Complex;

/// The squared magnitude past which an orbit is considered escaped.
pub const ESCAPE_NORM_SQR: f64 = 2.0;

/// The outcome of iterating a single starting point.  Once built it is
/// never modified; it moves from the producer, through the queue, to the
/// aggregator.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    /// Whether the orbit left the bounded region within the budget.
    pub escaped: bool,
    /// The number of steps actually taken, never more than the budget.
    pub iterations: usize,
    /// Every intermediate value of the orbit, in iteration order.  Empty
    /// unless the path was requested.
    pub path: Vec<Complex<f64>>,
}

/// Iterate `z -> z^2 + c` from `z = 0` for at most `max_iterations`
/// steps, stopping at the first value whose squared magnitude exceeds
/// `ESCAPE_NORM_SQR`.  When `collect_path` is set every value, including
/// the escaping one, is recorded.
pub fn iterate(c: Complex<f64>, max_iterations: usize, collect_path: bool) -> Trajectory {
    let mut z: Complex<f64> = Complex { re: 0.0, im: 0.0 };
    let mut path = Vec::new();
    for i in 0..max_iterations {
        z = z * z + c;
        if collect_path {
            path.push(z);
        }
        if z.norm_sqr() > ESCAPE_NORM_SQR {
            return Trajectory {
                escaped: true,
                iterations: i + 1,
                path,
            };
        }
    }
    Trajectory {
        escaped: false,
        iterations: max_iterations,
        path,
    }
}
