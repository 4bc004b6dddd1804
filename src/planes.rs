// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0 in
//! the upper left, and a rectangle on the complex plane with an
//! arbitrary pair of corners defining the leftlower and rightupper
//! corners.
use crate::error::BuddhaError;
use num::Complex;

/// Map `value` from the range `min..=max` onto `0.0..=1.0`.  Values
/// outside the range map outside the unit interval; the caller decides
/// what to do with them.
pub fn normalize(min: f64, max: f64, value: f64) -> Result<f64, BuddhaError> {
    if max < min {
        return Err(BuddhaError::InvertedRange { min, max });
    }
    Ok((value - min) / (max - min))
}

/// Describes the lower-left corner and upper-right corner of a
/// rectangle on the complex plane, treating the real part of each value
/// as the x-component and the imaginary part as the y-component.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ComplexPlane(pub Complex<f64>, pub Complex<f64>);

impl ComplexPlane {
    /// The rectangle the Mandelbrot set lives in: real axis -2..1,
    /// imaginary axis -1.5..1.5.
    pub fn mandelbrot() -> Self {
        ComplexPlane(Complex::new(-2.0, -1.5), Complex::new(1.0, 1.5))
    }

    /// Check that the corners are in the right order and enclose a
    /// non-empty area.  `what` names the rectangle in the error.
    pub fn validate(&self, what: &'static str) -> Result<(), BuddhaError> {
        let (leftlower, rightupper) = (self.0, self.1);
        // Written so that NaN corners fail too.
        if !(leftlower.re < rightupper.re) || !(leftlower.im < rightupper.im) {
            return Err(BuddhaError::InvalidPlane(what));
        }
        Ok(())
    }

    /// Whether the point lies inside the rectangle, edges included.
    pub fn contains(&self, point: &Complex<f64>) -> bool {
        point.re >= self.0.re
            && point.re <= self.1.re
            && point.im >= self.0.im
            && point.im <= self.1.im
    }
}

/// Describes the column and row of a cell in the integral plane.  Row
/// zero is the top of the image.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// Contains the definitions of two planes: an integral cartesian plane,
/// and a complex cartesian plane.  Maps points from the complex plane
/// onto the integral one, flipping the vertical axis so that larger
/// imaginary parts land on earlier rows.
#[derive(Debug, Clone)]
pub struct PlaneMapper {
    /// Width of the integral plane.
    pub width: usize,
    /// Height of the integral plane.
    pub height: usize,
    /// The visualization window.  Points outside it are not mapped.
    pub complex_plane: ComplexPlane,
}

impl PlaneMapper {
    /// Constructor.  Takes the size of the integral plane and the two
    /// corners of the complex window mapped onto it.
    pub fn new(
        width: usize,
        height: usize,
        leftlower: Complex<f64>,
        rightupper: Complex<f64>,
    ) -> Result<PlaneMapper, BuddhaError> {
        if width == 0 || height == 0 || width.checked_mul(height).is_none() {
            return Err(BuddhaError::InvalidGrid(width, height));
        }
        let complex_plane = ComplexPlane(leftlower, rightupper);
        complex_plane.validate("visualization window")?;

        Ok(PlaneMapper {
            width,
            height,
            complex_plane,
        })
    }

    /// Given a complex number, find the cell it falls into, or `None` if
    /// it lies outside the visualization window.  Each axis is
    /// normalized independently, scaled to the last column or row, and
    /// truncated toward zero.
    pub fn point_to_pixel(&self, point: &Complex<f64>) -> Option<Pixel> {
        if !self.complex_plane.contains(point) {
            return None;
        }
        let ComplexPlane(leftlower, rightupper) = self.complex_plane;
        let left = normalize(leftlower.re, rightupper.re, point.re).ok()?;
        let up = normalize(leftlower.im, rightupper.im, point.im).ok()?;
        let left = left * (self.width - 1) as f64;
        let up = up * (self.height - 1) as f64;
        let (left, up) = (left as usize, up as usize);
        if left >= self.width || up >= self.height {
            return None;
        }
        Some(Pixel(left, self.height - 1 - up))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planemapper_fails_on_bad_shape() {
        let pm = PlaneMapper::new(4, 4, Complex::new(-1.0, 1.0), Complex::new(1.0, -1.0));
        assert!(pm.is_err());
    }

    #[test]
    fn planemapper_fails_on_flat_shape() {
        let pm = PlaneMapper::new(4, 4, Complex::new(-1.0, 1.0), Complex::new(1.0, 1.0));
        assert!(pm.is_err());
    }

    #[test]
    fn planemapper_fails_on_empty_grid() {
        let pm = PlaneMapper::new(0, 4, Complex::new(-1.0, -1.0), Complex::new(1.0, 1.0));
        assert!(pm.is_err());
    }

    #[test]
    fn planemapper_passes_on_good_shape() {
        let pm = PlaneMapper::new(4, 4, Complex::new(-1.0, -1.0), Complex::new(1.0, 1.0));
        assert!(pm.is_ok());
    }

    #[test]
    fn point_to_pixel_on_positive_planes() {
        let pm = PlaneMapper::new(5, 5, Complex::new(0.0, 0.0), Complex::new(4.0, 4.0)).unwrap();
        assert_eq!(pm.point_to_pixel(&Complex::new(0.0, 0.0)), Some(Pixel(0, 4)));
        assert_eq!(pm.point_to_pixel(&Complex::new(2.0, 2.0)), Some(Pixel(2, 2)));
        assert_eq!(pm.point_to_pixel(&Complex::new(4.0, 4.0)), Some(Pixel(4, 0)));
        assert_eq!(pm.point_to_pixel(&Complex::new(3.0, 1.0)), Some(Pixel(3, 3)));
    }

    #[test]
    fn point_to_pixel_on_the_default_window() {
        let window = ComplexPlane::mandelbrot();
        let pm = PlaneMapper::new(301, 301, window.0, window.1).unwrap();
        assert_eq!(pm.point_to_pixel(&Complex::new(-2.0, -1.5)), Some(Pixel(0, 300)));
        assert_eq!(pm.point_to_pixel(&Complex::new(1.0, 1.5)), Some(Pixel(300, 0)));
        assert_eq!(pm.point_to_pixel(&Complex::new(0.0, 0.0)), Some(Pixel(200, 150)));
    }

    #[test]
    fn point_to_pixel_rejects_points_outside_the_window() {
        let pm = PlaneMapper::new(4, 4, Complex::new(-2.0, -2.0), Complex::new(2.0, 2.0)).unwrap();
        assert_eq!(pm.point_to_pixel(&Complex::new(100.0, 100.0)), None);
        assert_eq!(pm.point_to_pixel(&Complex::new(-2.1, 0.0)), None);
        assert_eq!(pm.point_to_pixel(&Complex::new(0.0, 2.1)), None);
        assert_eq!(pm.point_to_pixel(&Complex::new(std::f64::NAN, 0.0)), None);
    }

    #[test]
    fn point_to_pixel_scales_the_normalized_coordinate() {
        let window = ComplexPlane::mandelbrot();
        let (width, height) = (512, 384);
        let pm = PlaneMapper::new(width, height, window.0, window.1).unwrap();
        let expected = |min: f64, max: f64, v: f64, cells: usize| {
            (normalize(min, max, v).unwrap() * (cells - 1) as f64) as usize
        };
        let re_step = (window.1.re - window.0.re) / (width - 1) as f64;
        let im_step = (window.1.im - window.0.im) / (height - 1) as f64;
        // Points on the cell boundaries, where the rounding of the scale
        // decides which side they land on, plus points between them.
        for k in 0..width * 2 {
            for j in (0..height * 2).step_by(7) {
                let point = Complex::new(
                    (window.0.re + k as f64 * re_step / 2.0).min(window.1.re),
                    (window.0.im + j as f64 * im_step / 2.0).min(window.1.im),
                );
                let left = expected(window.0.re, window.1.re, point.re, width);
                let up = expected(window.0.im, window.1.im, point.im, height);
                assert_eq!(
                    pm.point_to_pixel(&point),
                    Some(Pixel(left, height - 1 - up)),
                    "{:?}",
                    point
                );
            }
        }
    }

    #[test]
    fn planemapper_fails_on_an_unaddressable_grid() {
        let pm = PlaneMapper::new(
            usize::max_value(),
            2,
            Complex::new(-1.0, -1.0),
            Complex::new(1.0, 1.0),
        );
        assert!(pm.is_err());
    }

    #[test]
    fn single_cell_plane_maps_everything_inside_to_it() {
        let pm = PlaneMapper::new(1, 1, Complex::new(-1.0, -1.0), Complex::new(1.0, 1.0)).unwrap();
        assert_eq!(pm.point_to_pixel(&Complex::new(0.5, -0.5)), Some(Pixel(0, 0)));
    }

    #[test]
    fn normalize_maps_onto_the_unit_interval() {
        assert_eq!(normalize(-2.0, 1.0, -2.0).unwrap(), 0.0);
        assert_eq!(normalize(-2.0, 1.0, 1.0).unwrap(), 1.0);
        assert_eq!(normalize(0.0, 10.0, 5.0).unwrap(), 0.5);
    }

    #[test]
    fn normalize_rejects_inverted_bounds() {
        assert!(normalize(1.0, -2.0, 0.0).is_err());
    }
}
