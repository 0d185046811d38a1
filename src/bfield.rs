//! Analytic magnetic field of the star (Haskell et al. 2008)
//!
//! Mixed poloidal-toroidal field inside the star (`r<1`) matched to a dipole
//! outside of it. Radii are in units of the stellar radius, the polar angle
//! `theta` in radians and the field in Gauss.
//! The field is continuous at the stellar surface: see [MagneticField::continuity_jump].

use crate::definitions::Units;
use std::{
    f64::consts::PI,
    fmt,
    ops::{Deref, Sub},
};

#[cfg(feature = "plot")]
use crate::plot::{drawing, minmax, padded, PlotError};
#[cfg(feature = "plot")]
use plotters::prelude::*;
#[cfg(feature = "plot")]
use std::path::Path;

/// Field strength at the pole of the stellar surface [G]
pub const B_MAX: f64 = 1e15;
/// Outer radius of the computational domain [stellar radius]
pub const R_MAX: f64 = 2.;

/// Spherical components of the magnetic field
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FieldComponents {
    pub r: f64,
    pub theta: f64,
    pub phi: f64,
}
impl FieldComponents {
    pub fn magnitude(&self) -> f64 {
        (self.r * self.r + self.theta * self.theta + self.phi * self.phi).sqrt()
    }
    pub fn abs(self) -> Self {
        Self {
            r: self.r.abs(),
            theta: self.theta.abs(),
            phi: self.phi.abs(),
        }
    }
}
impl Sub for FieldComponents {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            r: self.r - rhs.r,
            theta: self.theta - rhs.theta,
            phi: self.phi - rhs.phi,
        }
    }
}
impl fmt::Display for FieldComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[Br:{:10.3e}, Btheta:{:10.3e}, Bphi:{:10.3e}]",
            self.r, self.theta, self.phi
        )
    }
}

/// Evenly spaced samples of `[start,stop]`, `stop` excluded if `!endpoint`
fn linspace(start: f64, stop: f64, n: usize, endpoint: bool) -> impl Iterator<Item = f64> {
    let intervals = match (endpoint, n) {
        (_, 0) => 1,
        (true, 1) => 1,
        (true, n) => n - 1,
        (false, n) => n,
    };
    let step = (stop - start) / intervals as f64;
    (0..n).map(move |k| start + k as f64 * step)
}

/// Radial samples across the star, its magnetosphere and the outer ghost cell
#[derive(Debug, Clone)]
pub struct RadialGrid(Vec<f64>);
impl Deref for RadialGrid {
    type Target = [f64];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl Default for RadialGrid {
    /// 99 samples in `[0,1)`, 30 in `[1,2]` and a ghost cell at 2.01
    fn default() -> Self {
        Self::new(99, 30, R_MAX, Some(2.01))
    }
}
impl RadialGrid {
    pub fn new(n_interior: usize, n_exterior: usize, r_max: f64, ghost: Option<f64>) -> Self {
        Self(
            linspace(0., 1., n_interior, false)
                .chain(linspace(1., r_max, n_exterior, true))
                .chain(ghost)
                .collect(),
        )
    }
}

/// The analytic stellar magnetic field
#[derive(Debug, Clone, Copy)]
pub struct MagneticField {
    /// field strength at the pole [G]
    pub b_max: f64,
    /// the field is frozen beyond this radius [stellar radius]
    pub r_max: f64,
}
impl Default for MagneticField {
    fn default() -> Self {
        Self {
            b_max: B_MAX,
            r_max: R_MAX,
        }
    }
}
impl MagneticField {
    pub fn new(b_max: f64, r_max: f64) -> Self {
        Self { b_max, r_max }
    }
    fn interior_r(&self, r: f64, cos_theta: f64) -> f64 {
        let (s, c) = (PI * r).sin_cos();
        let pi2 = PI * PI;
        (pi2 * PI * r.powi(3) + 3. * (pi2 * r * r - 2.) * s + 6. * PI * r * c) * self.b_max
            * cos_theta
            / (PI * (pi2 - 6.))
    }
    fn interior_theta(&self, r: f64, sin_theta: f64) -> f64 {
        let (s, c) = (PI * r).sin_cos();
        let pi2 = PI * PI;
        (-2. * pi2 * PI * r.powi(3) + 3. * (pi2 * r * r - 2.) * (s - PI * r * c))
            * self.b_max
            * sin_theta
            / (2. * PI * (pi2 - 6.))
    }
    fn interior_phi(&self, r: f64, sin_theta: f64) -> f64 {
        self.b_max * (PI * r).sin() * sin_theta / PI
    }
    fn interior(&self, r: f64, theta: f64) -> FieldComponents {
        let (sin_theta, cos_theta) = theta.sin_cos();
        FieldComponents {
            r: self.interior_r(r, cos_theta),
            theta: self.interior_theta(r, sin_theta),
            phi: self.interior_phi(r, sin_theta),
        }
    }
    fn dipole(&self, r: f64, theta: f64) -> FieldComponents {
        let (sin_theta, cos_theta) = theta.sin_cos();
        let r3 = r.powi(3);
        FieldComponents {
            r: self.b_max * cos_theta / r3,
            theta: self.b_max * sin_theta / (2. * r3),
            phi: 0.,
        }
    }
    /// Field at the polar axis boundaries, only the radial component is kept
    fn polar_axis(&self, r: f64, sign: f64) -> FieldComponents {
        let radial = if r < 1. {
            self.interior_r(r, sign)
        } else {
            self.b_max * sign / r.powi(3)
        };
        FieldComponents {
            r: radial,
            ..Default::default()
        }
    }
    /// Field components at radius `r` and polar angle `theta`
    pub fn evaluate(&self, r: f64, theta: f64) -> FieldComponents {
        if theta == 0. {
            return self.polar_axis(r, 1.);
        }
        if theta == 2. * PI {
            return self.polar_axis(r, -1.);
        }
        if r < 1. {
            self.interior(r, theta)
        } else if r <= self.r_max {
            self.dipole(r, theta)
        } else {
            self.dipole(self.r_max, theta)
        }
    }
    /// Field components along `grid` at polar angle `theta`
    pub fn profile(&self, grid: &RadialGrid, theta: f64) -> FieldProfile {
        let mut profile = FieldProfile {
            theta,
            ..Default::default()
        };
        for &r in grid.iter() {
            let b = self.evaluate(r, theta);
            profile.radius.push(r);
            profile.b_r.push(b.r);
            profile.b_theta.push(b.theta);
            profile.b_phi.push(b.phi);
        }
        profile
    }
    /// Absolute difference between the dipole and the interior field at the stellar surface
    pub fn continuity_jump(&self, theta: f64) -> FieldComponents {
        (self.dipole(1., theta) - self.interior(1., theta)).abs()
    }
}

/// Magnetic field components along a radial line
#[derive(Debug, Default, Clone)]
pub struct FieldProfile {
    /// polar angle [rd]
    pub theta: f64,
    pub radius: Vec<f64>,
    pub b_r: Vec<f64>,
    pub b_theta: Vec<f64>,
    pub b_phi: Vec<f64>,
}
impl FieldProfile {
    pub fn len(&self) -> usize {
        self.radius.len()
    }
    pub fn is_empty(&self) -> bool {
        self.radius.is_empty()
    }
    /// Rescales the field to the simulation code units
    pub fn to_code_units(mut self, units: &Units) -> Self {
        let b_0 = units.magnetic_field();
        for b in [&mut self.b_r, &mut self.b_theta, &mut self.b_phi] {
            b.iter_mut().for_each(|b| *b /= b_0);
        }
        self
    }
    pub fn to_csv<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(["r", "Br", "Btheta", "Bphi"])?;
        for k in 0..self.len() {
            wtr.write_record(&[
                format!("{}", self.radius[k]),
                format!("{:e}", self.b_r[k]),
                format!("{:e}", self.b_theta[k]),
                format!("{:e}", self.b_phi[k]),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
    /// Plots the three components of the field
    #[cfg(feature = "plot")]
    pub fn plot<P: AsRef<Path>>(&self, filename: P, y_desc: &str) -> Result<(), PlotError> {
        let b_range = minmax(
            self.b_r
                .iter()
                .chain(&self.b_theta)
                .chain(&self.b_phi)
                .cloned(),
        )
        .ok_or(PlotError::Empty)?;
        let r_end = minmax(self.radius.iter().cloned())
            .map(|(_, r)| r.max(2.1))
            .ok_or(PlotError::Empty)?;

        let root = BitMapBackend::new(filename.as_ref(), (1200, 800)).into_drawing_area();
        root.fill(&WHITE).map_err(drawing)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("theta = {:.4} rd", self.theta),
                ("sans-serif", 24),
            )
            .set_label_area_size(LabelAreaPosition::Left, 100)
            .set_label_area_size(LabelAreaPosition::Bottom, 50)
            .margin(20)
            .build_cartesian_2d(0f64..r_end, padded(b_range, 0.05))
            .map_err(drawing)?;
        chart
            .configure_mesh()
            .x_desc("Radius")
            .y_desc(y_desc)
            .y_label_formatter(&|y: &f64| format!("{:.2e}", y))
            .draw()
            .map_err(drawing)?;

        for (label, values, color) in [
            ("Br", &self.b_r, BLUE),
            ("Btheta", &self.b_theta, RED),
            ("Bphi", &self.b_phi, GREEN),
        ] {
            let points: Vec<_> = self.radius.iter().cloned().zip(values.iter().cloned()).collect();
            chart
                .draw_series(LineSeries::new(points.iter().cloned(), &color))
                .map_err(drawing)?
                .label(label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
            chart
                .draw_series(points.into_iter().map(|p| Circle::new(p, 3, color.filled())))
                .map_err(drawing)?;
        }
        chart
            .configure_series_labels()
            .border_style(&BLACK)
            .background_style(&WHITE.mix(0.8))
            .position(SeriesLabelPosition::UpperRight)
            .draw()
            .map_err(drawing)?;

        root.present().map_err(drawing)?;
        log::info!("Magnetic field profile written to {:?}", filename.as_ref());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::scratch_dir;
    use assert_approx_eq::assert_approx_eq;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn default_grid() {
        let grid = RadialGrid::default();
        assert_eq!(grid.len(), 130);
        assert_eq!(grid[0], 0.);
        assert_approx_eq!(grid[98], 98. / 99.);
        assert_eq!(grid[99], 1.);
        assert_approx_eq!(grid[128], 2.);
        assert_eq!(grid[129], 2.01);
    }

    #[test]
    fn linspace_endpoints() {
        let x: Vec<_> = linspace(1., 2., 3, true).collect();
        assert_eq!(x, vec![1., 1.5, 2.]);
        let x: Vec<_> = linspace(0., 1., 4, false).collect();
        assert_eq!(x, vec![0., 0.25, 0.5, 0.75]);
        assert_eq!(linspace(0., 1., 0, true).count(), 0);
    }

    #[test]
    fn center() {
        let b = MagneticField::default().evaluate(0., FRAC_PI_4);
        assert_approx_eq!(b.r, 0., 1e-3);
        assert_approx_eq!(b.theta, 0., 1e-3);
        assert_eq!(b.phi, 0.);
    }

    #[test]
    fn continuous_at_surface() {
        let field = MagneticField::default();
        for theta in [0.1, FRAC_PI_4, 1., 2., 3.] {
            let jump = field.continuity_jump(theta);
            assert!(jump.magnitude() < 1e-6 * B_MAX, "{}", jump);
        }
        let inside = field.evaluate(1. - 1e-9, FRAC_PI_4);
        let outside = field.evaluate(1., FRAC_PI_4);
        assert_approx_eq!(inside.r / B_MAX, outside.r / B_MAX, 1e-6);
        assert_approx_eq!(inside.theta / B_MAX, outside.theta / B_MAX, 1e-6);
    }

    #[test]
    fn dipole() {
        let b = MagneticField::default().evaluate(1.5, FRAC_PI_4);
        assert_approx_eq!(b.r, B_MAX * FRAC_PI_4.cos() / 3.375, 1.);
        assert_approx_eq!(b.theta, B_MAX * FRAC_PI_4.sin() / 6.75, 1.);
        assert_eq!(b.phi, 0.);
    }

    #[test]
    fn frozen_beyond_r_max() {
        let field = MagneticField::default();
        assert_eq!(field.evaluate(2.01, 1.), field.evaluate(R_MAX, 1.));
        assert_eq!(field.evaluate(5., 1.), field.evaluate(R_MAX, 1.));
    }

    #[test]
    fn polar_axis() {
        let field = MagneticField::default();
        let north = field.evaluate(0.5, 0.);
        assert_eq!((north.theta, north.phi), (0., 0.));
        assert_approx_eq!(north.r, field.evaluate(0.5, 1e-12).r, 1.);
        let south = field.evaluate(1.5, 2. * PI);
        assert_approx_eq!(south.r, -B_MAX / 3.375, 1.);
        assert_eq!((south.theta, south.phi), (0., 0.));
    }

    #[test]
    fn profile_and_code_units() {
        let field = MagneticField::default();
        let profile = field.profile(&RadialGrid::default(), FRAC_PI_4);
        assert_eq!(profile.len(), 130);
        assert!(profile.b_phi[99..].iter().all(|&b| b == 0.));
        let b_r = profile.b_r[110];
        let code = profile.to_code_units(&Units::default());
        assert_approx_eq!(code.b_r[110], b_r / 1e14);
    }

    #[test]
    fn profile_csv() {
        let path = scratch_dir("bfield_csv").join("profile.csv");
        let profile = MagneticField::default().profile(&RadialGrid::default(), FRAC_PI_4);
        profile.to_csv(&path).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        assert_eq!(rdr.headers().unwrap(), vec!["r", "Br", "Btheta", "Bphi"]);
        let records: Vec<Vec<f64>> = rdr
            .records()
            .map(|record| {
                record
                    .unwrap()
                    .iter()
                    .map(|value| value.parse().unwrap())
                    .collect()
            })
            .collect();
        assert_eq!(records.len(), profile.len());
        for (k, record) in records.iter().enumerate() {
            assert_eq!(record[0], profile.radius[k]);
            assert_approx_eq!(record[1], profile.b_r[k], 1e3);
            assert_approx_eq!(record[2], profile.b_theta[k], 1e3);
            assert_approx_eq!(record[3], profile.b_phi[k], 1e3);
        }
    }

    #[cfg(feature = "plot")]
    #[test]
    fn plot() {
        let filename = scratch_dir("bfield_plot").join("bfield_profile.png");
        MagneticField::default()
            .profile(&RadialGrid::default(), FRAC_PI_4)
            .plot(&filename, "Field Strength [G]")
            .unwrap();
        assert!(filename.is_file());
        assert!(matches!(
            FieldProfile::default().plot(filename.with_file_name("empty.png"), ""),
            Err(PlotError::Empty)
        ));
    }
}
