//! Shared plotting helpers

use plotters::style::RGBColor;
use std::ops::Range;

#[derive(thiserror::Error, Debug)]
pub enum PlotError {
    #[error("failed to draw the figure: {0}")]
    Drawing(String),
    #[error("no data to plot")]
    Empty,
}
pub type Result<T> = std::result::Result<T, PlotError>;

/// Maps any plotters backend error into [PlotError]
pub(crate) fn drawing<E: std::fmt::Debug>(e: E) -> PlotError {
    PlotError::Drawing(format!("{:?}", e))
}

pub fn rgb(color: colorous::Color) -> RGBColor {
    RGBColor(color.r, color.g, color.b)
}

/// Samples a colormap at `value` normalized to `[vmin,vmax]`
pub fn sample(gradient: colorous::Gradient, value: f64, vmin: f64, vmax: f64) -> RGBColor {
    let t = ((value - vmin) / (vmax - vmin)).clamp(0., 1.);
    rgb(gradient.eval_continuous(t))
}

/// Range of finite values, `None` if there is none
pub fn minmax<I: IntoIterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|x| x.is_finite())
        .fold(None, |acc, x| match acc {
            None => Some((x, x)),
            Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
        })
}

/// Widens `[min,max]` by `padding` of its extent on both sides
pub fn padded((min, max): (f64, f64), padding: f64) -> Range<f64> {
    let extent = max - min;
    if extent == 0. {
        let pad = if min == 0. { 1. } else { min.abs() * padding };
        return min - pad..max + pad;
    }
    min - extent * padding..max + extent * padding
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minmax_skips_nan() {
        assert_eq!(minmax(vec![1., f64::NAN, -2., 3.]), Some((-2., 3.)));
        assert_eq!(minmax(Vec::<f64>::new()), None);
    }

    #[test]
    fn padded_flat_range() {
        let r = padded((2., 2.), 0.1);
        assert!(r.start < 2. && r.end > 2.);
        let r = padded((0., 10.), 0.1);
        assert_eq!(r, -1.0..11.0);
    }

    #[test]
    fn sample_is_clamped() {
        let lo = sample(colorous::BLUES, -10., 0., 1.);
        let first = rgb(colorous::BLUES.eval_continuous(0.));
        assert_eq!((lo.0, lo.1, lo.2), (first.0, first.1, first.2));
    }
}
