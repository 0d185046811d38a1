//! Convergence of the moments of inertia with the polar angular resolution
//!
//! Runs performed with 8, 16 and 32 cells along the polar axis are joined
//! on their common time stamps and their moments of inertia normalized to
//! t=0 are compared side by side.

use crate::inertia::{time_key, Inertia, InertiaError, InertiaLoader, Moment};
use rayon::prelude::*;
use std::{
    collections::{BTreeMap, BTreeSet},
    f64::consts::PI,
    fmt,
    path::Path,
};
use strum_macros::EnumIter;

#[cfg(feature = "plot")]
use crate::plot::{drawing, minmax, padded, sample, PlotError};
#[cfg(feature = "plot")]
use plotters::prelude::*;

#[derive(thiserror::Error, Debug)]
pub enum ResolutionError {
    #[error("{0} is not a valid polar resolution, expected 8, 16 or 32")]
    Cells(u32),
    #[error("failed to load the {resolution} run")]
    Load {
        resolution: PolarResolution,
        #[source]
        source: InertiaError,
    },
    #[error("no run to compare")]
    NoRuns,
    #[error("{0} run is given more than once")]
    Duplicate(PolarResolution),
    #[error("the runs do not share any time stamp")]
    NoOverlap,
    #[cfg(feature = "plot")]
    #[error("failed to plot the resolution comparison")]
    Plot(#[from] PlotError),
}
type Result<T> = std::result::Result<T, ResolutionError>;

/// Number of cells along the polar axis `(0,pi)`
#[derive(EnumIter, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PolarResolution {
    Eight,
    Sixteen,
    ThirtyTwo,
}
impl PolarResolution {
    pub fn new(cells: u32) -> Result<Self> {
        use PolarResolution::*;
        match cells {
            8 => Ok(Eight),
            16 => Ok(Sixteen),
            32 => Ok(ThirtyTwo),
            _ => Err(ResolutionError::Cells(cells)),
        }
    }
    pub fn cells(&self) -> u32 {
        use PolarResolution::*;
        match self {
            Eight => 8,
            Sixteen => 16,
            ThirtyTwo => 32,
        }
    }
    /// Angular size of a cell [rd]
    pub fn cell_width(&self) -> f64 {
        PI / self.cells() as f64
    }
    pub fn to_pretty_string(&self) -> String {
        format!("Δθ,φ = π/{}", self.cells())
    }
}
impl fmt::Display for PolarResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "theta{}", self.cells())
    }
}

/// Moments of inertia of a run at a given polar resolution
#[derive(Debug, Clone)]
pub struct ResolutionRun {
    pub resolution: PolarResolution,
    pub inertia: Inertia,
}
impl ResolutionRun {
    pub fn new(resolution: PolarResolution, inertia: Inertia) -> Self {
        Self {
            resolution,
            inertia,
        }
    }
    /// Loads the inertia tensor table at `path`
    pub fn load<P: AsRef<Path>>(resolution: PolarResolution, path: P) -> Result<Self> {
        InertiaLoader::default()
            .path(path)
            .load()
            .map(|inertia| Self::new(resolution, inertia))
            .map_err(|source| ResolutionError::Load { resolution, source })
    }
    /// Loads several runs in parallel
    pub fn load_all<P>(paths: Vec<(PolarResolution, P)>) -> Result<Vec<Self>>
    where
        P: AsRef<Path> + Send,
    {
        paths
            .into_par_iter()
            .map(|(resolution, path)| Self::load(resolution, path))
            .collect()
    }
}

/// Normalized moments of inertia and ellipticity of one run
#[derive(Debug, Clone)]
pub struct NormalizedRun {
    pub resolution: PolarResolution,
    pub ixx: Vec<f64>,
    pub iyy: Vec<f64>,
    pub izz: Vec<f64>,
    pub ellipticity: Vec<f64>,
    /// ellipticity at t=0
    pub ellipticity_0: f64,
}
impl NormalizedRun {
    pub fn moment(&self, moment: Moment) -> &[f64] {
        match moment {
            Moment::Ixx => &self.ixx,
            Moment::Iyy => &self.iyy,
            Moment::Izz => &self.izz,
        }
    }
    fn columns_mut(&mut self) -> [&mut Vec<f64>; 4] {
        [
            &mut self.ixx,
            &mut self.iyy,
            &mut self.izz,
            &mut self.ellipticity,
        ]
    }
}

/// Runs joined on their common time stamps
#[derive(Debug, Clone)]
pub struct Comparison {
    pub time: Vec<f64>,
    pub runs: Vec<NormalizedRun>,
}
impl Comparison {
    /// Inner join of the runs on time, records with a NaN in any run are dropped
    pub fn new(mut runs: Vec<ResolutionRun>) -> Result<Self> {
        if runs.is_empty() {
            return Err(ResolutionError::NoRuns);
        }
        runs.sort_by_key(|run| run.resolution);
        if let Some(pair) = runs.windows(2).find(|w| w[0].resolution == w[1].resolution) {
            return Err(ResolutionError::Duplicate(pair[0].resolution));
        }

        let indices: Vec<BTreeMap<i64, usize>> = runs
            .iter()
            .map(|run| {
                let mut index = BTreeMap::new();
                for (k, &t) in run.inertia.time.iter().enumerate() {
                    index.entry(time_key(t)).or_insert(k);
                }
                index
            })
            .collect();
        let mut keys: BTreeSet<i64> = indices[0].keys().cloned().collect();
        for index in &indices[1..] {
            keys.retain(|key| index.contains_key(key));
        }

        let mut normalized = Vec::with_capacity(runs.len());
        for run in &runs {
            let load_err = |source: InertiaError| ResolutionError::Load {
                resolution: run.resolution,
                source,
            };
            let inertia = &run.inertia;
            let ellipticity = inertia.ellipticity().map_err(load_err)?;
            let izz_0 = inertia.reference(Moment::Izz).map_err(load_err)?;
            let ixx_0 = inertia.reference(Moment::Ixx).map_err(load_err)?;
            normalized.push((
                run.resolution,
                [
                    inertia.normalized(Moment::Ixx).map_err(load_err)?,
                    inertia.normalized(Moment::Iyy).map_err(load_err)?,
                    inertia.normalized(Moment::Izz).map_err(load_err)?,
                    ellipticity,
                ],
                (izz_0 - ixx_0) / izz_0,
            ));
        }

        let mut time = vec![];
        let mut joined: Vec<NormalizedRun> = normalized
            .iter()
            .map(|(resolution, _, ellipticity_0)| NormalizedRun {
                resolution: *resolution,
                ixx: vec![],
                iyy: vec![],
                izz: vec![],
                ellipticity: vec![],
                ellipticity_0: *ellipticity_0,
            })
            .collect();
        for key in keys {
            let rows: Vec<usize> = indices.iter().map(|index| index[&key]).collect();
            let complete = normalized
                .iter()
                .zip(&rows)
                .all(|((_, columns, _), &k)| columns.iter().all(|c| !c[k].is_nan()));
            if !complete {
                continue;
            }
            time.push(runs[0].inertia.time[rows[0]]);
            for ((run, (_, columns, _)), &k) in joined.iter_mut().zip(&normalized).zip(&rows) {
                for (joined_column, column) in run.columns_mut().into_iter().zip(columns) {
                    joined_column.push(column[k]);
                }
            }
        }
        if time.is_empty() {
            return Err(ResolutionError::NoOverlap);
        }
        log::info!(
            "{} runs joined on {} time stamps",
            joined.len(),
            time.len()
        );
        Ok(Self { time, runs: joined })
    }
    pub fn len(&self) -> usize {
        self.time.len()
    }
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
    /// Keeps the records up to `t_max` included
    pub fn truncate(&mut self, t_max: f64) -> &mut Self {
        let n = self.time.iter().take_while(|&&t| t <= t_max).count();
        self.time.truncate(n);
        for run in self.runs.iter_mut() {
            for column in run.columns_mut() {
                column.truncate(n);
            }
        }
        self
    }
    pub fn summary(&self) {
        println!("SUMMARY:");
        println!(" - # of common records: {}", self.len());
        if let (Some(t0), Some(t1)) = (self.time.first(), self.time.last()) {
            println!(" - time range: [{:8.3}-{:8.3}]s", t0, t1);
        }
        println!(
            "    {:^8}: ({:^10}, {:^10}, {:^10})",
            "RUN", "Ixx/Ixx0", "Izz/Izz0", "ELLIP."
        );
        for run in &self.runs {
            if let (Some(ixx), Some(izz), Some(e)) = (
                run.ixx.last(),
                run.izz.last(),
                run.ellipticity.last(),
            ) {
                println!(
                    "  - {:8}: ({:>10.4}, {:>10.4}, {:>10.4})",
                    run.resolution.to_string(),
                    ixx,
                    izz,
                    e
                );
            }
        }
    }
    /// Plots the normalized moments (left) and the ellipticity (right), one row per resolution
    #[cfg(feature = "plot")]
    pub fn plot<P: AsRef<Path>>(&self, filename: P) -> Result<()> {
        let time_range = padded(
            minmax(self.time.iter().cloned()).ok_or(PlotError::Empty)?,
            0.,
        );
        let n_runs = self.runs.len();
        // colormap normalization: vmin=1-3, vmax=n+1
        let (vmin, vmax) = (-2f64, n_runs as f64 + 1.);

        let root = BitMapBackend::new(filename.as_ref(), (1800, 360 * n_runs as u32 + 120))
            .into_drawing_area();
        root.fill(&WHITE).map_err(drawing)?;
        let (labels, panels) = root.split_horizontally(260);
        let label_rows = labels.split_evenly((n_runs, 1));
        let rows = panels.split_evenly((n_runs, 2));

        for (k, run) in self.runs.iter().enumerate() {
            let value = k as f64 + 1.;
            let ixx_color = sample(colorous::BLUES, value, vmin, vmax);
            let izz_color = sample(colorous::ORANGE_RED, value, vmin, vmax);
            let ellipticity_color = sample(colorous::BLUE_PURPLE, value, vmin, vmax);
            let last_row = k + 1 == n_runs;

            let (_, height) = label_rows[k].dim_in_pixel();
            label_rows[k]
                .draw(&Text::new(
                    format!(
                        "{}) {}",
                        (b'a' + k as u8) as char,
                        run.resolution.to_pretty_string()
                    ),
                    (10, height as i32 / 2),
                    ("sans-serif", 28).into_font(),
                ))
                .map_err(drawing)?;

            let mut builder = ChartBuilder::on(&rows[2 * k]);
            builder
                .set_label_area_size(LabelAreaPosition::Left, 60)
                .set_label_area_size(LabelAreaPosition::Bottom, 45)
                .margin(10);
            if k == 0 {
                builder.caption("Normalized Principal Moments of Inertia", ("sans-serif", 24));
            }
            let mut chart = builder
                .build_cartesian_2d(time_range.clone(), 0.2f64..1.1f64)
                .map_err(drawing)?;
            let mut mesh = chart.configure_mesh();
            if last_row {
                mesh.x_desc("Time (s)");
            }
            mesh.draw().map_err(drawing)?;
            for (moment, color) in [(Moment::Ixx, ixx_color), (Moment::Izz, izz_color)] {
                chart
                    .draw_series(LineSeries::new(
                        self.time
                            .iter()
                            .cloned()
                            .zip(run.moment(moment).iter().cloned()),
                        &color,
                    ))
                    .map_err(drawing)?
                    .label(moment.to_string())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
            }
            chart
                .configure_series_labels()
                .border_style(&BLACK)
                .background_style(&WHITE.mix(0.8))
                .position(SeriesLabelPosition::UpperRight)
                .draw()
                .map_err(drawing)?;

            let mut builder = ChartBuilder::on(&rows[2 * k + 1]);
            builder
                .set_label_area_size(LabelAreaPosition::Left, 60)
                .set_label_area_size(LabelAreaPosition::Bottom, 45)
                .margin(10);
            if k == 0 {
                builder.caption("Ellipticity", ("sans-serif", 24));
            }
            let mut chart = builder
                .build_cartesian_2d(time_range.clone(), -0.15f64..0.15f64)
                .map_err(drawing)?;
            let mut mesh = chart.configure_mesh();
            if last_row {
                mesh.x_desc("Time (s)");
            }
            mesh.draw().map_err(drawing)?;
            // error band: [ellipticity - ellipticity(t=0), ellipticity]
            let band: Vec<(f64, f64)> = self
                .time
                .iter()
                .cloned()
                .zip(run.ellipticity.iter().cloned())
                .chain(
                    self.time
                        .iter()
                        .cloned()
                        .zip(run.ellipticity.iter().map(|e| e - run.ellipticity_0))
                        .rev(),
                )
                .collect();
            chart
                .draw_series(std::iter::once(Polygon::new(
                    band,
                    ellipticity_color.mix(0.3).filled(),
                )))
                .map_err(drawing)?;
            chart
                .draw_series(DashedLineSeries::new(
                    vec![(time_range.start, 0.), (time_range.end, 0.)],
                    10,
                    5,
                    RGBColor(0x94, 0x94, 0x94).stroke_width(2),
                ))
                .map_err(drawing)?;
            chart
                .draw_series(LineSeries::new(
                    self.time.iter().cloned().zip(run.ellipticity.iter().cloned()),
                    &ellipticity_color,
                ))
                .map_err(drawing)?
                .label("ε")
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], &ellipticity_color)
                });
            chart
                .configure_series_labels()
                .border_style(&BLACK)
                .background_style(&WHITE.mix(0.8))
                .position(SeriesLabelPosition::UpperLeft)
                .draw()
                .map_err(drawing)?;
        }

        root.present().map_err(drawing)?;
        log::info!("Resolution comparison written to {:?}", filename.as_ref());
        Ok(())
    }
}
