//! Principal moments of inertia of the star and its ellipticity
//!
//! The simulation writes the diagonal of the inertia tensor at every output
//! step into a whitespace delimited text file:
//! ```text
//! t        Ixx          Iyy          Izz
//! 0.0      1.2345e44    1.2345e44    1.2401e44
//! ...
//! ```
//! The ellipticity is computed with respect to the moment about the
//! rotation axis at t=0: `(Izz(t)-Ixx(t))/Izz(0)`.

use flate2::read::GzDecoder;
use itertools::Itertools;
use serde::Deserialize;
use std::{
    fmt,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    time::Instant,
};
use strum_macros::EnumIter;

#[cfg(feature = "plot")]
use crate::plot::{drawing, minmax, padded, rgb, PlotError};
#[cfg(feature = "plot")]
use plotters::prelude::*;
#[cfg(feature = "plot")]
use strum::IntoEnumIterator;

#[derive(thiserror::Error, Debug)]
pub enum InertiaError {
    #[error("failed to open the inertia tensor file")]
    Io(#[from] std::io::Error),
    #[error("failed to (de)serialize the inertia tensor table")]
    Csv(#[from] csv::Error),
    #[error("the inertia tensor table {0:?} is empty")]
    Empty(PathBuf),
    #[error("no record at t=0 to normalize by")]
    MissingReference,
    #[error("{0} is zero at t=0")]
    ZeroReference(Moment),
    #[cfg(feature = "plot")]
    #[error("failed to plot the moments of inertia")]
    Plot(#[from] PlotError),
}
type Result<T> = std::result::Result<T, InertiaError>;

/// Number of decimals the time stamps are rounded to, halves round to even
pub const TIME_DECIMALS: i32 = 4;

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}
/// Integer key of a rounded time stamp, used to match records across tables
pub(crate) fn time_key(time: f64) -> i64 {
    (time * 10f64.powi(TIME_DECIMALS)).round_ties_even() as i64
}

/// Principal moments of inertia
#[derive(EnumIter, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moment {
    Ixx,
    Iyy,
    Izz,
}
impl fmt::Display for Moment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Moment::Ixx => write!(f, "Ixx"),
            Moment::Iyy => write!(f, "Iyy"),
            Moment::Izz => write!(f, "Izz"),
        }
    }
}

#[derive(Deserialize, Debug)]
struct Record {
    #[serde(alias = "time", alias = "Time")]
    t: f64,
    #[serde(rename = "Ixx", alias = "ixx")]
    ixx: f64,
    #[serde(rename = "Iyy", alias = "iyy")]
    iyy: f64,
    #[serde(rename = "Izz", alias = "izz")]
    izz: f64,
}

/// Rewrites whitespace delimited lines as comma delimited ones
fn to_comma_delimited(contents: &str) -> String {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if line.contains(',') {
                line.split(',').map(str::trim).join(",")
            } else {
                line.split_whitespace().join(",")
            }
        })
        .join("\n")
}

/// Inertia tensor table loader
pub struct InertiaLoader {
    path: PathBuf,
    time_range: (f64, f64),
    decimals: i32,
}
impl Default for InertiaLoader {
    fn default() -> Self {
        Self {
            path: PathBuf::from("InertiaTensorData.csv"),
            time_range: (f64::NEG_INFINITY, f64::INFINITY),
            decimals: TIME_DECIMALS,
        }
    }
}
impl InertiaLoader {
    /// Directory the default "InertiaTensorData.csv" file is in
    pub fn data_path<P: AsRef<Path>>(self, data_path: P) -> Self {
        let filename = self
            .path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("InertiaTensorData.csv"));
        Self {
            path: data_path.as_ref().join(filename),
            ..self
        }
    }
    /// Full path to the table
    pub fn path<P: AsRef<Path>>(self, path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..self
        }
    }
    pub fn start_time(self, time: f64) -> Self {
        Self {
            time_range: (time, self.time_range.1),
            ..self
        }
    }
    pub fn end_time(self, time: f64) -> Self {
        Self {
            time_range: (self.time_range.0, time),
            ..self
        }
    }
    /// Number of decimals the time stamps are rounded to (default: 4)
    pub fn decimals(self, decimals: i32) -> Self {
        Self { decimals, ..self }
    }
    fn decompress(&self) -> Result<String> {
        let mut contents = String::new();
        let file = File::open(&self.path)?;
        log::info!("Loading {:?}...", self.path);
        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some("gz") | Some("z") => {
                GzDecoder::new(file).read_to_string(&mut contents)?;
            }
            _ => {
                let mut file = file;
                file.read_to_string(&mut contents)?;
            }
        }
        Ok(contents)
    }
    pub fn load(self) -> Result<Inertia> {
        let now = Instant::now();
        let contents = to_comma_delimited(&self.decompress()?);
        let mut rdr = csv::Reader::from_reader(contents.as_bytes());

        let mut inertia = Inertia::default();
        for result in rdr.deserialize() {
            let record: Record = result?;
            let time = round_to(record.t, self.decimals);
            if time < self.time_range.0 || time > self.time_range.1 {
                continue;
            }
            inertia.time.push(time);
            inertia.ixx.push(record.ixx);
            inertia.iyy.push(record.iyy);
            inertia.izz.push(record.izz);
        }
        if inertia.is_empty() {
            return Err(InertiaError::Empty(self.path));
        }
        log::info!(
            "... loaded {} records in {}ms",
            inertia.len(),
            now.elapsed().as_millis()
        );
        Ok(inertia)
    }
}

/// Principal moments of inertia time series
#[derive(Default, Debug, Clone)]
pub struct Inertia {
    pub time: Vec<f64>,
    pub ixx: Vec<f64>,
    pub iyy: Vec<f64>,
    pub izz: Vec<f64>,
}
impl Inertia {
    pub fn loader() -> InertiaLoader {
        InertiaLoader::default()
    }
    pub fn len(&self) -> usize {
        self.time.len()
    }
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
    pub fn moment(&self, moment: Moment) -> &[f64] {
        match moment {
            Moment::Ixx => &self.ixx,
            Moment::Iyy => &self.iyy,
            Moment::Izz => &self.izz,
        }
    }
    /// Index of the t=0 record
    fn reference_index(&self) -> Result<usize> {
        self.time
            .iter()
            .position(|&t| time_key(t) == 0)
            .ok_or(InertiaError::MissingReference)
    }
    /// Value of a moment at t=0
    pub fn reference(&self, moment: Moment) -> Result<f64> {
        let value = self.moment(moment)[self.reference_index()?];
        if value == 0. {
            Err(InertiaError::ZeroReference(moment))
        } else {
            Ok(value)
        }
    }
    /// Moment of inertia normalized to its value at t=0
    pub fn normalized(&self, moment: Moment) -> Result<Vec<f64>> {
        let i_0 = self.reference(moment)?;
        Ok(self.moment(moment).iter().map(|i| i / i_0).collect())
    }
    /// Stellar ellipticity `(Izz-Ixx)/Izz(t=0)`
    pub fn ellipticity(&self) -> Result<Vec<f64>> {
        let izz_0 = self.reference(Moment::Izz)?;
        Ok(self
            .izz
            .iter()
            .zip(&self.ixx)
            .map(|(izz, ixx)| (izz - ixx) / izz_0)
            .collect())
    }
    fn retain<F: Fn(f64) -> bool>(&mut self, keep: F) {
        let mask: Vec<bool> = self.time.iter().map(|&t| keep(t)).collect();
        for column in [&mut self.time, &mut self.ixx, &mut self.iyy, &mut self.izz] {
            let mut k = 0;
            column.retain(|_| {
                let keep = mask[k];
                k += 1;
                keep
            });
        }
    }
    /// Keeps the records up to `t_max` included
    pub fn truncate(&mut self, t_max: f64) -> &mut Self {
        self.retain(|t| t <= t_max);
        self
    }
    pub fn summary(&self) {
        println!("SUMMARY:");
        println!(" - # of records: {}", self.len());
        if let Some((t0, t1)) = self.time.iter().cloned().minmax().into_option() {
            println!(" - time range: [{:8.3}-{:8.3}]s", t0, t1);
        }
        println!("    {:^6}: ({:^12}, {:^12})", "MOMENT", "MIN", "MAX");
        for moment in [Moment::Ixx, Moment::Iyy, Moment::Izz] {
            if let Some((min, max)) = self.moment(moment).iter().cloned().minmax().into_option() {
                println!("  - {:6}: ({:>12.4e}, {:>12.4e})", moment.to_string(), min, max);
            }
        }
        match self.ellipticity() {
            Ok(ellipticity) => {
                if let Some((min, max)) = ellipticity.iter().cloned().minmax().into_option() {
                    println!(" - ellipticity range: [{:.4e}, {:.4e}]", min, max);
                }
            }
            Err(e) => println!(" - ellipticity: {}", e),
        }
    }
    /// Writes the moments, the ellipticity and the normalized moments to a CSV file
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let ellipticity = self.ellipticity()?;
        let normalized = [
            self.normalized(Moment::Ixx)?,
            self.normalized(Moment::Iyy)?,
            self.normalized(Moment::Izz)?,
        ];
        let mut wtr = csv::Writer::from_path(path.as_ref())?;
        wtr.write_record([
            "t",
            "Ixx",
            "Iyy",
            "Izz",
            "ellip",
            "Ixx_normalized",
            "Iyy_normalized",
            "Izz_normalized",
        ])?;
        for k in 0..self.len() {
            wtr.write_record(&[
                format!("{}", self.time[k]),
                format!("{:e}", self.ixx[k]),
                format!("{:e}", self.iyy[k]),
                format!("{:e}", self.izz[k]),
                format!("{}", ellipticity[k]),
                format!("{}", normalized[0][k]),
                format!("{}", normalized[1][k]),
                format!("{}", normalized[2][k]),
            ])?;
        }
        wtr.flush()?;
        log::info!("Inertia table written to {:?}", path.as_ref());
        Ok(())
    }
    /// Plots the moments of inertia (top) and the ellipticity (bottom)
    #[cfg(feature = "plot")]
    pub fn plot<P: AsRef<Path>>(&self, filename: P) -> Result<()> {
        let time_range = minmax(self.time.iter().cloned()).ok_or(PlotError::Empty)?;
        let ellipticity = self.ellipticity()?;
        let moi_range = minmax(self.ixx.iter().chain(&self.iyy).chain(&self.izz).cloned())
            .ok_or(PlotError::Empty)?;
        let ellipticity_range = minmax(ellipticity.iter().cloned()).ok_or(PlotError::Empty)?;

        let root = BitMapBackend::new(filename.as_ref(), (1800, 1400)).into_drawing_area();
        root.fill(&WHITE).map_err(drawing)?;
        let panels = root.split_evenly((2, 1));

        let mut chart = ChartBuilder::on(&panels[0])
            .caption("Principal Moments of Inertia", ("sans-serif", 32))
            .set_label_area_size(LabelAreaPosition::Left, 110)
            .set_label_area_size(LabelAreaPosition::Bottom, 50)
            .margin(20)
            .build_cartesian_2d(padded(time_range, 0.), padded(moi_range, 0.05))
            .map_err(drawing)?;
        chart
            .configure_mesh()
            .y_label_formatter(&|y: &f64| format!("{:.3e}", y))
            .draw()
            .map_err(drawing)?;
        for (moment, color) in Moment::iter().zip(colorous::TABLEAU10.iter()) {
            let color = rgb(*color);
            chart
                .draw_series(LineSeries::new(
                    self.time
                        .iter()
                        .cloned()
                        .zip(self.moment(moment).iter().cloned()),
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

        let purple = RGBColor(128, 0, 128);
        let mut chart = ChartBuilder::on(&panels[1])
            .caption("Stellar Ellipticity", ("sans-serif", 32))
            .set_label_area_size(LabelAreaPosition::Left, 110)
            .set_label_area_size(LabelAreaPosition::Bottom, 50)
            .margin(20)
            .build_cartesian_2d(padded(time_range, 0.), padded(ellipticity_range, 0.05))
            .map_err(drawing)?;
        chart
            .configure_mesh()
            .x_desc("Time (s)")
            .draw()
            .map_err(drawing)?;
        chart
            .draw_series(LineSeries::new(
                self.time.iter().cloned().zip(ellipticity.iter().cloned()),
                &purple,
            ))
            .map_err(drawing)?
            .label("Ellipticity")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &purple));
        chart
            .configure_series_labels()
            .border_style(&BLACK)
            .background_style(&WHITE.mix(0.8))
            .position(SeriesLabelPosition::UpperRight)
            .draw()
            .map_err(drawing)?;

        root.present().map_err(drawing)?;
        log::info!("Moments of inertia plot written to {:?}", filename.as_ref());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::scratch_dir;
    use assert_approx_eq::assert_approx_eq;
    use flate2::{write::GzEncoder, Compression};
    use std::{fs, io::Write};

    const TABLE: &str = "t        Ixx        Iyy        Izz        Ixy
0.00001  1.00e44    1.00e44    1.10e44    0.0
0.50004  0.98e44    0.99e44    1.08e44    0.0
1.0      0.95e44    0.97e44    1.06e44    0.0
";

    fn write_table(name: &str, contents: &str) -> PathBuf {
        let path = scratch_dir(name).join("InertiaTensorData.csv");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn load_whitespace_table() {
        let path = write_table("load", TABLE);
        let inertia = Inertia::loader().path(&path).load().unwrap();
        assert_eq!(inertia.len(), 3);
        assert_eq!(inertia.time, vec![0., 0.5, 1.]);
        assert_approx_eq!(inertia.izz[1], 1.08e44, 1e30);
    }

    #[test]
    fn load_from_data_path() {
        let path = write_table("data_path", TABLE);
        let inertia = InertiaLoader::default()
            .data_path(path.parent().unwrap())
            .load()
            .unwrap();
        assert_eq!(inertia.len(), 3);
    }

    #[test]
    fn load_comma_table() {
        let path = write_table("comma", "t, Ixx, Iyy, Izz\n0, 1, 1, 2\n1, 1, 1, 3\n");
        let inertia = Inertia::loader().path(&path).load().unwrap();
        assert_eq!(inertia.izz, vec![2., 3.]);
    }

    #[test]
    fn load_gzip_table() {
        let path = scratch_dir("gzip").join("InertiaTensorData.csv.gz");
        let mut gz = GzEncoder::new(fs::File::create(&path).unwrap(), Compression::default());
        gz.write_all(TABLE.as_bytes()).unwrap();
        gz.finish().unwrap();
        let inertia = Inertia::loader().path(&path).load().unwrap();
        assert_eq!(inertia.len(), 3);
    }

    #[test]
    fn time_window() {
        let path = write_table("window", TABLE);
        let inertia = Inertia::loader()
            .path(&path)
            .start_time(0.25)
            .end_time(0.75)
            .load()
            .unwrap();
        assert_eq!(inertia.time, vec![0.5]);
    }

    #[test]
    fn empty_table() {
        let path = write_table("empty", "t Ixx Iyy Izz\n");
        assert!(matches!(
            Inertia::loader().path(&path).load(),
            Err(InertiaError::Empty(_))
        ));
    }

    #[test]
    fn bad_value() {
        let path = write_table("bad", "t Ixx Iyy Izz\n0 1 one 1\n");
        assert!(matches!(
            Inertia::loader().path(&path).load(),
            Err(InertiaError::Csv(_))
        ));
    }

    #[test]
    fn ellipticity() {
        let path = write_table("ellipticity", TABLE);
        let inertia = Inertia::loader().path(&path).load().unwrap();
        let ellipticity = inertia.ellipticity().unwrap();
        assert_approx_eq!(ellipticity[0], 0.1 / 1.1);
        assert_approx_eq!(ellipticity[2], (1.06 - 0.95) / 1.1);
    }

    #[test]
    fn normalized() {
        let path = write_table("normalized", TABLE);
        let inertia = Inertia::loader().path(&path).load().unwrap();
        let ixx = inertia.normalized(Moment::Ixx).unwrap();
        assert_approx_eq!(ixx[0], 1.);
        assert_approx_eq!(ixx[2], 0.95);
    }

    #[test]
    fn missing_reference() {
        let path = write_table("reference", TABLE);
        let inertia = Inertia::loader().path(&path).start_time(0.1).load().unwrap();
        assert!(matches!(
            inertia.ellipticity(),
            Err(InertiaError::MissingReference)
        ));
    }

    #[test]
    fn zero_reference() {
        let path = write_table("zero", "t Ixx Iyy Izz\n0 0 1 1\n1 1 1 1\n");
        let inertia = Inertia::loader().path(&path).load().unwrap();
        assert!(matches!(
            inertia.normalized(Moment::Ixx),
            Err(InertiaError::ZeroReference(Moment::Ixx))
        ));
        assert!(inertia.ellipticity().is_ok());
    }

    #[test]
    fn truncate() {
        let path = write_table("truncate", TABLE);
        let mut inertia = Inertia::loader().path(&path).load().unwrap();
        inertia.truncate(0.5);
        assert_eq!(inertia.time, vec![0., 0.5]);
        assert_eq!(inertia.ixx.len(), 2);
        assert_eq!(inertia.izz.len(), 2);
    }

    #[test]
    fn csv_output() {
        let path = write_table("csv", TABLE);
        let inertia = Inertia::loader().path(&path).load().unwrap();
        let output = path.with_file_name("derived.csv");
        inertia.to_csv(&output).unwrap();
        let contents = fs::read_to_string(&output).unwrap();
        let mut lines = contents.lines();
        assert!(lines.next().unwrap().starts_with("t,Ixx,Iyy,Izz,ellip"));
        assert_eq!(lines.count(), 3);
    }

    #[test]
    fn half_step_rounds_to_even() {
        assert_eq!(round_to(0.5, 0), 0.);
        assert_eq!(round_to(1.5, 0), 2.);
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(0.375, 2), 0.38);
        assert_eq!(time_key(1.00004), 10000);
    }

    #[cfg(feature = "plot")]
    #[test]
    fn plot() {
        let path = write_table("plot", TABLE);
        let inertia = Inertia::loader().path(&path).load().unwrap();
        let filename = path.with_file_name("MOI_ellip.png");
        inertia.plot(&filename).unwrap();
        assert!(filename.is_file());
        assert!(matches!(
            Inertia::default().plot(path.with_file_name("empty.png")),
            Err(InertiaError::Plot(PlotError::Empty))
        ));
    }
}
