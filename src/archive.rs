//! Archiving of the simulation dumps
//!
//! PLUTO writes one `data.NNNN.vtk` file per output step; only every n-th
//! of them is copied to the archive drive.

use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

#[derive(thiserror::Error, Debug)]
pub enum ArchiveError {
    #[error("failed to copy the dumps")]
    Io(#[from] std::io::Error),
    #[error("invalid dump search pattern")]
    Pattern(#[from] glob::PatternError),
    #[error("failed to list the dumps")]
    Glob(#[from] glob::GlobError),
    #[error("failed to compile the dump filename pattern")]
    Regex(#[from] regex::Error),
    #[error("the archiving stride must be at least 1")]
    Stride,
    #[error("source directory {0:?} not found")]
    Source(PathBuf),
    #[error("source directory {0:?} is not a valid UTF-8 path")]
    NonUtf8(PathBuf),
}
type Result<T> = std::result::Result<T, ArchiveError>;

/// Outcome of an archiving pass
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ArchiveReport {
    /// dumps copied (or to be copied on a dry run)
    pub copied: Vec<PathBuf>,
    /// dumps already in the archive
    pub present: usize,
    /// dumps not on the stride
    pub skipped: usize,
    /// files named like a dump but without a dump index, or dumps with the
    /// same name as a dump already selected in this pass
    pub ignored: usize,
}
impl ArchiveReport {
    pub fn summary(&self) {
        println!("ARCHIVE:");
        println!(" - copied : {}", self.copied.len());
        println!(" - present: {}", self.present);
        println!(" - skipped: {}", self.skipped);
        println!(" - ignored: {}", self.ignored);
    }
}

/// Copies every `stride`-th dump from `source` to `destination`
pub struct Archiver {
    source: PathBuf,
    destination: PathBuf,
    stride: u64,
    dry_run: bool,
}
impl Archiver {
    pub fn new<S: AsRef<Path>, D: AsRef<Path>>(source: S, destination: D) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            destination: destination.as_ref().to_path_buf(),
            stride: 10,
            dry_run: false,
        }
    }
    pub fn stride(self, stride: u64) -> Self {
        Self { stride, ..self }
    }
    /// Reports what would be copied without copying anything
    pub fn dry_run(self, dry_run: bool) -> Self {
        Self { dry_run, ..self }
    }
    /// All the files below the source directory with "data" in their name
    fn candidates(&self) -> Result<Vec<PathBuf>> {
        let source = self
            .source
            .to_str()
            .ok_or_else(|| ArchiveError::NonUtf8(self.source.clone()))?;
        let pattern = Path::new(&glob::Pattern::escape(source))
            .join("**")
            .join("*data*");
        let mut paths = glob::glob(&pattern.to_string_lossy())?
            .collect::<std::result::Result<Vec<PathBuf>, glob::GlobError>>()?;
        paths.retain(|path| path.is_file());
        paths.sort();
        Ok(paths)
    }
    pub fn run(&self) -> Result<ArchiveReport> {
        if self.stride == 0 {
            return Err(ArchiveError::Stride);
        }
        if !self.source.is_dir() {
            return Err(ArchiveError::Source(self.source.clone()));
        }
        let now = Instant::now();
        let re_dump = Regex::new(r"^data\.(\d+)\.vtk$")?;

        let mut report = ArchiveReport::default();
        // target -> source, dumps are copied flat into the destination
        let mut selected: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();
        for path in self.candidates()? {
            let Some(filename) = path.file_name().and_then(|f| f.to_str()) else {
                report.ignored += 1;
                continue;
            };
            let index = re_dump
                .captures(filename)
                .and_then(|capts| capts[1].parse::<u64>().ok());
            match index {
                None => {
                    log::warn!("{:?} is not a dump, ignored", path);
                    report.ignored += 1;
                }
                Some(index) if index % self.stride != 0 => {
                    report.skipped += 1;
                }
                Some(_) => {
                    let target = self.destination.join(filename);
                    if target.exists() {
                        log::debug!("{:?} already archived", target);
                        report.present += 1;
                    } else if let Some(first) = selected.get(&target) {
                        log::warn!(
                            "{:?} and {:?} are both archived as {:?}, keeping the former",
                            first,
                            path,
                            target
                        );
                        report.ignored += 1;
                    } else {
                        selected.insert(target, path);
                    }
                }
            }
        }

        if self.dry_run {
            for (target, path) in selected {
                log::info!("{:?} -> {:?} (dry run)", path, target);
                report.copied.push(target);
            }
            return Ok(report);
        }

        fs::create_dir_all(&self.destination)?;
        let pb = ProgressBar::new(selected.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("[{eta_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        for (target, path) in selected {
            pb.set_message(target.file_name().map(|f| f.to_string_lossy().into_owned()).unwrap_or_default());
            fs::copy(&path, &target)?;
            log::debug!("{:?} -> {:?}", path, target);
            report.copied.push(target);
            pb.inc(1);
        }
        pb.finish();
        log::info!(
            "{} dumps archived to {:?} in {}s",
            report.copied.len(),
            self.destination,
            now.elapsed().as_secs()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::scratch_dir;

    fn populate(source: &Path) {
        for k in 0..=25 {
            fs::write(source.join(format!("data.{:04}.vtk", k)), format!("{}", k)).unwrap();
        }
        fs::write(source.join("data.log"), "log").unwrap();
        fs::write(source.join("grid.out"), "grid").unwrap();
        let sub = source.join("restart");
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join("data.0030.vtk"), "30").unwrap();
    }

    #[test]
    fn every_tenth() {
        let root = scratch_dir("archive");
        let (source, destination) = (root.join("source"), root.join("drive"));
        fs::create_dir_all(&source).unwrap();
        populate(&source);

        let report = Archiver::new(&source, &destination).run().unwrap();
        let mut copied: Vec<_> = report
            .copied
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        copied.sort();
        assert_eq!(
            copied,
            vec!["data.0000.vtk", "data.0010.vtk", "data.0020.vtk", "data.0030.vtk"]
        );
        assert_eq!(report.skipped, 23);
        assert_eq!(report.ignored, 1);
        assert_eq!(
            fs::read_to_string(destination.join("data.0020.vtk")).unwrap(),
            "20"
        );
        assert!(!destination.join("data.0005.vtk").exists());

        let report = Archiver::new(&source, &destination).run().unwrap();
        assert!(report.copied.is_empty());
        assert_eq!(report.present, 4);
    }

    #[test]
    fn existing_files_are_kept() {
        let root = scratch_dir("archive_keep");
        let (source, destination) = (root.join("source"), root.join("drive"));
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&destination).unwrap();
        populate(&source);
        fs::write(destination.join("data.0010.vtk"), "old").unwrap();

        let report = Archiver::new(&source, &destination).stride(5).run().unwrap();
        assert_eq!(report.copied.len(), 6);
        assert_eq!(report.present, 1);
        assert_eq!(
            fs::read_to_string(destination.join("data.0010.vtk")).unwrap(),
            "old"
        );
    }

    #[test]
    fn dry_run() {
        let root = scratch_dir("archive_dry");
        let (source, destination) = (root.join("source"), root.join("drive"));
        fs::create_dir_all(&source).unwrap();
        populate(&source);

        let report = Archiver::new(&source, &destination)
            .dry_run(true)
            .run()
            .unwrap();
        assert_eq!(report.copied.len(), 4);
        assert!(!destination.exists());
    }

    #[test]
    fn same_name_in_two_directories() {
        let root = scratch_dir("archive_twins");
        let (source, destination) = (root.join("source"), root.join("drive"));
        for (dir, contents) in [("a", "A"), ("b", "B")] {
            fs::create_dir_all(source.join(dir)).unwrap();
            fs::write(source.join(dir).join("data.0010.vtk"), contents).unwrap();
        }

        let report = Archiver::new(&source, &destination).run().unwrap();
        assert_eq!(report.copied, vec![destination.join("data.0010.vtk")]);
        assert_eq!(report.ignored, 1);
        assert_eq!(
            fs::read_to_string(destination.join("data.0010.vtk")).unwrap(),
            "A"
        );
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_source() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};
        let root = scratch_dir("archive_non_utf8");
        let source = root.join(OsStr::from_bytes(b"run\xff"));
        fs::create_dir_all(&source).unwrap();
        assert!(matches!(
            Archiver::new(&source, root.join("drive")).run(),
            Err(ArchiveError::NonUtf8(_))
        ));
    }

    #[test]
    fn invalid_inputs() {
        let root = scratch_dir("archive_invalid");
        assert!(matches!(
            Archiver::new(&root, root.join("drive")).stride(0).run(),
            Err(ArchiveError::Stride)
        ));
        assert!(matches!(
            Archiver::new(root.join("missing"), root.join("drive")).run(),
            Err(ArchiveError::Source(_))
        ));
    }
}
