//! # Magnetar simulation analysis
//!
//! Post-processing of the PLUTO magnetised star runs:
//!  - [`Inertia`]: principal moments of inertia time series and the stellar ellipticity
//!  - [`Comparison`]: the same quantities compared across polar angular resolutions
//!  - [`MagneticField`]: the analytic interior/exterior field the star is initialized with
//!  - [`Archiver`]: copies every n-th simulation dump to an external drive

pub mod archive;
pub mod bfield;
pub mod definitions;
mod error;
pub mod inertia;
#[cfg(feature = "plot")]
pub mod plot;
pub mod resolution;

pub use archive::{ArchiveReport, Archiver};
pub use bfield::{FieldComponents, FieldProfile, MagneticField, RadialGrid};
pub use definitions::{Definitions, Units};
pub use error::Error;
pub use inertia::{Inertia, InertiaLoader, Moment};
pub use resolution::{Comparison, PolarResolution, ResolutionRun};
