use crate::{
    archive::ArchiveError, definitions::DefinitionsError, inertia::InertiaError,
    resolution::ResolutionError,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error in the `inertia` module")]
    Inertia(#[from] InertiaError),
    #[error("Error in the `resolution` module")]
    Resolution(#[from] ResolutionError),
    #[error("Error in the `definitions` module")]
    Definitions(#[from] DefinitionsError),
    #[error("Error in the `archive` module")]
    Archive(#[from] ArchiveError),
    #[cfg(feature = "plot")]
    #[error("Error in the `plot` module")]
    Plot(#[from] crate::plot::PlotError),
}
