use magnetar_analysis::{Comparison, PolarResolution, ResolutionRun};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "angular-resolution",
    about = "Moments of inertia and ellipticity convergence with the polar resolution"
)]
struct Opt {
    /// Inertia tensor table of the run with 8 polar cells
    #[structopt(long)]
    theta8: Option<String>,
    /// Inertia tensor table of the run with 16 polar cells
    #[structopt(long)]
    theta16: Option<String>,
    /// Inertia tensor table of the run with 32 polar cells
    #[structopt(long)]
    theta32: Option<String>,
    /// Compare the runs up to this time [s]
    #[structopt(long, default_value = "20")]
    t_max: f64,
    /// Plot filename
    #[structopt(short, long, default_value = "Angular_Res_Comparison.png")]
    output: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let paths: Vec<_> = [
        (PolarResolution::Eight, opt.theta8),
        (PolarResolution::Sixteen, opt.theta16),
        (PolarResolution::ThirtyTwo, opt.theta32),
    ]
    .into_iter()
    .filter_map(|(resolution, path)| path.map(|path| (resolution, path)))
    .collect();
    if paths.is_empty() {
        anyhow::bail!("at least one of --theta8, --theta16 or --theta32 is required");
    }

    let runs = ResolutionRun::load_all(paths)?;
    let mut comparison = Comparison::new(runs)?;
    comparison.truncate(opt.t_max);
    comparison.summary();
    comparison.plot(&opt.output)?;

    Ok(())
}
