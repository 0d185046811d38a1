use magnetar_analysis::Inertia;
use std::time::{SystemTime, UNIX_EPOCH};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "moi-ellipticity",
    about = "Principal moments of inertia and ellipticity of a magnetar run"
)]
struct Opt {
    /// Path to the inertia tensor table
    #[structopt(default_value = "InertiaTensorData.csv")]
    path: String,
    /// Start time
    #[structopt(short, long)]
    start: Option<f64>,
    /// End time
    #[structopt(short, long)]
    end: Option<f64>,
    /// Save the moments, the ellipticity and the normalized moments to a CSV file
    #[structopt(long)]
    csv: Option<String>,
    /// Plot filename
    #[structopt(short, long, default_value = "MOI_ellip.png")]
    output: String,
    /// Suffix the plot filename with the current Unix time in seconds,
    /// e.g. `MOI_ellip_1760745600.png`
    #[structopt(long)]
    timestamp: bool,
    /// Skip the plot
    #[structopt(long)]
    no_plot: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let mut loader = Inertia::loader().path(&opt.path);
    if let Some(arg) = opt.start {
        loader = loader.start_time(arg);
    }
    if let Some(arg) = opt.end {
        loader = loader.end_time(arg);
    }
    let inertia = loader.load()?;
    inertia.summary();

    if let Some(filename) = opt.csv {
        inertia.to_csv(filename)?;
    }
    if !opt.no_plot {
        let filename = if opt.timestamp {
            let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
            match opt.output.rsplit_once('.') {
                Some((stem, ext)) => format!("{}_{}.{}", stem, now, ext),
                None => format!("{}_{}", opt.output, now),
            }
        } else {
            opt.output
        };
        inertia.plot(filename)?;
    }
    Ok(())
}
