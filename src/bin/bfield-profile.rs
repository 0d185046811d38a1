use magnetar_analysis::{bfield::R_MAX, Definitions, MagneticField, RadialGrid};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "bfield-profile",
    about = "Radial profile of the analytic stellar magnetic field"
)]
struct Opt {
    /// Polar angle [rd]
    #[structopt(long, default_value = "0.7853981633974483")]
    theta: f64,
    /// Field strength at the pole [G]
    #[structopt(long, default_value = "1e15")]
    b_max: f64,
    /// PLUTO `definitions.h` of the run, for the domain outer radius and the code units
    #[structopt(long)]
    definitions: Option<String>,
    /// Express the field in code units
    #[structopt(long)]
    code_units: bool,
    /// Save the profile to a CSV file
    #[structopt(long)]
    csv: Option<String>,
    /// Plot filename
    #[structopt(short, long, default_value = "bfield_profile.png")]
    output: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let definitions = match &opt.definitions {
        Some(path) => Definitions::from_path(path)?,
        None => Definitions::default(),
    };
    let r_max = definitions.r_max()?.unwrap_or(R_MAX);
    let units = definitions.units()?;

    let field = MagneticField::new(opt.b_max, r_max);
    let grid = RadialGrid::new(99, 30, r_max, Some(r_max + 0.01));
    println!(
        "Field jump at the stellar surface (theta={:.4}): {}",
        opt.theta,
        field.continuity_jump(opt.theta)
    );

    let mut profile = field.profile(&grid, opt.theta);
    let y_desc = if opt.code_units {
        profile = profile.to_code_units(&units);
        "Field Strength [code units]"
    } else {
        "Field Strength [G]"
    };
    if let Some(filename) = opt.csv {
        profile.to_csv(filename)?;
    }
    profile.plot(&opt.output, y_desc)?;

    Ok(())
}
