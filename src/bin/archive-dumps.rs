use magnetar_analysis::Archiver;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "archive-dumps",
    about = "Copies every n-th simulation dump to an archive drive"
)]
struct Opt {
    /// Directory the simulation writes the `data.NNNN.vtk` dumps to
    source: String,
    /// Archive directory
    destination: String,
    /// Archive the dumps with an index multiple of `stride`
    #[structopt(short, long, default_value = "10")]
    stride: u64,
    /// List the dumps to be copied without copying them
    #[structopt(long)]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let report = Archiver::new(&opt.source, &opt.destination)
        .stride(opt.stride)
        .dry_run(opt.dry_run)
        .run()?;
    if opt.dry_run {
        report.copied.iter().for_each(|path| println!("{}", path.display()));
    }
    report.summary();

    Ok(())
}
