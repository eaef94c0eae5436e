mod create;
mod dump;
mod extract;
mod insert;
mod sanitize;
mod show;

use clap::Parser;
use v9klabel::{Geometry, VolumeSpec};

#[derive(Debug, clap::Args)]
struct Create {
    /// Disk image to create
    output: String,
    /// Total cylinders, up to the ROM limit
    #[clap(long)]
    cylinders: u16,
    /// Head count
    #[clap(long, default_value_t = 8)]
    heads: u8,
    /// Sectors per track
    #[clap(long, default_value_t = 17)]
    spt: u8,
    /// Drive serial, at most 16 characters
    #[clap(long, default_value = "V9000")]
    serial: String,
    /// Volume spec NAME:SIZE_MiB[:AU][:ROOT], repeat for multiple volumes
    #[clap(long = "volume", required = true)]
    volumes: Vec<VolumeSpec>,
    /// Primary boot volume index
    #[clap(long, default_value_t = 0)]
    boot_volume: u16,
    /// Align volumes after the first to cylinder boundaries
    #[clap(long)]
    align_volumes: bool,
    /// Label revision: 1 for the original boot ROM, 2 as MS-DOS hdsetup writes it
    #[clap(long, default_value_t = 2, value_parser = clap::value_parser!(u16).range(1..=2))]
    label_revision: u16,
}

#[derive(Debug, clap::Args)]
struct Show {
    /// Disk image to inspect
    image: String,
    /// Also hex-dump the raw label sector
    #[clap(long)]
    hex: bool,
}

#[derive(Debug, clap::Args)]
struct Extract {
    /// Source disk image
    image: String,
    /// Volume index to extract
    index: usize,
    /// Standalone FAT image to write
    output: String,
}

#[derive(Debug, clap::Args)]
struct Insert {
    /// Source disk image
    image: String,
    /// Volume index to replace
    index: usize,
    /// Replacement volume image
    replacement: String,
    /// Spliced disk image to write
    output: String,
}

#[derive(Debug, clap::Args)]
struct Dump {
    /// Source disk image
    image: String,
    /// Output filename prefix; volume N lands in <PREFIX>NN.img
    #[clap(long, default_value = "volume")]
    prefix: String,
}

#[derive(Debug, clap::Args)]
struct Sanitize {
    /// Source disk image with bad-media regions
    image: String,
    /// Contiguous disk image to write
    output: String,
}

#[derive(Debug, clap::Subcommand)]
enum Action {
    /// Create a fresh disk image with ROM-legal labels
    Create(Create),
    /// Show the disk label, media regions and volumes
    Show(Show),
    /// Extract one MS-DOS volume to a standalone FAT image
    Extract(Extract),
    /// Splice a replacement volume into a new disk image
    Insert(Insert),
    /// Extract every MS-DOS volume
    Dump(Dump),
    /// Strip bad-media regions into a single contiguous image
    Sanitize(Sanitize),
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(short, long)]
    quiet: bool,
    #[clap(short, action = clap::ArgAction::Count)]
    verbosity: u8,
    #[clap(subcommand)]
    action: Action,
}

fn main() {
    let args = Args::parse();
    let level = match (args.quiet, args.verbosity) {
        (true, _) => log::LevelFilter::Off,
        (_, 0) => log::LevelFilter::Info,
        (_, 1) => log::LevelFilter::Debug,
        (_, _) => log::LevelFilter::Trace,
    };
    log::set_max_level(level);
    env_logger::builder().filter(None, level).target(env_logger::Target::Stdout).init();

    let result = match args.action {
        Action::Create(args) => {
            let geometry = Geometry {
                cylinders: args.cylinders,
                heads: args.heads,
                sectors_per_track: args.spt,
            };
            create::create(
                &args.output,
                geometry,
                &args.serial,
                &args.volumes,
                args.boot_volume,
                args.align_volumes,
                args.label_revision,
            )
        }
        Action::Show(args) => show::show(&args.image, args.hex),
        Action::Extract(args) => extract::extract(&args.image, args.index, &args.output),
        Action::Insert(args) => {
            insert::insert(&args.image, args.index, &args.replacement, &args.output)
        }
        Action::Dump(args) => dump::dump(&args.image, &args.prefix),
        Action::Sanitize(args) => sanitize::sanitize(&args.image, &args.output),
    };
    if let Some(error) = result.err() {
        eprintln!("{}", error);
        std::process::exit(1);
    }
}
