use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu",
    version,
    about = "Stereoplane CLI - fit a viewing plane to a small molecule and label its bonds as wedge, dash or plain while it rotates.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fix the viewing plane of a molecule and print its bond labels.
    Align(AlignArgs),
    /// Simulate auto rotation and print how the bond labels change.
    Spin(SpinArgs),
    /// Download a molecule from PubChem into the local store.
    Fetch(FetchArgs),
    /// Manage the local molecule store.
    Store(StoreArgs),
}

/// Where the molecule comes from and how the plane is set up. Shared by `align` and `spin`.
#[derive(Args, Debug, Clone, Default)]
pub struct MoleculeArgs {
    /// An SDF/MOL file path, or the name of a molecule in the local store.
    #[arg(required = true, value_name = "PATH_OR_NAME")]
    pub molecule: String,

    /// Molecule name used for plane-rule lookup (defaults to the file stem or store name).
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the depth threshold as a fraction of the molecule radius.
    #[arg(short = 'd', long, value_name = "FLOAT")]
    pub depth_factor: Option<f64>,

    /// Skip turning the molecule toward the camera.
    #[arg(long)]
    pub no_viewer: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S rotation.speed=45
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,

    /// Write a TOML report to this path.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments for the `align` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct AlignArgs {
    #[command(flatten)]
    pub molecule: MoleculeArgs,
}

/// Arguments for the `spin` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct SpinArgs {
    #[command(flatten)]
    pub molecule: MoleculeArgs,

    /// Simulated time in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub duration: Option<f64>,

    /// Simulated frames per second.
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f64>,

    /// Override the rotation speed in degrees per second.
    #[arg(long, value_name = "DEG_PER_SEC")]
    pub speed: Option<f64>,
}

/// Arguments for the `fetch` subcommand.
#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Compound name to look up on PubChem (e.g., 'ethanol').
    #[arg(required = true)]
    pub name: String,

    /// Overwrite the molecule if it is already in the store.
    #[arg(long)]
    pub force: bool,

    /// Download the 2D record instead of trying the 3D conformer first.
    #[arg(long = "2d")]
    pub two_d: bool,
}

/// Arguments for the `store` subcommand.
#[derive(Args, Debug)]
pub struct StoreArgs {
    #[command(subcommand)]
    pub command: StoreCommands,
}

/// Available commands for store management.
#[derive(Subcommand, Debug)]
pub enum StoreCommands {
    /// Show the absolute path to the local molecule store.
    Path,
    /// Set a custom absolute path for the local molecule store.
    SetPath {
        /// The new directory to store molecules in.
        #[arg(required = true)]
        path: PathBuf,
    },
    /// Reset the store path to its default, OS-specific location.
    ResetPath,
    /// List the molecules in the store.
    List,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spin_accepts_shared_and_specific_flags() {
        let cli = Cli::parse_from([
            "stereoplane",
            "-vv",
            "spin",
            "ethanol",
            "--duration",
            "3.5",
            "--fps",
            "30",
            "-S",
            "rotation.speed=45",
            "-o",
            "out.toml",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Spin(args) = cli.command else {
            panic!("expected spin command");
        };
        assert_eq!(args.molecule.molecule, "ethanol");
        assert_eq!(args.duration, Some(3.5));
        assert_eq!(args.fps, Some(30.0));
        assert_eq!(args.molecule.set_values, vec!["rotation.speed=45"]);
        assert_eq!(args.molecule.output, Some(PathBuf::from("out.toml")));
    }

    #[test]
    fn fetch_parses_two_d_flag() {
        let cli = Cli::parse_from(["stereoplane", "fetch", "acetone", "--2d", "--force"]);
        let Commands::Fetch(args) = cli.command else {
            panic!("expected fetch command");
        };
        assert!(args.two_d);
        assert!(args.force);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["stereoplane", "-q", "-v", "store", "path"]);
        assert!(result.is_err());
    }
}
