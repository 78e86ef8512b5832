use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use graphite::Parity;

#[derive(Parser)]
#[command(
    name = "graphite",
    about = "Equivariant graph networks and structural order parameters",
    version,
    author,
    before_help = crate::display::banner_for_help(),
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress output (for scripting)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build a NequIP network from a TOML config and show its irreps chain
    #[command(visible_alias = "p")]
    Plan(PlanArgs),

    /// Compute Steinhardt order parameters of an XYZ structure
    #[command(visible_alias = "o")]
    Order(OrderArgs),
}

#[derive(Args)]
pub struct PlanArgs {
    /// Model configuration (built-in defaults if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct OrderArgs {
    /// Input XYZ file (stdin if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Output file (stdout if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Neighbour cutoff radius
    #[arg(long, value_name = "R")]
    pub cutoff: f64,

    #[command(flatten)]
    pub steinhardt: SteinhardtOptions,
}

/// Order parameter options.
#[derive(Args)]
#[command(next_help_heading = "Order Parameters")]
pub struct SteinhardtOptions {
    /// Spherical harmonic degree l
    #[arg(long, value_name = "L", default_value = "6")]
    pub degree: u32,

    /// Parity of the harmonics
    #[arg(long, value_name = "P", default_value = "e")]
    pub parity: ParityArg,

    /// Use the first-shell averages directly
    #[arg(long = "no-second-shell")]
    pub no_second_shell: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ParityArg {
    #[value(name = "e")]
    Even,
    #[value(name = "o")]
    Odd,
}

impl From<ParityArg> for Parity {
    fn from(p: ParityArg) -> Self {
        match p {
            ParityArg::Even => Parity::Even,
            ParityArg::Odd => Parity::Odd,
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn order_defaults() {
        let cli = Cli::try_parse_from(["graphite", "order", "-i", "a.xyz", "--cutoff", "3.0"]).unwrap();
        let Command::Order(args) = cli.command else {
            panic!("expected order command");
        };
        assert_eq!(args.cutoff, 3.0);
        assert_eq!(args.steinhardt.degree, 6);
        assert!(matches!(args.steinhardt.parity, ParityArg::Even));
        assert!(!args.steinhardt.no_second_shell);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["graphite", "plan", "-vv", "-q"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.quiet);
    }

    #[test]
    fn order_requires_cutoff() {
        assert!(Cli::try_parse_from(["graphite", "order", "-i", "a.xyz"]).is_err());
    }
}
