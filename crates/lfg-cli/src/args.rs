//! Command line parsing.

use std::str::FromStr;

pub const USAGE: &str = "\
Usage: lfg [options]

Simulates parties queueing for a limited number of dungeon instances.
Any required value not given as a flag is asked for interactively.

Options:
  --instances <n>      Maximum number of concurrent instances
  --tanks <n>          Number of tank players
  --healers <n>        Number of healer players
  --dps <n>            Number of DPS players
  --min-time <secs>    Minimum dungeon run time (t1)
  --max-time <secs>    Maximum dungeon run time (t2)
  --seed <n>           Seed for run times [default: random]
  --time-unit-ms <ms>  Wall-clock length of one simulated second [default: 1000]
  --json               Print the final report as JSON (progress goes to the log)
  -h, --help           Show this help";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgsError {
    #[error("{0} requires a value")]
    MissingValue(String),
    #[error("invalid value '{value}' for {flag}")]
    InvalidValue { flag: String, value: String },
    #[error("unknown flag: {0}")]
    UnknownFlag(String),
    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),
}

/// Values given on the command line. `None` means "ask for it".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub instances: Option<usize>,
    pub tanks: Option<u32>,
    pub healers: Option<u32>,
    pub dps: Option<u32>,
    pub min_time: Option<u32>,
    pub max_time: Option<u32>,
    pub seed: Option<u64>,
    pub time_unit_ms: Option<u64>,
    pub json: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Run(CliArgs),
    Help,
}

pub fn parse_args(args: &[String]) -> Result<Command, ArgsError> {
    let mut cli = CliArgs::default();

    let mut i = 1; // skip argv[0]
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--instances" => cli.instances = Some(value(args, &mut i)?),
            "--tanks" => cli.tanks = Some(value(args, &mut i)?),
            "--healers" => cli.healers = Some(value(args, &mut i)?),
            "--dps" => cli.dps = Some(value(args, &mut i)?),
            "--min-time" => cli.min_time = Some(value(args, &mut i)?),
            "--max-time" => cli.max_time = Some(value(args, &mut i)?),
            "--seed" => cli.seed = Some(value(args, &mut i)?),
            "--time-unit-ms" => cli.time_unit_ms = Some(value(args, &mut i)?),
            "--json" => cli.json = true,
            "--help" | "-h" => return Ok(Command::Help),
            arg if arg.starts_with('-') => return Err(ArgsError::UnknownFlag(arg.to_string())),
            arg => return Err(ArgsError::UnexpectedArgument(arg.to_string())),
        }
        i += 1;
    }

    Ok(Command::Run(cli))
}

/// Parse the value following the flag at `args[*i]`, advancing past it.
fn value<T: FromStr>(args: &[String], i: &mut usize) -> Result<T, ArgsError> {
    let flag = &args[*i];
    *i += 1;
    let raw = args
        .get(*i)
        .ok_or_else(|| ArgsError::MissingValue(flag.clone()))?;
    raw.parse().map_err(|_| ArgsError::InvalidValue {
        flag: flag.clone(),
        value: raw.clone(),
    })
}
