//! Interactive collection of whatever the command line left out.

use std::io::{BufRead, Write};
use std::str::FromStr;
use std::time::Duration;

use lfg::{ConfigError, RoleCounts, RunTimeRange, SimulationConfig};

use crate::args::CliArgs;

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("input ended before {0} was given")]
    EndOfInput(&'static str),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Build a validated configuration from `args`, prompting on `input`/`out` for
/// each missing value. Invalid answers are explained and asked again.
pub fn complete_config<R: BufRead, W: Write>(
    args: &CliArgs,
    input: &mut R,
    out: &mut W,
) -> Result<SimulationConfig, PromptError> {
    let mut ask = Prompter { input, out };

    let instances = match args.instances {
        Some(n) => n,
        None => ask.value(
            "instances",
            "Enter maximum number of concurrent instances (n): ",
            |&n: &usize| {
                if n == 0 {
                    Err("at least one instance is required".to_string())
                } else {
                    Ok(())
                }
            },
        )?,
    };
    let tanks = match args.tanks {
        Some(n) => n,
        None => ask.value("tanks", "Enter number of tank players: ", accept)?,
    };
    let healers = match args.healers {
        Some(n) => n,
        None => ask.value("healers", "Enter number of healer players: ", accept)?,
    };
    let dps = match args.dps {
        Some(n) => n,
        None => ask.value("dps", "Enter number of DPS players: ", accept)?,
    };
    let min_time = match args.min_time {
        Some(t) => t,
        None => ask.value(
            "min_time",
            "Enter minimum dungeon run time (t1 in seconds): ",
            accept,
        )?,
    };
    let max_time = match args.max_time {
        Some(t) => t,
        None => ask.value(
            "max_time",
            "Enter maximum dungeon run time (t2 in seconds): ",
            |&t: &u32| {
                if t < min_time {
                    Err(format!("must be at least the minimum run time ({min_time})"))
                } else {
                    Ok(())
                }
            },
        )?,
    };

    let mut config = SimulationConfig::new(
        instances,
        RoleCounts::new(tanks, healers, dps),
        RunTimeRange::new(min_time, max_time)?,
    );
    if let Some(ms) = args.time_unit_ms {
        config = config.with_time_unit(Duration::from_millis(ms));
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    config.validate()?;
    Ok(config)
}

fn accept<T>(_: &T) -> Result<(), String> {
    Ok(())
}

struct Prompter<'a, R, W> {
    input: &'a mut R,
    out: &'a mut W,
}

impl<R: BufRead, W: Write> Prompter<'_, R, W> {
    fn value<T: FromStr>(
        &mut self,
        field: &'static str,
        prompt: &str,
        check: impl Fn(&T) -> Result<(), String>,
    ) -> Result<T, PromptError> {
        let mut line = String::new();
        loop {
            write!(self.out, "{prompt}")?;
            self.out.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                return Err(PromptError::EndOfInput(field));
            }

            let answer = line.trim();
            let reason = match answer.parse::<T>() {
                Ok(value) => match check(&value) {
                    Ok(()) => return Ok(value),
                    Err(reason) => reason,
                },
                Err(_) => "expected a non-negative whole number".to_string(),
            };
            writeln!(self.out, "Invalid value '{answer}': {reason}.")?;
            tracing::debug!(field, answer, "Rejected interactive input");
        }
    }
}
