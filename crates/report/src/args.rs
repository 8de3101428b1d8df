//! Command-line arguments.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use festflow_core::config::Preset;
use festflow_core::types::Timestamp;
use festflow_sources::timestamps::parse_bound;

pub const USAGE: &str = "\
usage: festflow-report <events.json> [options]

options:
  --stops <file>        TfE-shaped stop list (default: demo stops near the venues)
  --timetable <file>    {stop_id: [\"HH:MM\", ...]} departures per stop
  --preset <name>       optimisation | direct_capacity (default: optimisation)
  --radius <meters>     override the preset's stop radius
  --from <date>         keep performances starting at or after this date
  --to <date>           keep performances starting at or before this date
  --rows <n>            rows printed per table (default: 15)
  -h, --help            show this message

EVENTS_PATH is used when <events.json> is omitted.";

pub const DEFAULT_ROWS: usize = 15;

#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    pub events: PathBuf,
    pub stops: Option<PathBuf>,
    pub timetable: Option<PathBuf>,
    pub preset: Preset,
    pub radius_m: Option<f64>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub rows: usize,
}

/// Outcome of parsing: run, or print usage.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run(Args),
    Help,
}

/// Parse arguments (without the program name). `env` supplies fallbacks
/// such as `EVENTS_PATH`.
pub fn parse(
    argv: impl IntoIterator<Item = String>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Command> {
    let mut events: Option<PathBuf> = None;
    let mut stops = None;
    let mut timetable = None;
    let mut preset = None;
    let mut radius_m = None;
    let mut from = None;
    let mut to = None;
    let mut rows = DEFAULT_ROWS;

    let mut argv = argv.into_iter();
    while let Some(arg) = argv.next() {
        let mut value = |flag: &str| {
            argv.next()
                .ok_or_else(|| anyhow!("{flag} requires a value"))
        };
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--stops" => stops = Some(PathBuf::from(value("--stops")?)),
            "--timetable" => timetable = Some(PathBuf::from(value("--timetable")?)),
            "--preset" => preset = Some(value("--preset")?.parse::<Preset>()?),
            "--radius" => {
                let raw = value("--radius")?;
                radius_m = Some(
                    raw.parse::<f64>()
                        .with_context(|| format!("--radius expects meters, got '{raw}'"))?,
                );
            }
            "--from" => from = Some(bound("--from", &value("--from")?)?),
            "--to" => to = Some(bound("--to", &value("--to")?)?),
            "--rows" => {
                let raw = value("--rows")?;
                rows = raw
                    .parse()
                    .with_context(|| format!("--rows expects a count, got '{raw}'"))?;
            }
            flag if flag.starts_with("--") => bail!("unknown option {flag}"),
            path if events.is_none() => events = Some(PathBuf::from(path)),
            extra => bail!("unexpected argument '{extra}'"),
        }
    }

    let events = events
        .or_else(|| env("EVENTS_PATH").map(PathBuf::from))
        .ok_or_else(|| anyhow!("missing <events.json>\n\n{USAGE}"))?;
    let preset = match preset {
        Some(p) => p,
        None => env("PIPELINE_PRESET")
            .map(|raw| raw.parse::<Preset>())
            .transpose()?
            .unwrap_or(Preset::Optimisation),
    };

    Ok(Command::Run(Args {
        events,
        stops,
        timetable,
        preset,
        radius_m,
        from,
        to,
        rows,
    }))
}

fn bound(flag: &str, raw: &str) -> Result<Timestamp> {
    parse_bound(raw).ok_or_else(|| anyhow!("{flag} expects YYYY-MM-DD or a timestamp, got '{raw}'"))
}
