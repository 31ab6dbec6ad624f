use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::housing::SimulationMethod;
use crate::model::PricingMode;

/// Options for a `price` what-if query. Unset values come from the config.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceArgs {
    pub state: String,
    pub added_power_mw: Option<f64>,
    pub added_annual_mwh: Option<f64>,
    pub mode: Option<PricingMode>,
    pub pue: Option<f64>,
    pub share_floor: Option<f64>,
    pub exclude_from_sales: bool,
}

/// Options for a `housing` projection.
#[derive(Debug, Clone, PartialEq)]
pub struct HousingArgs {
    pub state: String,
    pub current_price: f64,
    pub years_after: i32,
    pub future_year: Option<i32>,
    pub base_year: Option<i32>,
    pub method: SimulationMethod,
    /// When set, emit one row per year up to this many years out.
    pub horizon: Option<i32>,
    pub out: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Summary,
    Price(PriceArgs),
    Housing(HousingArgs),
    History { state: String, out: Option<PathBuf> },
    States,
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub json: bool,
    pub command: Command,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

pub fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut config = None;
    let mut json = false;

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --config (expected a TOML path)")?;
                if config.replace(PathBuf::from(path)).is_some() {
                    return Err("--config provided more than once".to_string());
                }
            }
            "--json" => json = true,
            "--help" | "-h" => {
                return Ok(CliOptions {
                    config,
                    json,
                    command: Command::Help,
                });
            }
            _ => break,
        }
        i += 1;
    }

    let Some(name) = args.get(i) else {
        return Err("missing command (summary, price, housing, history, states)".to_string());
    };
    let rest = &args[i + 1..];
    let command = match name.as_str() {
        "summary" => no_options("summary", rest).map(|()| Command::Summary)?,
        "states" => no_options("states", rest).map(|()| Command::States)?,
        "price" => Command::Price(parse_price(rest)?),
        "housing" => Command::Housing(parse_housing(rest)?),
        "history" => parse_history(rest)?,
        "help" => Command::Help,
        other => return Err(format!("unknown command: {other}")),
    };

    Ok(CliOptions {
        config,
        json,
        command,
    })
}

fn no_options(command: &str, rest: &[String]) -> Result<(), String> {
    match rest.first() {
        Some(arg) => Err(format!("unexpected argument for {command}: {arg}")),
        None => Ok(()),
    }
}

fn parse_price(args: &[String]) -> Result<PriceArgs, String> {
    let mut out = PriceArgs::default();
    let mut state = None;
    let mut i = 0usize;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--state" => {
                i += 1;
                state = Some(args.next_or_err(i, "missing value for --state")?.to_string());
            }
            "--mw" => {
                i += 1;
                out.added_power_mw = Some(args.parse_at(i, flag)?);
            }
            "--mwh" => {
                i += 1;
                out.added_annual_mwh = Some(args.parse_at(i, flag)?);
            }
            "--mode" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --mode (assumption|trained)")?;
                out.mode = Some(raw.parse::<PricingMode>().map_err(|e| e.to_string())?);
            }
            "--pue" => {
                i += 1;
                out.pue = Some(args.parse_at(i, flag)?);
            }
            "--share-floor" => {
                i += 1;
                out.share_floor = Some(args.parse_at(i, flag)?);
            }
            "--exclude-from-sales" => out.exclude_from_sales = true,
            other => return Err(format!("unknown argument for price: {other}")),
        }
        i += 1;
    }
    out.state = state.ok_or_else(|| "price requires --state".to_string())?;
    if out.added_power_mw.is_none() && out.added_annual_mwh.is_none() {
        return Err("price requires --mw or --mwh".to_string());
    }
    Ok(out)
}

fn parse_housing(args: &[String]) -> Result<HousingArgs, String> {
    let mut state = None;
    let mut current_price = None;
    let mut out = HousingArgs {
        state: String::new(),
        current_price: 0.0,
        years_after: 5,
        future_year: None,
        base_year: None,
        method: SimulationMethod::Simple,
        horizon: None,
        out: None,
    };
    let mut i = 0usize;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--state" => {
                i += 1;
                state = Some(args.next_or_err(i, "missing value for --state")?.to_string());
            }
            "--price" => {
                i += 1;
                current_price = Some(args.parse_at(i, flag)?);
            }
            "--years" => {
                i += 1;
                out.years_after = args.parse_at(i, flag)?;
            }
            "--future-year" => {
                i += 1;
                out.future_year = Some(args.parse_at(i, flag)?);
            }
            "--base-year" => {
                i += 1;
                out.base_year = Some(args.parse_at(i, flag)?);
            }
            "--method" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --method (simple|advanced)")?;
                out.method = raw
                    .parse::<SimulationMethod>()
                    .map_err(|e| e.to_string())?;
            }
            "--horizon" => {
                i += 1;
                out.horizon = Some(args.parse_at(i, flag)?);
            }
            "--out" => {
                i += 1;
                out.out = Some(PathBuf::from(args.next_or_err(i, "missing value for --out")?));
            }
            other => return Err(format!("unknown argument for housing: {other}")),
        }
        i += 1;
    }
    out.state = state.ok_or_else(|| "housing requires --state".to_string())?;
    out.current_price = current_price.ok_or_else(|| "housing requires --price".to_string())?;
    if out.out.is_some() && out.horizon.is_none() {
        return Err("--out requires --horizon".to_string());
    }
    Ok(out)
}

fn parse_history(args: &[String]) -> Result<Command, String> {
    let mut state = None;
    let mut out = None;
    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--state" => {
                i += 1;
                state = Some(args.next_or_err(i, "missing value for --state")?.to_string());
            }
            "--out" => {
                i += 1;
                out = Some(PathBuf::from(args.next_or_err(i, "missing value for --out")?));
            }
            other => return Err(format!("unknown argument for history: {other}")),
        }
        i += 1;
    }
    Ok(Command::History {
        state: state.ok_or_else(|| "history requires --state".to_string())?,
        out,
    })
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
    fn parse_at<T: FromStr>(&self, index: usize, flag: &str) -> Result<T, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }

    fn parse_at<T: FromStr>(&self, index: usize, flag: &str) -> Result<T, String> {
        let raw = self.next_or_err(index, &format!("missing value for {flag}"))?;
        raw.parse()
            .map_err(|_| format!("invalid value for {flag}: {raw}"))
    }
}

pub fn print_usage() {
    eprintln!("dc-impact - data-center load impact on electricity prices and home values");
    eprintln!();
    eprintln!("Usage: dc-impact [--config <path>] [--json] <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  summary                          Fit quality and coefficients of both price models");
    eprintln!("  price --state <ST> (--mw <MW> | --mwh <MWh>)");
    eprintln!("        [--mode assumption|trained] [--pue <x>] [--share-floor <x>]");
    eprintln!("        [--exclude-from-sales]     What-if price for added data-center load");
    eprintln!("  housing --state <ST> --price <USD> [--years <n>] [--future-year <y>]");
    eprintln!("        [--base-year <y>] [--method simple|advanced]");
    eprintln!("        [--horizon <n> [--out <csv>]]  Home value projection");
    eprintln!("  history --state <ST> [--out <csv>]  Housing history for a state");
    eprintln!("  states                           States known to each table");
    eprintln!();
    eprintln!("Without --config, sample data under data/ is used.");
}
