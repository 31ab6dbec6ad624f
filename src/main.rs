//! dc-impact entry point: CLI wiring and report printing.

use std::process;

use serde::Serialize;
use tracing::info;

use dc_impact::cli::{self, Command, HousingArgs, PriceArgs};
use dc_impact::config::AppConfig;
use dc_impact::housing::{HousingPrediction, SimulationMethod};
use dc_impact::io::export::{export_history_csv, export_predictions_csv};
use dc_impact::reporting::{ModelSummary, PriceChangeSummary, WhatIfReport};
use dc_impact::telemetry::init_tracing;
use dc_impact::{ModelContext, Result};

fn main() {
    let opts = match cli::parse_args() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!();
            cli::print_usage();
            process::exit(1);
        }
    };
    if opts.command == Command::Help {
        cli::print_usage();
        return;
    }

    init_tracing(opts.json);

    let config = match AppConfig::load(opts.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = run(config, opts.command, opts.json) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(config: AppConfig, command: Command, json: bool) -> Result<()> {
    let ctx = ModelContext::load(config)?;
    match command {
        Command::Summary => {
            let summary = ModelSummary::new(
                ctx.energy().len(),
                ctx.models(),
                ctx.config().pricing.pass_through_elec,
            );
            if json {
                let coefficients = |m: &dc_impact::model::FittedModel| {
                    m.coefficients()
                        .map(|(n, c)| (n.to_string(), c))
                        .collect::<Vec<_>>()
                };
                print_json(&serde_json::json!({
                    "states": summary.states,
                    "status": ctx.status(),
                    "baseline": {
                        "r_squared": ctx.models().baseline.r_squared,
                        "coefficients": coefficients(&ctx.models().baseline),
                    },
                    "full": {
                        "r_squared": ctx.models().full.r_squared,
                        "coefficients": coefficients(&ctx.models().full),
                    },
                }))?;
            } else {
                println!("{summary}");
            }
        }
        Command::Price(args) => price(&ctx, args, json)?,
        Command::Housing(args) => housing(&ctx, args, json)?,
        Command::History { state, out } => {
            let points = ctx.state_housing_history(&state)?;
            if let Some(path) = out {
                export_history_csv(&points, &path)?;
                info!(path = %path.display(), rows = points.len(), "history exported");
            }
            if json {
                print_json(&points)?;
            } else {
                println!("date,year,avg_home_value,pct_change,is_post_announcement");
                for p in &points {
                    let value = p.avg_home_value.map(|v| format!("{v:.2}")).unwrap_or_default();
                    let pct = p.pct_change.map(|v| format!("{v:.4}")).unwrap_or_default();
                    println!(
                        "{},{},{value},{pct},{}",
                        p.date, p.year, p.is_post_announcement
                    );
                }
            }
        }
        Command::States => {
            let catalog = ctx.catalog();
            if json {
                print_json(&catalog)?;
            } else {
                println!("electricity: {}", catalog.electricity_states.join(" "));
                println!("housing:     {}", catalog.housing_states.join(" "));
                println!("all:         {}", catalog.all_states.join(" "));
            }
        }
        Command::Help => cli::print_usage(),
    }
    Ok(())
}

fn price(ctx: &ModelContext, args: PriceArgs, json: bool) -> Result<()> {
    let mut req = ctx.what_if_request(&args.state)?;
    req.added_power_mw = args.added_power_mw;
    req.added_annual_mwh = args.added_annual_mwh;
    if let Some(mode) = args.mode {
        req.mode = mode;
    }
    if let Some(pue) = args.pue {
        req.pue = pue;
    }
    if let Some(floor) = args.share_floor {
        req.share_floor = floor;
    }
    if args.exclude_from_sales {
        req.include_added_load_in_sales = false;
    }

    let result = ctx.what_if_added_dc(&req)?;
    let summary = PriceChangeSummary::summarize(&result, &PriceChangeSummary::default_states());
    if json {
        print_json(&serde_json::json!({ "result": result, "summary": summary }))?;
    } else {
        println!("{}", WhatIfReport(&result));
        println!();
        println!("{summary}");
    }
    Ok(())
}

fn housing(ctx: &ModelContext, args: HousingArgs, json: bool) -> Result<()> {
    let base_year = args.base_year.unwrap_or(ctx.config().housing.base_year);

    if let Some(horizon) = args.horizon {
        let rows = ctx.housing_predictions(
            args.method,
            &args.state,
            args.current_price,
            base_year,
            horizon,
        )?;
        if let Some(path) = &args.out {
            export_predictions_csv(&rows, path)?;
            info!(path = %path.display(), rows = rows.len(), "projection exported");
        }
        if json {
            print_json(&rows)?;
        } else {
            for row in &rows {
                print_prediction(row);
            }
        }
        return Ok(());
    }

    let estimate = match args.method {
        SimulationMethod::Simple => ctx.simple_simulate_house_price(
            &args.state,
            args.current_price,
            args.years_after,
            base_year,
        )?,
        SimulationMethod::Advanced => ctx.advanced_simulate_house_price(
            &args.state,
            args.current_price,
            args.future_year.unwrap_or(base_year + args.years_after),
            base_year,
        )?,
    };
    let prediction = HousingPrediction::from_estimate(args.current_price, &estimate);
    if json {
        print_json(&prediction)?;
    } else {
        print_prediction(&prediction);
    }
    Ok(())
}

fn print_prediction(p: &HousingPrediction) {
    println!(
        "{} {}: nominal ${:.0} | real (2025$) ${:.0} | {:+.2}% | growth {:.2}% + {:.2}% = {:.2}%/yr [{}]",
        p.state,
        p.target_year,
        p.nominal_price,
        p.real_price_2025_dollars,
        p.nominal_increase_pct,
        p.normal_growth_rate,
        p.hyperscale_effect_rate,
        p.total_growth_rate,
        p.method,
    );
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
