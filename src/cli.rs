//! Command-line interface for the loot planner.

use crate::request::{PlanRequest, TargetRequest};
use lexopt::prelude::*;
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Debug, Clone)]
pub struct CliArgs {
    pub command: Command,
    pub preset: Option<String>,
    pub request_file: Option<PathBuf>,
    pub loot: Vec<(String, i64)>,
    pub players: Option<usize>,
    pub hard_mode: bool,
    pub target: Option<String>,
    pub target_quantity: Option<u32>,
    pub bag_capacity: Option<Decimal>,
    pub format: OutputFormat,
    pub output_file: Option<PathBuf>,
    pub trace_file: Option<PathBuf>,
    pub debug: bool,
    pub verbose: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Plan,
    Explain,
    Catalog,
    Presets,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            command: Command::Plan,
            preset: None,
            request_file: None,
            loot: Vec::new(),
            players: None,
            hard_mode: false,
            target: None,
            target_quantity: None,
            bag_capacity: None,
            format: OutputFormat::Text,
            output_file: None,
            trace_file: None,
            debug: false,
            verbose: false,
            quiet: false,
        }
    }
}

pub fn parse_args() -> Result<CliArgs, lexopt::Error> {
    parse_from(lexopt::Parser::from_env())
}

pub fn parse_from(mut args: lexopt::Parser) -> Result<CliArgs, lexopt::Error> {
    let mut cli_args = CliArgs::default();
    let mut subcommand = None;

    while let Some(arg) = args.next()? {
        match arg {
            Value(val) => {
                let val_str = val.string()?;
                if subcommand.is_none() {
                    subcommand = Some(val_str);
                } else {
                    return Err(lexopt::Error::from(format!(
                        "Unexpected argument '{}'",
                        val_str
                    )));
                }
            }
            Long("preset") => {
                cli_args.preset = Some(args.value()?.string()?);
            }
            Long("request") | Short('r') => {
                cli_args.request_file = Some(PathBuf::from(args.value()?));
            }
            Long("loot") | Short('l') => {
                let loot = args.value()?.string()?;
                cli_args.loot.push(parse_loot_arg(&loot)?);
            }
            Long("players") | Short('p') => {
                cli_args.players = Some(args.value()?.parse()?);
            }
            Long("hard") => cli_args.hard_mode = true,
            Long("target") | Short('t') => {
                cli_args.target = Some(args.value()?.string()?);
            }
            Long("target-quantity") => {
                cli_args.target_quantity = Some(args.value()?.parse()?);
            }
            Long("bag-capacity") => {
                cli_args.bag_capacity = Some(args.value()?.parse()?);
            }
            Long("format") | Short('f') => {
                let format = args.value()?.string()?;
                cli_args.format = match format.as_str() {
                    "text" => OutputFormat::Text,
                    "json" => OutputFormat::Json,
                    other => {
                        return Err(lexopt::Error::from(format!(
                            "Unknown format '{}' (expected text or json)",
                            other
                        )));
                    }
                };
            }
            Long("output") | Short('o') => {
                cli_args.output_file = Some(PathBuf::from(args.value()?));
            }
            Long("trace") => {
                cli_args.trace_file = Some(PathBuf::from(args.value()?));
            }
            Long("debug") => cli_args.debug = true,
            Long("verbose") | Short('v') => cli_args.verbose = true,
            Long("quiet") | Short('q') => cli_args.quiet = true,
            Long("help") | Short('h') => {
                print_help();
                std::process::exit(0);
            }
            _ => return Err(arg.unexpected()),
        }
    }

    cli_args.command = match subcommand.as_deref() {
        Some("plan") | None => Command::Plan,
        Some("explain") => Command::Explain,
        Some("catalog") => Command::Catalog,
        Some("presets") => Command::Presets,
        Some(cmd) => {
            return Err(lexopt::Error::from(format!("Unknown command: {}", cmd)));
        }
    };

    Ok(cli_args)
}

/// Parse `NAME=QTY`.
fn parse_loot_arg(arg: &str) -> Result<(String, i64), lexopt::Error> {
    let Some((name, quantity)) = arg.split_once('=') else {
        return Err(lexopt::Error::from(format!(
            "Invalid loot '{}' (expected NAME=QTY)",
            arg
        )));
    };
    let quantity: i64 = quantity
        .trim()
        .parse()
        .map_err(|_| lexopt::Error::from(format!("Invalid quantity in '{}'", arg)))?;
    Ok((name.trim().to_string(), quantity))
}

/// Apply CLI overrides on top of a preset or request file.
pub fn apply_overrides(request: &mut PlanRequest, args: &CliArgs) {
    for (name, quantity) in &args.loot {
        request.manifest.loot.insert(name.clone(), *quantity);
    }

    if let Some(players) = args.players {
        request.players = players;
    }

    if args.hard_mode {
        request.hard_mode = true;
    }

    if let Some(name) = &args.target {
        let quantity = args
            .target_quantity
            .or(request.manifest.primary_target.as_ref().map(|t| t.quantity))
            .unwrap_or(1);
        request.manifest.primary_target = Some(TargetRequest {
            name: name.clone(),
            quantity,
        });
    } else if let (Some(quantity), Some(target)) =
        (args.target_quantity, request.manifest.primary_target.as_mut())
    {
        target.quantity = quantity;
    }

    if let Some(capacity) = args.bag_capacity {
        request.parameters.bag_capacity = capacity;
    }
}

fn print_help() {
    println!("\nLoot Planner - split heist loot across the crew's bags\n");
    println!("USAGE:");
    println!("    loot-planner [COMMAND] [OPTIONS]\n");

    println!("COMMANDS:");
    println!("    plan             Plan the loot split (default)");
    println!("    explain          Plan and print every allocation step");
    println!("    catalog          Show loot priority and primary target values");
    println!("    presets          List built-in requests\n");

    println!("REQUEST OPTIONS:");
    println!("    --preset <NAME>            Start from a built-in request");
    println!("    -r, --request <FILE>       Load request from JSON or YAML file");
    println!("    -l, --loot <NAME=QTY>      Stacks of a loot type (can be used multiple times)");
    println!("                               Available: gold, cocaine, weed, painting, cash");
    println!("    -p, --players <N>          Number of players");
    println!("    --hard                     Hard mode primary target values");
    println!("    -t, --target <NAME>        Primary target, e.g. \"Pink Diamond\"");
    println!("    --target-quantity <N>      Primary target quantity (default 1)");
    println!("    --bag-capacity <PCT>       Bag capacity per player (default 100)\n");

    println!("OUTPUT OPTIONS:");
    println!("    -f, --format <text|json>   Output format (default text)");
    println!("    -o, --output <FILE>        Write the plan to a file");
    println!("    --trace <FILE>             Write the allocation trace as JSON");
    println!("    --debug                    Enable debug logging");
    println!("    -v, --verbose              Enable info logging");
    println!("    -q, --quiet                Only log errors");
    println!("    -h, --help                 Print help information\n");

    println!("EXAMPLES:");
    println!("    loot-planner --preset crew");
    println!("    loot-planner -p 2 -l gold=3 -l cash=4 -t \"Ruby Necklace\" --hard -f json");
}
