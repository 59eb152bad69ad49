use log::warn;
use loot_planner::allocator::plan_request;
use loot_planner::catalog::{LootCatalog, PrimaryTarget};
use loot_planner::cli::{self, CliArgs, Command, OutputFormat};
use loot_planner::events::EventLog;
use loot_planner::report::PlanReport;
use loot_planner::request::{PlanRequest, create_standard_presets};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Run with --help for usage");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&args);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(args: &CliArgs) {
    let level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(args: &CliArgs) -> Result<(), Box<dyn Error>> {
    let catalog = LootCatalog::heist();

    match args.command {
        Command::Catalog => {
            print_catalog(&catalog);
            Ok(())
        }
        Command::Presets => {
            let presets = create_standard_presets();
            let mut names: Vec<&String> = presets.keys().collect();
            names.sort();
            for name in names {
                println!("{}", name);
                println!("{}", presets[name]);
            }
            Ok(())
        }
        Command::Plan | Command::Explain => {
            let request = build_request(args)?;
            if let Err(problems) = request.validate(&catalog) {
                for problem in problems {
                    warn!("{}", problem);
                }
            }

            let mut log = EventLog::new();
            let result = plan_request(&request, &catalog, &mut log);
            let report = PlanReport::from_result(&result);

            if args.command == Command::Explain {
                for event in log.get_events() {
                    println!("{}", event);
                }
                println!();
            }

            let rendered = match args.format {
                OutputFormat::Text => report.to_string(),
                OutputFormat::Json => report.to_json()?,
            };
            match &args.output_file {
                Some(path) => std::fs::write(path, rendered)?,
                None => println!("{}", rendered),
            }

            if let Some(path) = &args.trace_file {
                log.save_to_file(&path.to_string_lossy())?;
            }
            Ok(())
        }
    }
}

fn build_request(args: &CliArgs) -> Result<PlanRequest, Box<dyn Error>> {
    let mut request = if let Some(path) = &args.request_file {
        PlanRequest::load_from_file(&path.to_string_lossy())?
    } else if let Some(name) = &args.preset {
        create_standard_presets()
            .remove(name)
            .ok_or_else(|| format!("Unknown preset '{}'", name))?
    } else {
        PlanRequest::new("command_line".to_string())
    };

    cli::apply_overrides(&mut request, args);
    Ok(request)
}

fn print_catalog(catalog: &LootCatalog) {
    println!("Loot priority (value per 1% of bag):");
    for (rank, rates) in catalog.ranked().iter().enumerate() {
        println!(
            "  {}. {:<9} {:>10.2}/1%  ${:.2}/click  {:.3}%/click  {} clicks/stack",
            rank + 1,
            rates.id,
            rates.density,
            rates.value_per_click,
            rates.bag_space_per_click,
            rates.clicks_per_stack
        );
    }

    println!("\nPrimary targets (normal / hard):");
    for target in PrimaryTarget::ALL {
        println!(
            "  {:<18} ${:>9} / ${}",
            target.name(),
            target.value(false),
            target.value(true)
        );
    }
}
