use wirestate::cli::Args;
use wirestate::config::{CONFIG_FILE, SynthConfig};
use wirestate::entities::NodeId;
use wirestate::host::MemoryHost;
use wirestate::paths::{self, PathConfig};
use wirestate::plugin::{Plugin, SynthesisFinished};

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error, info};

fn init_logging(args: &Args, path_config: &PathConfig) -> Result<()> {
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .clone()
            .unwrap_or_else(|| paths::data_file("wirestate.log", path_config));
        paths::ensure_parent(&log_path)?;
        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Respects RUST_LOG if set
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .format_timestamp_millis()
            .init();
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let path_config = PathConfig::from_env_and_cli(args.config_dir.clone());
    init_logging(&args, &path_config)?;
    debug!("Command-line args: {:?}", args);

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| paths::config_file(CONFIG_FILE, &path_config));
    info!("Config path: {}", config_path.display());
    let config = SynthConfig::load(&config_path)?;

    let host = MemoryHost::load(&args.scene)?;
    let message = std::fs::read_to_string(&args.message)
        .with_context(|| format!("Failed to read message: {}", args.message.display()))?;

    let mut plugin = Plugin::new(host, config);
    if args.report {
        plugin.bus().subscribe::<SynthesisFinished, _>(|e| {
            if let Some(report) = &e.report {
                match serde_json::to_string_pretty(report) {
                    Ok(json) => eprintln!("{}", json),
                    Err(err) => error!("Failed to serialize run report: {}", err),
                }
            }
        });
    }

    let reply = plugin.handle_json(&message)?;
    println!("{}", reply);

    let mut host = plugin.into_host();
    for id in &args.press {
        let node = NodeId::from(id.as_str());
        match host.fire(&node) {
            Ok(writes) => info!("Fired {}: {} cell writes", node, writes),
            Err(e) => error!("Failed to fire {}: {}", node, e),
        }
    }

    let out = args.out.as_ref().unwrap_or(&args.scene);
    paths::ensure_parent(out)?;
    host.save(out)?;
    info!("Scene written to {}", out.display());
    Ok(())
}
