use clap::Parser;
use std::path::PathBuf;

/// Synthesize cross-element interactions (shared cells, bindings, reactions)
/// for a saved scene, driven by one UI control message.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Scene JSON (selection, nodes, components, cells)
    #[arg(short = 's', long = "scene", value_name = "SCENE")]
    pub scene: PathBuf,

    /// Control message JSON, as posted by the configuration UI
    #[arg(short = 'm', long = "message", value_name = "MESSAGE")]
    pub message: PathBuf,

    /// Write the resulting scene here (default: overwrite --scene)
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Fire the reaction of this node after synthesis (repeatable, in order)
    #[arg(short = 'p', long = "press", value_name = "NODE_ID")]
    pub press: Vec<String>,

    /// Print the run report as JSON to stderr
    #[arg(long = "report")]
    pub report: bool,

    /// Engine config file (default: wirestate.json in the config directory)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Enable debug logging to file (default: wirestate.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,
}
