use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use agent_mux::auth::AgentCredential;
use agent_mux::config::{load_config, MuxConfig};
use agent_mux::observability::logging;
use agent_mux::routing::RoutingTable;

#[derive(Parser)]
#[command(name = "mux-check")]
#[command(about = "Validate agent-mux policies and explain how addresses are routed", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "agent-mux.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the config file and every credential in it
    Validate,
    /// Show the gateway and credential chosen for each address
    Route {
        /// Destination addresses, e.g. 10.0.0.5:22
        #[arg(required = true)]
        addrs: Vec<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config: MuxConfig<AgentCredential> = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let _ = logging::init(&config.observability.log_level);

    let match_kind = config.match_kind;
    let policy = config.into_policy();
    if let Err(e) = policy.validate() {
        eprintln!("Error: invalid policy: {}", e);
        return ExitCode::FAILURE;
    }
    let routes = match RoutingTable::build(&policy, &match_kind) {
        Ok(routes) => routes,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Validate => {
            println!(
                "OK: {} gate rule(s), {} agent rule(s), default credential: {}",
                routes.gate_count(),
                routes.auth_count(),
                if policy.default.is_some() { "yes" } else { "no" }
            );
        }
        Commands::Route { addrs, json } => {
            let report: Vec<Value> = addrs
                .iter()
                .map(|addr| {
                    let gateway = routes.gate(addr);
                    let user = routes.resolve_auth(addr).map(|c| c.user.clone());
                    json!({
                        "addr": addr,
                        "gateway": gateway,
                        "user": user.as_ref().ok(),
                        "error": user.as_ref().err().map(ToString::to_string),
                    })
                })
                .collect();

            if json {
                match serde_json::to_string_pretty(&report) {
                    Ok(out) => println!("{}", out),
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                for entry in &report {
                    println!(
                        "{} via {} as {}",
                        entry["addr"].as_str().unwrap_or_default(),
                        entry["gateway"].as_str().unwrap_or("<direct>"),
                        entry["user"]
                            .as_str()
                            .or_else(|| entry["error"].as_str())
                            .unwrap_or_default(),
                    );
                }
            }
        }
    }

    ExitCode::SUCCESS
}
