//! Line-at-a-time REPL over the legacy `mongo` shell.
//!
//! Each line read from stdin is sent as one command and the cleaned response
//! is printed. Ctrl-C aborts the running command (the shell is restarted);
//! Ctrl-D exits.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example mongo_repl
//! cargo run --example mongo_repl -- --port 27018 --timeout 60
//! RUST_LOG=debug cargo run --example mongo_repl -- --mongo /opt/mongo/bin/mongo
//! ```

use std::env;
use std::io::Write;
use std::time::Duration;

use replwire::profile::probe_version;
use replwire::{Driver, DriverBuilder};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    match probe_version(&args.mongo).await {
        Ok(version) => println!(
            "{} (version {})",
            args.mongo,
            version.version.as_deref().unwrap_or("unknown")
        ),
        Err(e) => eprintln!("Warning: {}", e),
    }

    let mut builder = DriverBuilder::new()
        .executable(&args.mongo)
        .default_options_file()
        .timeout(args.timeout.map(Duration::from_secs));
    if let Some(port) = &args.port {
        builder = builder.option("port", port);
    }

    let mut driver = builder.build()?;
    driver.open().await?;
    println!("Shell ready. Ctrl-C aborts a command, Ctrl-D exits.");

    let interrupt = driver.interrupt_handle();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            interrupt.interrupt();
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match driver.execute(&line).await {
            Ok(response) if response.is_empty() => {}
            Ok(response) => println!("{}", response),
            Err(e) if e.restarts_session() => {
                eprintln!("Error: {} (shell restarted, session state was lost)", e)
            }
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    driver.shutdown().await?;
    println!();
    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    mongo: String,
    port: Option<String>,
    timeout: Option<u64>,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut mongo = "mongo".to_string();
        let mut port = None;
        let mut timeout = None;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--mongo" | "-m" => {
                    i += 1;
                    if i < args.len() {
                        mongo = args[i].clone();
                    }
                }
                "--port" | "-p" => {
                    i += 1;
                    if i < args.len() {
                        port = Some(args[i].clone());
                    }
                }
                "--timeout" | "-t" => {
                    i += 1;
                    if i < args.len() {
                        timeout = args[i].parse().ok();
                    }
                }
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                }
            }
            i += 1;
        }

        Self {
            mongo,
            port,
            timeout,
        }
    }

    fn print_help() {
        println!(
            r#"replwire mongo_repl example

USAGE:
    cargo run --example mongo_repl -- [OPTIONS]

OPTIONS:
    -m, --mongo <PATH>       Shell executable [default: mongo]
    -p, --port <PORT>        Server port passed to the shell
    -t, --timeout <SECS>     Per-command timeout [default: none]
    --help                   Print this help message

Extra shell flags are read from $JUPYTER_CONFIG_DIR/imongo_config.yml
(default ~/.jupyter/imongo_config.yml) when present.
"#
        );
    }
}
