//! EmberKV - A Single-Threaded, Event-Driven Key-Value Server
//!
//! This is the main entry point. It parses the command line, sets up
//! logging, binds the listener, and hands the thread to the event loop.

use anyhow::Context;
use emberkv::server::Server;
use emberkv::storage::Store;
use std::net::ToSocketAddrs;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Server configuration
struct Config {
    /// Host to bind to
    host: String,
    /// Port to listen on
    port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: emberkv::DEFAULT_HOST.to_string(),
            port: emberkv::DEFAULT_PORT,
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> Self {
        let mut config = Config::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    if i + 1 < args.len() {
                        config.host = args[i + 1].clone();
                        i += 2;
                    } else {
                        eprintln!("Error: --host requires a value");
                        std::process::exit(1);
                    }
                }
                "--port" | "-p" => {
                    if i + 1 < args.len() {
                        config.port = args[i + 1].parse().unwrap_or_else(|_| {
                            eprintln!("Error: invalid port number");
                            std::process::exit(1);
                        });
                        i += 2;
                    } else {
                        eprintln!("Error: --port requires a value");
                        std::process::exit(1);
                    }
                }
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("EmberKV version {}", emberkv::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                    print_help();
                    std::process::exit(1);
                }
            }
        }

        config
    }

    /// Returns the bind address as a string
    fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn print_help() {
    println!(
        r#"
EmberKV - A Single-Threaded, Event-Driven Key-Value Server

USAGE:
    emberkv [OPTIONS]

OPTIONS:
    -h, --host <HOST>    Host to bind to (default: 127.0.0.1)
    -p, --port <PORT>    Port to listen on (default: 6379)
    -v, --version        Print version information
        --help           Print this help message

EXAMPLES:
    emberkv                        # Start on 127.0.0.1:6379
    emberkv --port 6380            # Start on port 6380
    emberkv --host 0.0.0.0         # Listen on all interfaces

CONNECTING:
    Use redis-cli or any RESP client to connect:
    $ redis-cli -p 6379
    127.0.0.1:6379> PING
    PONG
    127.0.0.1:6379> SET name ember
    OK
    127.0.0.1:6379> GET name
    "ember"
"#
    );
}

fn print_banner(config: &Config) {
    println!(
        r#"
EmberKV v{} - Single-Threaded Event-Driven Key-Value Server
──────────────────────────────────────────────────────────
Listening on {}
Commands: PING, ECHO, SET (EX/PX), GET
"#,
        emberkv::VERSION,
        config.bind_address()
    );
}

fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = Config::from_args();

    // Set up logging; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    print_banner(&config);

    let addr = config
        .bind_address()
        .to_socket_addrs()
        .with_context(|| format!("invalid bind address '{}'", config.bind_address()))?
        .next()
        .with_context(|| format!("could not resolve '{}'", config.bind_address()))?;

    // The store is owned by this server instance for its whole lifetime
    let mut server = Server::bind(addr, Store::new())
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;

    info!(addr = %server.local_addr(), "EmberKV started");

    // Returns only if the reactor itself fails
    server.run_forever().context("event loop terminated")?;
    Ok(())
}
