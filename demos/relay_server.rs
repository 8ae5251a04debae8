//! Pose relay server
//!
//! Run with: cargo run --example relay_server -- [BIND_ADDR] [-- ENGINE CMD...]
//!
//! Examples:
//!   engine | cargo run --example relay_server                 # stdin, 0.0.0.0:9009
//!   cargo run --example relay_server localhost:9010            # stdin, 127.0.0.1:9010
//!   cargo run --example relay_server -- -- ./pose_engine -model_folder models
//!
//! Without an engine command the server reads engine output from stdin.
//!
//! ## Subscribing
//!
//!   cargo run --example frame_client -- body
//!   cargo run --example frame_client -- head 127.0.0.1:9009

use std::net::SocketAddr;

use pose_relay::protocol::constants::DEFAULT_PORT;
use pose_relay::upstream::EngineProcess;
use pose_relay::{Error, RelayServer, ServerConfig};
use tokio::io::BufReader;

/// Parse a bind address
///
/// Accepts "localhost", "localhost:PORT", "IP" and "IP:PORT".
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: relay_server [BIND_ADDR] [-- ENGINE CMD...]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:{})", DEFAULT_PORT);
    eprintln!("  ENGINE CMD   Engine to spawn; its stdout is relayed (default: read stdin)");
}

async fn serve<R>(server: &mut RelayServer, upstream: R)
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    match server.run_until(upstream, shutdown).await {
        Ok(()) => println!("\nShutting down..."),
        Err(Error::UpstreamClosed) => eprintln!("Engine output closed"),
        Err(e) => eprintln!("Server error: {}", e),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let (server_args, engine_cmd) = match args.iter().position(|a| a == "--") {
        Some(i) => (&args[..i], &args[i + 1..]),
        None => (&args[..], &args[args.len()..]),
    };

    let mut config = ServerConfig::default();
    if let Some(addr_str) = server_args.first() {
        match parse_bind_addr(addr_str) {
            Ok(addr) => config = config.bind(addr),
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pose_relay=info".parse()?)
                .add_directive("relay_server=debug".parse()?),
        )
        .init();

    let mut server = RelayServer::bind(config).await?;
    println!("Relaying pose frames on {}", server.local_addr()?);

    match engine_cmd.split_first() {
        Some((program, engine_args)) => {
            let mut engine = EngineProcess::spawn(program, engine_args)?;
            let stdout = engine
                .take_stdout()
                .ok_or("engine stdout unavailable")?;
            serve(&mut server, stdout).await;
            engine.kill().await?;
        }
        None => serve(&mut server, BufReader::new(tokio::io::stdin())).await,
    }

    Ok(())
}
