//! Frame client - subscribes to one category and prints what arrives
//!
//! Run with: cargo run --example frame_client -- CATEGORY [SERVER_ADDR]
//!
//! CATEGORY is one of: body, left, right, head
//!
//! Examples:
//!   cargo run --example frame_client -- body
//!   cargo run --example frame_client -- left 192.168.1.20:9009

use std::net::SocketAddr;

use pose_relay::client::FrameSubscriber;
use pose_relay::protocol::FramePayload;
use pose_relay::StreamCategory;

fn parse_category(arg: &str) -> Option<StreamCategory> {
    match arg {
        "body" => Some(StreamCategory::ClosestBody),
        "left" => Some(StreamCategory::HandColorLH),
        "right" => Some(StreamCategory::HandColorRH),
        "head" => Some(StreamCategory::HeadColor),
        _ => None,
    }
}

fn print_usage() {
    eprintln!("Usage: frame_client CATEGORY [SERVER_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  CATEGORY     body | left | right | head");
    eprintln!("  SERVER_ADDR  Relay address (default: 127.0.0.1:9009)");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let Some(category) = args.first().and_then(|a| parse_category(a)) else {
        print_usage();
        std::process::exit(1);
    };

    let addr: SocketAddr = match args.get(1) {
        Some(a) => a.replace("localhost", "127.0.0.1").parse()?,
        None => SocketAddr::from(([127, 0, 0, 1], 9009)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pose_relay=debug".parse()?),
        )
        .init();

    let mut subscriber = FrameSubscriber::connect(addr, category).await?;
    println!("Subscribed to {} on {}", category, addr);

    while let Some(frame) = subscriber.next_frame().await? {
        match &frame.payload {
            FramePayload::Body(body) => {
                let confident = body.joints.iter().filter(|j| j.confidence > 0.0).count();
                println!(
                    "t={} bodies={} engagement={:.2} joints={}/{}",
                    frame.timestamp,
                    frame.body_count,
                    body.engagement,
                    confident,
                    body.joints.len()
                );
            }
            FramePayload::Image(image) => {
                let mean = if image.samples.is_empty() {
                    0.0
                } else {
                    image.samples.iter().map(|&s| s as f64).sum::<f64>() / image.samples.len() as f64
                };
                println!(
                    "t={} code={} {}x{} mean={:.1}{}",
                    frame.timestamp,
                    frame.code,
                    image.dimensions.width,
                    image.dimensions.height,
                    mean,
                    if image.is_placeholder() { " (no detection)" } else { "" }
                );
            }
        }
    }

    println!(
        "Connection closed after {} frames",
        subscriber.frames_received()
    );
    Ok(())
}
