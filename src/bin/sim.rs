//! Touch simulator - sends synthetic station messages over UDP
//!
//! Drives a local votewave server through start/hold/end cycles without
//! real station hardware.
//!
//! Usage:
//!   cargo run --bin sim -- --source 101 --choice left --hold-ms 1500
//!   cargo run --bin sim -- --beat

use clap::Parser;
use serde_json::json;
use tokio::net::UdpSocket;
use tokio::time::{sleep, Duration};

#[derive(Parser, Debug)]
#[command(name = "sim")]
#[command(about = "Sends synthetic touch messages to a votewave server")]
struct Args {
    /// Server address
    #[arg(long, default_value = "127.0.0.1:3333")]
    addr: String,

    /// Station source (last octet of the device ip)
    #[arg(long, default_value_t = 101)]
    source: i64,

    /// Station choice
    #[arg(long, default_value = "left")]
    choice: String,

    /// Touch hold duration per cycle
    #[arg(long, default_value_t = 500)]
    hold_ms: u64,

    /// Number of start/end cycles to send
    #[arg(long, default_value_t = 1)]
    cycles: u32,

    /// Pause between cycles
    #[arg(long, default_value_t = 250)]
    pause_ms: u64,

    /// Send a single touch_beat instead of touch cycles
    #[arg(long)]
    beat: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.connect(&args.addr).await?;

    if args.beat {
        send(&socket, &args, "touch_beat").await?;
        return Ok(());
    }

    for cycle in 0..args.cycles {
        if cycle > 0 {
            sleep(Duration::from_millis(args.pause_ms)).await;
        }
        send(&socket, &args, "start_touch").await?;
        sleep(Duration::from_millis(args.hold_ms)).await;
        send(&socket, &args, "end_touch").await?;
    }

    Ok(())
}

async fn send(
    socket: &UdpSocket,
    args: &Args,
    flavor: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let msg = json!({
        "source": args.source,
        "flavor": flavor,
        "choice": args.choice,
    })
    .to_string();

    socket.send(msg.as_bytes()).await?;
    println!("sent {} to {}", msg, args.addr);
    Ok(())
}
