//! Link monitor - connect to a robot serial port and watch packets arrive.
//!
//! ```text
//! cargo run --example monitor -- /dev/ttyUSB0 [baud]
//! ```

use std::sync::Arc;
use std::time::Duration;

use roverlink::transport::DEFAULT_BAUD;
use roverlink::{LatestPacketStore, Session};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roverlink=debug".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let path = args.next().ok_or("usage: monitor <serial-port> [baud]")?;
    let baud = match args.next() {
        Some(b) => b.parse()?,
        None => DEFAULT_BAUD,
    };

    let store = Arc::new(LatestPacketStore::new());
    let mut session = Session::new(store.clone());
    session.connect(&path, baud, None).await?;
    println!("connected to {} at {} baud", path, baud);

    loop {
        match tokio::time::timeout(Duration::from_secs(5), session.wait_for_packet()).await {
            Ok(()) => println!(
                "accepted {:6}  corrupted {:4}  distinct IDs {:3}",
                session.packets_accepted(),
                session.packets_corrupted(),
                store.len()
            ),
            Err(_) => {
                if !session.connected() {
                    println!("link closed");
                    break;
                }
                println!("no packets in the last 5s");
            }
        }
    }

    session.disconnect().await;
    Ok(())
}
