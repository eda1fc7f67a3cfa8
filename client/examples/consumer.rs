use std::net::SocketAddr;

use clap::Parser;
use flexi_logger::{colored_detailed_format, Logger};
use futures::StreamExt;
use pylon_client::{
    client::ClientBuilder,
    consumer::{ConsumeMessage, SubscribeMessage},
};
use pylon_common::types::{AckType, InitialPosition, Payload, SubType};
use signal_hook::consts::{SIGINT, SIGQUIT, SIGTERM};
use signal_hook_tokio::Signals;
use tokio::select;

#[derive(clap::Parser)]
struct Args {
    #[arg(long, env = "PYLON_BROKER_ADDR", default_value = "127.0.0.1:6650")]
    addr: SocketAddr,
    #[arg(long, env = "PYLON_TOPIC", default_value = "test-topic")]
    topic: String,
    #[arg(long, default_value = "test-subscription")]
    subscription: String,
    /// read the topic from the beginning
    #[arg(long)]
    earliest: bool,
    /// messages granted per flow request
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u32).range(1..))]
    permits: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    // logger init
    let _logger = Logger::try_with_str("debug")?
        .format(colored_detailed_format)
        .start()?;

    let mut client = ClientBuilder::new(args.addr)
        .keepalive(10000)
        .build()
        .await?;

    let initial_position = if args.earliest {
        InitialPosition::Earliest
    } else {
        InitialPosition::Latest
    };
    let mut consumer = client
        .new_consumer(
            SubscribeMessage::new(&args.topic, &args.subscription)
                .sub_type(SubType::Shared)
                .initial_position(initial_position),
        )
        .await?;
    consumer.flow(args.permits).await?;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGQUIT])?;
    let handle = signals.handle();
    let mut remaining = args.permits;
    loop {
        select! {
            msg = consumer.receive_message() => {
                let message = msg?;
                print_message(&message);
                consumer.ack(AckType::Individual, message.message_id, None).await?;
                remaining -= 1;
                if remaining == 0 {
                    consumer.flow(args.permits).await?;
                    remaining = args.permits;
                }
            }
            _ = signals.next() => {
                break
            }
        }
    }
    handle.close();
    consumer.close(client.next_request_id()).await?;
    Ok(())
}

fn print_message(message: &ConsumeMessage) {
    match &message.payload {
        Payload::Single(payload) => {
            println!(
                "received {}: {}",
                message.message_id,
                String::from_utf8_lossy(payload)
            );
        }
        Payload::Batch(batch) => {
            for (i, payload) in batch.iter().enumerate() {
                println!(
                    "received {}[{i}]: {}",
                    message.message_id,
                    String::from_utf8_lossy(payload)
                );
            }
        }
    }
}
