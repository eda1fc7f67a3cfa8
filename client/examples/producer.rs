use std::net::SocketAddr;

use clap::Parser;
use flexi_logger::{colored_detailed_format, Logger};
use pylon_client::{client::ClientBuilder, producer::Properties};
use pylon_common::types::{BatchMessage, CompressionType};

#[derive(clap::Parser)]
struct Args {
    #[arg(long, env = "PYLON_BROKER_ADDR", default_value = "127.0.0.1:6650")]
    addr: SocketAddr,
    #[arg(long, env = "PYLON_TOPIC", default_value = "test-topic")]
    topic: String,
    /// number of single messages to publish
    #[arg(short, long, default_value_t = 10)]
    count: usize,
    /// publish the messages as one batch instead
    #[arg(long)]
    batch: bool,
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
    let mut producer = client.new_producer(&args.topic).await?;

    if args.batch {
        let batch: BatchMessage = (0..args.count)
            .map(|i| format!("hello, world {i}"))
            .collect();
        let sequence_id = producer.send_batch(batch, CompressionType::None).await?;
        let receipt = producer.receive_send_receipt().await?;
        println!("batch {sequence_id} stored as {}", receipt.message_id);
    } else {
        for i in 0..args.count {
            let mut properties = Properties::new();
            properties.insert("index".to_string(), i.to_string());
            let sequence_id = producer
                .send(format!("hello, world {i}"), properties)
                .await?;
            let receipt = producer.receive_send_receipt().await?;
            println!("message {sequence_id} stored as {}", receipt.message_id);
        }
    }

    producer.close(client.next_request_id()).await?;
    Ok(())
}
