use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use futures::StreamExt;
use tracing::{debug, Level};
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use respire::{Command, Config, Connection, ScanOptions, Subscription};

#[derive(Parser, Debug)]
#[command(version, about = "Talk to a Redis-compatible server")]
struct Args {
    #[arg(long, env = "REDIS_HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(short, long, env = "REDIS_PORT", default_value_t = 6379)]
    port: u16,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log debug output; repeat for trace output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Run a raw command and print the reply
    Exec {
        #[arg(required = true)]
        args: Vec<String>,
    },
    /// Print every key, one per line
    Scan {
        #[arg(long)]
        pattern: Option<String>,
        #[arg(long)]
        count: Option<u64>,
    },
    /// Print messages published to channels
    Subscribe {
        #[arg(required = true)]
        channels: Vec<String>,
    },
    /// Print messages published to channels matching patterns
    Psubscribe {
        #[arg(required = true)]
        patterns: Vec<String>,
    },
    /// Publish a message and print the number of receivers
    Publish { channel: String, message: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_tracing(&args) {
        eprintln!("(error) cannot open log file: {}", e);
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("(error) {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(args: &Args) -> std::io::Result<()> {
    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let writer = match &args.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(writer)
        .with_ansi(args.log_file.is_none())
        .try_init()
        .map_err(|e| eprintln!("Failed to initialize global tracing: {}", e));

    Ok(())
}

async fn run(args: Args) -> respire::Result<()> {
    let config = Config::new(format!("{}:{}", args.host, args.port));
    let conn = Connection::connect_with(config).await?;
    debug!(addr = %conn.peer_addr(), "connected");

    match args.command {
        Cmd::Exec { args } => {
            let reply = conn.run(Command::from_iter(args)).await?;
            println!("{}", reply);
        }
        Cmd::Scan { pattern, count } => {
            let options = ScanOptions { pattern, count };
            let mut scan = conn.scan(&[options])?;
            scan.each(|_, key| -> respire::Result<()> {
                println!("{}", key);
                Ok(())
            })
            .await?;
        }
        Cmd::Subscribe { channels } => print_messages(conn.subscribe(channels).await?).await?,
        Cmd::Psubscribe { patterns } => print_messages(conn.psubscribe(patterns).await?).await?,
        Cmd::Publish { channel, message } => {
            let receivers = conn.publish(channel, message).await?;
            println!("(integer) {}", receivers);
        }
    }

    Ok(())
}

async fn print_messages(mut subscription: Subscription) -> respire::Result<()> {
    while let Some(event) = subscription.next().await {
        let message = event?;
        match &message.pattern {
            Some(pattern) => println!(
                "{} {} {}",
                pattern,
                message.channel,
                String::from_utf8_lossy(&message.payload)
            ),
            None => println!(
                "{} {}",
                message.channel,
                String::from_utf8_lossy(&message.payload)
            ),
        }
    }
    Ok(())
}
