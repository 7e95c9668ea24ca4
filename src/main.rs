use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, Local};
use clap::{Parser, Subcommand};

use duebell::actors::ReminderScheduler;
use duebell::config::Config;
use duebell::domain::Notification;
use duebell::ingest::IngestHandler;
use duebell::store::{JsonFileStorage, TaskStore};
use duebell::transport::{
    send_request, BroadcastPublisher, PublishServer, RequestServer, Subscription,
};
use duebell::{dlog, dlog_debug, dlog_error, Result};

/// duebell - task intake and one-shot reminder broadcaster
#[derive(Parser, Debug)]
#[command(name = "duebell")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    DUEBELL_DEBUG=1     Enable debug logging (alternative to --debug)")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Config file (defaults to ~/.duebell/duebell.toml)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the service (default when no subcommand is given)
    Serve {
        /// Address for the request channel
        #[arg(long)]
        request_addr: Option<String>,

        /// Address for the publish channel
        #[arg(long)]
        publish_addr: Option<String>,

        /// Task file path
        #[arg(long)]
        task_file: Option<String>,

        /// Seconds before the due time at which reminders fire
        #[arg(long)]
        lead_time_secs: Option<u64>,

        /// Seconds between reminder scans
        #[arg(long)]
        tick_interval_secs: Option<u64>,

        /// Log to stderr instead of the log file
        #[arg(long)]
        stderr: bool,
    },

    /// Send a batch of tasks and print the reply
    Send {
        /// JSON file holding the batch; reads stdin when omitted
        file: Option<PathBuf>,

        /// Send a built-in sample batch instead of reading input
        #[arg(long, conflicts_with = "file")]
        demo: bool,

        /// Request channel address
        #[arg(long, default_value = "127.0.0.1:5555")]
        addr: String,
    },

    /// Subscribe to reminders and print them as they arrive
    Listen {
        /// Publish channel address
        #[arg(long, default_value = "127.0.0.1:5556")]
        addr: String,

        /// Exit after this many reminders
        #[arg(long)]
        count: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Some(Command::Send { file, demo, addr }) => {
            duebell::log::init(cli.debug, None);
            run_send(file, demo, &addr)
        }
        Some(Command::Listen { addr, count }) => {
            duebell::log::init(cli.debug, None);
            run_listen(&addr, count)
        }
        Some(Command::Serve {
            request_addr,
            publish_addr,
            task_file,
            lead_time_secs,
            tick_interval_secs,
            stderr,
        }) => {
            config.request_addr = request_addr.or(config.request_addr);
            config.publish_addr = publish_addr.or(config.publish_addr);
            config.task_file = task_file.or(config.task_file);
            config.lead_time_secs = lead_time_secs.or(config.lead_time_secs);
            config.tick_interval_secs = tick_interval_secs.or(config.tick_interval_secs);

            let log_path = if stderr { None } else { Some(config.log_file()?) };
            duebell::log::init(cli.debug, log_path);
            run_serve(config).inspect_err(|e| dlog_error!("duebell failed: {}", e))
        }
        None => {
            duebell::log::init(cli.debug, Some(config.log_file()?));
            run_serve(config).inspect_err(|e| dlog_error!("duebell failed: {}", e))
        }
    }
}

/// Run both channels and the reminder actor until Ctrl-C.
fn run_serve(config: Config) -> Result<()> {
    if duebell::log::is_debug() {
        dlog!("duebell starting (debug mode enabled)");
    } else {
        dlog!("duebell starting");
    }

    let task_file = config.task_file()?;
    dlog!("Task file: {}", task_file.display());

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let store = Arc::new(TaskStore::open(Arc::new(JsonFileStorage::new(task_file))).await);
        let publisher = BroadcastPublisher::default();

        let publish_server = PublishServer::bind(config.publish_addr(), publisher.clone()).await?;
        let request_server = RequestServer::bind(
            config.request_addr(),
            Arc::new(IngestHandler::new(Arc::clone(&store))),
        )
        .await?;

        let scheduler = ReminderScheduler::new(Arc::clone(&store), Arc::new(publisher))
            .with_interval(config.tick_interval())
            .with_lead_time(config.lead_time())
            .spawn();

        dlog!(
            "Task reminder service is running (requests {}, reminders {})",
            request_server.addr(),
            publish_server.addr()
        );

        tokio::signal::ctrl_c().await?;
        dlog!("Shutting down");

        request_server.stop().await;
        scheduler.stop().await;
        publish_server.stop().await;
        dlog!("duebell stopped with {} tasks stored", store.len().await);
        Ok(())
    })
}

fn run_send(file: Option<PathBuf>, demo: bool, addr: &str) -> Result<()> {
    let request = if demo {
        demo_batch()
    } else if let Some(path) = file {
        std::fs::read_to_string(path)?
    } else {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    };
    dlog_debug!("Sending request: {}", request);

    let rt = tokio::runtime::Runtime::new()?;
    let response = rt.block_on(send_request(addr, &request))?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// One task that enters the default reminder window about a minute after
/// it is sent, and one that fails every check.
fn demo_batch() -> String {
    let due = (Local::now() + Duration::minutes(61))
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string();
    serde_json::json!([
        {"title": "Submit assignment", "due": due},
        {"title": "", "due": "2025-08-01T23:15:00"}
    ])
    .to_string()
}

fn run_listen(addr: &str, count: Option<usize>) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut subscription = Subscription::connect(addr).await?;
        println!("Listening for reminders on {}", addr);

        let mut received = 0;
        while count.map_or(true, |limit| received < limit) {
            let Notification::Reminder { task } = subscription.next().await?;
            println!("[Reminder] '{}' is due at {} (id {})", task.title, task.due, task.id);
            received += 1;
        }
        Ok(())
    })
}
