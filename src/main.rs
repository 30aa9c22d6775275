use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use perworld::storage::key::encode_row_id;
use perworld::{LoadWaiter, Partition, PartitionState, SaveCause, Sessions, StoreConfig, open_store};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::LocalSet;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "perworld")]
#[command(about = "Inspect and maintain stored per-world player state")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct Target {
    #[arg(long)]
    player: String,
    #[arg(long)]
    world: String,
    /// World bundle the world belongs to, if any.
    #[arg(long)]
    bundle: Option<String>,
}

impl Target {
    fn partition(&self) -> Partition {
        match &self.bundle {
            Some(bundle) => Partition::bundled(&self.world, bundle),
            None => Partition::new(&self.world),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print the hex row id a player's world state is stored under.
    RowId {
        #[command(flatten)]
        target: Target,
    },
    /// Load a player's world state and print it as JSON.
    Show {
        #[arg(long, default_value = "memory://")]
        store: String,
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
        #[command(flatten)]
        target: Target,
    },
    /// Overwrite a player's world state with a fresh one.
    Reset {
        #[arg(long, default_value = "memory://")]
        store: String,
        #[command(flatten)]
        target: Target,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::RowId { target } => {
            let row_id = encode_row_id(&target.player, &target.partition())?;
            println!("{}", hex::encode(row_id));
            Ok(())
        }
        Command::Show {
            store,
            timeout_secs,
            target,
        } => run_local(show(&store, &target, Duration::from_secs(timeout_secs))),
        Command::Reset { store, target } => run_local(reset(&store, &target)),
    }
}

fn run_local<F: std::future::Future<Output = Result<()>>>(task: F) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;
    runtime.block_on(LocalSet::new().run_until(task))
}

async fn show(url: &str, target: &Target, timeout: Duration) -> Result<()> {
    let config = StoreConfig::from_url(url)?;
    let store = open_store(&config).await?;
    let sessions = Sessions::new(store.clone());
    let session = sessions.open(target.player.clone());

    let (tx, rx) = oneshot::channel();
    let tx = RefCell::new(Some(tx));
    let waiter: LoadWaiter = Rc::new(move |state: Rc<PartitionState>| {
        if let Some(tx) = tx.borrow_mut().take() {
            let _ = tx.send(state);
        }
    });
    session.load_partition(&target.partition(), waiter);

    let state = tokio::time::timeout(timeout, rx)
        .await
        .map_err(|_| anyhow!("Timed out loading '{}' for {}", target.world, target.player))?
        .context("Session closed before the load completed")?;
    println!("{}", serde_json::to_string_pretty(state.as_ref())?);

    sessions.close_all();
    store.close().await?;
    Ok(())
}

async fn reset(url: &str, target: &Target) -> Result<()> {
    let config = StoreConfig::from_url(url)?;
    let store = open_store(&config).await?;

    let (tx, rx) = oneshot::channel();
    store.save(
        &target.player,
        &target.partition(),
        Rc::new(PartitionState::empty()),
        SaveCause::Custom(0),
        Box::new(move |success: bool| {
            let _ = tx.send(success);
        }),
    );
    let saved = rx.await.context("Store dropped the save")?;
    store.close().await?;

    if !saved {
        return Err(anyhow!("Failed to reset '{}' for {}", target.world, target.player));
    }
    println!("Reset '{}' for {}", target.world, target.player);
    Ok(())
}
