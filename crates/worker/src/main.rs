use anyhow::Context;
use clap::{Parser, Subcommand};
use hanami_core::roles::Role;
use hanami_worker::bloom_batch::{self, BatchOptions, DEFAULT_BATCH_SIZE};
use hanami_worker::{annotators, master};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Hanami batch jobs and account provisioning.
#[derive(Parser, Debug)]
#[command(name = "hanami-worker", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recompute the bloom status of every photo.
    BloomStatus {
        /// Compute and report without writing.
        #[arg(long)]
        dry_run: bool,

        /// Photos per page and per transaction.
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE, value_parser = clap::value_parser!(i64).range(1..))]
        batch_size: i64,
    },

    /// Manage annotator accounts.
    Annotator {
        #[command(subcommand)]
        action: AnnotatorAction,
    },

    /// Print the hash of a password. Does not touch the database.
    HashPassword { password: String },
}

#[derive(Subcommand, Debug)]
enum AnnotatorAction {
    Create {
        username: String,
        password: String,
        #[arg(long, default_value = "annotator", value_parser = parse_role)]
        role: Role,
    },
    List,
    Delete { username: String },
}

fn parse_role(s: &str) -> Result<Role, String> {
    Role::parse(s).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hanami_worker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match Cli::parse().command {
        Command::BloomStatus {
            dry_run,
            batch_size,
        } => {
            let calculator = master::load(&master::MasterPaths::from_env())?;
            let pool = connect().await?;
            if dry_run {
                println!("=== dry run: no rows will be written ===");
            }
            let stats = bloom_batch::run(
                &pool,
                &calculator,
                BatchOptions {
                    batch_size,
                    dry_run,
                },
            )
            .await?;
            println!(
                "done: processed {} | updated {} | skipped {} | errors {}",
                stats.processed, stats.updated, stats.skipped, stats.errors
            );
        }
        Command::Annotator { action } => {
            let pool = connect().await?;
            match action {
                AnnotatorAction::Create {
                    username,
                    password,
                    role,
                } => {
                    let a = annotators::create(&pool, &username, &password, role).await?;
                    println!("created annotator {} (id {}, role {})", a.username, a.id, a.role);
                }
                AnnotatorAction::List => {
                    for a in annotators::list(&pool).await? {
                        println!("{}", annotators::format_row(&a));
                    }
                }
                AnnotatorAction::Delete { username } => {
                    annotators::delete(&pool, &username).await?;
                    println!("deleted annotator {username}");
                }
            }
        }
        Command::HashPassword { password } => {
            println!("{}", annotators::hash(&password)?);
        }
    }

    Ok(())
}

async fn connect() -> anyhow::Result<hanami_db::DbPool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    hanami_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")
}
