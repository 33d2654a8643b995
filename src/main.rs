use std::path::PathBuf;

use clap::{Parser, Subcommand};
use locshare::{
    config,
    database::{self, migrate, seed},
    server,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Multi-user location sharing server")]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = config::DEFAULT_PATH)]
    config: PathBuf,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Copy, Clone, Subcommand)]
enum Command {
    /// Run pending migrations and serve HTTP (default)
    Serve,
    /// Run pending migrations
    Migrate,
    /// List migrations and whether they ran
    MigrateStatus,
    /// Create default users and locations
    Seed,
}

#[tokio::main]
async fn main() {
    println!("Started version {}", env!("CARGO_PKG_VERSION"));
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = config::get(&args.config).await.expect("Config read failed");

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => server::serve(config).await.expect("Server failed"),
        Command::Migrate => {
            let conn = database::connect(&config.database_url).await.expect("Database connection failed");
            migrate::run(&conn).await.expect("Migration failed");
        }
        Command::MigrateStatus => {
            let conn = database::connect(&config.database_url).await.expect("Database connection failed");
            for (migration, applied) in migrate::status(&conn).await.expect("Migration status failed") {
                println!("{:>4} {} {}", if applied { "up" } else { "down" }, migration.version, migration.name);
            }
        }
        Command::Seed => {
            let conn = database::connect(&config.database_url).await.expect("Database connection failed");
            migrate::run(&conn).await.expect("Migration failed");
            seed::run(&conn).await.expect("Seed failed");
        }
    }
}
