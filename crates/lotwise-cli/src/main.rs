//! Lotwise operations CLI
//!
//! Usage:
//!   lotwise migrate
//!   lotwise seed
//!   lotwise sweep-tokens
//!   lotwise geocode <address>

use clap::{Parser, Subcommand};
use lotwise_core::AppConfig;
use lotwise_geo::{Geocoder, GoogleGeocoder};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

const SCHEMA_SQL: &str = include_str!("../../../migrations/0001_init.sql");
const SEED_SQL: &str = include_str!("seed.sql");

#[derive(Parser)]
#[command(name = "lotwise")]
#[command(about = "Lotwise database and operations tooling")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the database schema
    Migrate,
    /// Load Metro Vancouver fixture data (replaces existing lookup data)
    Seed,
    /// Delete expired entries from the token blacklist
    SweepTokens,
    /// Geocode an address through the configured provider
    Geocode {
        /// Free-text address
        address: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    match cli.command {
        Commands::Migrate => {
            let pool = connect(&config).await?;
            sqlx::raw_sql(SCHEMA_SQL).execute(&pool).await?;
            println!("Schema applied");
        }
        Commands::Seed => {
            let pool = connect(&config).await?;
            sqlx::raw_sql(SEED_SQL).execute(&pool).await?;
            let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM properties")
                .fetch_one(&pool)
                .await?;
            println!("Seeded {count} properties");
        }
        Commands::SweepTokens => {
            let pool = connect(&config).await?;
            let swept = sqlx::query("DELETE FROM token_blacklist WHERE expires_at < NOW()")
                .execute(&pool)
                .await?
                .rows_affected();
            println!("Removed {swept} expired blacklist entries");
        }
        Commands::Geocode { address } => {
            let geocoder = GoogleGeocoder::from_config(&config.external)?
                .ok_or_else(|| anyhow::anyhow!("GOOGLE_MAPS_API_KEY is not set"))?;
            match geocoder.geocode(&address).await? {
                Some(result) => {
                    println!("{}", result.formatted_address);
                    println!(
                        "lat={:.7} lng={:.7}",
                        result.location.lat, result.location.lng
                    );
                }
                None => println!("No match for '{address}'"),
            }
        }
    }

    Ok(())
}

async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database.pool_size)
        .connect(&config.database.postgres_url)
        .await?;
    Ok(pool)
}
