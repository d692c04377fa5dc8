//! Operator CLI for manufacturer accounts and registered drugs.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::env;
use std::io;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use medverify::domain::{GovCode, ManufacturerAdminService, ManufacturerDraft, ManufacturerId};
use medverify::outbound::persistence::{
    DbPool, DieselDrugRepository, DieselManufacturerRepository, PoolConfig,
    run_pending_migrations,
};
use tokio::runtime::Builder;

const DATABASE_URL_ENV: &str = "MEDVERIFY_DATABASE_URL";

/// `medverify-admin` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "medverify-admin",
    about = "Manage manufacturer accounts and registered drug batches",
    version
)]
struct CliArgs {
    /// Database connection URL. Falls back to `MEDVERIFY_DATABASE_URL` when omitted.
    #[arg(long = "database-url", value_name = "url", global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Create an unverified manufacturer account.
    CreateManufacturer {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long = "license-number")]
        license_number: String,
        #[arg(long)]
        phone: Option<String>,
        /// Government code to assign; generated when omitted.
        #[arg(long = "gov-code", value_parser = parse_gov_code)]
        gov_code: Option<GovCode>,
    },
    /// Allow a manufacturer to log in and register drugs.
    ApproveManufacturer {
        #[arg(value_parser = parse_manufacturer_id)]
        id: ManufacturerId,
    },
    /// Delete a manufacturer and every drug it registered.
    DeleteManufacturer {
        #[arg(value_parser = parse_manufacturer_id)]
        id: ManufacturerId,
    },
    ListManufacturers,
    ListDrugs,
    DeleteDrug {
        identifier: String,
    },
}

fn parse_gov_code(raw: &str) -> Result<GovCode, String> {
    GovCode::new(raw).map_err(|error| error.to_string())
}

fn parse_manufacturer_id(raw: &str) -> Result<ManufacturerId, String> {
    raw.parse().map_err(|error: medverify::domain::ManufacturerValidationError| {
        error.to_string()
    })
}

fn main() -> io::Result<()> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let database_url = resolve_database_url(args.database_url, env::var(DATABASE_URL_ENV).ok())?;

    let url = database_url.clone();
    tokio::task::spawn_blocking(move || run_pending_migrations(&url))
        .await
        .map_err(|error| io::Error::other(format!("migration task: {error}")))?
        .map_err(|error| io::Error::other(format!("apply migrations: {error}")))?;

    let pool = DbPool::new(PoolConfig::new(&database_url).with_max_size(2))
        .await
        .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;
    let admin = ManufacturerAdminService::new(
        Arc::new(DieselManufacturerRepository::new(pool.clone())),
        Arc::new(DieselDrugRepository::new(pool)),
    );

    run(&admin, args.command)
        .await
        .map_err(|error| io::Error::other(format!("{:?}: {}", error.code(), error.message())))
}

async fn run(
    admin: &ManufacturerAdminService,
    command: Command,
) -> Result<(), medverify::domain::Error> {
    match command {
        Command::CreateManufacturer {
            name,
            email,
            password,
            license_number,
            phone,
            gov_code,
        } => {
            let draft = ManufacturerDraft {
                name,
                email,
                phone,
                license_number,
                gov_code,
            };
            let created = admin.create_manufacturer(draft, &password).await?;
            println!("id={}", created.id);
            println!("gov_code={}", created.gov_code);
            println!("is_verified={}", created.is_verified);
        }
        Command::ApproveManufacturer { id } => {
            admin.approve_manufacturer(&id).await?;
            println!("approved={id}");
        }
        Command::DeleteManufacturer { id } => {
            admin.delete_manufacturer(&id).await?;
            println!("deleted={id}");
        }
        Command::ListManufacturers => {
            for manufacturer in admin.list_manufacturers().await? {
                println!(
                    "{}\t{}\t{}\t{}\tverified={}",
                    manufacturer.id,
                    manufacturer.gov_code,
                    manufacturer.email,
                    manufacturer.name,
                    manufacturer.is_verified
                );
            }
        }
        Command::ListDrugs => {
            for drug in admin.list_drugs().await? {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    drug.identifier, drug.name, drug.batch, drug.manufacturer_name, drug.expiry
                );
            }
        }
        Command::DeleteDrug { identifier } => {
            admin.delete_drug(&identifier).await?;
            println!("deleted={identifier}");
        }
    }
    Ok(())
}

fn resolve_database_url(explicit: Option<String>, from_env: Option<String>) -> io::Result<String> {
    if let Some(value) = explicit {
        if value.trim().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "--database-url must not be empty when provided",
            ));
        }
        return Ok(value);
    }

    match from_env {
        Some(value) if !value.trim().is_empty() => Ok(value),
        Some(_) => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{DATABASE_URL_ENV} must not be empty"),
        )),
        None => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("database URL missing: set --database-url or {DATABASE_URL_ENV}"),
        )),
    }
}
