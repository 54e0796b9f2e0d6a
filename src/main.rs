// Copyright 2023 Remi Bernotavicius

use clap::Parser;
use clap::Subcommand;
use simple_logger::SimpleLogger;
use std::path::PathBuf;

mod account;
mod api;
mod config;
mod database;
mod error;
mod filter;
mod import;
mod recipe;
mod relation;
mod shopping_list;
mod validation;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};

type MainResult<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync + 'static>>;

#[derive(Parser, Debug)]
#[command(version, about = "Recipe sharing backend")]
struct Args {
    #[command(flatten)]
    config: config::Config,

    #[command(subcommand)]
    commands: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve the HTTP API.
    Serve,
    /// Create a user and print their API token.
    CreateUser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
    },
    ImportIngredients {
        path: PathBuf,
    },
    ImportTags {
        path: PathBuf,
    },
}

fn serve(config: config::Config, path: PathBuf) -> MainResult<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(api::serve(config, path))?;
    Ok(())
}

fn main() -> MainResult<()> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    let args = Args::parse();
    SimpleLogger::new()
        .with_level(args.config.log_level)
        .env()
        .init()?;

    let path = args.config.database_path()?;
    match args.commands {
        Commands::Serve => serve(args.config, path)?,
        Commands::CreateUser {
            email,
            username,
            first_name,
            last_name,
        } => {
            let mut conn = database::establish_connection(&path)?;
            let registration = account::Registration {
                email,
                username,
                first_name,
                last_name,
            };
            let (id, token) = account::create_user(&mut conn, &registration)?;
            println!("created user {id} with token {token}");
        }
        Commands::ImportIngredients { path: file } => {
            let mut conn = database::establish_connection(&path)?;
            let count = import::import_ingredients(&mut conn, file)?;
            println!("imported {count} ingredient(s)");
        }
        Commands::ImportTags { path: file } => {
            let mut conn = database::establish_connection(&path)?;
            let count = import::import_tags(&mut conn, file)?;
            println!("imported {count} tag(s)");
        }
    }
    Ok(())
}
