// Copyright 2023 Remi Bernotavicius

use crate::validation::Limits;
use crate::Result;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(clap::Args, Debug, Clone)]
pub struct Config {
    /// SQLite database file. Defaults to a file in the user data directory.
    #[arg(long, env = "FOODGRAM_DATABASE", global = true)]
    pub database: Option<PathBuf>,

    #[arg(long, env = "FOODGRAM_BIND", default_value = "127.0.0.1:8000", global = true)]
    pub bind: SocketAddr,

    /// Maximum number of pooled database connections.
    #[arg(long, env = "FOODGRAM_POOL_SIZE", default_value_t = 8, global = true)]
    pub pool_size: usize,

    /// Minutes.
    #[arg(long, env = "FOODGRAM_MIN_COOKING_TIME", default_value_t = 1, global = true)]
    pub min_cooking_time: i32,

    #[arg(long, env = "FOODGRAM_MIN_INGREDIENT_AMOUNT", default_value_t = 1, global = true)]
    pub min_ingredient_amount: i32,

    #[arg(long, env = "FOODGRAM_LOG", default_value = "info", global = true)]
    pub log_level: log::LevelFilter,
}

impl Config {
    /// This is where the database lives unless configured otherwise. On Linux it should be like:
    /// `~/.local/share/foodgram/foodgram.sqlite`
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.database {
            return Ok(path.clone());
        }
        let dirs = directories::BaseDirs::new().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "failed to get user home directory",
            )
        })?;
        let path = dirs.data_dir().join("foodgram");
        std::fs::create_dir_all(&path)?;
        Ok(path.join("foodgram.sqlite"))
    }

    pub fn limits(&self) -> Limits {
        Limits {
            min_cooking_time: self.min_cooking_time,
            min_ingredient_amount: self.min_ingredient_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        config: Config,
    }

    #[test]
    fn flags() {
        let cli = Cli::parse_from([
            "foodgram",
            "--database",
            "/tmp/test.sqlite",
            "--min-cooking-time",
            "5",
            "--log-level",
            "debug",
        ]);
        assert_eq!(
            cli.config.database_path().unwrap(),
            PathBuf::from("/tmp/test.sqlite")
        );
        assert_eq!(
            cli.config.limits(),
            Limits {
                min_cooking_time: 5,
                min_ingredient_amount: 1,
            }
        );
        assert_eq!(cli.config.log_level, log::LevelFilter::Debug);
        assert_eq!(cli.config.pool_size, 8);
    }
}
