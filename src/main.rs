//! application entry point

use crate::desk::model::config::ClientConfig;
use crate::desk::model::draft::DraftLineItem;
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use derive_more::Display;
use log::{debug, info};
use std::env;
use std::path::Path;
use std::str::FromStr;

mod desk;

#[derive(Parser, Debug)]
#[command(name = "bill-desk")]
#[command(about = "client cli to list and create bills for one user", version, long_about = None)]
struct Cli {
    /// user the bills belong to, overrides BILLS_USER_ID
    #[arg(long, global = true)]
    user_id: Option<i64>,
    /// base url of the bill service, overrides BILLS_API_URL
    #[arg(long, global = true)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// list the bills of the user
    List,
    /// show one bill with its items
    #[command(arg_required_else_help = true)]
    Show(ShowArgs),
    /// open the bill form
    Create(CreateArgs),
}

#[derive(Debug, Args)]
struct ShowArgs {
    #[arg(help = "Bill id to show", value_parser = clap::value_parser!(i64).range(1..))]
    id: i64,
}

#[derive(Debug, Args)]
struct CreateArgs {
    #[arg(long = "item", help = "Pre-filled row, repeatable.", value_name = "NAME,PRICE,QTY", value_parser = parse_item_arg)]
    items: Vec<DraftLineItem>,
    #[arg(long, help = "Submit right away instead of opening the interactive form.")]
    submit: bool,
}

/// `NAME,PRICE,QTY`, split from the right so names may contain commas
fn parse_item_arg(raw: &str) -> Result<DraftLineItem, String> {
    let mut parts = raw.rsplitn(3, ',');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(quantity), Some(unit_price), Some(product_name)) => Ok(DraftLineItem::new(
            product_name.trim(),
            unit_price.trim(),
            quantity.trim(),
        )),
        _ => Err(format!("expected NAME,PRICE,QTY, got {raw:?}")),
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // bootstrap
    // a. env
    let env = env::var("APP_ENV")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(Env::Dev); // default dev env if absent

    let dotenv = match env {
        Env::Prod | Env::Stg => None, // provided by the deployment
        Env::Dev => Some(dotenvy::from_path(Path::new(".env.dev"))),
    };

    // b. logging
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    if let Some(Err(e)) = dotenv {
        debug!("no .env.dev loaded, {}", e);
    }

    // c. config
    let args = Cli::parse();
    let mut config = ClientConfig::from_env().context("failed to load config from env, aborting")?;
    if let Some(user_id) = args.user_id {
        config = config.with_user_id(user_id);
    }
    if let Some(url) = args.base_url {
        config = config.with_base_url(url);
    }

    info!("bill desk is starting in env={} for user={}", env, config.user_id);

    match args.command {
        Commands::List => desk::list(&config).await,
        Commands::Show(args) => desk::show(&config, args.id).await,
        Commands::Create(args) => desk::create(&config, args.items, args.submit).await,
    }
}

#[derive(Debug, Display)]
#[non_exhaustive]
enum Env {
    #[display("dev")]
    Dev,
    #[display("stg")]
    Stg,
    #[display("prod")]
    Prod,
}

impl FromStr for Env {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Self::Dev),
            "stg" => Ok(Self::Stg),
            "prod" => Ok(Self::Prod),
            s => Err(format!("Invalid Env: {s}")),
        }
    }
}
