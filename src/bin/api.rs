use alice_eph::api;
use alice_eph::settings::Settings;
use anyhow::Error;
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;

#[derive(Parser)]
#[clap(about, version, author)]
struct Args {
    /// Path to the config file
    #[clap(short, long)]
    config: Option<PathBuf>,
}

#[rocket::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .filter_module("rocket", log::LevelFilter::Error)
        .init();

    let args = Args::parse();
    let settings = Settings::load(args.config)?;
    let addr = settings.listen_addr()?;

    let mut config = rocket::Config::default();
    config.address = addr.ip();
    config.port = addr.port();

    info!("Upstream API: {}", settings.api.base_url);
    if settings.api.token.is_some() {
        info!("Using configured fallback token for requests without credentials");
    }

    if let Err(e) = api::rocket(settings, config).launch().await {
        error!("{}", e);
    }
    Ok(())
}
