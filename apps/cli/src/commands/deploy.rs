//! `void-cloud deploy`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use voidcloud_api::Client;
use voidcloud_api::constants::PARAM_JWT;
use voidcloud_share::{DeployCommand, deploy};
use voidcloud_system::{Keyring, SystemKeyring};

use crate::config::Config;

#[derive(Debug, Args)]
pub struct DeployArgs {
    /// Server endpoint URL
    #[arg(long, env = "SERVER", value_name = "URL")]
    pub server: Option<String>,

    /// Organization ID
    #[arg(long, env = "ORG")]
    pub org: Option<String>,

    /// Game ID
    #[arg(long, env = "GAME")]
    pub game: Option<String>,

    /// Personal access token (defaults to the one saved by `login`)
    #[arg(long, env = "TOKEN", value_name = "TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Directory to deploy
    pub path: PathBuf,

    /// Deployment label
    pub label: Option<String>,
}

pub async fn run(args: DeployArgs, config: &Config) -> anyhow::Result<()> {
    let server = config.server(args.server);
    let token = match args.token.filter(|t| !t.is_empty()) {
        Some(token) => token,
        None => SystemKeyring::new(server.as_str())
            .get(PARAM_JWT)
            .unwrap_or_default(),
    };
    let client = Client::new(&server, &token)?;

    println!("Deploying {} ...", args.path.display());

    let cmd = DeployCommand::new(
        Arc::new(client),
        config.org(args.org),
        config.game(args.game),
        args.path,
    )
    .with_label(args.label.unwrap_or_default())
    .on_started(|_, manifest, incremental| {
        println!("{}", started_message(manifest.len(), incremental.len()));
    })
    .on_upload(|_, path| println!("deploying {path}"));

    let result = deploy(&cmd).await?;

    println!("Deployed to {}", result.url);
    Ok(())
}

fn started_message(total: usize, count: usize) -> String {
    if total == count {
        format!("deploying ALL {total} files")
    } else {
        format!("deploying {count} / {total} files")
    }
}
