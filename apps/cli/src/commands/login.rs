//! `void-cloud login`.

use std::sync::Arc;

use anyhow::bail;
use clap::Args;
use voidcloud_account::{LoginCommand, login};
use voidcloud_system::{SystemKeyring, SystemRuntime};

use crate::config::Config;

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Server endpoint URL
    #[arg(long, env = "SERVER", value_name = "URL")]
    pub server: Option<String>,
}

pub async fn run(args: LoginArgs, config: &Config) -> anyhow::Result<()> {
    let server = config.server(args.server);
    println!("logging in to {server} ...");

    let cmd = LoginCommand::new(server.as_str())
        .with_runtime(Arc::new(SystemRuntime::new()))
        .with_keyring(Arc::new(SystemKeyring::new(server.as_str())));

    let user = match login(&cmd).await {
        Ok(user) => user,
        Err(e) if e.is_timeout() => bail!("{e}, please try again"),
        Err(e) => return Err(e.into()),
    };

    println!("You are logged in");
    println!("{}", serde_json::to_string_pretty(&user)?);
    Ok(())
}
