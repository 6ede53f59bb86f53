//! Drive one Cosmetica session from the command line.
//!
//! Reads the platform user from `COSMETICA_PLAYER_UUID`,
//! `COSMETICA_PLAYER_NAME` and `COSMETICA_ACCESS_TOKEN`, plus the usual
//! `COSMETICA_*` configuration, then authenticates, prints UI events and
//! keeps the session alive until Ctrl-C.

use std::sync::Arc;

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use cosmetica_auth::adapters::{ChannelUi, ReqwestHttpClient};
use cosmetica_auth::auth::{Identity, PlatformUser, API_ENDPOINT_RESOLVED, CLIENT_LOAD_FINISHED};
use cosmetica_auth::logging::{init_tracing, LogConfig};
use cosmetica_auth::{Session, SessionConfig};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn required_env(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| eyre!("{} must be set", key))
}

fn platform_user_from_env() -> Result<PlatformUser> {
    let uuid = required_env("COSMETICA_PLAYER_UUID")?;
    let name = required_env("COSMETICA_PLAYER_NAME")?;
    let access_token = required_env("COSMETICA_ACCESS_TOKEN")?;

    let identity = Identity::parse(&uuid, name)
        .wrap_err_with(|| format!("COSMETICA_PLAYER_UUID is not a valid uuid: {}", uuid))?;
    Ok(PlatformUser::new(identity, access_token))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    init_tracing(LogConfig {
        elevated: SessionConfig::elevated_logging_from_env(),
        ..Default::default()
    });
    tracing::info!("cosmetica-auth {}", VERSION);

    let config = SessionConfig::from_env();

    let user = platform_user_from_env()?;
    let (ui, mut events) = ChannelUi::new();
    let ui = Arc::new(ui);
    ui.set_loading(true);

    let mut session = Session::with_api_profiles(
        config,
        user,
        Arc::new(ReqwestHttpClient::new()),
        ui.clone(),
    );
    session.spawn_background();
    session.mark_ready(API_ENDPOINT_RESOLVED);
    session.mark_ready(CLIENT_LOAD_FINISHED);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => {
                    println!("{:?}", event);
                    ui.set_loading(false);
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.shutdown();
    Ok(())
}
