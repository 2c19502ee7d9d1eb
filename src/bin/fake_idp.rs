use clap::Parser;
use sso_session::fake_idp::*;
use sso_session::logger::*;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

/// Local stand-in for the identity broker and target API.
///
/// $ cargo run --bin fake_idp -- --address 127.0.0.1:8081 --prefix api --user alice:pw
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "127.0.0.1:8081")]
    address: SocketAddr,
    /// Mount point, e.g. "api" or "api2".
    #[arg(long, default_value = "api")]
    prefix: String,
    /// Extra `name:password` accounts.
    #[arg(long = "user")]
    users: Vec<String>,
    #[arg(long)]
    access_ttl_secs: Option<u64>,
    /// Where the authorize endpoint sends the browser back to.
    #[arg(long)]
    redirect_uri: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let logger = Logger::new_bootstrap()?;
    logger.reload_from_config(&LogConfig {
        filter: "info".to_string(),
    })?;

    let mut config = FakeIdpConfig::default();
    // Browsers land on our own login endpoint:
    // GET {auth_url}&username=alice&password=pw redirects to the callback.
    let mount = args.prefix.trim_matches('/');
    let login_path = if mount.is_empty() {
        "auth/oidc/authorize".to_string()
    } else {
        format!("{mount}/auth/oidc/authorize")
    };
    config.authorize_url = format!("http://{}/{login_path}", args.address);
    if let Some(uri) = args.redirect_uri {
        config.redirect_uri = uri;
    }
    if let Some(secs) = args.access_ttl_secs {
        config.jwt.access_ttl = std::time::Duration::from_secs(secs);
    }
    for user in &args.users {
        let (name, password) = user
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("expected name:password, got {user:?}"))?;
        config.users.push((name.to_string(), password.to_string()));
    }

    let idp = FakeIdp::spawn(Arc::new(FakeIdpState::new(config)), args.address, &args.prefix)?;
    info!(base_url = %idp.base_url(), "ready");

    signal::ctrl_c().await?;
    idp.shutdown().await;
    Ok(())
}
