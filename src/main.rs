use anyhow::anyhow;
use sso_session::application_port::TargetService;
use sso_session::domain_model::*;
use sso_session::gate::*;
use sso_session::logger::*;
use sso_session::settings::*;
use sso_session::system::System;
use std::io::BufRead;
use std::time::Duration;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap()?;

    let project_settings = parse_settings(cli.settings.as_deref())?;
    debug!(?project_settings);
    let logger_config = LogConfig {
        filter: project_settings.log.filter.clone(),
    };
    logger.reload_from_config(&logger_config)?;

    let system = System::try_new(&project_settings).await?;
    run(&system, cli.command).await
}

async fn run(system: &System, command: Command) -> anyhow::Result<()> {
    let session = &system.session;

    match command {
        Command::Login { username, password } => {
            let password = match password {
                Some(password) => password,
                None => read_password()?,
            };
            session.login(&username, &password).await?;
            println!("logged in as {username}");
        }
        Command::OidcStart => {
            let start = session.begin_oidc_login().await?;
            println!("{}", start.auth_url);
        }
        Command::OidcCallback { redirect_url } => {
            let callback = OidcCallback::from_redirect_url(&redirect_url)?;
            let result = session.complete_oidc_login(&callback).await?;
            let who = result
                .user_info
                .and_then(|u| u.preferred_username)
                .unwrap_or_else(|| "unknown user".to_string());
            println!("logged in as {who}");
        }
        Command::Status => {
            let status = serde_json::json!({
                "authenticated": session.is_authenticated().await,
                "expired": session.is_token_expired().await,
                "access_expires_at": session.access_expires_at().await,
                "user": session.current_user().await,
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::Token => {
            let token = session
                .ensure_valid_token()
                .await
                .ok_or_else(|| anyhow!("not logged in"))?;
            println!("{token}");
        }
        Command::User { refresh } => {
            let user = match session.current_user().await {
                Some(user) if !refresh => user,
                _ => session.fetch_user_info().await?,
            };
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        Command::Targets { command } => {
            if let GateDecision::Redirect { to, from } = system.gate.check(&command.location()).await {
                return Err(anyhow!("login required: sign in at {to}, then return to {from}"));
            }
            run_targets(system.targets.as_ref(), command).await?;
        }
        Command::Logout => {
            session.logout().await;
            println!("logged out");
        }
        Command::Watch { interval_secs } => {
            let watcher = match interval_secs {
                Some(secs) => SessionWatcher::spawn(session.clone(), Duration::from_secs(secs)).await,
                None => system.spawn_watcher().await,
            };
            watch(&watcher, system.gate.login_path()).await;
            watcher.shutdown().await;
        }
    }
    Ok(())
}

async fn run_targets(targets: &dyn TargetService, command: TargetsCommand) -> anyhow::Result<()> {
    match command {
        TargetsCommand::List { query } => {
            let all = targets.list().await?;
            let shown: Vec<&Target> = match query.as_deref() {
                Some(query) => search_targets(&all, query),
                None => all.iter().collect(),
            };
            for target in shown {
                println!(
                    "{}\t{}\t{}",
                    target.id,
                    target.full_name(),
                    target.dob.as_deref().unwrap_or("-")
                );
            }
        }
        TargetsCommand::Get { id } => {
            let target = targets.get(&TargetId(id)).await?;
            println!("{}", serde_json::to_string_pretty(&target)?);
        }
        TargetsCommand::Create {
            first_name,
            last_name,
            dob,
        } => {
            let target = targets
                .create(NewTarget {
                    first_name,
                    last_name,
                    dob,
                })
                .await?;
            println!("{}", target.id);
        }
        TargetsCommand::Delete { id } => {
            targets.delete(&TargetId(id)).await?;
        }
    }
    Ok(())
}

async fn watch(watcher: &SessionWatcher, login_path: &str) {
    let mut state = watcher.subscribe();
    info!(authenticated = *state.borrow(), "watching session");

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => break,
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                if !*state.borrow() {
                    println!("session ended, log in again at {login_path}");
                    break;
                }
            }
        }
    }
}

fn read_password() -> anyhow::Result<String> {
    eprint!("password: ");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
