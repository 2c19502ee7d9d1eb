use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "sso-session", about = "Single sign-on session client")]
pub struct Cli {
    #[arg(long)]
    pub settings: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Password login. Reads the password from stdin when not given.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Start an OIDC login and print the provider URL to open.
    OidcStart,
    /// Finish an OIDC login from the redirect URL the browser landed on.
    OidcCallback { redirect_url: String },
    Status,
    /// Print a valid access token, refreshing first if needed.
    Token,
    User {
        /// Ask the provider instead of using the cached profile.
        #[arg(long)]
        refresh: bool,
    },
    Targets {
        #[command(subcommand)]
        command: TargetsCommand,
    },
    Logout,
    /// Keep the session alive in the foreground until Ctrl-C.
    Watch {
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum TargetsCommand {
    List {
        /// Case-insensitive filter on "first last".
        #[arg(long)]
        query: Option<String>,
    },
    Get { id: String },
    Create {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        dob: Option<String>,
    },
    Delete { id: String },
}

impl TargetsCommand {
    /// The screen this command stands for, as the gate sees it.
    pub fn location(&self) -> String {
        match self {
            TargetsCommand::List { .. } => "/targets".to_string(),
            TargetsCommand::Get { id } => format!("/targets/{id}"),
            TargetsCommand::Create { .. } => "/targets/create".to_string(),
            TargetsCommand::Delete { id } => format!("/targets/{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_target_command() {
        let cli = Cli::try_parse_from([
            "sso-session",
            "--settings",
            "settings/system2.toml",
            "targets",
            "list",
            "--query",
            "ada",
        ])
        .unwrap();

        assert_eq!(cli.settings.as_deref(), Some("settings/system2.toml"));
        match cli.command {
            Command::Targets { command } => {
                assert_eq!(command.location(), "/targets");
                assert!(matches!(command, TargetsCommand::List { query: Some(q) } if q == "ada"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
