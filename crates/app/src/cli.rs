//! Command line of the `backoffice` binary.

use std::path::PathBuf;

use backoffice_domain::{ApiRequest, DomainError, HttpMethod, RequestBody};
use clap::{Parser, Subcommand};

/// Authenticated client for the back-office API
#[derive(Parser, Debug)]
#[command(name = "backoffice", version)]
#[command(about = "Authenticated client for the back-office API", arg_required_else_help = true)]
pub struct Cli {
    /// Settings file [default: backoffice.toml]
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub action: Action,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Log in and store the session
    Login {
        /// Account name
        username: String,
        /// Account password
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Send one authenticated request
    Send {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE)
        method: HttpMethod,
        /// Path relative to the API base URL, or an absolute URL
        path: String,
        /// JSON body for POST, PUT and PATCH
        #[arg(value_name = "JSON")]
        body: Option<String>,
    },
}

/// What the binary was asked to do, with request arguments resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Exchange credentials for a session.
    Login {
        /// Account name.
        username: String,
        /// Account password.
        password: String,
    },
    /// Forget the stored session.
    Logout,
    /// Show the cached user profile.
    WhoAmI,
    /// Send one authenticated request.
    Send(ApiRequest),
}

impl TryFrom<Action> for Command {
    type Error = DomainError;

    fn try_from(action: Action) -> Result<Self, Self::Error> {
        Ok(match action {
            Action::Login { username, password } => Self::Login { username, password },
            Action::Logout => Self::Logout,
            Action::Whoami => Self::WhoAmI,
            Action::Send { method, path, body } => {
                let request = ApiRequest::new(method, path);
                match body {
                    None => Self::Send(request),
                    Some(_) if !method.carries_body() => {
                        return Err(DomainError::InvalidBody(format!(
                            "{method} requests do not carry a body"
                        )));
                    }
                    Some(raw) => {
                        let value: serde_json::Value = serde_json::from_str(&raw)
                            .map_err(|e| DomainError::InvalidBody(e.to_string()))?;
                        Self::Send(request.with_body(RequestBody::Json(value)))
                    }
                }
            }
        })
    }
}
