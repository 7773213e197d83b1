// ABOUTME: fee-cli - command-line front end for the college fee backend
// ABOUTME: Logs in, inspects the decoded session, and sends guarded requests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors
//!
//! Usage:
//! ```bash
//! # Log in through the admin portal (admin, finance, HOD)
//! fee-cli login admin --email finance@college.edu --password secret
//!
//! # Log in as a student
//! fee-cli login student --usn-or-email 1AB21CS001 --password secret
//!
//! # Show the session decoded from the stored access token
//! fee-cli whoami
//!
//! # Ask the gate whether a call would be sent
//! fee-cli can POST /payments/offline/
//!
//! # Send a guarded request
//! fee-cli request GET /invoices/ --query status=unpaid
//! fee-cli request POST /payments/offline/ --data '{"invoice": 3, "amount": "1500.00"}'
//!
//! # Check backend connectivity
//! fee-cli status
//!
//! # End the session
//! fee-cli logout
//! ```

mod commands;
mod helpers;

use clap::{Parser, Subcommand};
use college_fee_client::{
    auth::AuthService,
    client::ApiClient,
    config::ClientConfig,
    errors::{AppError, AppResult},
    guard::RefreshMode,
    logging::LoggingConfig,
    models::Role,
    session::FileSessionStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use helpers::navigator::ConsoleNavigator;

type Result<T> = AppResult<T>;

#[derive(Parser)]
#[command(
    name = "fee-cli",
    about = "College fee backend client",
    long_about = "Command-line client for the college fee-management backend. Tokens are kept in a session file and every request passes the same permission gate and refresh logic as the library."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Backend base URL override
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Session file override
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    /// Refresh mode override (independent or coalesced)
    #[arg(long, global = true)]
    refresh_mode: Option<RefreshMode>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the token pair
    Login {
        #[command(subcommand)]
        portal: LoginCommand,
    },

    /// Log out (backend best effort) and remove stored tokens
    Logout,

    /// Show the session decoded from the stored access token
    Whoami,

    /// Fetch the current user's profile from the backend
    Me,

    /// Show whether the gate would allow a call, without sending it
    Can {
        /// HTTP method
        method: String,
        /// Path relative to the base URL
        path: String,
    },

    /// Send a guarded request and print the JSON response
    Request {
        /// HTTP method
        method: String,
        /// Path relative to the base URL
        path: String,
        /// JSON request body
        #[arg(long)]
        data: Option<String>,
        /// Query parameter as key=value (repeatable)
        #[arg(long = "query", short = 'q')]
        query: Vec<String>,
    },

    /// Check whether the session may enter a route restricted to some roles
    Route {
        /// Allowed roles (none means any logged-in user)
        roles: Vec<Role>,
    },

    /// Probe backend connectivity
    Status,
}

#[derive(Subcommand)]
enum LoginCommand {
    /// Student portal login
    Student {
        /// USN or email address
        #[arg(long)]
        usn_or_email: String,
        /// Password
        #[arg(long)]
        password: String,
    },

    /// Admin portal login (admin, finance, HOD)
    Admin {
        /// Email address
        #[arg(long)]
        email: String,
        /// Password
        #[arg(long)]
        password: String,
    },

    /// Generic staff login
    Staff {
        /// Email address
        #[arg(long)]
        email: String,
        /// Password
        #[arg(long)]
        password: String,
    },
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config.base_url = Url::parse(base_url)
            .map_err(|e| AppError::invalid_input(format!("--base-url '{base_url}': {e}")))?;
    }
    if let Some(path) = &cli.session_file {
        config.session_file = Some(path.clone());
    }
    if let Some(mode) = cli.refresh_mode {
        config.refresh_mode = mode;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = LoggingConfig::for_cli(cli.verbose).init() {
        eprintln!("logging disabled: {e}");
    }

    let config = load_config(&cli)?;
    debug!("{}", config.summary());

    let session_file = config.session_file_path().ok_or_else(|| {
        AppError::config("no user config directory found; set FEE_SESSION_FILE or --session-file")
    })?;
    let client = ApiClient::for_config(&config)
        .store(Arc::new(FileSessionStore::new(session_file)))
        .navigator(Arc::new(ConsoleNavigator))
        .build();
    let auth = AuthService::new(client.clone());

    let outcome = match cli.command {
        Command::Login { portal } => commands::session::login(&auth, portal.into_credentials()).await,
        Command::Logout => commands::session::logout(&auth).await,
        Command::Whoami => commands::session::whoami(&auth),
        Command::Me => commands::session::me(&auth).await,
        Command::Route { roles } => {
            commands::session::route(&auth, &roles);
            Ok(())
        }
        Command::Can { method, path } => commands::request::can(&client, &method, &path),
        Command::Request {
            method,
            path,
            data,
            query,
        } => commands::request::send(&client, &method, &path, data.as_deref(), &query).await,
        Command::Status => {
            commands::request::status(&client).await;
            Ok(())
        }
    };

    if let Err(e) = &outcome {
        warn!(code = ?e.code, "command failed");
    }
    outcome
}

impl LoginCommand {
    fn into_credentials(self) -> college_fee_client::models::Credentials {
        use college_fee_client::models::Credentials;
        match self {
            Self::Student {
                usn_or_email,
                password,
            } => Credentials::Student {
                usn_or_email,
                password,
            },
            Self::Admin { email, password } => Credentials::Admin { email, password },
            Self::Staff { email, password } => Credentials::Staff { email, password },
        }
    }
}
