//! Command dispatch: bridges CLI args -> view models -> output formatting.

pub mod auth;
pub mod config_cmd;
pub mod files;
pub mod users;
pub mod util;

use stratus_core::CloudApp;

use crate::cli::{Command, GlobalOpts};
use crate::config::Target;
use crate::error::CliError;

/// Commands that talk to the storage server.
#[derive(Debug)]
pub enum ServerCommand {
    Whoami,
    Login(crate::cli::LoginArgs),
    Logout(crate::cli::LogoutArgs),
    Register(crate::cli::RegisterArgs),
    Files(crate::cli::FilesArgs),
    Users(crate::cli::UsersArgs),
}

/// Commands that run without a server.
#[derive(Debug)]
pub enum LocalCommand {
    Config(crate::cli::ConfigArgs),
    Completions(crate::cli::CompletionsArgs),
}

impl ServerCommand {
    /// Split off the commands that need a server; local ones come back as `Err`.
    pub fn from_command(cmd: Command) -> Result<Self, LocalCommand> {
        match cmd {
            Command::Whoami => Ok(Self::Whoami),
            Command::Login(args) => Ok(Self::Login(args)),
            Command::Logout(args) => Ok(Self::Logout(args)),
            Command::Register(args) => Ok(Self::Register(args)),
            Command::Files(args) => Ok(Self::Files(args)),
            Command::Users(args) => Ok(Self::Users(args)),
            Command::Config(args) => Err(LocalCommand::Config(args)),
            Command::Completions(args) => Err(LocalCommand::Completions(args)),
        }
    }
}

/// Dispatch a server-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: ServerCommand,
    app: &CloudApp,
    target: &Target,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        ServerCommand::Whoami => auth::whoami(app, target, global).await,
        ServerCommand::Login(args) => auth::login(app, target, args, global).await,
        ServerCommand::Logout(args) => auth::logout(app, target, args, global).await,
        ServerCommand::Register(args) => auth::register(app, args, global).await,
        ServerCommand::Files(args) => {
            auth::ensure_session(app, target, global).await?;
            files::handle(app, args, global).await
        }
        ServerCommand::Users(args) => {
            auth::ensure_session(app, target, global).await?;
            users::handle(app, args, global).await
        }
    }
}
