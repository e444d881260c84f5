//! Clap derive structures for the `stratus` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// stratus -- command-line client for Stratus cloud storage
#[derive(Debug, Parser)]
#[command(
    name = "stratus",
    version,
    about = "Manage your Stratus cloud storage from the command line",
    long_about = "Upload, share and manage files on a Stratus cloud storage server.\n\n\
        Administrators can also list accounts, change roles and browse\n\
        other users' storage.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "STRATUS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server URL (overrides profile)
    #[arg(long, short = 's', env = "STRATUS_SERVER", global = true)]
    pub server: Option<String>,

    /// Account to sign in as (overrides profile)
    #[arg(long, short = 'u', env = "STRATUS_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "STRATUS_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "STRATUS_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "STRATUS_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show who the current session belongs to
    Whoami,

    /// Check credentials and open a session
    Login(LoginArgs),

    /// Close the server session
    Logout(LogoutArgs),

    /// Create a new account
    Register(RegisterArgs),

    /// Manage stored files
    #[command(alias = "f")]
    Files(FilesArgs),

    /// Manage accounts (administrators only)
    #[command(alias = "u")]
    Users(UsersArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Session ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Store the password in the system keyring for this profile
    #[arg(long)]
    pub save: bool,
}

#[derive(Debug, Args)]
pub struct LogoutArgs {
    /// Also remove the stored keyring password for this profile
    #[arg(long)]
    pub forget: bool,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Account name
    pub username: String,

    /// Contact email
    #[arg(long, short = 'e')]
    pub email: String,
}

// ── Files ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FilesArgs {
    /// Act on another account's storage (administrators only)
    #[arg(long, global = true)]
    pub user: Option<u64>,

    #[command(subcommand)]
    pub command: FilesCommand,
}

#[derive(Debug, Subcommand)]
pub enum FilesCommand {
    /// List stored files
    #[command(alias = "ls")]
    List,

    /// Upload a local file
    Upload {
        /// Path of the file to upload
        path: PathBuf,

        /// Comment shown next to the file
        #[arg(long, short = 'm', default_value = "")]
        comment: String,
    },

    /// Rename a file
    Rename {
        /// File ID
        id: u64,
        /// New file name
        name: String,
    },

    /// Replace a file's comment
    Comment {
        /// File ID
        id: u64,
        /// New comment (empty to clear)
        text: String,
    },

    /// Create a public share link
    Share {
        /// File ID
        id: u64,
    },

    /// Revoke the public share link
    Unshare {
        /// File ID
        id: u64,
    },

    /// Delete a file
    #[command(alias = "rm")]
    Delete {
        /// File ID
        id: u64,
    },

    /// Download a file
    #[command(alias = "get")]
    Download {
        /// File ID
        id: u64,

        /// Target directory (overrides the profile's download_dir)
        #[arg(long, short = 'd')]
        dir: Option<PathBuf>,
    },
}

// ── Users ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// List all accounts
    #[command(alias = "ls")]
    List,

    /// Delete an account and its files
    #[command(alias = "rm")]
    Delete {
        /// Account ID
        id: u64,
    },

    /// Grant or revoke administrator rights
    Admin(AdminArgs),
}

#[derive(Debug, Args)]
pub struct AdminArgs {
    /// Account ID
    pub id: u64,

    #[command(flatten)]
    pub role: RoleChange,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct RoleChange {
    /// Make the account an administrator
    #[arg(long)]
    pub grant: bool,

    /// Remove administrator rights
    #[arg(long)]
    pub revoke: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Show the current configuration (secrets masked)
    Show,

    /// Print the config file location
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
