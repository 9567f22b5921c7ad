// fieldguard/src/cli.rs
//! This file defines the command-line interface (CLI) for the fieldguard harness,
//! including all available commands and their arguments.
//! License: MIT OR APACHE 2.0

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "fieldguard",
    author = "FieldGuard Team",
    version = env!("CARGO_PKG_VERSION"),
    about = "Detect and mask sensitive data in form-field text",
    long_about = "FieldGuard scans short text, such as the value of a form field, for payment cards, national IDs, emails, phone numbers, credentials, cloud keys, private-key blocks and organization-defined categories. This harness runs the engine the way a host application would: with optional field metadata, custom patterns and an organization policy.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Disable informational messages
    #[arg(long, short = 'q', global = true, help = "Suppress all informational and debug messages.")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, short = 'd', global = true, help = "Enable debug logging.")]
    pub debug: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// All available commands for the `fieldguard` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scans text for sensitive data and lists the findings.
    #[command(about = "Scans text for sensitive data and lists the findings.")]
    Scan(ScanCommand),

    /// Prints the text with every finding masked.
    #[command(about = "Prints the text with every finding masked.")]
    Mask(MaskCommand),

    /// Tools for custom pattern files.
    #[command(subcommand, about = "Tools for custom pattern files.")]
    Patterns(PatternsCommand),

    /// Tools for organization policy files.
    #[command(subcommand, about = "Signs and verifies organization policy files.")]
    Policy(PolicyCommand),
}

/// Where the text comes from and which rules apply to it. Shared by `scan` and `mask`.
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Text to scan (reads from --input-file or stdin if not provided).
    #[arg(long, short = 't', value_name = "TEXT", conflicts_with = "input_file", help = "Text to scan. Reads from --input-file or stdin when omitted.")]
    pub text: Option<String>,

    /// Path to an input file.
    #[arg(long, short = 'i', value_name = "FILE", help = "Read input from a specified file instead of stdin.")]
    pub input_file: Option<PathBuf>,

    /// Path to an engine configuration file (YAML).
    #[arg(long = "config", value_name = "FILE", help = "Path to an engine configuration file (YAML).")]
    pub config: Option<PathBuf>,

    /// Path to a custom pattern file (YAML list).
    #[arg(long = "patterns", value_name = "FILE", help = "Path to a custom pattern file (YAML list).")]
    pub patterns: Option<PathBuf>,

    /// Path to an organization policy file (YAML).
    #[arg(long = "policy", value_name = "FILE", help = "Apply an organization policy. Its signature is verified when FIELDGUARD_POLICY_KEY is set.")]
    pub policy: Option<PathBuf>,
}

/// Field metadata, as a host would read it from the focused input element.
#[derive(Args, Debug, Clone, Default)]
pub struct FieldArgs {
    /// Declared input type (text, email, tel, password, number).
    #[arg(long = "kind", value_name = "TYPE", help = "Declared input type, e.g. 'email' or 'tel'.")]
    pub kind: Option<String>,

    #[arg(long = "name", value_name = "NAME", help = "The field's name attribute.")]
    pub name: Option<String>,

    #[arg(long = "placeholder", value_name = "TEXT", help = "The field's placeholder text.")]
    pub placeholder: Option<String>,

    #[arg(long = "label", value_name = "TEXT", help = "The field's visible label.")]
    pub label: Option<String>,

    #[arg(long = "title", value_name = "TEXT", help = "The field's title or accessibility text.")]
    pub title: Option<String>,
}

/// Arguments for the `scan` command.
#[derive(Args, Debug)]
pub struct ScanCommand {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub field: FieldArgs,

    /// Also print the text with every reported finding masked.
    #[arg(long, short = 'm', help = "Also print the text with every reported finding masked.")]
    pub mask: bool,

    /// Print findings as JSON instead of a table.
    #[arg(long, help = "Print findings as JSON instead of a table.")]
    pub json: bool,

    /// Ask the configured remote classifier as well.
    #[arg(long, help = "Also query the remote classifier named by remote.endpoint in the config file.")]
    pub remote: bool,
}

/// Arguments for the `mask` command.
#[derive(Args, Debug)]
pub struct MaskCommand {
    #[command(flatten)]
    pub input: InputArgs,

    /// Refuse to mask when any custom pattern fails to register.
    #[arg(long, help = "Fail instead of masking with a partial pattern set.")]
    pub strict: bool,
}

/// Subcommands for the `patterns` command.
#[derive(Subcommand, Debug)]
pub enum PatternsCommand {
    #[command(about = "Compiles a pattern file and prints the registration report.")]
    Check {
        /// The path to the pattern YAML file.
        #[arg(value_name = "FILE", help = "The path to the pattern YAML file.")]
        path: PathBuf,

        /// Print the report as JSON.
        #[arg(long, help = "Print the report as JSON.")]
        json: bool,
    },
}

/// Subcommands for the `policy` command.
#[derive(Subcommand, Debug)]
pub enum PolicyCommand {
    #[command(about = "Signs a policy YAML file in place with an HMAC-SHA256 key.")]
    Sign {
        /// The path to the policy YAML file to sign.
        #[arg(value_name = "FILE", help = "The path to the policy YAML file to sign.")]
        path: PathBuf,
        /// Hex-encoded signing key.
        #[arg(long = "key-hex", env = "FIELDGUARD_POLICY_KEY", hide_env_values = true, value_name = "HEX", help = "Hex-encoded signing key.")]
        key_hex: String,
    },
    #[command(about = "Verifies and validates a policy YAML file.")]
    Verify {
        /// The path to the policy YAML file to verify.
        #[arg(value_name = "FILE", help = "The path to the policy YAML file to verify.")]
        path: PathBuf,
        /// Hex-encoded verification key.
        #[arg(long = "key-hex", env = "FIELDGUARD_POLICY_KEY", hide_env_values = true, value_name = "HEX", help = "Hex-encoded verification key.")]
        key_hex: String,
    },
}
