use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "evpnctl")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative EVPN fabric configuration over RESTCONF", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Fabric configuration file
    #[arg(short, long, global = true, env = "EVPNCTL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Extra intent files, appended after the configuration's own resources
    #[arg(long, global = true)]
    pub intents: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Push intents to the fleet, in declaration order
    Apply {
        #[command(flatten)]
        select: Selection,

        /// Compile and print documents without contacting any device
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Re-send full documents to each resource's update path
    Update {
        #[command(flatten)]
        select: Selection,
    },

    /// Remove intents from the fleet, in reverse declaration order
    Destroy {
        #[command(flatten)]
        select: Selection,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Fetch intents from every host they apply to
    Read {
        #[command(flatten)]
        select: Selection,
    },

    /// Preview compiled documents offline
    Render {
        #[command(flatten)]
        select: Selection,

        /// Only render for this role
        #[arg(short, long)]
        role: Option<String>,
    },

    /// Show the hosts of one role or every role
    Hosts {
        /// Role name, e.g. spines
        role: Option<String>,
    },

    /// Send a raw request through the session manager
    Request(RequestArgs),

    /// Validate the fleet and every intent
    Validate,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Narrow an operation to some intents.
#[derive(Args, Clone, Default)]
pub struct Selection {
    /// Only intents of this kind, e.g. vlan
    #[arg(short, long)]
    pub kind: Option<String>,

    /// Only the intent with this id, e.g. 100
    #[arg(long)]
    pub id: Option<String>,
}

// ============================================================================
// Raw Requests
// ============================================================================

#[derive(Clone, Copy, ValueEnum)]
pub enum MethodArg {
    Fetch,
    Patch,
    Replace,
    Delete,
}

impl From<MethodArg> for restconf::Method {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::Fetch => Self::Fetch,
            MethodArg::Patch => Self::Patch,
            MethodArg::Replace => Self::Replace,
            MethodArg::Delete => Self::Delete,
        }
    }
}

#[derive(Args)]
#[command(group(clap::ArgGroup::new("target").required(true).args(["host", "role"])))]
pub struct RequestArgs {
    /// Request method
    #[arg(value_enum)]
    pub method: MethodArg,

    /// Resource path, e.g. /data/Cisco-IOS-XE-native:native/vlan
    pub path: String,

    /// Send to one host
    #[arg(long)]
    pub host: Option<String>,

    /// Fan out across a role's hosts
    #[arg(long)]
    pub role: Option<String>,

    /// File holding the JSON document for patch/replace
    #[arg(short, long)]
    pub payload: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_apply_selection() {
        let cli =
            Cli::try_parse_from(["evpnctl", "apply", "--kind", "vlan", "--id", "100", "-d"])
                .unwrap();
        match cli.command {
            Command::Apply { select, dry_run } => {
                assert_eq!(select.kind.as_deref(), Some("vlan"));
                assert_eq!(select.id.as_deref(), Some("100"));
                assert!(dry_run);
            }
            _ => panic!("expected apply"),
        }
    }

    #[test]
    fn test_request_requires_target() {
        assert!(Cli::try_parse_from(["evpnctl", "request", "fetch", "/data/x"]).is_err());
        assert!(
            Cli::try_parse_from([
                "evpnctl", "request", "fetch", "/data/x", "--host", "a", "--role", "leafs",
            ])
            .is_err()
        );
        let cli =
            Cli::try_parse_from(["evpnctl", "request", "delete", "/data/x", "--role", "leafs"])
                .unwrap();
        assert!(matches!(cli.command, Command::Request(RequestArgs { role: Some(_), .. })));
    }

    #[test]
    fn test_global_intents_repeatable() {
        let cli = Cli::try_parse_from([
            "evpnctl", "validate", "--intents", "a.toml", "--intents", "b.toml",
        ])
        .unwrap();
        assert_eq!(cli.intents.len(), 2);
    }
}
