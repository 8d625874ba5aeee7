use crate::engine::SyncOptions;
use crate::scanner::Excludes;
use crate::transport::ssh::SshConfig;
use crate::{FtpTreeError, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Source: a local directory, or user@host:path to download
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Destination: a local directory, or user@host:path to upload to
    #[arg(value_name = "DESTINATION")]
    pub destination: String,

    /// Exclude patterns (glob, matched against paths relative to the source)
    #[arg(short, long)]
    pub exclude: Vec<String>,

    /// Port for SSH
    #[arg(short = 'p', long, default_value_t = 22)]
    pub port: u16,

    /// Identity file for SSH
    #[arg(short = 'i', long)]
    pub identity: Option<PathBuf>,

    /// Password (agent and default keys are tried when absent)
    #[arg(long, env = "FTPTREE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Connection timeout in seconds, 0 to disable
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Do not create the destination root
    #[arg(long, default_value_t = false)]
    pub no_auto_create: bool,

    /// Fail when a remote directory cannot be created
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// Show progress during transfer
    #[arg(short = 'P', long, default_value_t = false)]
    pub progress: bool,

    /// Suppress non-error messages
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,

    /// Increase verbosity
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// `user@host:path`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSpec {
    pub user: String,
    pub host: String,
    pub path: String,
}

impl RemoteSpec {
    pub fn parse(spec: &str) -> Option<Self> {
        let (user_host, path) = spec.split_once(':')?;
        let (user, host) = user_host.split_once('@')?;
        if user.is_empty() || host.is_empty() || path.is_empty() {
            return None;
        }
        Some(Self { user: user.to_string(), host: host.to_string(), path: path.to_string() })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Direction {
    Download { remote: RemoteSpec, local: PathBuf },
    Upload { local: PathBuf, remote: RemoteSpec },
}

impl Direction {
    pub fn remote(&self) -> &RemoteSpec {
        match self {
            Direction::Download { remote, .. } | Direction::Upload { remote, .. } => remote,
        }
    }
}

impl Args {
    /// Exactly one side must be remote.
    pub fn direction(&self) -> Result<Direction> {
        match (RemoteSpec::parse(&self.source), RemoteSpec::parse(&self.destination)) {
            (Some(remote), None) => Ok(Direction::Download { remote, local: PathBuf::from(&self.destination) }),
            (None, Some(remote)) => Ok(Direction::Upload { local: PathBuf::from(&self.source), remote }),
            (Some(_), Some(_)) => Err(FtpTreeError::Config("Both SOURCE and DESTINATION are remote".into())),
            (None, None) => Err(FtpTreeError::Config(
                "One of SOURCE or DESTINATION must be user@host:path".into(),
            )),
        }
    }

    pub fn ssh_config(&self, remote: &RemoteSpec) -> SshConfig {
        SshConfig {
            host: remote.host.clone(),
            port: self.port,
            user: remote.user.clone(),
            password: self.password.clone(),
            key_path: self.identity.clone(),
            timeout: (self.timeout > 0).then(|| Duration::from_secs(self.timeout)),
        }
    }

    pub fn sync_options(&self) -> Result<SyncOptions> {
        Ok(SyncOptions {
            auto_create_root: !self.no_auto_create,
            strict_directories: self.strict,
            excludes: Excludes::new(&self.exclude)?,
        })
    }
}
