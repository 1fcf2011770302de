//! Configuration handling for the command-line client.

use clap::{Parser, Subcommand};
use std::num::NonZeroU64;
use std::path::PathBuf;
use std::time::Duration;

use crate::ci::{
    ClientOptions, Credentials, Endpoints, API_BASE_URL, DEFAULT_CHUNK_SIZE, IO_BASE_URL,
};
use crate::error::{CiError, Result};

/// Command-line client for the Sony Ci media cloud.
#[derive(Parser, Debug, Clone)]
#[command(name = "sony-ci")]
#[command(about = "Upload, list, inspect, delete and download Sony Ci assets")]
pub struct Config {
    /// Ci account username
    #[arg(long, env = "CI_USERNAME")]
    pub username: String,

    /// Ci account password
    #[arg(long, env = "CI_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// OAuth client ID
    #[arg(long, env = "CI_CLIENT_ID")]
    pub client_id: String,

    /// OAuth client secret
    #[arg(long, env = "CI_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,

    /// Workspace that uploads and listings are scoped to
    #[arg(long, env = "CI_WORKSPACE_ID")]
    pub workspace_id: String,

    /// Base URL for metadata and control operations
    #[arg(long, env = "CI_API_BASE", default_value = API_BASE_URL)]
    pub api_base: String,

    /// Base URL that receives upload bodies
    #[arg(long, env = "CI_IO_BASE", default_value = IO_BASE_URL)]
    pub io_base: String,

    /// Single-shot limit and multipart chunk size, in bytes
    #[arg(long, env = "CI_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: u64,

    /// Per-request timeout in seconds (transport default when unset)
    #[arg(long, env = "CI_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Upload a file and append a line to the upload log
    Upload {
        /// File to upload
        path: PathBuf,
        /// Upload log to append to
        #[arg(long, default_value = "ci-uploads.log")]
        log: PathBuf,
    },
    /// List one page of workspace contents
    List {
        #[arg(long, default_value_t = 50)]
        limit: u64,
        #[arg(long, default_value_t = 0)]
        offset: u64,
    },
    /// Show an asset's metadata
    Detail { id: String },
    /// Delete an asset
    Delete { id: String },
    /// Print a temporary download URL for an asset
    Download { id: String },
}

impl Config {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            workspace_id: self.workspace_id.clone(),
        }
    }

    pub fn client_options(&self) -> Result<ClientOptions> {
        let chunk_size = NonZeroU64::new(self.chunk_size).ok_or_else(|| {
            CiError::BadRequest("chunk size must be greater than zero".to_string())
        })?;

        Ok(ClientOptions {
            endpoints: Endpoints {
                api_base: self.api_base.clone(),
                io_base: self.io_base.clone(),
            },
            chunk_size,
            timeout: self.timeout_secs.map(Duration::from_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE_ARGS: [&str; 11] = [
        "sony-ci",
        "--username",
        "user@example.com",
        "--password",
        "pw",
        "--client-id",
        "cid",
        "--client-secret",
        "cs",
        "--workspace-id",
        "ws",
    ];

    fn parse(extra: &[&str]) -> Config {
        Config::try_parse_from(BASE_ARGS.iter().chain(extra.iter())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["list"]);
        let options = config.client_options().unwrap();
        assert_eq!(options.endpoints, Endpoints::default());
        assert_eq!(options.chunk_size.get(), DEFAULT_CHUNK_SIZE);
        assert!(options.timeout.is_none());
        assert_eq!(config.credentials().workspace_id, "ws");
        assert!(matches!(config.command, Command::List { limit: 50, offset: 0 }));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let config = parse(&["--chunk-size", "0", "detail", "asset-id"]);
        assert!(matches!(
            config.client_options(),
            Err(CiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_upload_subcommand() {
        let config = parse(&["--timeout-secs", "5", "upload", "video.mp3", "--log", "out.log"]);
        assert_eq!(
            config.client_options().unwrap().timeout,
            Some(Duration::from_secs(5))
        );
        match config.command {
            Command::Upload { path, log } => {
                assert_eq!(path, PathBuf::from("video.mp3"));
                assert_eq!(log, PathBuf::from("out.log"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
