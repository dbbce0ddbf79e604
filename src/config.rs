use std::path::PathBuf;

use anyhow::bail;

use crate::cli::Cli;
use crate::relpath::RelativePath;

/// Validated application configuration.
pub struct Config {
    pub source_url: String,
    /// Absolute Disk path; `None` only in list-only mode.
    pub destination: Option<String>,
    pub oauth_token: Option<String>,
    /// Restrict the run to this source-relative subtree.
    pub folder_filter: Option<RelativePath>,
    pub cache_dir: PathBuf,
    pub state_file: PathBuf,
    pub list_only: bool,
    pub test_single: bool,
    #[allow(dead_code)] // Copied from CLI but read from cli.verbose in main.rs before init
    pub verbose: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("source_url", &self.source_url)
            .field("destination", &self.destination)
            .field("oauth_token", &self.oauth_token.as_ref().map(|_| "<redacted>"))
            .field("folder_filter", &self.folder_filter)
            .field("cache_dir", &self.cache_dir)
            .field("state_file", &self.state_file)
            .field("list_only", &self.list_only)
            .field("test_single", &self.test_single)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_cli(cli: Cli) -> anyhow::Result<Self> {
        let source_url = cli.source.trim().to_string();
        if !source_url.starts_with("http") {
            bail!("source must be a URL, got: {source_url}");
        }
        if !source_url.contains("disk.yandex.ru/d/") && !source_url.contains("yadi.sk/d/") {
            bail!("source does not look like a public Yandex Disk folder link: {source_url}");
        }

        let destination = match cli.destination {
            Some(raw) => {
                let dest = raw.trim().trim_end_matches('/').to_string();
                if !dest.starts_with('/') || dest.len() < 2 {
                    bail!("destination must be an absolute Disk path like /Mirrors/Course, got: {raw}");
                }
                Some(dest)
            }
            None => None,
        };

        if !cli.list_only {
            if destination.is_none() {
                bail!("a destination path is required unless --list-only is given");
            }
            if cli.oauth_token.is_none() {
                bail!("an OAuth token is required unless --list-only is given \
                       (set YANDEX_OAUTH_TOKEN)");
            }
        }

        let folder_filter = cli
            .folder
            .as_deref()
            .map(|raw| RelativePath::parse(raw.trim_matches('/')))
            .transpose()?;

        Ok(Self {
            source_url,
            destination,
            oauth_token: cli.oauth_token,
            folder_filter,
            cache_dir: PathBuf::from(cli.cache_dir),
            state_file: PathBuf::from(cli.state_file),
            list_only: cli.list_only,
            test_single: cli.test,
            verbose: cli.verbose,
        })
    }
}
