use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "ydisk-mirror",
    about = "Mirror the video tree of a public Yandex Disk folder into your own Disk"
)]
pub struct Cli {
    /// Public link of the source folder (disk.yandex.ru/d/... or yadi.sk/d/...)
    #[arg(env = "YANDEX_PUBLIC_FOLDER_URL")]
    pub source: String,

    /// Absolute destination path on your Disk, e.g. /Mirrors/Course.
    /// Optional with --list-only.
    #[arg(env = "YANDEX_DESTINATION_PATH")]
    pub destination: Option<String>,

    /// OAuth token for the destination Disk.
    /// WARNING: passing via --oauth-token is visible in process listings.
    /// Prefer the YANDEX_OAUTH_TOKEN environment variable instead.
    #[arg(long, env = "YANDEX_OAUTH_TOKEN")]
    pub oauth_token: Option<String>,

    /// Only mirror the subtree under this source-relative folder
    #[arg(long)]
    pub folder: Option<String>,

    /// Discover and record the tree, print it, and exit without transferring
    #[arg(long)]
    pub list_only: bool,

    /// Transfer only the first pending item, then exit
    #[arg(long)]
    pub test: bool,

    /// Local staging directory for in-flight downloads
    #[arg(long, default_value = "videos")]
    pub cache_dir: String,

    /// Progress ledger file
    #[arg(long, default_value = "tree.md")]
    pub state_file: String,

    /// Verbose (debug-level) logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}
