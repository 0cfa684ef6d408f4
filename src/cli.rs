use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dataentry")]
#[command(about = "Upload text and CSV files to a data-entry page and follow its task", long_about = None)]
pub struct Cli {
    /// Configuration file (default: $DATAENTRY_CONFIG or config/dataentry.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stage files, upload them and follow the batch to its redirect
    Upload(UploadArgs),
    /// Stage files and print the manifest without uploading
    Inspect(FileArgs),
    /// Trigger a named page action (a button) and follow its task
    Action(ActionArgs),
    /// Ask the server to cancel the current batch and follow the cancellation
    Cancel(PageArgs),
}

#[derive(clap::Args, Debug)]
pub struct PageArgs {
    /// Data-entry page URL; overrides endpoint.page_url
    #[arg(long)]
    pub page: Option<String>,

    /// Open the redirect target in the system browser
    #[arg(long)]
    pub open: bool,
}

#[derive(clap::Args, Debug)]
pub struct FileArgs {
    /// Files to stage, as chosen with a file picker
    pub files: Vec<PathBuf>,

    /// Also read dropped file paths from stdin
    #[arg(long)]
    pub drop: bool,
}

#[derive(clap::Args, Debug)]
pub struct UploadArgs {
    #[command(flatten)]
    pub page: PageArgs,

    #[command(flatten)]
    pub files: FileArgs,
}

#[derive(clap::Args, Debug)]
pub struct ActionArgs {
    #[command(flatten)]
    pub page: PageArgs,

    /// Action name, as carried by the page's button
    pub name: String,
}
