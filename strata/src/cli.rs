use std::path::PathBuf;

use structopt::clap::AppSettings::*;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "strata",
    about = "Inspect and append to strata archives.",
    settings = &[SubcommandRequiredElseHelp, DisableHelpSubcommand, VersionlessSubcommands]
)]
pub struct CliOpts {
    #[structopt(short, long, help = "Show verbose output", global = true)]
    pub verbose: bool,

    #[structopt(subcommand)]
    pub cmd: Commands,
}

#[derive(Debug, StructOpt)]
pub enum Commands {
    #[structopt(name = "ls", visible_alias = "list", about = "List a directory of an archive")]
    List(ListArgs),

    #[structopt(name = "log", about = "List the snapshots of an archive")]
    Log(LogArgs),

    #[structopt(name = "cat", about = "Write a file of an archive to stdout")]
    Cat(CatArgs),

    #[structopt(name = "add", visible_alias = "a", about = "Append files to an archive")]
    Add(AddArgs),

    #[structopt(name = "rm", visible_alias = "remove", about = "Remove files from an archive")]
    Remove(RemoveArgs),

    #[structopt(name = "extract", visible_alias = "x", about = "Extract files from an archive")]
    Extract(ExtractArgs),

    #[structopt(name = "check", visible_alias = "t", about = "Verify entry checksums")]
    Check(CheckArgs),
}

/// How an archive is opened for reading.
#[derive(Debug, StructOpt)]
pub struct SnapshotArgs {
    #[structopt(long = "at", value_name = "OFFSET", help = "Read the archive as of a snapshot offset")]
    pub at: Option<u64>,

    #[structopt(long, help = "Resolve legacy symlink entries")]
    pub legacy: bool,
}

#[derive(Debug, StructOpt)]
pub struct ListArgs {
    #[structopt(name = "archive", parse(from_os_str), help = "Path to the archive")]
    pub archive: PathBuf,

    #[structopt(name = "dir", default_value = "", help = "Directory to list")]
    pub dir: String,

    #[structopt(short, long, help = "List subdirectories recursively")]
    pub recursive: bool,

    #[structopt(short, long, help = "Output in JSON format")]
    pub json: bool,

    #[structopt(flatten)]
    pub snapshot: SnapshotArgs,
}

#[derive(Debug, StructOpt)]
pub struct LogArgs {
    #[structopt(name = "archive", parse(from_os_str), help = "Path to the archive")]
    pub archive: PathBuf,

    #[structopt(short, long, help = "Output in JSON format")]
    pub json: bool,
}

#[derive(Debug, StructOpt)]
pub struct CatArgs {
    #[structopt(name = "archive", parse(from_os_str), help = "Path to the archive")]
    pub archive: PathBuf,

    #[structopt(name = "path", help = "File inside the archive")]
    pub path: String,

    #[structopt(flatten)]
    pub snapshot: SnapshotArgs,
}

#[derive(Debug, StructOpt)]
pub struct AddArgs {
    #[structopt(name = "archive", parse(from_os_str), help = "Path to the archive")]
    pub archive: PathBuf,

    #[structopt(
        name = "files",
        parse(from_os_str),
        required = true,
        help = "Host files or directories to append"
    )]
    pub files: Vec<PathBuf>,

    #[structopt(short, long, help = "Recursively handle provided directories")]
    pub recursive: bool,

    #[structopt(long, value_name = "DIR", default_value = "", help = "Directory to add files under")]
    pub prefix: String,
}

#[derive(Debug, StructOpt)]
pub struct RemoveArgs {
    #[structopt(name = "archive", parse(from_os_str), help = "Path to the archive")]
    pub archive: PathBuf,

    #[structopt(name = "paths", required = true, help = "Files inside the archive")]
    pub paths: Vec<String>,
}

#[derive(Debug, StructOpt)]
pub struct ExtractArgs {
    #[structopt(name = "archive", parse(from_os_str), help = "Path to the archive")]
    pub archive: PathBuf,

    #[structopt(short, long, parse(from_os_str), help = "Output directory [default: current directory]")]
    pub output: Option<PathBuf>,

    #[structopt(flatten)]
    pub snapshot: SnapshotArgs,
}

#[derive(Debug, StructOpt)]
pub struct CheckArgs {
    #[structopt(name = "archive", parse(from_os_str), help = "Path to the archive")]
    pub archive: PathBuf,

    #[structopt(long = "at", value_name = "OFFSET", help = "Check the archive as of a snapshot offset")]
    pub at: Option<u64>,
}
