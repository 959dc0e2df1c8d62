use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

#[derive(Parser, Debug)]
#[command(version, about = "Save the icon of a Windows executable as an .ico file")]
struct Cli {
    #[command(subcommand)]
    source: Source,

    /// Where to write the icon.
    #[arg(short, long, global = true, default_value = "icon.ico")]
    output: PathBuf,

    /// Drop embedded PNG images.
    #[arg(long, global = true)]
    no_png: bool,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Source {
    /// Icon of an executable or DLL on disk.
    File { path: PathBuf },
    /// Icon of the executable behind a running process.
    Pid { pid: u32 },
    /// The shell's generic application icon.
    Default,
}

fn run(cli: &Cli) -> Result<Option<usize>> {
    let allow_png = !cli.no_png;
    let icon = match &cli.source {
        Source::File { path } => exeicon::icon_from_path(path, allow_png)
            .with_context(|| format!("Failed to read icon from {}", path.display())),
        Source::Pid { pid } => exeicon::icon_from_pid(*pid, allow_png)
            .with_context(|| format!("Failed to read icon of process {pid}")),
        Source::Default => {
            exeicon::default_exe_icon(allow_png).context("Failed to read the default icon")
        }
    };

    let icon = match icon {
        Ok(icon) => icon,
        Err(e) if no_icon(&e) => return Ok(None),
        Err(e) => return Err(e),
    };

    fs::write(&cli.output, &icon)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;
    Ok(Some(icon.len()))
}

fn no_icon(e: &anyhow::Error) -> bool {
    e.downcast_ref::<exeicon::Error>()
        .is_some_and(exeicon::Error::is_no_icon)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::init_from_env(env_logger::Env::default().default_filter_or(default_level));

    match run(&cli) {
        Ok(Some(len)) => {
            info!("Wrote {len} bytes");
            println!("Saved icon: '{}'", cli.output.display());
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("No icon found");
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}
