use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use nfe_backup::cli::{
    handle_canceled_command, handle_history_command, handle_key_command, handle_report_command,
    handle_run_command, handle_select_command, ReportArgs, RunArgs, SelectArgs,
};
use nfe_backup::config::{NfePaths, Settings};
use nfe_backup::services::RunStatus;

#[derive(Parser)]
#[command(
    name = "nfe-backup",
    version,
    about = "Monthly backup and reporting of NFe fiscal documents",
    long_about = "nfe-backup selects the NFe XML documents issued in a reference month \
                  (by the period encoded in their access keys), copies and compresses \
                  them, and writes a per-item CSV report with the month's grand total."
)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the monthly backup
    Run(RunArgs),

    /// List the documents of a month
    Select(SelectArgs),

    /// List the access keys voided by cancellation events
    Canceled {
        /// Source folder (overrides the configured one)
        #[arg(long)]
        source: Option<PathBuf>,
    },

    /// Write the CSV report of a month without copying anything
    Report(ReportArgs),

    /// Show the access key of a single document
    Key {
        /// XML file to inspect
        file: PathBuf,
    },

    /// Show recent runs
    History {
        /// Number of runs to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Write a default settings file
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    nfe_backup::logging::init(cli.verbose);

    let paths = NfePaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    match cli.command {
        Some(Commands::Run(args)) => {
            let status = handle_run_command(&paths, &settings, args)?;
            if status != RunStatus::Success {
                std::process::exit(2);
            }
        }
        Some(Commands::Select(args)) => handle_select_command(&settings, args)?,
        Some(Commands::Canceled { source }) => handle_canceled_command(&settings, source)?,
        Some(Commands::Report(args)) => handle_report_command(&settings, args)?,
        Some(Commands::Key { file }) => handle_key_command(file)?,
        Some(Commands::History { limit }) => handle_history_command(&paths, limit)?,
        Some(Commands::Init) => {
            if paths.is_initialized() {
                println!(
                    "Settings already exist at: {}",
                    paths.settings_file().display()
                );
            } else {
                settings.save(&paths)?;
                println!("Settings written to: {}", paths.settings_file().display());
                println!("Edit the file to set the source folder, destination and client name.");
            }
        }
        Some(Commands::Config) => {
            println!("nfe-backup Configuration");
            println!("========================");
            println!("Settings file:    {}", paths.settings_file().display());
            println!("Run history:      {}", paths.run_history_file().display());
            println!();
            println!("Settings:");
            println!("  Source folder:       {}", settings.source_dir.display());
            println!("  Destination folder:  {}", settings.destination_base.display());
            println!("  Client name:         {}", settings.client_name);
            println!("  Archive enabled:     {}", settings.archive_enabled);
            println!("  Check digit checked: {}", settings.validate_check_digit);
            println!("  Prerequisite check:  {}", settings.prerequisites_check);
            println!("  Upload enabled:      {}", settings.upload.enabled);
            if settings.upload.enabled {
                println!("  rclone:              {}", settings.upload.rclone_path.display());
                println!("  Remote:              {}", settings.upload.remote_name);
                println!("  Remote base folder:  {}", settings.upload.drive_base_folder);
            }
        }
        None => {
            println!("nfe-backup - Monthly backup and reporting of NFe fiscal documents");
            println!();
            println!("Run 'nfe-backup --help' for usage information.");
            println!("Run 'nfe-backup run' to back up the previous month.");
        }
    }

    Ok(())
}
