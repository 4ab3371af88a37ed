use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use gitprofiles::cli::{handle_backup_command, BackupCommands};
use gitprofiles::config::{paths::ProfilePaths, settings::Settings};
use gitprofiles::storage::initialize_storage;

#[derive(Parser)]
#[command(
    name = "gitprofiles",
    author = "snowmerak",
    version,
    about = "Manage git identity profiles and their encrypted backups",
    long_about = "gitprofiles keeps SSH keys, GPG material and profile metadata \
                  under one base directory and packs it into password-protected \
                  backup containers that can be restored anywhere."
)]
struct Cli {
    /// Base directory for profile data
    #[arg(long, global = true, env = gitprofiles::config::paths::BASE_DIR_ENV)]
    base: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the base directory layout
    Init,

    /// Backup management commands
    #[command(subcommand)]
    Backup(BackupCommands),

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    gitprofiles::logging::init_logging(cli.verbose)?;

    let paths = match cli.base {
        Some(base) => ProfilePaths::with_base_dir(base),
        None => ProfilePaths::new()?,
    };
    let settings = Settings::load_or_create(&paths)?;

    match cli.command {
        Some(Commands::Init) => {
            println!("Initializing gitprofiles at: {}", paths.base_dir().display());
            initialize_storage(&paths)?;
            if !paths.settings_file().exists() {
                settings.save(&paths)?;
            }
            println!("Initialization complete!");
            println!();
            println!("Created:");
            println!("  {}", paths.keys_dir().display());
            println!("  {}", paths.meta_dir().display());
            println!("  {}", paths.backups_dir().display());
            println!("  {}", paths.gpg_dir().display());
        }
        Some(Commands::Backup(cmd)) => {
            handle_backup_command(&paths, &settings, cmd)?;
        }
        Some(Commands::Config) => {
            let kdf = &settings.backup.kdf;
            println!("gitprofiles Configuration");
            println!("=========================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Backup directory: {}", paths.backups_dir().display());
            println!("Settings file:    {}", paths.settings_file().display());
            println!("Audit log:        {}", paths.audit_log().display());
            println!("Initialized:      {}", paths.is_initialized());
            println!();
            println!("Backup settings:");
            println!("  scrypt:            N={} r={} p={}", kdf.n, kdf.r, kdf.p);
            println!("  Compression level: {}", settings.backup.compression_level);
            println!("  Max KDF memory:    {} MiB", settings.backup.max_kdf_memory_mib);
        }
        None => {
            println!("gitprofiles - git identity profiles with encrypted backups");
            println!();
            println!("Run 'gitprofiles --help' for usage information.");
        }
    }

    Ok(())
}
