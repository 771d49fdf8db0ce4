mod output;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use quicksync_core::payload::normalize_line_endings;
use quicksync_core::{Session, SessionConfig};
use tracing::{debug, error, info};

/// Marker for stdin/stdout in `--file`.
const STDIO: &str = "-";

#[derive(Parser, Debug)]
#[command(author, version, about = "Communicate with Gigaset handsets over AT and OBEX", long_about = None)]
struct Args {
    #[command(subcommand)]
    action: Action,

    /// Serial port device
    #[arg(short, long, global = true)]
    device: Option<String>,

    /// Baud rate
    #[arg(short, long, global = true)]
    baud: Option<u32>,

    /// File to read from or write into, `-` for stdin/stdout
    #[arg(short, long, global = true, default_value = STDIO)]
    file: String,

    /// Configuration file (default: ~/.config/quicksync/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print serial traffic (-v), including hex dumps (-vv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Query device identification and status
    Info,
    /// Dump the phonebook service logs
    #[command(name = "obexinfo")]
    ObexInfo,
    /// Call a number
    Dial { number: String },
    /// Download all contacts as vCard
    GetContacts,
    /// Create one contact per vCard in the input
    CreateContacts,
    /// Replace a contact with the vCard from --file
    EditContact { luid: String },
    /// Delete a contact
    DeleteContact { luid: String },
    /// Show memory status and the browsable folders
    ListFiles,
    /// Download a file from the handset into --file
    Download { name: String },
    /// Upload --file to the handset
    Upload { name: String },
    /// Delete a file on the handset
    Delete { name: String },
}

fn main() {
    let args = Args::parse();

    let level = match args.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Cannot install logger: {e}");
    }

    if let Err(e) = run(args) {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn default_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| Path::new(&home).join(".config/quicksync/config.toml"))
}

fn load_config(args: &Args) -> Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::load_from_file(path)
            .with_context(|| format!("Cannot load config {}", path.display()))?,
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => {
                debug!(path = %path.display(), "Loading config");
                SessionConfig::load_from_file(&path)
                    .with_context(|| format!("Cannot load config {}", path.display()))?
            }
            None => SessionConfig::default(),
        },
    };

    if let Some(device) = &args.device {
        config.device = device.clone();
    }
    if let Some(baud) = args.baud {
        config.baud = baud;
    }
    Ok(config)
}

/// Read `--file`, normalising line endings to CRLF.
fn read_vcf_file(path: &str) -> Result<Vec<u8>> {
    let data = std::fs::read(path).with_context(|| format!("Cannot read {path}"))?;
    Ok(normalize_line_endings(&data))
}

fn require_file(file: &str, what: &str) -> Result<()> {
    if file == STDIO || file.is_empty() {
        bail!("Please specify the {what} via --file");
    }
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    let file = args.file.as_str();
    let session = Session::open(config)?;

    match &args.action {
        Action::Info => {
            for item in session.device_info() {
                println!("{}", output::info_line(&item));
            }
        }
        Action::ObexInfo => {
            for (path, text) in session.obex_info()? {
                println!();
                println!("=== {path}");
                println!("{text}");
            }
        }
        Action::Dial { number } => session.dial(number)?,
        Action::GetContacts => {
            let vcf = session.get_contacts()?;
            if file == STDIO || file.is_empty() {
                println!("{vcf}");
            } else {
                std::fs::write(file, vcf).with_context(|| format!("Cannot write {file}"))?;
            }
        }
        Action::CreateContacts => {
            if file.is_empty() {
                bail!("Please give a .vcf file for import via --file");
            }
            let vcf = if file == STDIO {
                let mut text = String::new();
                std::io::stdin().read_to_string(&mut text)?;
                text
            } else {
                String::from_utf8(read_vcf_file(file)?).context("vCard file is not UTF-8")?
            };
            let created = session.create_contacts(&vcf)?;
            info!("Created {} contact(s)", created);
        }
        Action::EditContact { luid } => {
            require_file(file, ".vcf file")?;
            session.edit_contact(luid, &read_vcf_file(file)?)?;
        }
        Action::DeleteContact { luid } => session.delete_contact(luid)?,
        Action::ListFiles => {
            for line in output::storage_report(&session.list_files()?) {
                println!("{line}");
            }
        }
        Action::Download { name } => {
            require_file(file, "output file")?;
            let data = session.download(name)?;
            let mut out = std::fs::File::create(file)
                .with_context(|| format!("Cannot create {file}"))?;
            out.write_all(&data)?;
            info!(bytes = data.len(), "Saved {}", file);
        }
        Action::Upload { name } => {
            require_file(file, "input file")?;
            let data = std::fs::read(file).with_context(|| format!("Cannot read {file}"))?;
            let packets = session.upload(name, &data)?;
            info!(bytes = data.len(), packets, "Uploaded {}", name);
        }
        Action::Delete { name } => session.delete(name)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_flags_after_subcommand() {
        let args = Args::parse_from(["quicksync", "download", "/Pictures/a.jpg", "-f", "a.jpg", "-vv"]);
        assert_eq!(args.file, "a.jpg");
        assert_eq!(args.verbose, 2);
        assert!(matches!(args.action, Action::Download { ref name } if name == "/Pictures/a.jpg"));
    }

    #[test]
    fn test_obexinfo_name() {
        let args = Args::parse_from(["quicksync", "obexinfo"]);
        assert!(matches!(args.action, Action::ObexInfo));
        assert_eq!(args.file, STDIO);
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "quicksync",
            "info",
            "--config",
            "/nonexistent/quicksync.toml",
        ]);
        assert!(load_config(&args).is_err());

        let args = Args::parse_from(["quicksync", "-d", "/dev/ttyUSB0", "-b", "115200", "info"]);
        let mut expected = SessionConfig::default();
        if let Some(path) = default_config_path().filter(|p| p.exists()) {
            expected = SessionConfig::load_from_file(path).unwrap();
        }
        let config = load_config(&args).unwrap();
        assert_eq!(config.device, "/dev/ttyUSB0");
        assert_eq!(config.baud, 115200);
        assert_eq!(config.chunk_size, expected.chunk_size);
    }

    #[test]
    fn test_require_file() {
        assert!(require_file("-", "input file").is_err());
        assert!(require_file("", "input file").is_err());
        assert!(require_file("x.jpg", "input file").is_ok());
    }
}
