use anyhow::{Context, bail};
use clap::Parser;
use scrape4yaml::config::Settings;
use scrape4yaml::extract::ScanMode;
use scrape4yaml::scrape;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Fetches a webpage, extracts the JSON objects embedded in its
/// script tags and saves them as a timestamped YAML file
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// URL of the webpage to be scraped,
    /// prompted for on stdin if not given
    url: Option<String>,

    /// Root of the per-domain output directories
    /// [default: "S4Y Output" next to the executable]
    #[arg(long)]
    output_root: Option<PathBuf>,

    /// Request timeout in seconds, 0 to wait forever
    #[arg(long)]
    timeout: Option<u64>,

    /// Retries after a network failure
    #[arg(long)]
    retries: Option<u32>,

    /// Backoff before the first retry, in milliseconds
    #[arg(long)]
    backoff_ms: Option<u64>,

    /// How script text is scanned for JSON objects
    #[arg(long, value_enum)]
    scan: Option<ScanMode>,
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(root) = &self.output_root {
            settings.output_root = Some(root.clone());
        }
        if let Some(timeout) = self.timeout {
            settings.timeout_secs = timeout;
        }
        if let Some(retries) = self.retries {
            settings.retries = retries;
        }
        if let Some(backoff_ms) = self.backoff_ms {
            settings.backoff_ms = backoff_ms;
        }
        if let Some(scan) = self.scan {
            settings.scan = scan;
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn prompt_url() -> anyhow::Result<String> {
    print!("Enter the URL to fetch: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Can't read URL from stdin")?;

    let url = line.trim();
    if url.is_empty() {
        bail!("No URL given");
    }
    Ok(url.to_string())
}

fn main() -> anyhow::Result<()> {

    init_tracing();

    let args = Args::parse();

    let mut settings = Settings::load().context("Can't load settings")?;
    args.apply(&mut settings);

    let url = match &args.url {
        Some(url) => url.clone(),
        None => prompt_url()?,
    };

    let report = scrape::run(&url, &settings).with_context(|| format!("Can't scrape {url}"))?;

    println!("YAML data saved to {}", report.path.display());

    Ok(())
}
