//! Giftwatch CLI - long-running Stars gift monitor.
//!
//! Watches the available-gift catalog and buys qualifying gifts for the
//! configured recipient:
//!   giftwatch --recipient @giftdrop --min-price 100 --max-price 5000 --only-limited
//!
//! Configuration:
//!   --token <token>        Bot API token (or BOT_TOKEN env / .env)
//!   --recipient <id>       User id or @channel receiving gifts and notices
//!   --min-price <stars>    Inclusive lower price bound (default 0)
//!   --max-price <stars>    Inclusive upper price bound (default unlimited)
//!   --only-limited         Only act on limited-release gifts
//!   --interval <secs>      Poll cadence (default 10)
//!   --backoff <secs>       Sleep after a failed cycle (default 30)
//!   --api-base <url>       Alternate Bot API server
//!
//! Environment variables (lower priority than flags): GIFTWATCH_RECIPIENT,
//! GIFTWATCH_MIN_PRICE, GIFTWATCH_MAX_PRICE, GIFTWATCH_ONLY_LIMITED,
//! GIFTWATCH_INTERVAL, GIFTWATCH_BACKOFF, BOT_TOKEN.

use giftwatch::logging::init_logging;
use giftwatch::{install_signal_handlers, BotApiCatalog, Monitor, MonitorConfig};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("giftwatch 0.1.0");
        return;
    }

    // Startup errors are the only fatal class: fail before the loop.
    if let Err(e) = run(opts) {
        eprintln!("giftwatch: {e}");
        std::process::exit(1);
    }
}

fn run(opts: ParsedArgs) -> anyhow::Result<()> {
    let (token, api_base, config) = opts.into_settings()?;

    let client = match api_base {
        Some(base) => BotApiCatalog::with_base(base, token),
        None => BotApiCatalog::new(token),
    };

    let mut monitor = Monitor::new(Arc::new(client), config)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let shutdown = install_signal_handlers();
        monitor.run(shutdown.subscribe()).await;
        info!("bye");
    });

    Ok(())
}

#[derive(Default)]
struct ParsedArgs {
    token: Option<String>,
    recipient: Option<String>,
    min_price: Option<String>,
    max_price: Option<String>,
    only_limited: bool,
    interval: Option<String>,
    backoff: Option<String>,
    api_base: Option<String>,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        // Load .env file if present
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    let value = value.trim().trim_matches('"');
                    if !value.is_empty() && env::var(key.trim()).is_err() {
                        env::set_var(key.trim(), value);
                    }
                }
            }
        }

        let mut opts = ParsedArgs::default();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--only-limited" => opts.only_limited = true,
                "--token" | "-t" => {
                    if i + 1 < args.len() {
                        opts.token = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--recipient" | "-r" => {
                    if i + 1 < args.len() {
                        opts.recipient = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--min-price" => {
                    if i + 1 < args.len() {
                        opts.min_price = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--max-price" => {
                    if i + 1 < args.len() {
                        opts.max_price = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--interval" => {
                    if i + 1 < args.len() {
                        opts.interval = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--backoff" => {
                    if i + 1 < args.len() {
                        opts.backoff = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--api-base" => {
                    if i + 1 < args.len() {
                        opts.api_base = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                _ => {} // Ignore unknown flags
            }
            i += 1;
        }

        // Apply environment variables (lower priority than CLI args)
        if opts.token.is_none() {
            opts.token = env::var("BOT_TOKEN").ok().filter(|s| !s.is_empty());
        }
        if opts.recipient.is_none() {
            opts.recipient = env::var("GIFTWATCH_RECIPIENT").ok();
        }
        if opts.min_price.is_none() {
            opts.min_price = env::var("GIFTWATCH_MIN_PRICE").ok();
        }
        if opts.max_price.is_none() {
            opts.max_price = env::var("GIFTWATCH_MAX_PRICE").ok();
        }
        if opts.interval.is_none() {
            opts.interval = env::var("GIFTWATCH_INTERVAL").ok();
        }
        if opts.backoff.is_none() {
            opts.backoff = env::var("GIFTWATCH_BACKOFF").ok();
        }
        if !opts.only_limited {
            opts.only_limited = env::var("GIFTWATCH_ONLY_LIMITED")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false);
        }

        opts
    }

    fn into_settings(self) -> anyhow::Result<(String, Option<String>, MonitorConfig)> {
        let token = self
            .token
            .ok_or_else(|| anyhow::anyhow!("missing bot token (--token or BOT_TOKEN)"))?;
        let recipient = self
            .recipient
            .ok_or_else(|| anyhow::anyhow!("missing recipient (--recipient or GIFTWATCH_RECIPIENT)"))?;

        let mut config = MonitorConfig::new(recipient)
            .with_only_limited(self.only_limited)
            .with_price_range(
                parse_stars("--min-price", self.min_price.as_deref(), 0)?,
                parse_stars("--max-price", self.max_price.as_deref(), u64::MAX)?,
            );

        if let Some(secs) = self.interval.as_deref() {
            config = config.with_poll_interval(parse_secs("--interval", secs)?);
        }
        if let Some(secs) = self.backoff.as_deref() {
            config = config.with_error_backoff(parse_secs("--backoff", secs)?);
        }

        // Monitor::new validates the policy; anything wrong is fatal there.
        Ok((token, self.api_base, config))
    }
}

fn parse_stars(flag: &str, value: Option<&str>, default: u64) -> anyhow::Result<u64> {
    match value {
        None => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|_| anyhow::anyhow!("{flag}: '{v}' is not a Stars amount")),
    }
}

fn parse_secs(flag: &str, value: &str) -> anyhow::Result<Duration> {
    let secs: u64 = value
        .parse()
        .map_err(|_| anyhow::anyhow!("{flag}: '{value}' is not a number of seconds"))?;
    Ok(Duration::from_secs(secs))
}

fn print_usage() {
    println!(
        r#"giftwatch - Telegram Stars gift monitor

USAGE:
    giftwatch [OPTIONS]

OPTIONS:
    -t, --token <token>       Bot API token (or BOT_TOKEN / .env)
    -r, --recipient <id>      User id or @channel receiving gifts
        --min-price <stars>   Inclusive lower price bound (default 0)
        --max-price <stars>   Inclusive upper price bound (default unlimited)
        --only-limited        Only act on limited-release gifts
        --interval <secs>     Poll cadence (default 10)
        --backoff <secs>      Sleep after a failed cycle (default 30)
        --api-base <url>      Alternate Bot API server
    -h, --help                Show this help
    -V, --version             Show version

The monitor runs until SIGINT/SIGTERM. Every gift is acted on at most
once per process lifetime; a failed purchase is reported and not retried."#
    );
}
