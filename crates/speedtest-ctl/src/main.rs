//! speedtest-ctl — command-line client for speedtestd.

use std::path::Path;

use anyhow::{bail, Context, Result};

mod cmd;

use cmd::http::DEFAULT_SERVER;
use cmd::measure::{DEFAULT_PING_COUNT, DEFAULT_TRANSFER_BYTES};

fn print_usage() {
    println!("Usage: speedtest-ctl [--server <url>] <command>");
    println!();
    println!("Commands:");
    println!("  health                 Server liveness");
    println!("  ping [--count N]       Latency and jitter (default 10 pings)");
    println!("  download [--size N]    Download throughput (default 10 MiB)");
    println!("  upload [--size N]      Upload throughput (default 10 MiB)");
    println!("  run                    Ping, download, upload and quality score");
    println!("  ip-info                Client IP, ISP and location");
    println!("  regions                Server region catalog");
    println!("  share <json-file>      Create a shared report link");
    println!("  report <id>            Fetch a shared report");
    println!();
    println!("Default server: {}", DEFAULT_SERVER);
}

struct Options {
    server: String,
    count: u32,
    size: u64,
}

fn flag_value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str> {
    args.get(i)
        .map(String::as_str)
        .with_context(|| format!("{flag} requires a value"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut opts = Options {
        server: DEFAULT_SERVER.to_string(),
        count: DEFAULT_PING_COUNT,
        size: DEFAULT_TRANSFER_BYTES,
    };
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--server" => {
                i += 1;
                opts.server = flag_value(&args, i, "--server")?.to_string();
            }
            "--count" => {
                i += 1;
                opts.count = flag_value(&args, i, "--count")?
                    .parse()
                    .context("--count must be a number")?;
                if opts.count == 0 {
                    bail!("--count must be at least 1");
                }
            }
            "--size" => {
                i += 1;
                opts.size = flag_value(&args, i, "--size")?
                    .parse()
                    .context("--size must be a number of bytes")?;
            }
            other => remaining.push(other),
        }
        i += 1;
    }

    let server = opts.server.as_str();
    match remaining.as_slice() {
        ["health"] | [] => cmd::network::cmd_health(server).await,
        ["ping"] => cmd::measure::cmd_ping(server, opts.count).await,
        ["download"] => cmd::measure::cmd_download(server, opts.size).await,
        ["upload"] => cmd::measure::cmd_upload(server, opts.size).await,
        ["run"] => cmd::measure::cmd_run(server, opts.count, opts.size).await,
        ["ip-info"] => cmd::network::cmd_ip_info(server).await,
        ["regions"] => cmd::network::cmd_regions(server).await,
        ["share", file] => cmd::share::cmd_share(server, Path::new(file)).await,
        ["report", id] => cmd::share::cmd_report(server, id).await,
        ["help"] | ["--help"] | ["-h"] => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
