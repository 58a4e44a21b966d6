//! Report - command-line views over the order pipeline
//!
//! - `orders`: fetch from the remote listing and print a table with the
//!   per-row remaining net share
//! - `convert`: turn an Excel order export into the CSV snapshot used as
//!   the dashboard's fallback
//! - `watch`: re-run the conversion whenever the export changes

mod convert;
mod watch;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use order_pipeline::normalize::normalize_payload;
use order_pipeline::remote::RemoteReader;
use order_pipeline::{OrderRecord, PipelineConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "report", about = "Order reports and snapshot conversion")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print remote orders with the remaining net share per row
    Orders {
        /// Range start (DD.MM.YYYY or YYYY-MM-DD), requires --end
        #[arg(long, requires = "end")]
        start: Option<String>,

        /// Range end, requires --start
        #[arg(long, requires = "start")]
        end: Option<String>,

        /// Page of the unbounded listing, used without a range
        #[arg(long, env = "PAGE_INDEX", default_value_t = 0)]
        page_index: u32,

        #[arg(long, env = "PAGE_SIZE", default_value_t = 500)]
        page_size: u32,
    },
    /// Convert an Excel order export into the CSV snapshot
    Convert {
        /// Workbook to read; defaults to the first ALINAN*.xlsx in --dir
        #[arg(long)]
        input: Option<PathBuf>,

        #[arg(long, default_value = "orders.csv")]
        output: PathBuf,

        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Keep the CSV snapshot in sync with the Excel export in --dir
    Watch {
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Relative paths resolve against --dir
        #[arg(long, default_value = "orders.csv")]
        output: PathBuf,
    },
}

/// `net * remaining / quantity` rounded to cents; zero without a quantity.
fn remaining_net_share(record: &OrderRecord) -> f64 {
    if record.quantity == 0 {
        return 0.0;
    }
    let share =
        record.net_amount * record.remaining_quantity as f64 / record.quantity as f64;
    (share * 100.0).round() / 100.0
}

const TABLE_HEADERS: [&str; 8] = [
    "Tarih",
    "Cari",
    "Sor. Merkezi",
    "Miktar",
    "Teslim",
    "Kalan",
    "Net Tutar",
    "Kalan Net",
];

fn table_row(record: &OrderRecord) -> [String; 8] {
    [
        record.order_date_raw.clone(),
        record.customer_name.clone(),
        record.cost_center_name.clone(),
        record.quantity.to_string(),
        record.delivered_quantity.to_string(),
        record.remaining_quantity.to_string(),
        format!("{:.2}", record.net_amount),
        format!("{:.2}", remaining_net_share(record)),
    ]
}

/// Left-aligned text columns, right-aligned numbers.
fn render_table(records: &[OrderRecord]) -> String {
    let rows: Vec<[String; 8]> = records.iter().map(table_row).collect();

    let mut widths = TABLE_HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let pad = widths[i].saturating_sub(cell.chars().count());
                if i < 3 {
                    format!("{}{}", cell, " ".repeat(pad))
                } else {
                    format!("{}{}", " ".repeat(pad), cell)
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let header: Vec<String> = TABLE_HEADERS.iter().map(|h| h.to_string()).collect();
    let mut out = vec![line(&header[..])];
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in &rows {
        out.push(line(&row[..]));
    }
    out.join("\n")
}

async fn run_orders(
    start: Option<String>,
    end: Option<String>,
    page_index: u32,
    page_size: u32,
) -> Result<()> {
    let config = PipelineConfig::from_env();
    let reader = RemoteReader::new(&config).context("Failed to build HTTP client")?;

    let payload = match (start, end) {
        (Some(start), Some(end)) => {
            println!("Range: {} .. {}", start, end);
            reader.fetch(&start, &end, None).await
        }
        _ => {
            println!("Page: {} (size {})", page_index, page_size);
            reader.fetch_page(page_index, page_size).await
        }
    }
    .with_context(|| format!("Failed to fetch orders from {}", config.remote_url()))?;

    let records = normalize_payload(payload);
    info!("Normalized {} order records", records.len());

    println!("{}", render_table(&records));
    let total: f64 = records.iter().map(remaining_net_share).sum();
    println!("\nRecords: {}", records.len());
    println!("Remaining net total: {:.2}", total);
    Ok(())
}

fn run_convert(input: Option<PathBuf>, output: PathBuf, dir: PathBuf) -> Result<()> {
    let input = match input {
        Some(path) => path,
        None => convert::find_export(&dir)?.with_context(|| {
            format!(
                "No {}*.xlsx export found in {}",
                convert::EXPORT_NAME_MARKER,
                dir.display()
            )
        })?,
    };

    println!("Input: {}", input.display());
    println!("Output: {}", output.display());
    let rows = convert::convert_to_csv(&input, &output)?;
    println!("Rows written: {}", rows);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    println!("=== Order Report ===");

    match args.command {
        Command::Orders {
            start,
            end,
            page_index,
            page_size,
        } => run_orders(start, end, page_index, page_size).await,
        Command::Convert { input, output, dir } => run_convert(input, output, dir),
        Command::Watch { dir, output } => {
            println!("Watching: {}", dir.display());
            println!("Press Ctrl+C to stop.");
            tokio::task::spawn_blocking(move || watch::run(&dir, &output)).await?
        }
    }
}
