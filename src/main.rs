use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Parser;
use env_logger::{Builder, Env};
use mobi_reader::mobi::models::ExthValueKind;
use mobi_reader::mobi::types::tags::index_tag_name;
use mobi_reader::{MobiReader, ReaderOptions};

#[derive(Parser, Debug)]
#[command(name = "mobi-reader", version, about = "Inspect Mobipocket books and their INDX index")]
struct Args {
    /// Path to the .mobi / .prc / .azw file
    path: PathBuf,

    /// Skip decoding the INDX index
    #[arg(long)]
    no_index: bool,

    /// Maximum number of records an inflection chain may span
    #[arg(long, default_value_t = ReaderOptions::default().max_index_chain)]
    max_chain: usize,

    /// Number of index values to print
    #[arg(long, default_value_t = 10)]
    entries: usize,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}

fn tag_label(tag: u8) -> String {
    index_tag_name(tag).map_or_else(|| format!("tag_{}", tag), str::to_owned)
}

fn main() {
    let args = Args::parse();
    init_logger(args.verbose);

    let options = ReaderOptions {
        parse_index: !args.no_index,
        max_index_chain: args.max_chain,
    };

    println!("Reading MOBI file: {}", args.path.display());
    println!("{}", "=".repeat(60));

    let reader = match MobiReader::open(&args.path, options) {
        Ok(reader) => reader,
        Err(e) => {
            eprintln!("\nERROR: Failed to read MOBI file");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    };

    println!("\nBook Information:");
    println!("  Title: {}", reader.title());
    if let Some(author) = reader.author() {
        println!("  Author: {}", author);
    }
    println!("  Database: {} ({})", reader.pdb.name, reader.pdb.type_creator());
    println!("  MOBI version: {}", reader.mobi.file_version);
    println!("  Encoding: {:?}", reader.mobi.encoding);
    println!("  Compression: {}", reader.palmdoc.compression);
    println!("  Records: {}", reader.record_count());
    println!("  Text records: {}", reader.palmdoc.text_record_count);
    match reader.mobi.index_record() {
        Some(record) => println!("  Index record: {}", record),
        None => println!("  Index record: none"),
    }

    if let Some(exth) = &reader.exth {
        println!("\nEXTH Metadata ({} records):", exth.records.len());
        for record in &exth.records {
            let name = record
                .name()
                .map_or_else(|| format!("type_{}", record.record_type), str::to_owned);
            match record.kind() {
                ExthValueKind::Text => {
                    println!("  {}: {}", name, record.as_text(reader.mobi.encoding))
                }
                ExthValueKind::Numeric => match record.as_u32() {
                    Some(value) => println!("  {}: {}", name, value),
                    None => println!("  {}: {:02x?}", name, record.value),
                },
                ExthValueKind::Binary => {
                    println!("  {}: {} bytes", name, record.value.len())
                }
            }
        }
    }

    let entries = reader.index_entries();
    if entries.is_empty() {
        return;
    }

    let mut per_tag: BTreeMap<u8, usize> = BTreeMap::new();
    for entry in entries {
        *per_tag.entry(entry.tag).or_default() += 1;
    }

    println!("\nIndex Statistics:");
    println!("  Total values: {}", entries.len());
    for (tag, count) in &per_tag {
        println!("  {}: {}", tag_label(*tag), count);
    }

    println!("\nSample Index Values (first {}):", args.entries);
    for (i, entry) in entries.iter().take(args.entries).enumerate() {
        println!("  {}. [{}] {}", i + 1, tag_label(entry.tag), entry.value);
    }
    if entries.len() > args.entries {
        println!("  ... and {} more", entries.len() - args.entries);
    }
}
