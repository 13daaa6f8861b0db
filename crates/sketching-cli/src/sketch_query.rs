//! Sketch query CLI
//!
//! Usage: sketch_query <sketch> [--summary] [--help]
//! Prints a summary of the sketch, then answers one query per stdin line:
//!
//!   bitset    bit index       -> set / clear
//!   bloom     item            -> maybe / no
//!   countmin  item            -> estimated count
//!   minhash   path to sketch  -> Jaccard similarity
//!   hll       (no per-item queries)
//!
//! Example:
//!   sketch_query visitors.sketch < candidates.txt

use sketching::domain::sketch_format::SketchFormatError;
use sketching::infra::sketch_io::{AnySketch, load_any, load_min_hash};
use sketching::{Fnv1a, SketchKind};
use std::env;
use std::io::{self, BufRead};
use std::path::Path;

struct Args {
    sketch: String,
    summary_only: bool,
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <sketch> [options]", program);
    eprintln!();
    eprintln!("Answers one query per stdin line after printing a summary.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --summary        Print the summary only");
    eprintln!("  --help, -h       Show this help message");
}

/// `Ok(None)` when help was requested
fn parse_args(args: &[String]) -> Result<Option<Args>, String> {
    let mut sketch = None;
    let mut summary_only = false;

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--summary" => summary_only = true,
            "--help" | "-h" => return Ok(None),
            a if !a.starts_with('-') && sketch.is_none() => sketch = Some(a.to_string()),
            _ => return Err(format!("Unknown argument: {}", arg)),
        }
    }

    let sketch = sketch.ok_or_else(|| "Missing sketch path".to_string())?;
    Ok(Some(Args {
        sketch,
        summary_only,
    }))
}

fn format_sketch_error(path: &Path, err: SketchFormatError) -> String {
    match err {
        SketchFormatError::InvalidMagic => {
            format!("Invalid file: '{}' is not a sketch file.", path.display())
        }
        SketchFormatError::UnsupportedVersion(version) => format!(
            "Unsupported format version: {}.\nPlease rebuild the sketch.",
            version
        ),
        SketchFormatError::KindMismatch { expected, found } => format!(
            "'{}' holds a {} sketch, expected {}.",
            path.display(),
            found,
            expected
        ),
        other => format!("{}: {}", path.display(), other),
    }
}

fn print_summary(path: &Path, sketch: &AnySketch) {
    println!("File: {}", path.display());
    println!("Kind: {}", sketch.kind());
    match sketch {
        AnySketch::BitSet(s) => {
            println!("Bit width: {}", s.bit_width());
            println!("Bits set: {}", s.cardinality());
            match s.first() {
                Some(index) => println!("Lowest set bit: {}", index),
                None => println!("Lowest set bit: none"),
            }
        }
        AnySketch::Bloom(s) => {
            println!("Bit width: {}", s.bit_width());
            println!("Hash functions: {}", s.hash_count());
            println!("Bits set: {}", s.bits().cardinality());
            println!("Estimated items: {:.0}", s.cardinality());
            println!(
                "False positive probability: {:.6}",
                s.false_positive_probability(None)
            );
        }
        AnySketch::HyperLogLog(s) => {
            println!("Precision: {} ({} registers)", s.precision(), s.registers().len());
            println!("Estimated distinct items: {:.0}", s.cardinality());
        }
        AnySketch::MinHash(s) => {
            println!("Hash functions: {}", s.hash_count());
        }
        AnySketch::CountMin(s) => {
            println!("Depth: {}", s.depth());
            println!("Width: {}", s.width());
            println!("Total count: {}", s.counts()[..s.width()].iter().sum::<u64>());
        }
    }
}

fn query(sketch: &AnySketch, line: &str) -> String {
    match sketch {
        AnySketch::BitSet(s) => match line.parse::<usize>() {
            Ok(index) if index < s.bit_width() => {
                let state = if s.get(index) { "set" } else { "clear" };
                state.to_string()
            }
            Ok(_) => format!("out of range (width {})", s.bit_width()),
            Err(_) => "invalid bit index".to_string(),
        },
        AnySketch::Bloom(s) => {
            let answer = if s.contains(line.as_bytes()) { "maybe" } else { "no" };
            answer.to_string()
        }
        AnySketch::CountMin(s) => s.estimate(line.as_bytes()).to_string(),
        AnySketch::MinHash(s) => {
            let path = Path::new(line);
            match load_min_hash::<Fnv1a>(path) {
                Ok(other) => match s.jaccard(&other) {
                    Ok(j) => format!("{:.4}", j),
                    Err(e) => e.to_string(),
                },
                Err(e) => format_sketch_error(path, e),
            }
        }
        AnySketch::HyperLogLog(_) => "no per-item queries".to_string(),
    }
}

fn main() {
    let raw: Vec<String> = env::args().collect();
    let program = raw.first().map(String::as_str).unwrap_or("sketch_query");

    let args = match parse_args(&raw) {
        Ok(Some(a)) => a,
        Ok(None) => {
            print_usage(program);
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage(program);
            std::process::exit(1);
        }
    };
    let path = Path::new(&args.sketch);

    let sketch = match load_any(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", format_sketch_error(path, e));
            std::process::exit(1);
        }
    };

    print_summary(path, &sketch);

    if args.summary_only || sketch.kind() == SketchKind::HyperLogLog {
        return;
    }

    println!();
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading stdin: {}", e);
                std::process::exit(1);
            }
        };
        let item = line.trim();
        if item.is_empty() {
            continue;
        }
        println!("{}\t{}", item, query(&sketch, item));
    }
}
