//! Sketch creation CLI
//!
//! Usage: sketch_build <kind> <input> <output> [options]
//!
//! Reads one item per line from <input> and writes the sketch to <output>.
//! For `bitset`, each line is a bit index.
//!
//! Options:
//!   --bits <N>       Bit width (bitset, bloom)
//!   --hashes <N>     Hash functions (bloom, minhash)
//!   --fp-rate <P>    Target false positive rate (bloom, default 0.01)
//!   --precision <P>  Index bits (hll, 4-16, default 8)
//!   --depth <N>      Rows (countmin)
//!   --width <N>      Columns (countmin)
//!   --help, -h       Show help
//!
//! Example: sketch_build bloom visitors.txt visitors.sketch --fp-rate 0.001

#[cfg(not(feature = "parallel"))]
use sketching::app::builder::build_sketch_with_progress;
#[cfg(feature = "parallel")]
use sketching::app::builder::build_sketch_parallel;
use sketching::constants::{
    DEFAULT_CONFIDENCE, DEFAULT_EPSILON, DEFAULT_FALSE_POSITIVE_RATE, DEFAULT_MIN_HASH_COUNT,
    DEFAULT_PRECISION,
};
use sketching::domain::count_min::ideal_parameters;
use sketching::infra::sketch_io::{AnySketch, save_any};
use sketching::{BitSet, BloomFilter, CountMin, HyperLogLog, MinHash, Sketch, SketchKind};
use std::env;
use std::fs;
use std::time::Instant;

#[cfg(not(feature = "parallel"))]
use std::io::{self, Write};

struct Args {
    kind: SketchKind,
    input: String,
    output: String,
    bits: Option<usize>,
    hashes: Option<usize>,
    fp_rate: Option<f64>,
    precision: u8,
    depth: Option<usize>,
    width: Option<usize>,
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <kind> <input> <output> [options]", program);
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <kind>           bitset, bloom, hll, minhash or countmin");
    eprintln!("  <input>          Text file, one item per line");
    eprintln!("  <output>         Sketch file to write");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --bits <N>       Bit width (bitset, bloom)");
    eprintln!("  --hashes <N>     Hash functions (bloom, minhash)");
    eprintln!(
        "  --fp-rate <P>    Target false positive rate (bloom, default {})",
        DEFAULT_FALSE_POSITIVE_RATE
    );
    eprintln!(
        "  --precision <P>  Index bits (hll, default {})",
        DEFAULT_PRECISION
    );
    eprintln!("  --depth <N>      Rows (countmin)");
    eprintln!("  --width <N>      Columns (countmin)");
    eprintln!("  --help, -h       Show this help message");
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, name: &str) -> Result<T, String> {
    let raw = args
        .get(i + 1)
        .ok_or_else(|| format!("{} requires a value", name))?;
    raw.parse()
        .map_err(|_| format!("Invalid value for {}: {}", name, raw))
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().collect();

    let mut positional: Vec<String> = Vec::new();
    let mut bits = None;
    let mut hashes = None;
    let mut fp_rate = None;
    let mut precision = DEFAULT_PRECISION;
    let mut depth = None;
    let mut width = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bits" => {
                bits = Some(parse_value(&args, i, "--bits")?);
                i += 1;
            }
            "--hashes" => {
                hashes = Some(parse_value(&args, i, "--hashes")?);
                i += 1;
            }
            "--fp-rate" => {
                fp_rate = Some(parse_value(&args, i, "--fp-rate")?);
                i += 1;
            }
            "--precision" => {
                precision = parse_value(&args, i, "--precision")?;
                i += 1;
            }
            "--depth" => {
                depth = Some(parse_value(&args, i, "--depth")?);
                i += 1;
            }
            "--width" => {
                width = Some(parse_value(&args, i, "--width")?);
                i += 1;
            }
            "--help" | "-h" => {
                print_usage(&args[0]);
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') => positional.push(arg.to_string()),
            _ => return Err(format!("Unknown option: {}", args[i])),
        }
        i += 1;
    }

    if positional.len() != 3 {
        return Err(format!(
            "Expected 3 arguments (kind, input, output), got {}",
            positional.len()
        ));
    }
    let output = positional.pop().unwrap_or_default();
    let input = positional.pop().unwrap_or_default();
    let kind = positional.pop().unwrap_or_default().parse()?;

    Ok(Args {
        kind,
        input,
        output,
        bits,
        hashes,
        fp_rate,
        precision,
        depth,
        width,
    })
}

#[cfg(feature = "parallel")]
fn build<S: Sketch + Sync>(template: &S, items: &[&str]) -> Result<S, String> {
    build_sketch_parallel(template, items).map_err(|e| e.to_string())
}

#[cfg(not(feature = "parallel"))]
fn build<S: Sketch + Sync>(template: &S, items: &[&str]) -> Result<S, String> {
    let sketch = build_sketch_with_progress(template, items, |current, total| {
        let progress = if total > 0 {
            (current as f64 / total as f64) * 100.0
        } else {
            100.0
        };
        print!("\r[Build] Progress: {:.2}% ({}/{})", progress, current, total);
        io::stdout().flush().ok();
    });
    println!();
    Ok(sketch)
}

/// Explicit `--bits`, or just wide enough for the highest index
fn bit_set_width(bits: Option<usize>, indices: &[usize]) -> Result<usize, String> {
    if let Some(bits) = bits {
        return Ok(bits);
    }
    match indices.iter().max() {
        Some(&max) => max
            .checked_add(1)
            .ok_or_else(|| format!("Bit index {} is too large", max)),
        None => Ok(1),
    }
}

fn build_bit_set(args: &Args, items: &[&str]) -> Result<BitSet, String> {
    let indices = items
        .iter()
        .map(|line| {
            line.parse::<usize>()
                .map_err(|_| format!("Invalid bit index: {}", line))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let bit_width = bit_set_width(args.bits, &indices)?;
    let mut set = BitSet::new(bit_width).map_err(|e| e.to_string())?;
    for index in indices {
        if index >= bit_width {
            return Err(format!("Bit index {} exceeds width {}", index, bit_width));
        }
        set.set(index, true);
    }
    Ok(set)
}

/// Empty filter sized either by `--bits`/`--hashes` or by `--fp-rate`
fn bloom_template(args: &Args, item_count: usize) -> Result<BloomFilter, String> {
    let template = match (args.bits, args.hashes, args.fp_rate) {
        (Some(_), Some(_), Some(_)) => {
            return Err("--fp-rate cannot be combined with --bits and --hashes".to_string());
        }
        (Some(bits), Some(hashes), None) => BloomFilter::new(bits, hashes),
        (None, None, fp_rate) => BloomFilter::with_false_positive_rate(
            item_count.max(1),
            fp_rate.unwrap_or(DEFAULT_FALSE_POSITIVE_RATE),
        ),
        _ => return Err("--bits and --hashes must be given together".to_string()),
    };
    template.map_err(|e| e.to_string())
}

fn build_any(args: &Args, items: &[&str]) -> Result<AnySketch, String> {
    let sketch = match args.kind {
        SketchKind::BitSet => AnySketch::BitSet(build_bit_set(args, items)?),
        SketchKind::Bloom => {
            let template = bloom_template(args, items.len())?;
            AnySketch::Bloom(build(&template, items)?)
        }
        SketchKind::HyperLogLog => {
            let template: HyperLogLog = HyperLogLog::new(args.precision).map_err(|e| e.to_string())?;
            AnySketch::HyperLogLog(build(&template, items)?)
        }
        SketchKind::MinHash => {
            let template: MinHash = MinHash::new(args.hashes.unwrap_or(DEFAULT_MIN_HASH_COUNT))
                .map_err(|e| e.to_string())?;
            AnySketch::MinHash(build(&template, items)?)
        }
        SketchKind::CountMin => {
            let (default_depth, default_width) =
                ideal_parameters(DEFAULT_EPSILON, DEFAULT_CONFIDENCE).map_err(|e| e.to_string())?;
            let template: CountMin = CountMin::new(
                args.depth.unwrap_or(default_depth),
                args.width.unwrap_or(default_width),
            )
            .map_err(|e| e.to_string())?;
            AnySketch::CountMin(build(&template, items)?)
        }
    };
    Ok(sketch)
}

fn describe(sketch: &AnySketch) -> String {
    match sketch {
        AnySketch::BitSet(s) => format!("{} of {} bits set", s.cardinality(), s.bit_width()),
        AnySketch::Bloom(s) => format!(
            "{} bits, {} hashes, ~{:.0} items",
            s.bit_width(),
            s.hash_count(),
            s.cardinality()
        ),
        AnySketch::HyperLogLog(s) => format!(
            "precision {}, ~{:.0} distinct items",
            s.precision(),
            s.cardinality()
        ),
        AnySketch::MinHash(s) => format!("{} hashes", s.hash_count()),
        AnySketch::CountMin(s) => format!("{} x {} counters", s.depth(), s.width()),
    }
}

fn main() {
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage(&env::args().next().unwrap_or_default());
            std::process::exit(1);
        }
    };

    let content = match fs::read_to_string(&args.input) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading {}: {}", args.input, e);
            std::process::exit(1);
        }
    };
    let items: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    println!(
        "Building {} sketch from {} items in {}...",
        args.kind,
        items.len(),
        args.input
    );
    #[cfg(feature = "parallel")]
    println!("Using parallel processing for faster building.");

    let start = Instant::now();

    let sketch = match build_any(&args, &items) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "Built {} in {:.2} seconds",
        describe(&sketch),
        start.elapsed().as_secs_f64()
    );

    println!("Saving sketch to {}...", args.output);
    match save_any(&args.output, &sketch) {
        Ok(_) => println!("Sketch saved successfully."),
        Err(e) => {
            eprintln!("Error saving sketch: {}", e);
            std::process::exit(1);
        }
    }

    let file_size = fs::metadata(&args.output).map(|m| m.len()).unwrap_or(0);
    println!("File size: {:.2} KB", file_size as f64 / 1024.0);
}
