//! Sketch merge CLI
//!
//! Usage: sketch_merge <output> <input>... [--help]
//!
//! Merges sketches of the same kind and parameters into <output>.
//!
//! Example: sketch_merge all.sketch monday.sketch tuesday.sketch

use sketching::infra::sketch_io::{load_any, read_header, save_any};
use std::env;
use std::time::Instant;

struct Args {
    output: String,
    inputs: Vec<String>,
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <output> <input>...", program);
    eprintln!();
    eprintln!("Merges sketches of the same kind and parameters into <output>.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --help, -h       Show this help message");
}

/// `Ok(None)` when help was requested
fn parse_args(args: &[String]) -> Result<Option<Args>, String> {
    let mut paths = Vec::new();
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => return Ok(None),
            a if a.starts_with('-') => return Err(format!("Unknown option: {}", a)),
            a => paths.push(a.to_string()),
        }
    }

    if paths.len() < 2 {
        return Err("Expected an output path and at least one input".to_string());
    }
    let output = paths.remove(0);
    Ok(Some(Args {
        output,
        inputs: paths,
    }))
}

fn main() {
    let raw: Vec<String> = env::args().collect();
    let program = raw.first().map(String::as_str).unwrap_or("sketch_merge");

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

    let output = &args.output;
    let inputs = &args.inputs;

    let start = Instant::now();

    let mut merged = match load_any(&inputs[0]) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading {}: {}", inputs[0], e);
            std::process::exit(1);
        }
    };
    println!("[{}/{}] {} ({})", 1, inputs.len(), inputs[0], merged.kind());

    for (i, input) in inputs.iter().enumerate().skip(1) {
        let sketch = match load_any(input) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error loading {}: {}", input, e);
                std::process::exit(1);
            }
        };
        if let Err(e) = merged.merge(&sketch) {
            eprintln!("Error merging {}: {}", input, e);
            std::process::exit(1);
        }
        println!("[{}/{}] {} ({})", i + 1, inputs.len(), input, sketch.kind());
    }

    println!("Saving merged sketch to {}...", output);
    if let Err(e) = save_any(output, &merged) {
        eprintln!("Error saving sketch: {}", e);
        std::process::exit(1);
    }

    match read_header(output) {
        Ok(header) => println!(
            "Merged {} {} sketches in {:.2} seconds ({} payload bytes)",
            inputs.len(),
            header.kind,
            start.elapsed().as_secs_f64(),
            header.payload_len
        ),
        Err(e) => {
            eprintln!("Warning: could not re-read {}: {}", output, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        std::iter::once("sketch_merge")
            .chain(args.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_args() {
        let args = parse_args(&argv(&["all.sketch", "a.sketch", "b.sketch"]))
            .unwrap()
            .unwrap();
        assert_eq!(args.output, "all.sketch");
        assert_eq!(args.inputs, vec!["a.sketch", "b.sketch"]);
    }

    #[test]
    fn test_parse_args_help() {
        assert!(parse_args(&argv(&["--help"])).unwrap().is_none());
        assert!(parse_args(&argv(&["all.sketch", "-h"])).unwrap().is_none());
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(&argv(&["all.sketch"])).is_err());
        assert!(parse_args(&argv(&["all.sketch", "--force", "a.sketch"])).is_err());
    }
}
