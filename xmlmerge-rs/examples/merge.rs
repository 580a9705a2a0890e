//! Example: apply an XML patch document to a baseline file
//!
//! Takes a baseline XML file and a diff document and prints the merged
//! document to stdout.
//!
//! Usage: cargo run --example merge <baseline.xml> <diff.xml>

use std::env;
use std::fs::File;
use std::io;

use xml_merge::XmlMerge;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() != 3 {
        eprintln!("Usage: {} <baseline.xml> <diff.xml>", args[0]);
        std::process::exit(1);
    }

    let baseline = File::open(&args[1])?;
    let diff = File::open(&args[2])?;

    eprintln!("Applying {} to {}...", args[2], args[1]);
    let report = XmlMerge::new().merge(baseline, diff, &mut io::stdout())?;

    eprintln!(
        "\nMerge completed: {} applied, {} skipped",
        report.applied, report.skipped
    );
    Ok(())
}
