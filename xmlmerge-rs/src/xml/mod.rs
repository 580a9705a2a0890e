//! XML parsing and output.
//!
//! This module turns byte streams into [`Document`](crate::node::Document)
//! trees and back.

mod parser;
mod printer;

pub use parser::{parse_file, parse_read, parse_str, XmlParser};
pub use printer::{
    print_to_string, print_to_string_pretty, to_bytes, XmlPrinter, XmlPrinterOptions,
};
