use crate::generator::generate;
use crate::parser::parse_file;
use clap::Parser;
use std::error::Error;
use std::fs::File;
use std::path::PathBuf;

mod ast;
mod generator;
mod parser;

#[derive(Parser)]
struct Options {
    /// Set input filename of the assembly source
    input: PathBuf,

    /// Set output filename of the program image
    output: PathBuf,
}

fn main() -> Result<(), Box<dyn Error>> {
    let options: Options = Options::parse();
    let r = parse_file(&options.input)?;

    let mut output = File::create(&options.output)?;
    generate(&r, &mut output)?;

    Ok(())
}
