use chip8_isa::config::ListingProfile;
use chip8_isa::listing::{write_listing, ListingFlags, ListingOptions};
use chip8_isa::program::Program;
use chip8_isa::trace::{sweep, trace, Block};
use clap::Parser;
use std::error::Error;
use std::io;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
struct Options {
    /// Load listing settings from a TOML profile
    #[clap(long, short)]
    profile: Option<PathBuf>,

    /// Do not print instruction addresses
    #[clap(long, help_heading(Some("LISTING")))]
    no_addresses: bool,

    /// Do not print raw instruction bytes
    #[clap(long, help_heading(Some("LISTING")))]
    no_bytes: bool,

    /// Color the listing with ANSI escapes
    #[clap(long, short, help_heading(Some("LISTING")))]
    color: bool,

    /// Decode every word in order instead of following control flow
    #[clap(long, short)]
    linear: bool,

    /// Report words that could not be decoded
    #[clap(long, short)]
    verbose: bool,

    /// Set input filename of the image to disassemble
    filename: PathBuf,
}

fn report_invalid(blocks: &[Block]) {
    for line in blocks.iter().flat_map(|b| &b.lines) {
        if let Some(e) = &line.error {
            eprintln!("{:03x}: {}", line.address, e);
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let options: Options = Options::parse();

    // listing options, the profile first then flags on top
    let mut listing = match &options.profile {
        Some(p) => ListingProfile::load(p)?.options(),
        None => ListingOptions::new(),
    };
    if options.no_addresses {
        listing.hide(ListingFlags::ADDRESSES);
    }
    if options.no_bytes {
        listing.hide(ListingFlags::BYTES);
    }
    if options.color {
        listing.show(ListingFlags::COLOR);
    }

    let program = Program::load(&options.filename)?;
    if options.verbose {
        eprintln!("{}: {} bytes", options.filename.display(), program.len());
    }
    if program.is_empty() {
        return Ok(());
    }
    let blocks = if options.linear {
        sweep(&program)
    } else {
        trace(&program)
    };

    if options.verbose {
        report_invalid(&blocks);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_listing(&mut out, &blocks, &listing)?;
    out.flush()?;

    Ok(())
}
