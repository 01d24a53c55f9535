use crate::opcode::Opcode;
use crate::operand::Operand;
use crate::trace::{Block, Line};
use bitflags::bitflags;
use std::io;
use std::io::Write;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ListingFlags: u8 {
        const ADDRESSES = 0x1;
        const BYTES = 0x2;
        const COLOR = 0x4;
    }
}

/// ANSI escapes used when `COLOR` is set
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const ADDRESS: &str = "\x1b[2;37m";
    pub const BYTES: &str = "\x1b[2;33m";
    pub const MNEMONIC: &str = "\x1b[1;36m";
    pub const REGISTER: &str = "\x1b[1;32m";
    pub const NUMBER: &str = "\x1b[1;33m";
    pub const TARGET: &str = "\x1b[1;35m";
    pub const INVALID: &str = "\x1b[1;31m";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingOptions {
    flags: ListingFlags,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            flags: ListingFlags::ADDRESSES | ListingFlags::BYTES,
        }
    }
}

impl ListingOptions {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn show(&mut self, flags: ListingFlags) -> &mut Self {
        self.flags |= flags;
        self
    }

    pub fn hide(&mut self, flags: ListingFlags) -> &mut Self {
        self.flags -= flags;
        self
    }

    pub fn set(&mut self, flags: ListingFlags, enabled: bool) -> &mut Self {
        self.flags.set(flags, enabled);
        self
    }

    pub fn flags(&self) -> ListingFlags {
        self.flags
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.flags.contains(ListingFlags::COLOR) {
            format!("{}{}{}", color, text, colors::RESET)
        } else {
            text.to_string()
        }
    }
}

fn operand_color(o: &Operand) -> &'static str {
    if o.is_register() {
        colors::REGISTER
    } else if o.is_address() {
        colors::TARGET
    } else {
        colors::NUMBER
    }
}

/// Instruction text, same as `Display` unless colors are on.
pub fn format_opcode(opcode: &Opcode, options: &ListingOptions) -> String {
    let kind = opcode.kind();
    let mut operands = Vec::new();
    if let Some(implicit) = kind.implicit_operand() {
        operands.push(options.paint(colors::REGISTER, implicit));
    }
    for o in opcode.operands() {
        operands.push(options.paint(operand_color(&o), &o.to_string()));
    }

    let mnemonic = options.paint(colors::MNEMONIC, kind.mnemonic());
    if operands.is_empty() {
        mnemonic
    } else {
        format!("{} {}", mnemonic, operands.join(", "))
    }
}

pub fn format_line(line: &Line, options: &ListingOptions) -> String {
    let mut s = String::new();
    if options.flags.contains(ListingFlags::ADDRESSES) {
        s.push_str(&options.paint(colors::ADDRESS, &format!("{:03x}", line.address)));
        s.push('\t');
    }
    if options.flags.contains(ListingFlags::BYTES) {
        let [hi, lo] = line.word.to_be_bytes();
        s.push_str(&options.paint(colors::BYTES, &format!("{:02x} {:02x}", hi, lo)));
        s.push('\t');
    }
    match line.error {
        Some(_) => s.push_str(&options.paint(colors::INVALID, &line.opcode.to_string())),
        None => s.push_str(&format_opcode(&line.opcode, options)),
    }
    s
}

pub fn format_block(block: &Block, options: &ListingOptions) -> String {
    let header = options.paint(colors::TARGET, &format!("<{:03x}>:", block.start));
    let mut lines = vec![header];
    lines.extend(block.lines.iter().map(|l| format_line(l, options)));
    lines.join("\n")
}

/// Writes every block followed by a blank line.
pub fn write_listing<W: Write>(
    w: &mut W,
    blocks: &[Block],
    options: &ListingOptions,
) -> io::Result<()> {
    for block in blocks {
        writeln!(w, "{}", format_block(block, options))?;
        writeln!(w)?;
    }
    Ok(())
}
