use crate::opcode::{DecodeError, Opcode};
use crate::program::{Program, ORIGIN};
use std::collections::{HashSet, VecDeque};

/// A decoded word of the program.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub address: u16,
    pub word: u16,
    /// `NONE` when the word failed to decode.
    pub opcode: Opcode,
    pub error: Option<DecodeError>,
}

impl Line {
    fn decode(address: u16, word: u16) -> Self {
        match Opcode::decode(word, true) {
            Ok(opcode) => Self {
                address,
                word,
                opcode,
                error: None,
            },
            Err(e) => Self {
                address,
                word,
                opcode: Opcode::none(),
                error: Some(e),
            },
        }
    }
}

/// A run of consecutive instructions reached from a single entry point.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub start: u16,
    pub lines: Vec<Line>,
}

/// Follows control flow from the load address.
pub fn trace(program: &Program) -> Vec<Block> {
    trace_from(program, &[ORIGIN])
}

/// Follows control flow from each entry point.
///
/// Blocks end after `JP`, `JP V0` and `RET`, at the end of the image, or when
/// running into code already decoded. `JP`/`CALL` targets and the word a skip
/// instruction jumps to are queued as new entry points. Words that do not
/// decode are kept as `NONE` lines and decoding carries on.
pub fn trace_from(program: &Program, entries: &[u16]) -> Vec<Block> {
    let mut decoded = HashSet::new();
    let mut queue: VecDeque<u16> = entries.iter().copied().collect();
    let mut blocks = Vec::new();

    while let Some(start) = queue.pop_front() {
        if !program.contains(start) || decoded.contains(&start) {
            continue;
        }

        let mut lines = Vec::new();
        let mut address = start;
        while let Some(word) = program.read_u16(address) {
            if !decoded.insert(address) {
                break;
            }

            let line = Line::decode(address, word);
            let kind = line.opcode.kind();
            if let Some(target) = line.opcode.target() {
                queue.push_back(target);
            }
            if kind.is_skip() {
                queue.push_back(address.wrapping_add(4));
            }
            lines.push(line);

            if kind.is_terminator() {
                break;
            }
            address = address.wrapping_add(2);
        }

        if !lines.is_empty() {
            blocks.push(Block { start, lines });
        }
    }

    blocks
}

/// Decodes every word of the image in order, as a single block.
pub fn sweep(program: &Program) -> Vec<Block> {
    let lines: Vec<Line> = (ORIGIN as usize..program.end())
        .step_by(2)
        .filter_map(|a| {
            let address = a as u16;
            program
                .read_u16(address)
                .map(|word| Line::decode(address, word))
        })
        .collect();

    if lines.is_empty() {
        return Vec::new();
    }
    vec![Block {
        start: ORIGIN,
        lines,
    }]
}
