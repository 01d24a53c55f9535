use crate::ast::{Addr, Instr, Line};
use chip8_isa::program::ORIGIN;
use chip8_isa::Opcode;
use std::collections::HashMap;
use std::error::Error;
use std::io::Write;

pub fn generate<W: Write>(lines: &[Line], w: &mut W) -> Result<(), Box<dyn Error>> {
    let labels = labels(lines)?;
    opcodes(lines, &labels, w)
}

fn labels(lines: &[Line]) -> Result<HashMap<String, usize>, String> {
    let mut addr = ORIGIN as usize;
    let mut labels = HashMap::new();

    for l in lines {
        if let Some(label) = &l.label {
            // forbid duplicate labels
            if labels.contains_key(label) {
                return Err(format!("duplicate label: '{}'", label));
            }
            labels.insert(label.to_owned(), addr);
        }
        addr += l.size();
    }

    Ok(labels)
}

fn opcodes<W: Write>(
    lines: &[Line],
    labels: &HashMap<String, usize>,
    w: &mut W,
) -> Result<(), Box<dyn Error>> {
    for line in lines {
        match &line.instr {
            Some(Instr::Data(d)) => w.write_all(d)?,
            Some(Instr::Opcode(o)) => opcode(o, w)?,
            Some(Instr::Branch(b, a)) => opcode(&b.opcode(addr(a, labels)?), w)?,
            None => {}
        }
    }

    Ok(())
}

fn opcode<W: Write>(o: &Opcode, w: &mut W) -> Result<(), Box<dyn Error>> {
    let code = o.encode(true)?;
    w.write_all(&code.to_be_bytes()).map_err(|e| e.into())
}

fn addr(addr: &Addr, labels: &HashMap<String, usize>) -> Result<u16, String> {
    let a = match addr {
        Addr::Imm(a) => *a as usize,
        Addr::LabelRef(s) => *labels.get(s).ok_or(format!("unknown label: '{}'", s))?,
    };
    if a > 0xFFF {
        return Err(format!("address out of range: {:#x}", a));
    }
    Ok(a as u16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Branch;
    use chip8_isa::Register::*;

    fn line(label: Option<&str>, instr: Option<Instr>) -> Line {
        Line {
            label: label.map(String::from),
            instr,
        }
    }

    #[test]
    fn test_addr() {
        assert_eq!(addr(&Addr::Imm(0x251), &Default::default()), Ok(0x251));

        let mut labels = HashMap::new();
        labels.insert("start".to_string(), 0x204);
        assert_eq!(addr(&Addr::LabelRef("start".into()), &labels), Ok(0x204));
        assert!(addr(&Addr::LabelRef("end".into()), &labels).is_err());
        assert!(addr(&Addr::Imm(0x1000), &labels).is_err());
    }

    #[test]
    fn test_labels() {
        let lines = [
            line(Some("start"), None),
            line(None, Some(Instr::Data(vec![1, 2, 3]))),
            line(Some("next"), Some(Instr::Opcode(Opcode::cls()))),
            line(Some("last"), Some(Instr::Opcode(Opcode::ret()))),
        ];
        let labels = labels(&lines).unwrap();

        assert_eq!(labels["start"], 0x200);
        assert_eq!(labels["next"], 0x203);
        assert_eq!(labels["last"], 0x205);
    }

    #[test]
    fn test_duplicate_labels() {
        let lines = [line(Some("a"), None), line(Some("a"), None)];
        assert!(labels(&lines).is_err());
    }

    #[test]
    fn test_generate() {
        let lines = [
            line(Some("loop"), Some(Instr::Opcode(Opcode::ld_imm(VA, 7)))),
            line(None, Some(Instr::Branch(Branch::LoadI, Addr::LabelRef("sprite".into())))),
            line(None, Some(Instr::Opcode(Opcode::drw(V0, V1, 5)))),
            line(None, Some(Instr::Branch(Branch::Jump, Addr::LabelRef("loop".into())))),
            line(Some("sprite"), Some(Instr::Data(vec![0xF0, 0x90]))),
        ];

        let mut out = Vec::new();
        generate(&lines, &mut out).unwrap();
        assert_eq!(
            out,
            vec![0x6A, 0x07, 0xA2, 0x08, 0xD0, 0x15, 0x12, 0x00, 0xF0, 0x90]
        );
    }

    #[test]
    fn test_generate_reports_encoding_errors() {
        let lines = [line(None, Some(Instr::Opcode(Opcode::ld_reg(V1, I))))];
        let mut out = Vec::new();
        assert!(generate(&lines, &mut out).is_err());
    }
}
