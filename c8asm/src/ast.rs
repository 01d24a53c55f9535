use chip8_isa::Opcode;

#[derive(Debug, PartialEq)]
pub struct Line {
    pub label: Option<String>,
    pub instr: Option<Instr>,
}

impl Line {
    pub fn size(&self) -> usize {
        match &self.instr {
            Some(i) => i.size(),
            None => 0,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Instr {
    Opcode(Opcode),
    /// Instruction whose address operand may be a label
    Branch(Branch, Addr),
    Data(Vec<u8>),
}

impl Instr {
    pub fn size(&self) -> usize {
        match self {
            Instr::Opcode(_) | Instr::Branch(_, _) => 2,
            Instr::Data(d) => d.len(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Branch {
    Jump,
    Call,
    LoadI,
    JumpV0,
}

impl Branch {
    pub fn opcode(self, addr: u16) -> Opcode {
        match self {
            Branch::Jump => Opcode::jp(addr),
            Branch::Call => Opcode::call(addr),
            Branch::LoadI => Opcode::ld_i(addr),
            Branch::JumpV0 => Opcode::jp_v0(addr),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Addr {
    Imm(u16),
    LabelRef(String),
}
