use crate::endian::ByteOrder;
use crate::operand::{Operand, OperandError, OperandValue};
use crate::register::Register;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DecodeError {
    InvalidOpcode(u16),
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::InvalidOpcode(o) => write!(f, "invalid opcode: {:04X}", o),
        }
    }
}

impl Error for DecodeError {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EncodeError {
    IllegalEncoding(OpcodeType),
    WrongOperandKind,
    IllegalRegister(Register),
}

impl Display for EncodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodeError::IllegalEncoding(t) => {
                write!(f, "operands of {} have no encoding", t)
            }
            EncodeError::WrongOperandKind => write!(f, "wrong operand kind"),
            EncodeError::IllegalRegister(r) => {
                write!(f, "register {} is not general purpose", r)
            }
        }
    }
}

impl Error for EncodeError {}

impl From<OperandError> for EncodeError {
    fn from(e: OperandError) -> Self {
        match e {
            OperandError::WrongOperandKind => EncodeError::WrongOperandKind,
            OperandError::IllegalRegister(r) => EncodeError::IllegalRegister(r),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum OpcodeType {
    /// Placeholder for the all-zero word
    None,
    Cls,
    Ret,
    Jp,
    Call,
    Se,
    Sne,
    Ld,
    Add,
    Or,
    And,
    Xor,
    Sub,
    Shr,
    Subn,
    Shl,
    JpV0,
    Rnd,
    Drw,
    Skp,
    Sknp,
    LdFont,
    LdBcd,
}

impl OpcodeType {
    pub fn mnemonic(self) -> &'static str {
        match self {
            OpcodeType::None => "<none>",
            OpcodeType::Cls => "CLS",
            OpcodeType::Ret => "RET",
            OpcodeType::Jp | OpcodeType::JpV0 => "JP",
            OpcodeType::Call => "CALL",
            OpcodeType::Se => "SE",
            OpcodeType::Sne => "SNE",
            OpcodeType::Ld | OpcodeType::LdFont | OpcodeType::LdBcd => "LD",
            OpcodeType::Add => "ADD",
            OpcodeType::Or => "OR",
            OpcodeType::And => "AND",
            OpcodeType::Xor => "XOR",
            OpcodeType::Sub => "SUB",
            OpcodeType::Shr => "SHR",
            OpcodeType::Subn => "SUBN",
            OpcodeType::Shl => "SHL",
            OpcodeType::Rnd => "RND",
            OpcodeType::Drw => "DRW",
            OpcodeType::Skp => "SKP",
            OpcodeType::Sknp => "SKNP",
        }
    }

    /// Operand written in the text but not stored in any slot.
    pub fn implicit_operand(self) -> Option<&'static str> {
        match self {
            OpcodeType::JpV0 => Some("V0"),
            OpcodeType::LdFont => Some("F"),
            OpcodeType::LdBcd => Some("B"),
            _ => None,
        }
    }

    /// Execution never falls through to the next word.
    pub fn is_terminator(self) -> bool {
        matches!(self, OpcodeType::Jp | OpcodeType::JpV0 | OpcodeType::Ret)
    }

    /// Conditionally skips the next instruction.
    pub fn is_skip(self) -> bool {
        matches!(
            self,
            OpcodeType::Se | OpcodeType::Sne | OpcodeType::Skp | OpcodeType::Sknp
        )
    }
}

impl Display for OpcodeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// One instruction: a mnemonic and up to three operands.
///
/// The populated slots depend on the kind and on the constructor used, e.g.
/// `LD I, nnn` holds `I` in `op1` and the address in `op2`. `op3` is only
/// used by `DRW`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Opcode {
    kind: OpcodeType,
    op1: Option<Operand>,
    op2: Option<Operand>,
    op3: Option<Operand>,
}

impl Default for Opcode {
    fn default() -> Self {
        Self::none()
    }
}

fn nnn(opcode: u16) -> u16 {
    opcode & 0xFFF
}

fn x(opcode: u16) -> Register {
    Register::from_nibble(opcode >> 8)
}

fn y(opcode: u16) -> Register {
    Register::from_nibble(opcode >> 4)
}

fn kk(opcode: u16) -> u8 {
    (opcode & 0xFF) as u8
}

fn n(opcode: u16) -> u8 {
    (opcode & 0xF) as u8
}

impl Opcode {
    pub fn new(kind: OpcodeType) -> Self {
        Self {
            kind,
            op1: None,
            op2: None,
            op3: None,
        }
    }

    fn with(kind: OpcodeType, op1: Operand, op2: Option<Operand>) -> Self {
        Self {
            kind,
            op1: Some(op1),
            op2,
            op3: None,
        }
    }

    pub fn none() -> Self {
        Self::new(OpcodeType::None)
    }

    pub fn cls() -> Self {
        Self::new(OpcodeType::Cls)
    }

    pub fn ret() -> Self {
        Self::new(OpcodeType::Ret)
    }

    pub fn jp(addr: u16) -> Self {
        Self::with(OpcodeType::Jp, Operand::address(addr), None)
    }

    pub fn call(addr: u16) -> Self {
        Self::with(OpcodeType::Call, Operand::address(addr), None)
    }

    pub fn jp_v0(addr: u16) -> Self {
        Self::with(OpcodeType::JpV0, Operand::immediate(addr), None)
    }

    fn reg_imm(kind: OpcodeType, x: Register, kk: u8) -> Self {
        Self::with(kind, x.into(), Some(Operand::immediate(kk as u16)))
    }

    fn reg_reg(kind: OpcodeType, x: Register, y: Register) -> Self {
        Self::with(kind, x.into(), Some(y.into()))
    }

    fn reg(kind: OpcodeType, x: Register) -> Self {
        Self::with(kind, x.into(), None)
    }

    pub fn se_imm(x: Register, kk: u8) -> Self {
        Self::reg_imm(OpcodeType::Se, x, kk)
    }

    pub fn sne_imm(x: Register, kk: u8) -> Self {
        Self::reg_imm(OpcodeType::Sne, x, kk)
    }

    pub fn se_reg(x: Register, y: Register) -> Self {
        Self::reg_reg(OpcodeType::Se, x, y)
    }

    pub fn sne_reg(x: Register, y: Register) -> Self {
        Self::reg_reg(OpcodeType::Sne, x, y)
    }

    pub fn ld_imm(x: Register, kk: u8) -> Self {
        Self::reg_imm(OpcodeType::Ld, x, kk)
    }

    pub fn add_imm(x: Register, kk: u8) -> Self {
        Self::reg_imm(OpcodeType::Add, x, kk)
    }

    pub fn ld_reg(x: Register, y: Register) -> Self {
        Self::reg_reg(OpcodeType::Ld, x, y)
    }

    pub fn or(x: Register, y: Register) -> Self {
        Self::reg_reg(OpcodeType::Or, x, y)
    }

    pub fn and(x: Register, y: Register) -> Self {
        Self::reg_reg(OpcodeType::And, x, y)
    }

    pub fn xor(x: Register, y: Register) -> Self {
        Self::reg_reg(OpcodeType::Xor, x, y)
    }

    pub fn add_reg(x: Register, y: Register) -> Self {
        Self::reg_reg(OpcodeType::Add, x, y)
    }

    pub fn sub(x: Register, y: Register) -> Self {
        Self::reg_reg(OpcodeType::Sub, x, y)
    }

    pub fn subn(x: Register, y: Register) -> Self {
        Self::reg_reg(OpcodeType::Subn, x, y)
    }

    /// `SHR Vx`, or `SHR Vx, Vy` when the word carries a source register.
    /// A `V0` source leaves the field empty, so it is dropped.
    pub fn shr(x: Register, y: Option<Register>) -> Self {
        Self::with(OpcodeType::Shr, x.into(), shift_source(y))
    }

    /// `SHL Vx`, or `SHL Vx, Vy`, same rules as [`Opcode::shr`].
    pub fn shl(x: Register, y: Option<Register>) -> Self {
        Self::with(OpcodeType::Shl, x.into(), shift_source(y))
    }

    pub fn ld_i(addr: u16) -> Self {
        Self::with(
            OpcodeType::Ld,
            Register::I.into(),
            Some(Operand::immediate(addr)),
        )
    }

    pub fn rnd(x: Register, kk: u8) -> Self {
        Self::reg_imm(OpcodeType::Rnd, x, kk)
    }

    pub fn drw(x: Register, y: Register, n: u8) -> Self {
        Self {
            kind: OpcodeType::Drw,
            op1: Some(x.into()),
            op2: Some(y.into()),
            op3: Some(Operand::immediate(n as u16)),
        }
    }

    pub fn skp(x: Register) -> Self {
        Self::reg(OpcodeType::Skp, x)
    }

    pub fn sknp(x: Register) -> Self {
        Self::reg(OpcodeType::Sknp, x)
    }

    /// `LD Vx, DT`
    pub fn load_delay_timer(x: Register) -> Self {
        Self::reg_reg(OpcodeType::Ld, x, Register::DT)
    }

    /// `LD DT, Vx`
    pub fn set_delay_timer(x: Register) -> Self {
        Self::reg_reg(OpcodeType::Ld, Register::DT, x)
    }

    /// `LD ST, Vx`
    pub fn set_sound_timer(x: Register) -> Self {
        Self::reg_reg(OpcodeType::Ld, Register::ST, x)
    }

    /// `ADD I, Vx`
    pub fn add_i(x: Register) -> Self {
        Self::reg_reg(OpcodeType::Add, Register::I, x)
    }

    pub fn ld_font(x: Register) -> Self {
        Self::reg(OpcodeType::LdFont, x)
    }

    pub fn ld_bcd(x: Register) -> Self {
        Self::reg(OpcodeType::LdBcd, x)
    }

    /// `LD [I], Vx`: store V0..=Vx at I.
    pub fn save_regs(x: Register) -> Self {
        Self::with(
            OpcodeType::Ld,
            Operand::register(Register::I).indirect(),
            Some(x.into()),
        )
    }

    /// `LD Vx, [I]`: load V0..=Vx from I.
    pub fn load_regs(x: Register) -> Self {
        Self::with(
            OpcodeType::Ld,
            x.into(),
            Some(Operand::register(Register::I).indirect()),
        )
    }

    pub fn kind(&self) -> OpcodeType {
        self.kind
    }

    pub fn kind_mut(&mut self) -> &mut OpcodeType {
        &mut self.kind
    }

    pub fn op1(&self) -> Option<Operand> {
        self.op1
    }

    pub fn op2(&self) -> Option<Operand> {
        self.op2
    }

    pub fn op3(&self) -> Option<Operand> {
        self.op3
    }

    pub fn op1_mut(&mut self) -> &mut Option<Operand> {
        &mut self.op1
    }

    pub fn op2_mut(&mut self) -> &mut Option<Operand> {
        &mut self.op2
    }

    pub fn op3_mut(&mut self) -> &mut Option<Operand> {
        &mut self.op3
    }

    pub fn operands(&self) -> impl Iterator<Item = Operand> {
        [self.op1, self.op2, self.op3].into_iter().flatten()
    }

    /// Address a `JP` or `CALL` transfers control to.
    pub fn target(&self) -> Option<u16> {
        match self.kind {
            OpcodeType::Jp | OpcodeType::Call => {
                self.op1.and_then(|o| o.as_immediate().ok())
            }
            _ => None,
        }
    }

    /// Decodes a single instruction word.
    ///
    /// When `big_endian` is false, `word` is taken as read from memory in the
    /// host's native order and is normalized first.
    pub fn decode(word: u16, big_endian: bool) -> Result<Opcode, DecodeError> {
        let opcode = if big_endian {
            word
        } else {
            word.from_big_endian()
        };
        let msn = opcode >> 12;
        let lsn = opcode & 0xF;
        match opcode {
            0x0000 => Ok(Opcode::none()),
            0x00E0 => Ok(Opcode::cls()),
            0x00EE => Ok(Opcode::ret()),
            o if msn == 0x1 => Ok(Opcode::jp(nnn(o))),
            o if msn == 0x2 => Ok(Opcode::call(nnn(o))),
            o if msn == 0x3 => Ok(Opcode::se_imm(x(o), kk(o))),
            o if msn == 0x4 => Ok(Opcode::sne_imm(x(o), kk(o))),
            o if (msn, lsn) == (0x5, 0x0) => Ok(Opcode::se_reg(x(o), y(o))),
            o if msn == 0x6 => Ok(Opcode::ld_imm(x(o), kk(o))),
            o if msn == 0x7 => Ok(Opcode::add_imm(x(o), kk(o))),
            o if msn == 0x8 => decode_8(o),
            o if (msn, lsn) == (0x9, 0x0) => Ok(Opcode::sne_reg(x(o), y(o))),
            o if msn == 0xA => Ok(Opcode::ld_i(nnn(o))),
            o if msn == 0xB => Ok(Opcode::jp_v0(nnn(o))),
            o if msn == 0xC => Ok(Opcode::rnd(x(o), kk(o))),
            o if msn == 0xD => Ok(Opcode::drw(x(o), y(o), n(o))),
            o if msn == 0xE => decode_e(o),
            o if msn == 0xF => decode_f(o),
            o => Err(DecodeError::InvalidOpcode(o)),
        }
    }

    /// Encodes this instruction back into a word.
    ///
    /// With `big_endian` the logical word is returned; otherwise its native
    /// memory representation, i.e. the value whose native bytes are the
    /// big-endian bytes of the word.
    pub fn encode(&self, big_endian: bool) -> Result<u16, EncodeError> {
        let code = match self.kind {
            OpcodeType::None => 0x0000,
            OpcodeType::Cls => 0x00E0,
            OpcodeType::Ret => 0x00EE,
            OpcodeType::Jp => addr(0x1000, self.slot(self.op1)?.as_immediate()?),
            OpcodeType::Call => addr(0x2000, self.slot(self.op1)?.as_immediate()?),
            OpcodeType::Se => self.encode_skip(0x3000, 0x5000)?,
            OpcodeType::Sne => self.encode_skip(0x4000, 0x9000)?,
            OpcodeType::Ld => self.encode_ld()?,
            OpcodeType::Add => self.encode_add()?,
            OpcodeType::Or => self.encode_reg_reg(0x8001)?,
            OpcodeType::And => self.encode_reg_reg(0x8002)?,
            OpcodeType::Xor => self.encode_reg_reg(0x8003)?,
            OpcodeType::Sub => self.encode_reg_reg(0x8005)?,
            OpcodeType::Shr => self.encode_shift(0x8006)?,
            OpcodeType::Subn => self.encode_reg_reg(0x8007)?,
            OpcodeType::Shl => self.encode_shift(0x800E)?,
            OpcodeType::JpV0 => addr(0xB000, self.slot(self.op1)?.as_immediate()?),
            OpcodeType::Rnd => {
                let (x, kk) = (self.slot(self.op1)?, self.slot(self.op2)?);
                reg_imm(0xC000, gp(x)?, kk.as_immediate()?)
            }
            OpcodeType::Drw => {
                let (x, y) = (self.slot(self.op1)?, self.slot(self.op2)?);
                let n = self.slot(self.op3)?;
                reg_reg_nib(0xD000, gp(x)?, gp(y)?, n.as_immediate()?)
            }
            OpcodeType::Skp => self.encode_reg(0xE09E)?,
            OpcodeType::Sknp => self.encode_reg(0xE0A1)?,
            OpcodeType::LdFont => self.encode_reg(0xF029)?,
            OpcodeType::LdBcd => self.encode_reg(0xF033)?,
        };

        Ok(if big_endian {
            code
        } else {
            code.to_big_endian()
        })
    }

    fn slot(&self, op: Option<Operand>) -> Result<Operand, EncodeError> {
        op.ok_or(EncodeError::IllegalEncoding(self.kind))
    }

    fn encode_reg(&self, c: u16) -> Result<u16, EncodeError> {
        Ok(reg(c, gp(self.slot(self.op1)?)?))
    }

    fn encode_reg_reg(&self, c: u16) -> Result<u16, EncodeError> {
        let (x, y) = (self.slot(self.op1)?, self.slot(self.op2)?);
        Ok(reg_reg(c, gp(x)?, gp(y)?))
    }

    fn encode_shift(&self, c: u16) -> Result<u16, EncodeError> {
        let x = gp(self.slot(self.op1)?)?;
        let y = match self.op2 {
            Some(y) => gp(y)?,
            None => 0,
        };
        Ok(reg_reg(c, x, y))
    }

    fn encode_skip(&self, imm_form: u16, reg_form: u16) -> Result<u16, EncodeError> {
        let (x, rhs) = (self.slot(self.op1)?, self.slot(self.op2)?);
        match rhs.value() {
            OperandValue::Immediate(kk) => Ok(reg_imm(imm_form, gp(x)?, kk)),
            OperandValue::Register(_) => Ok(reg_reg(reg_form, gp(x)?, gp(rhs)?)),
        }
    }

    fn encode_ld(&self) -> Result<u16, EncodeError> {
        let (dst, src) = (self.slot(self.op1)?, self.slot(self.op2)?);
        match dst.as_register(false)? {
            // the value always sits in a general purpose register
            Register::DT => Ok(reg(0xF015, gp(src)?)),
            Register::ST => Ok(reg(0xF018, gp(src)?)),
            Register::I if dst.is_indirect() => Ok(reg(0xF055, gp(src)?)),
            Register::I => Ok(addr(0xA000, src.as_immediate()?)),
            r if r.is_general_purpose() => {
                let x = r as u16;
                match src.value() {
                    OperandValue::Immediate(kk) => Ok(reg_imm(0x6000, x, kk)),
                    OperandValue::Register(Register::DT) => Ok(reg(0xF007, x)),
                    OperandValue::Register(Register::I) if src.is_indirect() => {
                        Ok(reg(0xF065, x))
                    }
                    // reading I into a register does not exist
                    OperandValue::Register(Register::I) => {
                        Err(EncodeError::IllegalEncoding(self.kind))
                    }
                    OperandValue::Register(_) => Ok(reg_reg(0x8000, x, gp(src)?)),
                }
            }
            r => Err(EncodeError::IllegalRegister(r)),
        }
    }

    fn encode_add(&self) -> Result<u16, EncodeError> {
        let (dst, src) = (self.slot(self.op1)?, self.slot(self.op2)?);
        if dst.as_register(false)? == Register::I {
            return Ok(reg(0xF01E, gp(src)?));
        }
        let x = gp(dst)?;
        match src.value() {
            OperandValue::Immediate(kk) => Ok(reg_imm(0x7000, x, kk)),
            OperandValue::Register(_) => Ok(reg_reg(0x8004, x, gp(src)?)),
        }
    }
}

fn decode_8(opcode: u16) -> Result<Opcode, DecodeError> {
    let lsn = opcode & 0xF;
    let (x, y) = (x(opcode), y(opcode));
    // shifts only name their source register when the field is set
    let src = Some(y).filter(|&r| r != Register::V0);
    match lsn {
        0x0 => Ok(Opcode::ld_reg(x, y)),
        0x1 => Ok(Opcode::or(x, y)),
        0x2 => Ok(Opcode::and(x, y)),
        0x3 => Ok(Opcode::xor(x, y)),
        0x4 => Ok(Opcode::add_reg(x, y)),
        0x5 => Ok(Opcode::sub(x, y)),
        0x6 => Ok(Opcode::shr(x, src)),
        0x7 => Ok(Opcode::subn(x, y)),
        0xE => Ok(Opcode::shl(x, src)),
        _ => Err(DecodeError::InvalidOpcode(opcode)),
    }
}

fn decode_e(opcode: u16) -> Result<Opcode, DecodeError> {
    let lsb = opcode & 0xFF;
    let x = x(opcode);
    match lsb {
        0x9E => Ok(Opcode::skp(x)),
        0xA1 => Ok(Opcode::sknp(x)),
        _ => Err(DecodeError::InvalidOpcode(opcode)),
    }
}

fn decode_f(opcode: u16) -> Result<Opcode, DecodeError> {
    let lsb = opcode & 0xFF;
    let x = x(opcode);
    match lsb {
        0x07 => Ok(Opcode::load_delay_timer(x)),
        0x15 => Ok(Opcode::set_delay_timer(x)),
        0x18 => Ok(Opcode::set_sound_timer(x)),
        0x1E => Ok(Opcode::add_i(x)),
        0x29 => Ok(Opcode::ld_font(x)),
        0x33 => Ok(Opcode::ld_bcd(x)),
        0x55 => Ok(Opcode::save_regs(x)),
        0x65 => Ok(Opcode::load_regs(x)),
        _ => Err(DecodeError::InvalidOpcode(opcode)),
    }
}

fn shift_source(y: Option<Register>) -> Option<Operand> {
    y.filter(|&r| r != Register::V0).map(Operand::register)
}

/// 4-bit field value of a general purpose register operand.
fn gp(op: Operand) -> Result<u16, EncodeError> {
    Ok(op.as_register(true)? as u16)
}

fn addr(c: u16, a: u16) -> u16 {
    c | (a & 0xFFF)
}

fn reg_imm(c: u16, x: u16, kk: u16) -> u16 {
    c | ((x & 0xF) << 8) | (kk & 0xFF)
}

fn reg_reg(c: u16, x: u16, y: u16) -> u16 {
    c | ((x & 0xF) << 8) | ((y & 0xF) << 4)
}

fn reg_reg_nib(c: u16, x: u16, y: u16, n: u16) -> u16 {
    reg_reg(c, x, y) | (n & 0xF)
}

fn reg(c: u16, x: u16) -> u16 {
    c | ((x & 0xF) << 8)
}

/// Free-function form of [`Opcode::decode`].
pub fn decode(word: u16, big_endian: bool) -> Result<Opcode, DecodeError> {
    Opcode::decode(word, big_endian)
}

/// Free-function form of [`Opcode::encode`].
pub fn encode(opcode: &Opcode, big_endian: bool) -> Result<u16, EncodeError> {
    opcode.encode(big_endian)
}

impl Display for Opcode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        let mut sep = " ";
        if let Some(implicit) = self.kind.implicit_operand() {
            write!(f, "{}{}", sep, implicit)?;
            sep = ", ";
        }
        for o in self.operands() {
            write!(f, "{}{}", sep, o)?;
            sep = ", ";
        }
        Ok(())
    }
}
