use crate::register::Register;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OperandError {
    WrongOperandKind,
    IllegalRegister(Register),
}

impl Display for OperandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OperandError::WrongOperandKind => write!(f, "wrong operand kind"),
            OperandError::IllegalRegister(r) => {
                write!(f, "register {} is not general purpose", r)
            }
        }
    }
}

impl Error for OperandError {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OperandValue {
    Register(Register),
    Immediate(u16),
}

/// A single instruction argument.
///
/// `indirect` and `address` only change how the operand is written out,
/// except for an indirect `I` given to `LD`, which picks the register
/// dump/load layouts.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Operand {
    value: OperandValue,
    indirect: bool,
    address: bool,
}

impl Operand {
    pub fn register(reg: Register) -> Self {
        Self {
            value: OperandValue::Register(reg),
            indirect: false,
            address: false,
        }
    }

    pub fn immediate(imm: u16) -> Self {
        Self {
            value: OperandValue::Immediate(imm),
            indirect: false,
            address: false,
        }
    }

    /// An immediate used as a jump or call target.
    pub fn address(addr: u16) -> Self {
        Self {
            value: OperandValue::Immediate(addr),
            indirect: false,
            address: true,
        }
    }

    pub fn indirect(mut self) -> Self {
        self.indirect = true;
        self
    }

    pub fn value(&self) -> OperandValue {
        self.value
    }

    pub fn is_register(&self) -> bool {
        matches!(self.value, OperandValue::Register(_))
    }

    pub fn is_immediate(&self) -> bool {
        matches!(self.value, OperandValue::Immediate(_))
    }

    pub fn is_indirect(&self) -> bool {
        self.indirect
    }

    pub fn is_address(&self) -> bool {
        self.address
    }

    /// Returns the register held by this operand.
    ///
    /// With `only_general_purpose`, anything past `VF` is refused: most
    /// layouts only have a 4-bit register field.
    pub fn as_register(&self, only_general_purpose: bool) -> Result<Register, OperandError> {
        match self.value {
            OperandValue::Register(r) if only_general_purpose && !r.is_general_purpose() => {
                Err(OperandError::IllegalRegister(r))
            }
            OperandValue::Register(r) => Ok(r),
            OperandValue::Immediate(_) => Err(OperandError::WrongOperandKind),
        }
    }

    /// Returns the raw immediate. The value is not range checked.
    pub fn as_immediate(&self) -> Result<u16, OperandError> {
        match self.value {
            OperandValue::Immediate(v) => Ok(v),
            OperandValue::Register(_) => Err(OperandError::WrongOperandKind),
        }
    }
}

impl From<Register> for Operand {
    fn from(reg: Register) -> Self {
        Operand::register(reg)
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.indirect {
            write!(f, "[")?;
        }
        match self.value {
            OperandValue::Register(r) => write!(f, "{}", r)?,
            OperandValue::Immediate(v) if self.address => write!(f, "{:03x}", v)?,
            OperandValue::Immediate(v) => write!(f, "{}", v)?,
        }
        if self.indirect {
            write!(f, "]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::Register::*;

    #[test]
    fn test_as_register() {
        assert_eq!(Operand::register(V3).as_register(true), Ok(V3));
        assert_eq!(Operand::register(I).as_register(false), Ok(I));
        assert_eq!(
            Operand::immediate(3).as_register(false),
            Err(OperandError::WrongOperandKind)
        );
    }

    #[test]
    fn test_as_register_only_general_purpose() {
        for r in [I, DT, ST, PC, SP] {
            assert_eq!(
                Operand::register(r).as_register(true),
                Err(OperandError::IllegalRegister(r))
            );
        }
    }

    #[test]
    fn test_as_immediate() {
        assert_eq!(Operand::immediate(0xFFFF).as_immediate(), Ok(0xFFFF));
        assert_eq!(Operand::address(0x234).as_immediate(), Ok(0x234));
        assert_eq!(
            Operand::register(V0).as_immediate(),
            Err(OperandError::WrongOperandKind)
        );
    }

    #[test]
    fn test_kind() {
        assert!(Operand::register(V1).is_register());
        assert!(!Operand::register(V1).is_immediate());
        assert!(Operand::immediate(1).is_immediate());
        assert!(Operand::address(0x200).is_immediate());
        assert!(!Operand::address(0x200).is_register());
        assert!(Operand::register(I).indirect().is_register());
    }

    #[test]
    fn test_display() {
        let test_cases = [
            (Operand::register(VA), "VA"),
            (Operand::register(I).indirect(), "[I]"),
            (Operand::immediate(12), "12"),
            (Operand::address(0x2a4), "2a4"),
            (Operand::address(0x5), "005"),
            (Operand::address(0xABC), "abc"),
            (Operand::immediate(7).indirect(), "[7]"),
        ];

        for (o, s) in test_cases {
            assert_eq!(o.to_string(), s);
        }
    }
}
