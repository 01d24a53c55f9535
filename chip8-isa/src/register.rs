use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Every register an instruction can name.
///
/// The general purpose registers come first and their discriminants are the
/// 4-bit values used in the `x`/`y` fields, so `reg <= VF` is the general
/// purpose check.
#[derive(Copy, Clone, Debug, FromPrimitive, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Register {
    V0 = 0x0,
    V1 = 0x1,
    V2 = 0x2,
    V3 = 0x3,
    V4 = 0x4,
    V5 = 0x5,
    V6 = 0x6,
    V7 = 0x7,
    V8 = 0x8,
    V9 = 0x9,
    VA = 0xa,
    VB = 0xb,
    VC = 0xc,
    VD = 0xd,
    VE = 0xe,
    VF = 0xf,
    /// Index register
    I,
    /// Program counter, never an operand
    PC,
    /// Stack pointer, never an operand
    SP,
    /// Sound timer
    ST,
    /// Delay timer
    DT,
}

impl Register {
    pub fn from_nibble(n: u16) -> Register {
        // every 4-bit value is a general purpose register
        Register::from_u16(n & 0xF).unwrap_or(Register::V0)
    }

    pub fn nibble(self) -> Option<u16> {
        if self.is_general_purpose() {
            Some(self as u16)
        } else {
            None
        }
    }

    pub fn is_general_purpose(self) -> bool {
        self <= Register::VF
    }
}

impl Display for Register {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Register::I => write!(f, "I"),
            Register::DT => write!(f, "DT"),
            Register::ST => write!(f, "ST"),
            Register::PC => write!(f, "<PC>"),
            Register::SP => write!(f, "<SP>"),
            r => write!(f, "V{:X}", *r as u8),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseRegisterError(String);

impl Display for ParseRegisterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown register: '{}'", self.0)
    }
}

impl Error for ParseRegisterError {}

impl FromStr for Register {
    type Err = ParseRegisterError;

    /// Parses the names usable in source text; `PC` and `SP` are not.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        match upper.as_str() {
            "I" => Ok(Register::I),
            "DT" => Ok(Register::DT),
            "ST" => Ok(Register::ST),
            name => match name.strip_prefix('V') {
                Some(d) if d.len() == 1 => u16::from_str_radix(d, 16)
                    .map(Register::from_nibble)
                    .map_err(|_| ParseRegisterError(s.to_owned())),
                _ => Err(ParseRegisterError(s.to_owned())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::Register::*;

    #[test]
    fn test_general_purpose_ordering() {
        assert!(V0.is_general_purpose());
        assert!(VF.is_general_purpose());
        for r in [I, PC, SP, ST, DT] {
            assert!(!r.is_general_purpose());
            assert_eq!(r.nibble(), None);
        }
    }

    #[test]
    fn test_nibble() {
        for n in 0..16 {
            assert_eq!(Register::from_nibble(n).nibble(), Some(n));
        }
        assert_eq!(Register::from_nibble(0x1A), VA);
    }

    #[test]
    fn test_display() {
        let test_cases = [
            (V0, "V0"),
            (V9, "V9"),
            (VA, "VA"),
            (VF, "VF"),
            (I, "I"),
            (DT, "DT"),
            (ST, "ST"),
            (PC, "<PC>"),
            (SP, "<SP>"),
        ];

        for (r, s) in test_cases {
            assert_eq!(r.to_string(), s);
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("v3".parse::<Register>(), Ok(V3));
        assert_eq!("VE".parse::<Register>(), Ok(VE));
        assert_eq!("i".parse::<Register>(), Ok(I));
        assert_eq!("Dt".parse::<Register>(), Ok(DT));
        assert_eq!("ST".parse::<Register>(), Ok(ST));
        assert!("PC".parse::<Register>().is_err());
        assert!("SP".parse::<Register>().is_err());
        assert!("VG".parse::<Register>().is_err());
        assert!("V10".parse::<Register>().is_err());
    }
}
