pub mod config;
pub mod endian;
pub mod listing;
pub mod opcode;
pub mod operand;
pub mod program;
pub mod register;
pub mod trace;

pub use crate::opcode::{decode, encode, DecodeError, EncodeError, Opcode, OpcodeType};
pub use crate::operand::{Operand, OperandError, OperandValue};
pub use crate::register::Register;
