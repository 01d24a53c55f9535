use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io;
use std::io::Read;
use std::path::Path;

pub const MEMORY_SIZE: usize = 4096;
pub const RESERVED_SIZE: usize = 512;

/// Address programs are loaded at.
pub const ORIGIN: u16 = RESERVED_SIZE as u16;

/// Largest image that fits in memory after the reserved area.
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - RESERVED_SIZE;

#[derive(Debug)]
pub enum ProgramError {
    Io(io::Error),
    TooLarge(usize),
}

impl Display for ProgramError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgramError::Io(e) => write!(f, "{}", e),
            ProgramError::TooLarge(n) => write!(
                f,
                "program is {} bytes, at most {} fit in memory",
                n, MAX_PROGRAM_SIZE
            ),
        }
    }
}

impl Error for ProgramError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ProgramError::Io(e) => Some(e),
            ProgramError::TooLarge(_) => None,
        }
    }
}

impl From<io::Error> for ProgramError {
    fn from(e: io::Error) -> Self {
        ProgramError::Io(e)
    }
}

/// A program image as it sits in memory, starting at [`ORIGIN`].
#[derive(Debug, Clone, Default)]
pub struct Program {
    bytes: Vec<u8>,
}

impl Program {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProgramError> {
        if bytes.len() > MAX_PROGRAM_SIZE {
            return Err(ProgramError::TooLarge(bytes.len()));
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    pub fn load<P: AsRef<Path>>(p: P) -> Result<Self, ProgramError> {
        let mut r = File::open(p)?;
        let mut bytes = Vec::new();
        r.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// First address past the image.
    pub fn end(&self) -> usize {
        ORIGIN as usize + self.bytes.len()
    }

    pub fn contains(&self, addr: u16) -> bool {
        addr >= ORIGIN && (addr as usize) < self.end()
    }

    /// Reads the big-endian word at `addr`; both bytes must lie in the image.
    pub fn read_u16(&self, addr: u16) -> Option<u16> {
        let offset = (addr as usize).checked_sub(RESERVED_SIZE)?;
        let b = self.bytes.get(offset..offset + 2)?.try_into().ok()?;
        Some(u16::from_be_bytes(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u16_big_endian_works() {
        let p = Program::from_bytes(&[0xAB, 0xCD, 0xEF]).unwrap();
        assert_eq!(p.read_u16(0x200), Some(0xABCD));
        assert_eq!(p.read_u16(0x201), Some(0xCDEF));
    }

    #[test]
    fn test_read_u16_out_of_image() {
        let p = Program::from_bytes(&[0xAB, 0xCD, 0xEF]).unwrap();
        assert_eq!(p.read_u16(0x1FF), None);
        assert_eq!(p.read_u16(0x202), None);
        assert_eq!(p.read_u16(0x000), None);
        assert_eq!(p.read_u16(0xFFFF), None);
    }

    #[test]
    fn test_from_bytes() {
        let p = Program::from_bytes(&[0x00, 0xE0, 0x12]).unwrap();
        assert_eq!(p.as_bytes(), &[0x00, 0xE0, 0x12]);
        assert_eq!(p.len(), 3);
        assert!(!p.is_empty());

        let p = Program::default();
        assert_eq!(p.len(), 0);
        assert!(p.is_empty());
        assert!(p.as_bytes().is_empty());
    }

    #[test]
    fn test_contains() {
        let p = Program::from_bytes(&[0; 4]).unwrap();
        assert!(!p.contains(0x1FF));
        assert!(p.contains(0x200));
        assert!(p.contains(0x203));
        assert!(!p.contains(0x204));
        assert_eq!(p.end(), 0x204);
    }

    #[test]
    fn test_too_large() {
        let bytes = vec![0; MAX_PROGRAM_SIZE + 1];
        assert!(matches!(
            Program::from_bytes(&bytes),
            Err(ProgramError::TooLarge(n)) if n == MAX_PROGRAM_SIZE + 1
        ));
        assert!(Program::from_bytes(&bytes[1..]).is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let r = Program::load("/nonexistent/path/to/rom.ch8");
        assert!(matches!(r, Err(ProgramError::Io(_))));
    }
}
