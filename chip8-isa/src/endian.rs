/// Conversions between the big-endian order of program memory and the
/// host's native order.
pub trait ByteOrder: Sized {
    /// Unconditional byte swap.
    fn swap(self) -> Self;

    /// Native value to big-endian representation. Identity on big-endian hosts.
    fn to_big_endian(self) -> Self;

    /// Big-endian representation to native value. Identity on big-endian hosts.
    fn from_big_endian(self) -> Self;
}

macro_rules! impl_byte_order {
    ($($t:ty),*) => {
        $(
            impl ByteOrder for $t {
                fn swap(self) -> Self {
                    self.swap_bytes()
                }

                fn to_big_endian(self) -> Self {
                    self.to_be()
                }

                fn from_big_endian(self) -> Self {
                    <$t>::from_be(self)
                }
            }
        )*
    };
}

impl_byte_order!(u16, u32, u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap() {
        assert_eq!(0xABCDu16.swap(), 0xCDAB);
        assert_eq!(0x0102_0304u32.swap(), 0x0403_0201);
        assert_eq!(0x0102_0304_0506_0708u64.swap(), 0x0807_0605_0403_0201);
    }

    #[test]
    fn test_big_endian_memory_layout() {
        let v = 0xABCDu16.to_big_endian();
        assert_eq!(v.to_ne_bytes(), [0xAB, 0xCD]);

        let v = 0x0102_0304u32.to_big_endian();
        assert_eq!(v.to_ne_bytes(), [0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_from_big_endian() {
        let native = u16::from_ne_bytes([0x12, 0x34]);
        assert_eq!(native.from_big_endian(), 0x1234);

        let native = u64::from_ne_bytes([0, 0, 0, 0, 0, 0, 0x12, 0x34]);
        assert_eq!(native.from_big_endian(), 0x1234);
    }
}
