use anyhow::anyhow;

/// Builds `try_get_{type}` readers over any [`bytes::Buf`]. The plain `get_*`
/// family panics when the buffer runs dry; these return `Result` instead, so a
/// truncated class file surfaces as an error rather than an abort. All
/// multi-byte getters on `Buf` are big-endian, which is what the class-file
/// format mandates regardless of host byte order.
macro_rules! impl_safebuf {
    ( $($type:ty),* ) => {
        pub trait SafeBuf: bytes::Buf {
            paste::paste! {
                $(
                fn [<try_get_ $type>](&mut self) -> anyhow::Result<$type> {
                    if self.remaining() >= std::mem::size_of::<$type>() {
                        Ok(self.[<get_ $type>]())
                    } else {
                        Err(anyhow!(
                            "out of bytes (needed {}, had {})",
                            std::mem::size_of::<$type>(),
                            self.remaining()
                        ))
                    }
                }
                )*
            }

            fn try_take_bytes(&mut self, count: usize) -> anyhow::Result<Vec<u8>> {
                if self.remaining() < count {
                    return Err(anyhow!(
                        "out of bytes (needed {}, had {})",
                        count,
                        self.remaining()
                    ));
                }

                let mut out = vec![0; count];
                self.copy_to_slice(&mut out);
                Ok(out)
            }
        }

        impl<T: bytes::Buf> SafeBuf for T {}
    }
}

impl_safebuf!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

#[cfg(test)]
mod tests {
    use super::SafeBuf;
    use bytes::Bytes;

    #[test]
    fn it_reads_big_endian() {
        let mut bytes = Bytes::from_static(&[0xCA, 0xFE, 0xBA, 0xBE]);
        assert_eq!(bytes.try_get_u32().unwrap(), 0xCAFEBABE);
    }

    #[test]
    fn it_errors_instead_of_panicking() {
        let mut bytes = Bytes::from_static(&[0x01]);
        assert!(bytes.try_get_u16().is_err());
    }

    #[test]
    fn it_takes_exact_slices() {
        let mut bytes = Bytes::from_static(&[1, 2, 3, 4]);
        assert_eq!(bytes.try_take_bytes(3).unwrap(), vec![1, 2, 3]);
        assert!(bytes.try_take_bytes(2).is_err());
    }
}
