use std::fmt::{self, Display, Formatter};

const BYTES_PER_ROW: usize = 8;

/// Renders bytes as rows of eight hex octets, each row prefixed with the
/// offset of its first byte.
///
/// ```text
/// [0000] 00 09 00 01 00 00 00 2a
/// [0008] 61 5f 3a 10
/// ```
pub struct HexDump<'a>(pub &'a [u8]);

impl Display for HexDump<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (row, chunk) in self.0.chunks(BYTES_PER_ROW).enumerate() {
            if row > 0 {
                f.write_str("\n")?;
            }

            write!(f, "[{:04x}]", row * BYTES_PER_ROW)?;
            for b in chunk {
                write!(f, " {b:02x}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows() {
        let data = (0u8..20).collect::<Vec<_>>();
        let got = HexDump(&data).to_string();

        assert_eq!(
            got,
            "[0000] 00 01 02 03 04 05 06 07\n\
             [0008] 08 09 0a 0b 0c 0d 0e 0f\n\
             [0010] 10 11 12 13"
        );
    }

    #[test]
    fn empty() {
        assert_eq!(HexDump(&[]).to_string(), "");
    }
}
