use bytes::BufMut;

use crate::encode::{RLPEncode, encode_length};

/// Encodes a struct as an RLP list, one field at a time.
///
/// ```
/// use ferrite_rlp::structs::Encoder;
///
/// let mut buf = Vec::new();
/// Encoder::new(&mut buf)
///     .encode_field(&1u64)
///     .encode_field("dog")
///     .finish();
/// assert_eq!(buf, vec![0xc5, 0x01, 0x83, b'd', b'o', b'g']);
/// ```
pub struct Encoder<'a> {
    buf: &'a mut dyn BufMut,
    temp_buf: Vec<u8>,
}

impl<'a> Encoder<'a> {
    pub fn new(buf: &'a mut dyn BufMut) -> Self {
        Self {
            buf,
            temp_buf: Vec::new(),
        }
    }

    pub fn encode_field<T: RLPEncode + ?Sized>(mut self, value: &T) -> Self {
        value.encode(&mut self.temp_buf);
        self
    }

    /// Appends an item that is already RLP encoded, such as an embedded trie node.
    pub fn encode_raw(mut self, encoded: &[u8]) -> Self {
        self.temp_buf.put_slice(encoded);
        self
    }

    pub fn finish(self) {
        encode_length(self.temp_buf.len(), self.buf);
        self.buf.put_slice(&self.temp_buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::U256;

    #[test]
    fn encoder_matches_list_encoding() {
        let mut buf = Vec::new();
        Encoder::new(&mut buf)
            .encode_field("cat")
            .encode_field("dog")
            .finish();
        assert_eq!(buf, vec!["cat", "dog"].encode_to_vec());
    }

    #[test]
    fn raw_items_are_not_wrapped() {
        let inner = vec![1u8, 2u8].encode_to_vec();
        let mut buf = Vec::new();
        Encoder::new(&mut buf)
            .encode_field(&U256::from(3))
            .encode_raw(&inner)
            .finish();
        assert_eq!(buf, vec![0xc4, 0x03, 0xc2, 0x01, 0x02]);
    }
}
