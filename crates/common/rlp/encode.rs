use bytes::{BufMut, Bytes};
use ethereum_types::{Address, Bloom, H64, H256, U256};

use crate::constants::{RLP_EMPTY_LIST, RLP_NULL};

pub trait RLPEncode {
    fn encode(&self, buf: &mut dyn BufMut);

    fn length(&self) -> usize {
        let mut buf = Vec::new();
        self.encode(&mut buf);
        buf.len()
    }

    fn encode_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode(&mut buf);
        buf
    }
}

/// Writes the header of a list whose items take `payload_len` bytes once encoded.
pub fn encode_length(payload_len: usize, buf: &mut dyn BufMut) {
    write_header(payload_len, RLP_EMPTY_LIST, buf);
}

/// Writes a string or list header. Short payloads fit in the prefix byte itself,
/// longer ones carry their big-endian length right after the prefix.
fn write_header(payload_len: usize, offset: u8, buf: &mut dyn BufMut) {
    if payload_len < 56 {
        // payload_len < 56 so this never truncates
        buf.put_u8(offset + payload_len as u8);
    } else {
        let len_bytes = payload_len.to_be_bytes();
        let start = len_bytes.iter().take_while(|b| **b == 0).count();
        let len_of_len = len_bytes.len() - start;
        buf.put_u8(offset + 55 + len_of_len as u8);
        buf.put_slice(&len_bytes[start..]);
    }
}

fn encode_bytes(value: &[u8], buf: &mut dyn BufMut) {
    match value {
        [single] if *single < RLP_NULL => buf.put_u8(*single),
        _ => {
            write_header(value.len(), RLP_NULL, buf);
            buf.put_slice(value);
        }
    }
}

/// Integers are encoded as their big-endian representation with no leading zeros.
fn encode_integer(be_bytes: &[u8], buf: &mut dyn BufMut) {
    let start = be_bytes.iter().take_while(|b| **b == 0).count();
    encode_bytes(&be_bytes[start..], buf);
}

impl RLPEncode for bool {
    fn encode(&self, buf: &mut dyn BufMut) {
        if *self {
            buf.put_u8(0x01);
        } else {
            buf.put_u8(RLP_NULL);
        }
    }
}

impl RLPEncode for u8 {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_integer(&[*self], buf);
    }
}

impl RLPEncode for u32 {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_integer(&self.to_be_bytes(), buf);
    }
}

impl RLPEncode for u64 {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_integer(&self.to_be_bytes(), buf);
    }
}

impl RLPEncode for usize {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_integer(&self.to_be_bytes(), buf);
    }
}

impl RLPEncode for U256 {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_integer(&self.to_big_endian(), buf);
    }
}

impl RLPEncode for [u8] {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_bytes(self, buf);
    }
}

impl<const N: usize> RLPEncode for [u8; N] {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_bytes(self, buf);
    }
}

impl RLPEncode for Bytes {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_bytes(self, buf);
    }
}

impl RLPEncode for str {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_bytes(self.as_bytes(), buf);
    }
}

impl RLPEncode for Address {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_bytes(self.as_bytes(), buf);
    }
}

impl RLPEncode for H64 {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_bytes(self.as_bytes(), buf);
    }
}

impl RLPEncode for H256 {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_bytes(self.as_bytes(), buf);
    }
}

impl RLPEncode for Bloom {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_bytes(self.as_bytes(), buf);
    }
}

impl<T: RLPEncode> RLPEncode for Vec<T> {
    fn encode(&self, buf: &mut dyn BufMut) {
        if self.is_empty() {
            buf.put_u8(RLP_EMPTY_LIST);
            return;
        }
        let mut payload = Vec::new();
        for item in self {
            item.encode(&mut payload);
        }
        encode_length(payload.len(), buf);
        buf.put_slice(&payload);
    }
}

impl<T: RLPEncode + ?Sized> RLPEncode for &T {
    fn encode(&self, buf: &mut dyn BufMut) {
        (*self).encode(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn can_encode_small_integers() {
        assert_eq!(0u64.encode_to_vec(), vec![RLP_NULL]);
        assert_eq!(15u8.encode_to_vec(), vec![0x0f]);
        assert_eq!(0x80u8.encode_to_vec(), vec![0x81, 0x80]);
        assert_eq!(1024u64.encode_to_vec(), vec![0x82, 0x04, 0x00]);
        assert_eq!(U256::zero().encode_to_vec(), vec![RLP_NULL]);
    }

    #[test]
    fn can_encode_strings() {
        assert_eq!("dog".encode_to_vec(), vec![0x83, b'd', b'o', b'g']);
        assert_eq!("".encode_to_vec(), vec![RLP_NULL]);
        let long = "Lorem ipsum dolor sit amet, consectetur adipisicing elit";
        let encoded = long.encode_to_vec();
        assert_eq!(&encoded[..2], &[0xb8, 0x38]);
        assert_eq!(&encoded[2..], long.as_bytes());
    }

    #[test]
    fn can_encode_lists() {
        let list = vec!["cat", "dog"];
        assert_eq!(
            list.encode_to_vec(),
            hex!("c88363617483646f67").to_vec()
        );
        let empty: Vec<u64> = vec![];
        assert_eq!(empty.encode_to_vec(), vec![RLP_EMPTY_LIST]);
    }

    #[test]
    fn can_encode_fixed_hashes() {
        let address = Address::repeat_byte(0x11);
        let encoded = address.encode_to_vec();
        assert_eq!(encoded.len(), 21);
        assert_eq!(encoded[0], 0x94);
        let bloom = Bloom::zero().encode_to_vec();
        assert_eq!(&bloom[..3], &[0xb9, 0x01, 0x00]);
    }
}
