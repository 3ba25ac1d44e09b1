/// Path through the trie, one half-byte per element.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Nibbles(Vec<u8>);

impl Nibbles {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(
            bytes
                .iter()
                .flat_map(|byte| [byte >> 4, byte & 0x0f])
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn at(&self, index: usize) -> Option<u8> {
        self.0.get(index).copied()
    }

    /// Length of the prefix shared with `other` once both are read from `offset`.
    pub fn common_prefix_len(&self, other: &Nibbles, offset: usize) -> usize {
        let lhs = self.0.get(offset..).unwrap_or_default();
        let rhs = other.0.get(offset..).unwrap_or_default();
        lhs.iter().zip(rhs).take_while(|(a, b)| a == b).count()
    }

    /// Hex-prefix encoding of `self[start..end]`.
    ///
    /// The high nibble of the first byte holds the flags: bit 1 marks a leaf, bit 0 an odd
    /// path length. An odd path stores its first nibble in the low half of that same byte.
    pub fn encode_compact(&self, start: usize, end: usize, is_leaf: bool) -> Vec<u8> {
        let path = self.0.get(start..end).unwrap_or_default();
        let leaf_flag = if is_leaf { 0x20 } else { 0x00 };
        let mut compact = Vec::with_capacity(path.len() / 2 + 1);
        let rest = if path.len() % 2 == 1 {
            compact.push(leaf_flag | 0x10 | path[0]);
            &path[1..]
        } else {
            compact.push(leaf_flag);
            path
        };
        compact.extend(rest.chunks(2).map(|pair| (pair[0] << 4) | pair[1]));
        compact
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_bytes_into_nibbles() {
        let nibbles = Nibbles::from_bytes(&[0x12, 0xab]);
        assert_eq!(nibbles.len(), 4);
        assert_eq!(nibbles.at(0), Some(1));
        assert_eq!(nibbles.at(3), Some(0xb));
        assert_eq!(nibbles.at(4), None);
    }

    #[test]
    fn compact_encoding_flags() {
        let nibbles = Nibbles::from_bytes(&[0x12, 0x34, 0x50]);
        // even extension
        assert_eq!(nibbles.encode_compact(0, 4, false), vec![0x00, 0x12, 0x34]);
        // odd extension
        assert_eq!(nibbles.encode_compact(1, 4, false), vec![0x12, 0x34]);
        // even leaf
        assert_eq!(nibbles.encode_compact(2, 6, true), vec![0x20, 0x34, 0x50]);
        // odd leaf
        assert_eq!(nibbles.encode_compact(1, 6, true), vec![0x32, 0x34, 0x50]);
    }

    #[test]
    fn common_prefix_from_offset() {
        let a = Nibbles::from_bytes(&[0x12, 0x34]);
        let b = Nibbles::from_bytes(&[0x12, 0x38]);
        assert_eq!(a.common_prefix_len(&b, 0), 3);
        assert_eq!(a.common_prefix_len(&b, 1), 2);
        assert_eq!(a.common_prefix_len(&b, 3), 0);
    }
}
