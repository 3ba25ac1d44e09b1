use ferrite_crypto::keccak::keccak_hash;
use ferrite_rlp::structs::Encoder;

use crate::nibbles::Nibbles;

pub(crate) type Entry<'a> = (&'a Nibbles, &'a [u8]);

/// How a child node is referenced from its parent.
enum NodeRef {
    Empty,
    /// Nodes whose encoding is shorter than a hash are embedded as-is.
    Inline(Vec<u8>),
    Hash([u8; 32]),
}

impl NodeRef {
    fn new(encoded: Option<Vec<u8>>) -> Self {
        match encoded {
            None => NodeRef::Empty,
            Some(encoded) if encoded.len() < 32 => NodeRef::Inline(encoded),
            Some(encoded) => NodeRef::Hash(keccak_hash(&encoded)),
        }
    }

    fn append<'a>(&self, encoder: Encoder<'a>) -> Encoder<'a> {
        match self {
            NodeRef::Empty => encoder.encode_field(&[] as &[u8]),
            NodeRef::Inline(encoded) => encoder.encode_raw(encoded),
            NodeRef::Hash(hash) => encoder.encode_field(hash),
        }
    }
}

/// Builds the RLP encoding of the node holding `entries`, whose keys all agree on their
/// first `level` nibbles. `entries` must be sorted and free of duplicates.
pub(crate) fn encode_node(entries: &[Entry<'_>], level: usize) -> Option<Vec<u8>> {
    let (first_key, first_value) = *entries.first()?;
    let mut buf = Vec::new();

    if entries.len() == 1 {
        Encoder::new(&mut buf)
            .encode_field(
                first_key
                    .encode_compact(level, first_key.len(), true)
                    .as_slice(),
            )
            .encode_field(first_value)
            .finish();
        return Some(buf);
    }

    let prefix_len = entries
        .iter()
        .skip(1)
        .map(|(key, _)| first_key.common_prefix_len(key, level))
        .min()
        .unwrap_or(0);

    if prefix_len > 0 {
        let child = NodeRef::new(encode_node(entries, level + prefix_len));
        let path = first_key.encode_compact(level, level + prefix_len, false);
        let encoder = Encoder::new(&mut buf).encode_field(path.as_slice());
        child.append(encoder).finish();
        return Some(buf);
    }

    let mut branches: [Vec<Entry<'_>>; 16] = Default::default();
    let mut value: &[u8] = &[];
    for &(key, entry_value) in entries {
        match key.at(level) {
            Some(nibble) => branches[usize::from(nibble)].push((key, entry_value)),
            None => value = entry_value,
        }
    }

    let mut encoder = Encoder::new(&mut buf);
    for branch in &branches {
        encoder = NodeRef::new(encode_node(branch, level + 1)).append(encoder);
    }
    encoder.encode_field(value).finish();
    Some(buf)
}
