use bytes::Bytes;
use ethereum_types::{Address, Bloom, BloomInput, H256};
use ferrite_rlp::{encode::RLPEncode, structs::Encoder};
use serde::{Deserialize, Serialize};

/// Receipt layout used before Byzantium: the intermediate state root takes the place of
/// the status code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub post_state: H256,
    #[serde(with = "crate::serde_utils::u64::hex_str")]
    pub cumulative_gas_used: u64,
    pub bloom: Bloom,
    pub logs: Vec<Log>,
}

impl Receipt {
    pub fn new(post_state: H256, cumulative_gas_used: u64, logs: Vec<Log>) -> Self {
        Self {
            post_state,
            cumulative_gas_used,
            bloom: bloom_from_logs(&logs),
            logs,
        }
    }
}

impl RLPEncode for Receipt {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        Encoder::new(buf)
            .encode_field(&self.post_state)
            .encode_field(&self.cumulative_gas_used)
            .encode_field(&self.bloom)
            .encode_field(&self.logs)
            .finish();
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<H256>,
    #[serde(with = "crate::serde_utils::bytes")]
    pub data: Bytes,
}

impl RLPEncode for Log {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        Encoder::new(buf)
            .encode_field(&self.address)
            .encode_field(&self.topics)
            .encode_field(&self.data)
            .finish();
    }
}

/// Folds the emitting address and every topic of each log into a 2048-bit filter.
pub fn bloom_from_logs(logs: &[Log]) -> Bloom {
    let mut bloom = Bloom::zero();
    for log in logs {
        bloom.accrue(BloomInput::Raw(log.address.as_bytes()));
        for topic in &log.topics {
            bloom.accrue(BloomInput::Raw(topic.as_bytes()));
        }
    }
    bloom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bloom_contains_address_and_topics() {
        let log = Log {
            address: Address::repeat_byte(0x0f),
            topics: vec![H256::repeat_byte(0x01)],
            data: Bytes::new(),
        };
        let bloom = bloom_from_logs(std::slice::from_ref(&log));
        assert!(bloom.contains_input(BloomInput::Raw(log.address.as_bytes())));
        assert!(bloom.contains_input(BloomInput::Raw(log.topics[0].as_bytes())));
        assert!(!bloom.contains_input(BloomInput::Raw(H256::repeat_byte(0x02).as_bytes())));
    }

    #[test]
    fn empty_logs_give_empty_bloom() {
        let receipt = Receipt::new(H256::zero(), 21000, vec![]);
        assert_eq!(receipt.bloom, Bloom::zero());
    }
}
