use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use ferrite_crypto::ecdsa::{SECP256K1_N, recover_address, sign_hash, signature_has_high_s};
use ferrite_rlp::{constants::RLP_NULL, encode::RLPEncode, structs::Encoder};
use serde::{Deserialize, Serialize};

use crate::{errors::EcdsaError, types::Fork, utils::keccak};

/// A pre-typed-envelope transaction, the only kind known to proof-of-work chains.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(with = "crate::serde_utils::u64::hex_str")]
    pub nonce: u64,
    pub gas_price: U256,
    #[serde(with = "crate::serde_utils::u64::hex_str")]
    pub gas: u64,
    /// The recipient of the transaction.
    /// Create transactions contain a [`null`](RLP_NULL) value in this field.
    #[serde(default)]
    pub to: TxKind,
    pub value: U256,
    #[serde(with = "crate::serde_utils::bytes")]
    pub data: Bytes,
    pub v: U256,
    pub r: U256,
    pub s: U256,
}

/// The transaction's kind: call or create.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<Address>", into = "Option<Address>")]
pub enum TxKind {
    Call(Address),
    #[default]
    Create,
}

impl From<Option<Address>> for TxKind {
    fn from(value: Option<Address>) -> Self {
        match value {
            Some(address) => TxKind::Call(address),
            None => TxKind::Create,
        }
    }
}

impl From<TxKind> for Option<Address> {
    fn from(value: TxKind) -> Self {
        match value {
            TxKind::Call(address) => Some(address),
            TxKind::Create => None,
        }
    }
}

impl RLPEncode for TxKind {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        match self {
            Self::Call(address) => address.encode(buf),
            Self::Create => buf.put_u8(RLP_NULL),
        }
    }
}

impl RLPEncode for Transaction {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        Encoder::new(buf)
            .encode_field(&self.nonce)
            .encode_field(&self.gas_price)
            .encode_field(&self.gas)
            .encode_field(&self.to)
            .encode_field(&self.value)
            .encode_field(&self.data)
            .encode_field(&self.v)
            .encode_field(&self.r)
            .encode_field(&self.s)
            .finish();
    }
}

impl Transaction {
    pub fn is_create(&self) -> bool {
        matches!(self.to, TxKind::Create)
    }

    pub fn hash(&self) -> H256 {
        keccak(self.encode_to_vec())
    }

    /// Hash covered by the signature. Replay-protected transactions (EIP-155) append
    /// `[chain_id, 0, 0]` to the unsigned fields.
    pub fn signing_hash(&self, chain_id: Option<u64>) -> H256 {
        let mut buf = vec![];
        let encoder = Encoder::new(&mut buf)
            .encode_field(&self.nonce)
            .encode_field(&self.gas_price)
            .encode_field(&self.gas)
            .encode_field(&self.to)
            .encode_field(&self.value)
            .encode_field(&self.data);
        match chain_id {
            None => encoder.finish(),
            Some(chain_id) => encoder
                .encode_field(&chain_id)
                .encode_field(&0u8)
                .encode_field(&0u8)
                .finish(),
        }
        keccak(buf)
    }

    /// The chain id a replay-protected signature commits to, if any.
    pub fn chain_id(&self) -> Option<u64> {
        if self.v < U256::from(35) {
            return None;
        }
        let chain_id = (self.v - 35) / 2;
        (chain_id <= U256::from(u64::MAX)).then(|| chain_id.as_u64())
    }

    /// Recovers the sender, applying the signature rules in force under `fork`.
    ///
    /// `v` must be 27 or 28, or from SpuriousDragon on also `chain_id * 2 + 35` or
    /// `chain_id * 2 + 36`. `r` and `s` must lie in `1..n`, and from Homestead on `s`
    /// must not exceed `n / 2`.
    pub fn sender(&self, chain_id: u64, fork: Fork) -> Result<Address, EcdsaError> {
        let (recovery_id, signed_chain_id) = self.recovery_params(chain_id, fork)?;

        let n = U256::from_big_endian(&SECP256K1_N);
        if self.r.is_zero() || self.r >= n {
            return Err(EcdsaError::InvalidR);
        }
        if self.s.is_zero() || self.s >= n {
            return Err(EcdsaError::InvalidS);
        }
        let s = self.s.to_big_endian();
        if fork >= Fork::Homestead && signature_has_high_s(&s) {
            return Err(EcdsaError::InvalidS);
        }

        let mut signature = [0u8; 65];
        signature[..32].copy_from_slice(&self.r.to_big_endian());
        signature[32..64].copy_from_slice(&s);
        signature[64] = recovery_id;
        let hash = self.signing_hash(signed_chain_id);
        Ok(recover_address(&hash.0, &signature)?)
    }

    fn recovery_params(&self, chain_id: u64, fork: Fork) -> Result<(u8, Option<u64>), EcdsaError> {
        if self.v == U256::from(27) || self.v == U256::from(28) {
            let recovery_id = if self.v == U256::from(27) { 0 } else { 1 };
            return Ok((recovery_id, None));
        }
        if fork >= Fork::SpuriousDragon {
            let base = U256::from(chain_id) * 2 + 35;
            if self.v == base {
                return Ok((0, Some(chain_id)));
            }
            if self.v == base + 1 {
                return Ok((1, Some(chain_id)));
            }
        }
        Err(EcdsaError::InvalidV(self.v))
    }

    /// Signs the transaction in place. With a chain id the signature is replay-protected.
    pub fn sign(mut self, secret_key: &[u8; 32], chain_id: Option<u64>) -> Result<Self, EcdsaError> {
        let hash = self.signing_hash(chain_id);
        let signature = sign_hash(secret_key, &hash.0)?;
        self.r = U256::from_big_endian(&signature[..32]);
        self.s = U256::from_big_endian(&signature[32..64]);
        let parity = u64::from(signature[64]);
        self.v = match chain_id {
            Some(chain_id) => U256::from(chain_id) * 2 + 35 + parity,
            None => U256::from(27 + parity),
        };
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrite_crypto::ecdsa::address_from_secret_key;
    use hex_literal::hex;

    const SECRET: [u8; 32] =
        hex!("45a915e4d060149eb4365960e6a7a45f334393093061116b197e3240065ff2d8");

    fn transfer() -> Transaction {
        Transaction {
            nonce: 0,
            gas_price: U256::from(10),
            gas: 21_000,
            to: TxKind::Call(Address::repeat_byte(0x42)),
            value: U256::from(1_000),
            ..Default::default()
        }
    }

    #[test]
    fn eip155_example_signing_hash() {
        // Example transaction from EIP-155.
        let tx = Transaction {
            nonce: 9,
            gas_price: U256::from(20_000_000_000u64),
            gas: 21_000,
            to: TxKind::Call(Address::from(hex!("3535353535353535353535353535353535353535"))),
            value: U256::from(1_000_000_000_000_000_000u64),
            ..Default::default()
        };
        assert_eq!(
            tx.signing_hash(Some(1)),
            H256(hex!(
                "daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
            ))
        );
    }

    #[test]
    fn unprotected_signature_recovers_in_every_fork() {
        let tx = transfer().sign(&SECRET, None).unwrap();
        let expected = address_from_secret_key(&SECRET).unwrap();
        for fork in [Fork::Frontier, Fork::Homestead, Fork::SpuriousDragon] {
            assert_eq!(tx.sender(1, fork).unwrap(), expected);
        }
        assert_eq!(tx.chain_id(), None);
    }

    #[test]
    fn protected_signature_needs_spurious_dragon() {
        let tx = transfer().sign(&SECRET, Some(1)).unwrap();
        assert_eq!(tx.chain_id(), Some(1));
        assert!(matches!(
            tx.sender(1, Fork::TangerineWhistle),
            Err(EcdsaError::InvalidV(_))
        ));
        assert_eq!(
            tx.sender(1, Fork::SpuriousDragon).unwrap(),
            address_from_secret_key(&SECRET).unwrap()
        );
        // Signed for another chain.
        assert!(tx.sender(61, Fork::SpuriousDragon).is_err());
    }

    #[test]
    fn high_s_rejected_from_homestead() {
        let mut tx = transfer().sign(&SECRET, None).unwrap();
        let n = U256::from_big_endian(&SECP256K1_N);
        // (r, n - s) with the flipped parity is the same signature in its malleable form.
        tx.s = n - tx.s;
        tx.v = if tx.v == U256::from(27) {
            U256::from(28)
        } else {
            U256::from(27)
        };
        assert_eq!(
            tx.sender(1, Fork::Frontier).unwrap(),
            address_from_secret_key(&SECRET).unwrap()
        );
        assert!(matches!(
            tx.sender(1, Fork::Homestead),
            Err(EcdsaError::InvalidS)
        ));
    }

    #[test]
    fn zero_r_is_rejected() {
        let mut tx = transfer().sign(&SECRET, None).unwrap();
        tx.r = U256::zero();
        assert!(matches!(tx.sender(1, Fork::Frontier), Err(EcdsaError::InvalidR)));
    }

    #[test]
    fn create_transactions_serialize_null_recipient() {
        let tx = Transaction::default();
        let json = serde_json::to_value(&tx).unwrap();
        assert!(json["to"].is_null());
        let back: Transaction = serde_json::from_value(json).unwrap();
        assert!(back.is_create());
    }
}
