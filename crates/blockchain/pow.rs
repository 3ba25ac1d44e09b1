use crate::error::{ChainError, InvalidBlockError};
use ferrite_common::{H64, H256, U256, U512, types::BlockHeader};

/// Seal verification for proof-of-work headers.
///
/// Implementors only provide `hashimoto`; dataset and cache generation for the epoch of
/// `block_number` lives behind it.
pub trait ProofOfWork: Send + Sync {
    /// Returns `(mix_digest, result)` for the header hash without its seal fields.
    fn hashimoto(
        &self,
        seal_hash: H256,
        nonce: H64,
        block_number: u64,
    ) -> Result<(H256, H256), ChainError>;

    fn verify(&self, header: &BlockHeader) -> Result<(), ChainError> {
        let (mix_digest, result) = self.hashimoto(header.seal_hash(), header.nonce, header.number)?;
        if mix_digest != header.mix_hash {
            return Err(InvalidBlockError::MixDigestMismatch.into());
        }
        if !meets_target(result, header.difficulty) {
            return Err(InvalidBlockError::InvalidProofOfWork.into());
        }
        Ok(())
    }
}

/// Accepts every seal. Used for chains whose headers were never mined.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProofOfWork;

impl ProofOfWork for NoProofOfWork {
    fn hashimoto(&self, _: H256, _: H64, _: u64) -> Result<(H256, H256), ChainError> {
        Err(ChainError::Custom(
            "NoProofOfWork does not compute hashimoto".to_string(),
        ))
    }

    fn verify(&self, _header: &BlockHeader) -> Result<(), ChainError> {
        Ok(())
    }
}

/// `result <= 2^256 / difficulty`, evaluated without truncating the bound.
pub fn meets_target(result: H256, difficulty: U256) -> bool {
    if difficulty.is_zero() {
        return false;
    }
    let two_pow_256 = U512::from(U256::MAX).saturating_add(U512::one());
    let target = two_pow_256 / U512::from(difficulty);
    U512::from_big_endian(result.as_bytes()) <= target
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSeal {
        mix_digest: H256,
        result: H256,
    }

    impl ProofOfWork for FixedSeal {
        fn hashimoto(&self, _: H256, _: H64, _: u64) -> Result<(H256, H256), ChainError> {
            Ok((self.mix_digest, self.result))
        }
    }

    fn header(difficulty: u64) -> BlockHeader {
        BlockHeader {
            difficulty: U256::from(difficulty),
            mix_hash: H256::repeat_byte(0x11),
            ..Default::default()
        }
    }

    #[test]
    fn target_bound_is_inclusive() {
        // 2^256 / 2^255 = 2
        let difficulty = U256::one() << 255;
        let two = H256::from_low_u64_be(2);
        let three = H256::from_low_u64_be(3);
        assert!(meets_target(two, difficulty));
        assert!(!meets_target(three, difficulty));
        // Difficulty one accepts every result.
        assert!(meets_target(H256::repeat_byte(0xff), U256::one()));
        assert!(!meets_target(H256::zero(), U256::zero()));
    }

    #[test]
    fn verify_checks_mix_digest_then_target() {
        let good = FixedSeal {
            mix_digest: H256::repeat_byte(0x11),
            result: H256::zero(),
        };
        assert!(good.verify(&header(131_072)).is_ok());

        let wrong_mix = FixedSeal {
            mix_digest: H256::repeat_byte(0x22),
            result: H256::zero(),
        };
        assert!(matches!(
            wrong_mix.verify(&header(131_072)),
            Err(ChainError::InvalidBlock(InvalidBlockError::MixDigestMismatch))
        ));

        let above_target = FixedSeal {
            mix_digest: H256::repeat_byte(0x11),
            result: H256::repeat_byte(0xff),
        };
        assert!(matches!(
            above_target.verify(&header(131_072)),
            Err(ChainError::InvalidBlock(InvalidBlockError::InvalidProofOfWork))
        ));
    }

    #[test]
    fn no_proof_of_work_accepts_anything() {
        assert!(NoProofOfWork.verify(&header(131_072)).is_ok());
    }
}
