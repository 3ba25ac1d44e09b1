use ferrite::{
    cli::{Options, import_chain_file},
    initializers::{init_blockchain, init_tracing},
    utils::{ChainFile, read_chain_file},
};
use ferrite_blockchain::{
    chain::Chain,
    error::{ChainError, InvalidBlockError},
    fork_rules::ruleset,
};
use ferrite_common::{
    Address, Bloom, Bytes, H64, H256, U256,
    constants::{DEFAULT_OMMERS_HASH, EMPTY_TRIE_HASH},
    types::{Block, BlockBody, BlockHeader, ChainConfig, Fork, Genesis, GenesisAccount},
};
use std::{collections::BTreeMap, io::Write};

const BLOCK_REWARD: u64 = 5_000_000_000_000_000_000;

fn genesis() -> Genesis {
    let mut alloc = BTreeMap::new();
    alloc.insert(
        Address::repeat_byte(0x10),
        GenesisAccount {
            balance: U256::from(1_000_000u64),
            ..Default::default()
        },
    );
    Genesis {
        config: ChainConfig::with_fork_from_genesis(1, Fork::Homestead),
        alloc,
        coinbase: Address::zero(),
        difficulty: U256::from(131_072),
        extra_data: Bytes::new(),
        gas_limit: 3_141_592,
        nonce: H64::zero(),
        mix_hash: H256::zero(),
        timestamp: 0,
        state_root: None,
    }
}

/// An empty block on top of genesis: its only effect is the mining reward.
fn empty_block(genesis: &Genesis) -> Block {
    let mut chain = Chain::from_genesis(genesis).unwrap();
    let parent = chain.head().unwrap().header.clone();
    let miner = Address::repeat_byte(0xc0);
    chain
        .state
        .increase_balance(miner, U256::from(BLOCK_REWARD))
        .unwrap();

    let mut header = BlockHeader {
        parent_hash: parent.hash(),
        ommers_hash: DEFAULT_OMMERS_HASH,
        coinbase: miner,
        state_root: chain.state.state_root(),
        transactions_root: EMPTY_TRIE_HASH,
        receipts_root: EMPTY_TRIE_HASH,
        logs_bloom: Bloom::zero(),
        number: 1,
        gas_limit: parent.gas_limit,
        timestamp: 15,
        ..Default::default()
    };
    header.difficulty = ruleset(Fork::Homestead).calculate_difficulty(&header, &parent);
    Block::new(header, BlockBody::default())
}

fn write_chain_file(chain_file: &ChainFile) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&serde_json::to_vec(chain_file).unwrap())
        .unwrap();
    file
}

#[test]
fn imports_chain_file() {
    let genesis = genesis();
    let block = empty_block(&genesis);
    let expected_root = block.header.state_root;
    let expected_head = block.hash();
    let file = write_chain_file(&ChainFile {
        genesis,
        blocks: vec![block],
    });

    let blockchain = init_blockchain(true, false).unwrap();
    let chain = import_chain_file(file.path(), &blockchain).unwrap();
    assert_eq!(chain.state.state_root(), expected_root);
    assert_eq!(chain.head().unwrap().hash(), expected_head);
}

#[test]
fn stops_at_invalid_block() {
    let genesis = genesis();
    let mut block = empty_block(&genesis);
    block.header.state_root = H256::repeat_byte(0x01);
    let file = write_chain_file(&ChainFile {
        genesis,
        blocks: vec![block],
    });

    let blockchain = init_blockchain(true, false).unwrap();
    let error = import_chain_file(file.path(), &blockchain).unwrap_err();
    assert!(matches!(
        error.downcast_ref::<ChainError>(),
        Some(ChainError::InvalidBlock(InvalidBlockError::StateRootMismatch))
    ));
}

#[test]
fn genesis_only_chain_file() {
    let json = r#"{
        "genesis": {
            "config": { "chainId": 1, "homesteadBlock": 0 },
            "alloc": {},
            "difficulty": "0x20000",
            "gasLimit": "0x2fefd8"
        }
    }"#;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let chain_file = read_chain_file(file.path()).unwrap();
    assert!(chain_file.blocks.is_empty());

    let blockchain = init_blockchain(true, false).unwrap();
    let chain = import_chain_file(file.path(), &blockchain).unwrap();
    assert_eq!(chain.state.state_root(), EMPTY_TRIE_HASH);
    assert_eq!(chain.head().unwrap().header.number, 0);
}

#[test]
fn seal_verification_needs_an_engine() {
    assert!(init_blockchain(false, false).is_err());
}

#[test]
fn tracing_initializes_more_than_once() {
    let opts = Options::default();
    init_tracing(&opts);
    // The second subscriber is refused and the first one stays in place.
    init_tracing(&opts);
    assert!(tracing::dispatcher::has_been_set());
}
