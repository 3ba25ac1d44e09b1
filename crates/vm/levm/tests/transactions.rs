//! Whole-transaction scenarios run through `VM::execute`.

use bytes::Bytes;
use ferrite_common::{
    Address, U256,
    evm::calculate_create_address,
    types::{Fork, Transaction, TxKind},
};
use ferrite_levm::{
    EVMConfig, Environment,
    account::AccountInfo,
    call_frame::CallFrame,
    constants::{IDENTITY_ADDRESS, RIPEMD_160_ADDRESS, STACK_DEPTH_LIMIT},
    db::WorldState,
    errors::{ContextResult, ExceptionalHalt, TxResult, TxValidationError, VMError},
    vm::VM,
};

const SENDER: u64 = 0x100;
const CONTRACT: u64 = 0x42;
const COINBASE: u64 = 0xc0;

fn sender() -> Address {
    Address::from_low_u64_be(SENDER)
}

fn coinbase() -> Address {
    Address::from_low_u64_be(COINBASE)
}

fn env(fork: Fork, gas_price: u64) -> Environment {
    Environment {
        origin: sender(),
        config: EVMConfig::new(fork),
        coinbase: coinbase(),
        block_gas_limit: 10_000_000,
        gas_price: U256::from(gas_price),
        ..Default::default()
    }
}

fn tx(to: TxKind, gas: u64, gas_price: u64, value: u64, data: Vec<u8>) -> Transaction {
    Transaction {
        nonce: 0,
        gas_price: U256::from(gas_price),
        gas,
        to,
        value: U256::from(value),
        data: Bytes::from(data),
        ..Default::default()
    }
}

fn funded_db(balance: u64) -> WorldState {
    let mut db = WorldState::new();
    db.insert_account(
        sender(),
        AccountInfo::new(U256::from(balance), 0, Bytes::new()),
        [],
    );
    db
}

fn deploy(db: &mut WorldState, address: Address, balance: u64, code: Vec<u8>) {
    db.insert_account(
        address,
        AccountInfo::new(U256::from(balance), 0, Bytes::from(code)),
        [],
    );
}

#[test]
fn value_transfer_settles_sender_recipient_and_miner() {
    let recipient = Address::from_low_u64_be(0xbeef);
    let mut db = funded_db(1_000_000);
    let tx = tx(TxKind::Call(recipient), 21_000, 1, 100, vec![]);

    let report = VM::new(env(Fork::Frontier, 1), &mut db, &tx)
        .execute()
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.gas_used, 21_000);
    assert_eq!(report.gas_left, 0);
    assert_eq!(report.gas_refunded, 0);

    let sender = db.get_account(sender());
    assert_eq!(sender.nonce, 1);
    assert_eq!(sender.balance, U256::from(1_000_000 - 21_000 - 100));
    assert_eq!(db.get_account(recipient).balance, U256::from(100));
    assert_eq!(db.get_account(coinbase()).balance, U256::from(21_000));
    assert_eq!(db.checkpoint_depth(), 0);
}

#[test]
fn intrinsic_gas_too_low_leaves_state_untouched() {
    let mut db = funded_db(1_000_000);
    let before = db.state_root();
    let tx = tx(TxKind::Call(Address::from_low_u64_be(1)), 20_999, 1, 0, vec![]);

    let result = VM::new(env(Fork::Frontier, 1), &mut db, &tx).execute();

    assert_eq!(
        result,
        Err(VMError::TxValidation(TxValidationError::IntrinsicGasTooLow {
            intrinsic: 21_000,
            gas_limit: 20_999,
        }))
    );
    assert_eq!(db.state_root(), before);
    assert_eq!(db.get_account(sender()).nonce, 0);
}

#[test]
fn nonce_mismatch_is_rejected() {
    let mut db = funded_db(1_000_000);
    let mut tx = tx(TxKind::Call(Address::from_low_u64_be(1)), 21_000, 1, 0, vec![]);
    tx.nonce = 3;

    let result = VM::new(env(Fork::Homestead, 1), &mut db, &tx).execute();

    assert_eq!(
        result,
        Err(VMError::TxValidation(TxValidationError::NonceMismatch {
            expected: 0,
            actual: 3,
        }))
    );
}

#[test]
fn upfront_cost_includes_value() {
    let mut db = funded_db(21_000);
    let tx = tx(TxKind::Call(Address::from_low_u64_be(1)), 21_000, 1, 1, vec![]);

    let result = VM::new(env(Fork::Frontier, 1), &mut db, &tx).execute();

    assert_eq!(
        result,
        Err(VMError::TxValidation(
            TxValidationError::InsufficientAccountFunds
        ))
    );
}

#[test]
fn selfdestruct_removes_contract_and_refunds() {
    let contract = Address::from_low_u64_be(CONTRACT);
    let beneficiary = Address::from_low_u64_be(0xbe);
    let mut db = funded_db(1_000_000);

    // PUSH20 beneficiary, SELFDESTRUCT
    let mut code = vec![0x73];
    code.extend_from_slice(beneficiary.as_bytes());
    code.push(0xff);
    deploy(&mut db, contract, 500, code);

    let tx = tx(TxKind::Call(contract), 100_000, 1, 0, vec![]);
    let report = VM::new(env(Fork::Frontier, 1), &mut db, &tx)
        .execute()
        .unwrap();

    // 21000 intrinsic + 3 for PUSH20; SELFDESTRUCT is free in Frontier.
    let gross = 21_003;
    assert!(report.is_success());
    assert_eq!(report.gas_refunded, gross / 2);
    assert_eq!(report.gas_used, gross - gross / 2);
    assert_eq!(report.gas_left, 100_000 - gross);
    assert_eq!(
        report.gas_used + report.gas_left + report.gas_refunded,
        tx.gas
    );

    assert!(!db.account_exists(contract));
    assert_eq!(db.get_account(beneficiary).balance, U256::from(500));
    assert_eq!(
        db.get_account(sender()).balance,
        U256::from(1_000_000 - report.gas_used)
    );
}

/// `CALL`s `callee` with 30000 gas, then stores the success flag at slot 0 and 1 at slot 1.
fn caller_code(callee: Address) -> Vec<u8> {
    let mut code = vec![
        0x60, 0x00, // retSize
        0x60, 0x00, // retOffset
        0x60, 0x00, // argsSize
        0x60, 0x00, // argsOffset
        0x60, 0x00, // value
        0x73, // PUSH20 callee
    ];
    code.extend_from_slice(callee.as_bytes());
    code.extend_from_slice(&[
        0x61, 0x75, 0x30, // PUSH2 30000
        0xf1, // CALL
        0x60, 0x00, 0x55, // SSTORE(0, success)
        0x60, 0x01, 0x60, 0x01, 0x55, // SSTORE(1, 1)
        0x00, // STOP
    ]);
    code
}

#[test]
fn erred_child_is_rolled_back_and_parent_continues() {
    let parent = Address::from_low_u64_be(CONTRACT);
    let child = Address::from_low_u64_be(0x43);
    let mut db = funded_db(10_000_000);
    deploy(&mut db, parent, 0, caller_code(child));
    // SSTORE(0, 7), INVALID
    deploy(&mut db, child, 0, vec![0x60, 0x07, 0x60, 0x00, 0x55, 0xfe]);

    let tx = tx(TxKind::Call(parent), 200_000, 1, 0, vec![]);
    let report = VM::new(env(Fork::Frontier, 1), &mut db, &tx)
        .execute()
        .unwrap();

    assert!(report.is_success());
    assert_eq!(db.get_storage(parent, U256::zero()), U256::zero());
    assert_eq!(db.get_storage(parent, U256::one()), U256::one());
    assert_eq!(db.get_storage(child, U256::zero()), U256::zero());
}

#[test]
fn successful_child_commits_into_parent() {
    let parent = Address::from_low_u64_be(CONTRACT);
    let child = Address::from_low_u64_be(0x43);
    let mut db = funded_db(10_000_000);
    deploy(&mut db, parent, 0, caller_code(child));
    // SSTORE(0, 7), STOP
    deploy(&mut db, child, 0, vec![0x60, 0x07, 0x60, 0x00, 0x55, 0x00]);

    let tx = tx(TxKind::Call(parent), 200_000, 1, 0, vec![]);
    let report = VM::new(env(Fork::Frontier, 1), &mut db, &tx)
        .execute()
        .unwrap();

    assert!(report.is_success());
    assert_eq!(db.get_storage(parent, U256::zero()), U256::one());
    assert_eq!(db.get_storage(child, U256::zero()), U256::from(7));
}

// PUSH1 1, PUSH1 0, RETURN: returns one zero byte for 9 gas.
const RETURN_ONE_BYTE: [u8; 5] = [0x60, 0x01, 0x60, 0x00, 0xf3];

#[test]
fn frontier_creation_survives_unpaid_code_deposit() {
    let mut db = funded_db(10_000_000);
    // Intrinsic: 21000 + 4 non-zero bytes * 68 + 1 zero byte * 4, no creation surcharge.
    let intrinsic = 21_276;
    let tx = tx(TxKind::Create, intrinsic + 100, 1, 0, RETURN_ONE_BYTE.to_vec());

    let report = VM::new(env(Fork::Frontier, 1), &mut db, &tx)
        .execute()
        .unwrap();

    let created = calculate_create_address(sender(), 0);
    assert!(report.is_success());
    assert_eq!(report.gas_used, intrinsic + 9);
    assert!(db.account_exists(created));
    assert!(!db.get_account(created).has_code());
}

#[test]
fn homestead_creation_fails_on_unpaid_code_deposit() {
    let mut db = funded_db(10_000_000);
    let intrinsic = 21_276 + 32_000;
    let tx = tx(TxKind::Create, intrinsic + 100, 1, 0, RETURN_ONE_BYTE.to_vec());

    let report = VM::new(env(Fork::Homestead, 1), &mut db, &tx)
        .execute()
        .unwrap();

    assert_eq!(
        report.result,
        TxResult::Revert(ExceptionalHalt::OutOfGas.into())
    );
    assert_eq!(report.gas_used, tx.gas);
    assert!(!db.account_exists(calculate_create_address(sender(), 0)));
    // The nonce bump survives the failed creation.
    assert_eq!(db.get_account(sender()).nonce, 1);
}

#[test]
fn spurious_dragon_rejects_oversized_code() {
    let mut db = funded_db(10_000_000);
    // PUSH2 0x6001, PUSH1 0, RETURN
    let init_code = vec![0x61, 0x60, 0x01, 0x60, 0x00, 0xf3];
    let tx = tx(TxKind::Create, 200_000, 1, 0, init_code);

    let report = VM::new(env(Fork::SpuriousDragon, 1), &mut db, &tx)
        .execute()
        .unwrap();

    assert_eq!(
        report.result,
        TxResult::Revert(ExceptionalHalt::ContractOutputTooBig.into())
    );
    assert_eq!(report.gas_used, 200_000);
    assert!(!db.account_exists(calculate_create_address(sender(), 0)));
    assert_eq!(db.get_account(sender()).nonce, 1);
}

#[test]
fn spurious_dragon_creation_starts_with_nonce_one() {
    let mut db = funded_db(10_000_000);
    let tx = tx(TxKind::Create, 200_000, 1, 0, RETURN_ONE_BYTE.to_vec());

    let report = VM::new(env(Fork::SpuriousDragon, 1), &mut db, &tx)
        .execute()
        .unwrap();

    let created = db.get_account(calculate_create_address(sender(), 0));
    assert!(report.is_success());
    assert_eq!(created.nonce, 1);
    assert_eq!(created.code, Bytes::from_static(&[0x00]));
}

#[test]
fn touched_empty_accounts_are_removed_from_spurious_dragon() {
    let target = Address::from_low_u64_be(0xdead);

    let mut frontier_db = funded_db(1_000_000);
    let call = tx(TxKind::Call(target), 21_000, 0, 0, vec![]);
    VM::new(env(Fork::Frontier, 0), &mut frontier_db, &call)
        .execute()
        .unwrap();
    assert!(frontier_db.account_exists(target));
    // A zero fee still creates the coinbase before SpuriousDragon.
    assert!(frontier_db.account_exists(coinbase()));

    let mut db = funded_db(1_000_000);
    VM::new(env(Fork::SpuriousDragon, 0), &mut db, &call)
        .execute()
        .unwrap();
    assert!(!db.account_exists(target));
    assert!(!db.account_exists(coinbase()));
}

#[test]
fn existing_empty_coinbase_is_destroyed_on_zero_fee() {
    let mut db = funded_db(1_000_000);
    db.insert_account(coinbase(), AccountInfo::default(), []);
    let call = tx(TxKind::Call(Address::from_low_u64_be(0xdead)), 21_000, 0, 0, vec![]);

    VM::new(env(Fork::SpuriousDragon, 0), &mut db, &call)
        .execute()
        .unwrap();

    assert!(!db.account_exists(coinbase()));
}

// ISZERO, PUSH1 0, SSTORE, GAS, PUSH1 1, SSTORE, STOP: slot 0 is 1 when the preceding
// CALL or CREATE failed, slot 1 holds the gas left right after recording it.
const RECORD_OUTCOME: [u8; 9] = [0x15, 0x60, 0x00, 0x55, 0x5a, 0x60, 0x01, 0x55, 0x00];

/// `CALL`s `callee` with `gas` and `value`, then runs [`RECORD_OUTCOME`]. Costs 21 gas
/// before the CALL itself.
fn call_and_record(callee: Address, gas: u16, value: u8) -> Vec<u8> {
    let mut code = vec![
        0x60, 0x00, // retSize
        0x60, 0x00, // retOffset
        0x60, 0x00, // argsSize
        0x60, 0x00, // argsOffset
        0x60, value, // value
        0x73, // PUSH20 callee
    ];
    code.extend_from_slice(callee.as_bytes());
    code.push(0x61); // PUSH2 gas
    code.extend_from_slice(&gas.to_be_bytes());
    code.push(0xf1); // CALL
    code.extend_from_slice(&RECORD_OUTCOME);
    code
}

/// `CREATE(value, 0, 0)`, then runs [`RECORD_OUTCOME`]. Costs 9 gas before the CREATE.
fn create_and_record(value: u8) -> Vec<u8> {
    let mut code = vec![
        0x60, 0x00, // size
        0x60, 0x00, // offset
        0x60, value, // value
        0xf0, // CREATE
    ];
    code.extend_from_slice(&RECORD_OUTCOME);
    code
}

/// Runs `code` as the contract in a frame that is already at the maximum call depth.
fn run_at_max_depth(db: &mut WorldState, code: Vec<u8>, gas: u64) -> ContextResult {
    let contract = Address::from_low_u64_be(CONTRACT);
    deploy(db, contract, 1_000, code.clone());
    let tx = tx(TxKind::Call(contract), gas, 1, 0, vec![]);
    let mut vm = VM::new(env(Fork::Homestead, 1), db, &tx);
    vm.current_call_frame = CallFrame {
        msg_sender: sender(),
        to: contract,
        code_address: contract,
        bytecode: Bytes::from(code),
        gas_limit: gas,
        gas_remaining: gas,
        depth: STACK_DEPTH_LIMIT,
        ..Default::default()
    };
    assert!(vm.enter_frame().unwrap().is_none());
    vm.run_execution().unwrap()
}

#[test]
fn call_past_depth_limit_fails_and_returns_gas() {
    let contract = Address::from_low_u64_be(CONTRACT);
    let callee = Address::from_low_u64_be(0x43);
    let mut db = funded_db(0);
    deploy(&mut db, callee, 0, vec![0x00]);

    let result = run_at_max_depth(&mut db, call_and_record(callee, 10_000, 0), 100_000);

    // 21 + 40 for the CALL, whose 10000 forwarded gas comes back, + 3 + 3 + 20000 + 2.
    assert!(result.is_success());
    assert_eq!(db.get_storage(contract, U256::zero()), U256::one());
    assert_eq!(db.get_storage(contract, U256::one()), U256::from(79_931));
    assert_eq!(result.gas_used, 40_072);
}

#[test]
fn create_past_depth_limit_fails_and_returns_gas() {
    let contract = Address::from_low_u64_be(CONTRACT);
    let mut db = funded_db(0);

    let result = run_at_max_depth(&mut db, create_and_record(0), 100_000);

    // 9 + 32000, the reserved remainder comes back, + 3 + 3 + 20000 + 2.
    assert!(result.is_success());
    assert_eq!(db.get_storage(contract, U256::zero()), U256::one());
    assert_eq!(db.get_storage(contract, U256::one()), U256::from(47_983));
    assert_eq!(result.gas_used, 72_020);
    assert_eq!(db.get_account(contract).nonce, 0);
    assert!(!db.account_exists(calculate_create_address(contract, 0)));
}

#[test]
fn colliding_create_bumps_nonce_and_loses_reserved_gas() {
    let contract = Address::from_low_u64_be(CONTRACT);
    let taken = calculate_create_address(contract, 0);
    let mut db = funded_db(10_000_000);
    db.insert_account(taken, AccountInfo::new(U256::zero(), 1, Bytes::new()), []);
    // CREATE(0, 0, 0), ISZERO, SSTORE(0, failed), STOP
    deploy(
        &mut db,
        contract,
        0,
        vec![0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0xf0, 0x15, 0x60, 0x00, 0x55, 0x00],
    );

    let tx = tx(TxKind::Call(contract), 2_000_000, 1, 0, vec![]);
    let report = VM::new(env(Fork::TangerineWhistle, 1), &mut db, &tx)
        .execute()
        .unwrap();

    // 1979000 message gas - 32009 leaves 1946991; all but 30421 of it is reserved and lost.
    assert!(report.is_success());
    assert_eq!(report.gas_left, 30_421 - 20_006);
    assert_eq!(report.gas_used, 1_989_585);
    assert_eq!(db.get_storage(contract, U256::zero()), U256::one());
    assert_eq!(db.get_account(contract).nonce, 1);
    assert_eq!(db.get_account(taken).nonce, 1);
    assert!(!db.account_exists(calculate_create_address(contract, 1)));
}

#[test]
fn colliding_create_leaves_nothing_before_tangerine_whistle() {
    let contract = Address::from_low_u64_be(CONTRACT);
    let mut db = funded_db(10_000_000);
    db.insert_account(
        calculate_create_address(contract, 0),
        AccountInfo::new(U256::zero(), 1, Bytes::new()),
        [],
    );
    deploy(
        &mut db,
        contract,
        0,
        vec![0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0xf0, 0x15, 0x60, 0x00, 0x55, 0x00],
    );

    let tx = tx(TxKind::Call(contract), 100_000, 1, 0, vec![]);
    let report = VM::new(env(Fork::Homestead, 1), &mut db, &tx)
        .execute()
        .unwrap();

    // CREATE reserved every remaining unit, so the ISZERO after it runs out of gas.
    assert_eq!(
        report.result,
        TxResult::Revert(ExceptionalHalt::OutOfGas.into())
    );
    assert_eq!(report.gas_used, 100_000);
    assert_eq!(db.get_account(contract).nonce, 0);
}

#[test]
fn unfunded_create_fails_without_bumping_nonce() {
    let contract = Address::from_low_u64_be(CONTRACT);
    let mut db = funded_db(10_000_000);
    deploy(&mut db, contract, 0, create_and_record(1));

    let tx = tx(TxKind::Call(contract), 200_000, 1, 0, vec![]);
    let report = VM::new(env(Fork::Homestead, 1), &mut db, &tx)
        .execute()
        .unwrap();

    // 179000 - 9 - 32000 = 146991 reserved and given back, then 20008 to record it.
    assert!(report.is_success());
    assert_eq!(db.get_storage(contract, U256::zero()), U256::one());
    assert_eq!(db.get_storage(contract, U256::one()), U256::from(126_983));
    assert_eq!(report.gas_used, 21_000 + 72_020);
    assert_eq!(db.get_account(contract).nonce, 0);
    assert!(!db.account_exists(calculate_create_address(contract, 0)));
}

#[test]
fn create_from_max_nonce_fails_without_bumping_nonce() {
    let contract = Address::from_low_u64_be(CONTRACT);
    let mut db = funded_db(10_000_000);
    db.insert_account(
        contract,
        AccountInfo::new(U256::zero(), u64::MAX, Bytes::from(create_and_record(0))),
        [],
    );

    let tx = tx(TxKind::Call(contract), 200_000, 1, 0, vec![]);
    let report = VM::new(env(Fork::Homestead, 1), &mut db, &tx)
        .execute()
        .unwrap();

    assert!(report.is_success());
    assert_eq!(db.get_storage(contract, U256::zero()), U256::one());
    assert_eq!(db.get_storage(contract, U256::one()), U256::from(126_983));
    assert_eq!(db.get_account(contract).nonce, u64::MAX);
}

#[test]
fn precompile_out_of_gas_fails_the_call() {
    let contract = Address::from_low_u64_be(CONTRACT);
    let mut db = funded_db(1_000_000);
    // IDENTITY costs 15 on empty input.
    deploy(&mut db, contract, 0, call_and_record(IDENTITY_ADDRESS, 10, 0));

    let tx = tx(TxKind::Call(contract), 100_000, 1, 0, vec![]);
    let report = VM::new(env(Fork::SpuriousDragon, 1), &mut db, &tx)
        .execute()
        .unwrap();

    // 21 + 700 + the 10 forwarded and burnt + 20008 before the gas is recorded.
    assert!(report.is_success());
    assert_eq!(db.get_storage(contract, U256::zero()), U256::one());
    assert_eq!(db.get_storage(contract, U256::one()), U256::from(79_000 - 20_739));
    assert_eq!(report.gas_used, 21_000 + 40_742);
    assert!(!db.account_exists(IDENTITY_ADDRESS));
}

#[test]
fn erred_ripemd160_call_still_removes_its_empty_account() {
    let contract = Address::from_low_u64_be(CONTRACT);
    for (precompile, removed) in [(RIPEMD_160_ADDRESS, true), (IDENTITY_ADDRESS, false)] {
        let mut db = funded_db(1_000_000);
        db.insert_account(precompile, AccountInfo::default(), []);
        deploy(&mut db, contract, 0, call_and_record(precompile, 10, 0));

        let tx = tx(TxKind::Call(contract), 100_000, 1, 0, vec![]);
        let report = VM::new(env(Fork::SpuriousDragon, 1), &mut db, &tx)
            .execute()
            .unwrap();

        assert!(report.is_success());
        assert_eq!(db.get_storage(contract, U256::zero()), U256::one());
        assert_eq!(db.account_exists(precompile), !removed, "{precompile:#x}");
    }
}

#[test]
fn tangerine_whistle_caps_forwarded_gas() {
    let contract = Address::from_low_u64_be(CONTRACT);
    let callee = Address::from_low_u64_be(0x43);
    // GAS, PUSH1 0, SSTORE, STOP
    let callee_code = vec![0x5a, 0x60, 0x00, 0x55, 0x00];

    let mut db = funded_db(1_000_000);
    deploy(&mut db, callee, 0, callee_code.clone());
    deploy(&mut db, contract, 0, call_and_record(callee, 0xffff, 0));
    let tx = tx(TxKind::Call(contract), 71_000, 1, 0, vec![]);
    let report = VM::new(env(Fork::TangerineWhistle, 1), &mut db, &tx)
        .execute()
        .unwrap();

    // 50000 - 21 - 700 = 49279 available, of which all but 769 is forwarded.
    assert!(report.is_success());
    assert_eq!(db.get_storage(callee, U256::zero()), U256::from(48_510 - 2));
    assert_eq!(db.get_storage(contract, U256::zero()), U256::zero());
    assert_eq!(db.get_storage(contract, U256::one()), U256::from(24_266));
    assert_eq!(report.gas_used, 66_737);

    // Before TangerineWhistle the full request is charged and cannot be paid.
    let mut db = funded_db(1_000_000);
    deploy(&mut db, callee, 0, callee_code);
    deploy(&mut db, contract, 0, call_and_record(callee, 0xffff, 0));
    let report = VM::new(env(Fork::Homestead, 1), &mut db, &tx)
        .execute()
        .unwrap();
    assert_eq!(
        report.result,
        TxResult::Revert(ExceptionalHalt::OutOfGas.into())
    );
    assert_eq!(report.gas_used, 71_000);
}

#[test]
fn stack_overflow_consumes_all_gas() {
    let contract = Address::from_low_u64_be(CONTRACT);
    let mut db = funded_db(1_000_000);
    // JUMPDEST, PUSH1 0, PUSH1 0, JUMP: one more item on every pass.
    deploy(&mut db, contract, 0, vec![0x5b, 0x60, 0x00, 0x60, 0x00, 0x56]);

    let tx = tx(TxKind::Call(contract), 100_000, 1, 0, vec![]);
    let report = VM::new(env(Fork::Homestead, 1), &mut db, &tx)
        .execute()
        .unwrap();

    assert_eq!(
        report.result,
        TxResult::Revert(ExceptionalHalt::StackOverflow.into())
    );
    assert_eq!(report.gas_used, 100_000);
    assert_eq!(report.gas_left, 0);
}

#[test]
fn invalid_jump_consumes_all_gas() {
    let contract = Address::from_low_u64_be(CONTRACT);
    let mut db = funded_db(1_000_000);
    // PUSH1 5, JUMP, STOP, PUSH1 0x5b: the jump lands on push data.
    deploy(&mut db, contract, 0, vec![0x60, 0x05, 0x56, 0x00, 0x60, 0x5b]);

    let tx = tx(TxKind::Call(contract), 100_000, 1, 0, vec![]);
    let report = VM::new(env(Fork::Homestead, 1), &mut db, &tx)
        .execute()
        .unwrap();

    assert_eq!(
        report.result,
        TxResult::Revert(ExceptionalHalt::InvalidJump.into())
    );
    assert_eq!(report.gas_used, 100_000);
    assert_eq!(
        db.get_account(sender()).balance,
        U256::from(1_000_000 - 100_000)
    );
}
