use crate::{
    db::WorldState,
    errors::{InternalError, VMError},
};
use bytes::Bytes;
use ferrite_common::{Address, U256, evm::calculate_create_address, types::TxKind};

/// Everything one frame needs to know about the call or creation it runs.
///
/// A message is never modified after it is built; each one produces exactly one
/// [`CallFrame`](crate::call_frame::CallFrame).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub caller: Address,
    /// [`TxKind::Create`] for contract creation.
    pub target: TxKind,
    /// The account whose storage and balance the frame operates on.
    pub current_target: Address,
    /// The account whose code runs. `None` for creations, where the code is init code.
    pub code_address: Option<Address>,
    pub code: Bytes,
    pub value: U256,
    pub data: Bytes,
    pub gas: u64,
    pub depth: usize,
    pub should_transfer_value: bool,
}

impl Message {
    pub fn is_create(&self) -> bool {
        matches!(self.target, TxKind::Create)
    }
}

/// Builds the message for a call or creation.
///
/// For a creation the target address derives from the caller and the caller's nonce
/// minus one (the nonce has already been bumped when this runs), `data` becomes the
/// init code and the input is empty. For a call the code is read from `code_address`,
/// which defaults to the target.
#[allow(clippy::too_many_arguments)]
pub fn prepare_message(
    caller: Address,
    target: TxKind,
    value: U256,
    data: Bytes,
    gas: u64,
    depth: usize,
    code_address: Option<Address>,
    should_transfer_value: bool,
    db: &WorldState,
) -> Result<Message, VMError> {
    let message = match target {
        TxKind::Create => {
            let nonce = db
                .get_account(caller)
                .nonce
                .checked_sub(1)
                .ok_or(InternalError::Underflow)?;
            Message {
                caller,
                target,
                current_target: calculate_create_address(caller, nonce),
                code_address: None,
                code: data,
                value,
                data: Bytes::new(),
                gas,
                depth,
                should_transfer_value,
            }
        }
        TxKind::Call(address) => {
            let code_address = code_address.unwrap_or(address);
            Message {
                caller,
                target,
                current_target: address,
                code_address: Some(code_address),
                code: db.get_account(code_address).code,
                value,
                data,
                gas,
                depth,
                should_transfer_value,
            }
        }
    };
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountInfo;

    #[test]
    fn create_message_uses_previous_nonce() {
        let caller = Address::repeat_byte(0x11);
        let mut db = WorldState::new();
        db.insert_account(caller, AccountInfo::new(U256::zero(), 1, Bytes::new()), []);

        let init_code = Bytes::from_static(&[0x60, 0x00]);
        let message = prepare_message(
            caller,
            TxKind::Create,
            U256::zero(),
            init_code.clone(),
            100,
            0,
            None,
            true,
            &db,
        )
        .unwrap();
        assert_eq!(message.current_target, calculate_create_address(caller, 0));
        assert_eq!(message.code, init_code);
        assert!(message.data.is_empty());
        assert!(message.is_create());
    }

    #[test]
    fn create_message_requires_bumped_nonce() {
        let db = WorldState::new();
        let result = prepare_message(
            Address::zero(),
            TxKind::Create,
            U256::zero(),
            Bytes::new(),
            0,
            0,
            None,
            true,
            &db,
        );
        assert!(matches!(result, Err(VMError::Internal(InternalError::Underflow))));
    }

    #[test]
    fn call_message_runs_code_address() {
        let target = Address::repeat_byte(0x22);
        let library = Address::repeat_byte(0x33);
        let mut db = WorldState::new();
        db.insert_account(
            library,
            AccountInfo::new(U256::zero(), 0, Bytes::from_static(&[0x00])),
            [],
        );

        let message = prepare_message(
            Address::zero(),
            TxKind::Call(target),
            U256::zero(),
            Bytes::from_static(&[1, 2]),
            0,
            1,
            Some(library),
            false,
            &db,
        )
        .unwrap();
        assert_eq!(message.current_target, target);
        assert_eq!(message.code_address, Some(library));
        assert_eq!(message.code, Bytes::from_static(&[0x00]));
        assert_eq!(message.data, Bytes::from_static(&[1, 2]));
    }
}
