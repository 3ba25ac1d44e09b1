use crate::{
    errors::{ContextResult, VMError},
    hooks::default_hook::DefaultHook,
    vm::VM,
};
use std::{cell::RefCell, rc::Rc};

/// Code that runs around a transaction's outermost message.
pub trait Hook {
    /// Runs before any frame starts. An error here rejects the transaction.
    fn prepare_execution(&mut self, vm: &mut VM<'_>) -> Result<(), VMError>;

    /// Runs once the outermost frame has finished.
    fn finalize_execution(
        &mut self,
        vm: &mut VM<'_>,
        report: &mut ContextResult,
    ) -> Result<(), VMError>;
}

pub fn default_hooks() -> Vec<Rc<RefCell<dyn Hook + 'static>>> {
    vec![Rc::new(RefCell::new(DefaultHook))]
}
