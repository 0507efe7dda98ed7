pub mod config;
pub mod stats;
pub mod timer;

use std::rc::Rc;

use focusloop_core::{CoreError, Store};

/// Open the shared store. Degraded storage is announced once as an
/// advisory; every command keeps working against the in-memory
/// fallback.
pub(crate) fn open_store() -> Rc<Store> {
    let store = Store::open();
    if store.is_ephemeral() {
        eprintln!("warning: using temporary storage; progress will not survive this process");
    }
    Rc::new(store)
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CoreError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
