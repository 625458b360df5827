mod storage;
mod types;

pub use storage::MenuStore;
pub use types::{NewMenuItem, OrderLine, Selection, StoredMenuItem};
