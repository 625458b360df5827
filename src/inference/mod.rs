pub mod builder;
mod client;
mod state;
mod types;

pub use builder::{ContentKind, Payload, build};
pub use client::{
    HttpInferenceBackend, INFER_MENU_PATH, InferenceBackend, extract_error_message, infer_menu,
    map_status, parse_menu_items,
};
pub use state::{ForwardEvent, ForwardState, ForwardStateMachine};
pub use types::*;
