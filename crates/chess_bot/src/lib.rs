//! Front ends for `chess_session`: the HTTP board/command server and a
//! console loop standing in for the chat layer.

pub mod console;
pub mod logging;
pub mod server;

pub use server::{build_router, AppState};
