pub mod access;
pub mod adapter;
pub mod error;
pub mod handler;
pub mod keyboard;
pub mod transport;

pub use access::TelegramAccess;
pub use adapter::{bot_from_token, TelegramAdapter};
pub use error::TelegramError;
pub use transport::TelegramTransport;
