pub mod chat;
pub mod personalities;
pub mod setup;
