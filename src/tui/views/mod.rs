pub mod campaign;
pub mod chat;
pub mod gate;
