pub mod campaign;
pub mod chat;
pub mod credentials;
pub mod gemini;
pub mod keygate;
pub mod logging;
