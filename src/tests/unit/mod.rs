mod chat_tests;
mod client_tests;
mod keygate_tests;
