mod auth_tests;
mod chat_tests;
mod gateway_tests;
mod health_tests;
mod lobby_tests;
