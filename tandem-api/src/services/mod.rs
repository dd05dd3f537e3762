pub mod account_service;
pub mod room_service;
pub mod token_service;
