pub mod availability;
pub mod health;
pub mod login;
pub mod profile;
pub mod register;
pub mod rooms;
