pub mod playlist;
pub mod session;
pub mod token;
