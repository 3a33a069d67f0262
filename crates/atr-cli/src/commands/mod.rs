pub mod check;
pub mod classify;
pub mod inspect;
pub mod messages;
