pub mod token;
pub mod users;

pub use token::{token_obtain, token_refresh};
pub use users::user_create;
