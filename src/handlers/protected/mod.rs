pub mod chats;
pub mod messages;
pub mod users;

pub use chats::*;
pub use messages::*;
pub use users::*;
