pub mod chat;
pub mod message;
pub mod user;

pub use chat::{Chat, ChatChanges, ChatDetail, NewChat};
pub use message::{Message, MessageChanges, NewMessage};
pub use user::{NewUser, User, UserChanges, UserDetail};
