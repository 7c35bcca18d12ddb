pub mod booking;
pub mod comment;
pub mod event;
pub mod user;

pub use booking::Booking;
pub use comment::CommentView;
pub use event::{Event, EventStatus};
pub use user::User;
