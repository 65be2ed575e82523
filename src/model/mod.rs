//! Domain values of the user directory.

mod user;

pub use user::{Credentials, InvalidUserId, NewUser, UpdateError, User, UserId, UserUpdate, UserView};
