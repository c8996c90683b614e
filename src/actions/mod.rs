//! Account use cases behind the login and registration routes.

mod login;
mod register;

pub use login::LoginAction;
pub use register::RegisterAction;
