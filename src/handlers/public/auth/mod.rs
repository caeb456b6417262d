// handlers/public/auth/mod.rs - Public authentication handlers
//
// Account creation and token acquisition; no token required.

pub mod login;    // POST /auth/login - exchange credentials for a JWT
pub mod register; // POST /auth/register - create a Client account

pub use login::login_post;
pub use register::register_post;
