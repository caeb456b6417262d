// Protected handlers: every route here runs the guard before touching the
// store. Path ids are validated first so malformed ids never reach it.

pub mod athletes;
pub mod clients;
pub mod enrollments;
pub mod payments;
pub mod resource;
pub mod tournaments;
pub mod whoami;
