//! Screen controllers: each one backs a single screen and talks only to the
//! catalog client, the session manager or the work scheduler.

pub mod detail;
pub mod home;
pub mod login;
pub mod profile;
pub mod register;

pub use detail::{DetailController, DetailView};
pub use home::{HomeController, HomeView, MovieListItem};
pub use login::LoginController;
pub use profile::ProfileController;
pub use register::{RegisterController, RegistrationForm};

#[cfg(test)]
#[path = "../tests/controllers_tests.rs"]
mod tests;
