/// Console front end
///
/// The numbered text menu and the controller that drives it.

pub mod controller;
pub mod menu;

pub use controller::Console;
pub use menu::{ConsoleState, MenuChoice};
