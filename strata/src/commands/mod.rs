pub mod add;
pub mod cat;
pub mod check;
pub mod extract;
pub mod list;
pub mod log;
pub mod rm;

pub use add::run as add;
pub use cat::run as cat;
pub use check::run as check;
pub use extract::run as extract;
pub use list::run as list;
pub use log::run as log;
pub use rm::run as remove;
