pub mod cli;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod validate;

pub mod util {
    pub mod logging;
    pub mod tools;
}
