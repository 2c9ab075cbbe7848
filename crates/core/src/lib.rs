pub mod config;
pub mod diagram;
pub mod element;
pub mod error;
pub mod finding;
pub mod threat;

pub use config::Config;
pub use diagram::*;
pub use element::*;
pub use error::*;
pub use finding::*;
pub use threat::*;
