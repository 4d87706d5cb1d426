mod classify;
mod controller;
mod fetcher;
mod initiator;
mod machine;
mod models;
mod observer;
mod poller;
mod policy;
mod state;
mod traits;

pub use classify::*;
pub use controller::{ConnectionController, ControllerOptions};
pub use fetcher::*;
pub use initiator::*;
pub use machine::*;
pub use models::*;
pub use observer::*;
pub use poller::*;
pub use policy::*;
pub use state::*;
pub use traits::*;
