pub mod adapters;
pub mod auth;
pub mod codec;
pub mod combat;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod linereader;
pub mod ratelimit;
pub mod session;
pub mod tick;
pub mod world;

pub use adapters::Adapters;
pub use auth::AuthStore;
pub use config::Config;
pub use dispatch::{dispatch, DispatchServices};
pub use error::{MudError, MudResult};
pub use ratelimit::RateLimiter;
pub use session::{DispatchMode, LineReaderTable, SessionRegistry};
pub use tick::{TickHandle, TICK_INTERVAL};
pub use world::{Delivery, World};
