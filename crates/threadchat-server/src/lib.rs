pub mod config;
pub mod handlers;
pub mod logging;
pub mod reply;
pub mod server;
pub mod session;
pub mod state;

pub use config::{Cli, ConfigError, ServerConfig, StoreKind};
pub use reply::ReplyAssembler;
pub use server::{configure_routes, run_server};
pub use session::{DisplayMessage, DisplayRole, SessionContext, SessionError, ThreadEntry};
pub use state::AppState;
