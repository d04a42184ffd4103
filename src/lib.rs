pub mod aggregator;
pub mod app;
pub mod badge;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod settings;
pub mod source;
pub mod stats;
pub mod storage;
pub mod transfer;
pub mod state;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::load_store;
