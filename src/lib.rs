pub mod app;
pub mod calendar;
pub mod config;
pub mod errors;
pub mod gesture;
pub mod handlers;
pub mod models;
pub mod remote;
pub mod state;
pub mod stats;
pub mod status;
pub mod tracker;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use remote::HttpRemote;
pub use state::AppState;
pub use tracker::Tracker;
