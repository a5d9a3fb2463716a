use crate::remote::HttpRemote;
use crate::tracker::Tracker;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<Mutex<Tracker>>,
    pub remote: Arc<HttpRemote>,
}

impl AppState {
    pub fn new(tracker: Tracker, remote: HttpRemote) -> Self {
        Self {
            tracker: Arc::new(Mutex::new(tracker)),
            remote: Arc::new(remote),
        }
    }
}
