// Application state for HTTP handlers
use crate::application::poller::PollerHandle;

#[derive(Clone)]
pub struct AppState {
    pub poller: PollerHandle,
}
