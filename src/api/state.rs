use std::sync::Arc;

use crate::fetch::FplApi;

#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<dyn FplApi>,
    pub cors_origin: String,
}
