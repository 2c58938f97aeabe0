use std::sync::Arc;

use crate::{
    config::AppConfig,
    models::session::Session,
    services::{
        backend::{AuthConnector, DataConnector},
        dispatch::TripDispatcher,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub auth: Arc<dyn AuthConnector>,
    pub data: Arc<dyn DataConnector>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        auth: Arc<dyn AuthConnector>,
        data: Arc<dyn DataConnector>,
    ) -> Self {
        Self { config, auth, data }
    }

    /// A dispatcher whose backend calls carry the session's access token.
    pub fn dispatcher_for(&self, session: &Session) -> TripDispatcher {
        TripDispatcher::new(self.data.scoped(Some(session.access_token.clone())))
    }
}
