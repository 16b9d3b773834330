use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::services::Services;
use crate::timer::StudyTimer;

#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub timer: Arc<Mutex<StudyTimer>>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(services: Services, config: AppConfig) -> Self {
        Self {
            services,
            timer: Arc::new(Mutex::new(StudyTimer::new())),
            config: Arc::new(config),
        }
    }
}
