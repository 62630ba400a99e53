use crate::config::Config;
use crate::models::LedgerData;
use crate::predictor::PredictorClient;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<LedgerData>>,
    pub predictor: Option<PredictorClient>,
}

impl AppState {
    pub fn new(data_path: PathBuf, data: LedgerData) -> Self {
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
            predictor: None,
        }
    }

    pub fn from_config(config: &Config, data: LedgerData) -> Self {
        let predictor = config
            .predictor
            .clone()
            .map(|settings| PredictorClient::new(reqwest::Client::new(), settings));
        Self {
            predictor,
            ..Self::new(config.data_path.clone(), data)
        }
    }
}
