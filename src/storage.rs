use crate::errors::AppError;
use crate::models::LedgerData;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info};

pub async fn load_data(path: &Path) -> LedgerData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<LedgerData>(&bytes) {
            Ok(mut data) => {
                data.sort();
                info!("loaded {} entries from {}", data.entries.len(), path.display());
                data
            }
            Err(err) => {
                error!("failed to parse ledger file: {err}");
                LedgerData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => LedgerData::default(),
        Err(err) => {
            error!("failed to read ledger file: {err}");
            LedgerData::default()
        }
    }
}

/// Writes to a sibling temp file and renames it over `path`, so a crash
/// mid-write leaves the previous ledger intact.
pub async fn persist_data(path: &Path, data: &LedgerData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data)?;
    let tmp_path = temp_path_for(path);

    let result = match fs::write(&tmp_path, payload).await {
        Ok(()) => fs::rename(&tmp_path, path).await,
        Err(err) => Err(err),
    };
    if let Err(err) = result {
        error!("failed to write ledger file {}: {err}", path.display());
        let _ = fs::remove_file(&tmp_path).await;
        return Err(AppError::internal(err));
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
