use crate::profiles::error::WriteError;
use crate::types::profile::{Profile, ProfileDocument, Provenance};
use log::info;
use std::path::Path;
use tokio::fs;

/// Packages `profiles` with their provenance. Pure formatting, order is kept.
pub fn write_document(profiles: Vec<Profile>, provenance: Provenance) -> ProfileDocument {
    ProfileDocument {
        meta: provenance,
        features: profiles,
    }
}

impl ProfileDocument {
    pub fn to_json(&self) -> Result<String, WriteError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Writes the document as compact JSON, creating the parent directory if needed.
    pub async fn save(&self, path: &Path) -> Result<(), WriteError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| WriteError::OutputDirCreation(parent.to_path_buf(), e))?;
        }
        let json = self.to_json()?;
        fs::write(path, json)
            .await
            .map_err(|e| WriteError::OutputWrite(path.to_path_buf(), e))?;
        info!("Wrote {} with {} regions", path.display(), self.features.len());
        Ok(())
    }
}
