// JSON-file save store: one save record and one profile per directory.

use crate::domain::ports::{Profile, SaveRecord, SaveStore, StoreError};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const SAVE_FILE: &str = "save.json";
const PROFILE_FILE: &str = "profile.json";

pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // Written to a sibling temp file, then renamed into place.
    async fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let bytes = serde_json::to_vec_pretty(value)?;
        let path = self.dir.join(name);
        let tmp = self.dir.join(format!("{name}.tmp"));
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, StoreError> {
        match tokio::fs::read(self.dir.join(name)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl SaveStore for JsonFileStore {
    async fn write_save(&self, record: &SaveRecord) -> Result<(), StoreError> {
        self.write_json(SAVE_FILE, record).await
    }

    async fn read_save(&self) -> Result<Option<SaveRecord>, StoreError> {
        self.read_json(SAVE_FILE).await
    }

    async fn write_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        self.write_json(PROFILE_FILE, profile).await
    }

    async fn read_profile(&self) -> Result<Option<Profile>, StoreError> {
        self.read_json(PROFILE_FILE).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClassType, Coordinates, Player};

    fn scratch_store() -> JsonFileStore {
        JsonFileStore::new(std::env::temp_dir().join(format!("survival-{}", uuid::Uuid::new_v4())))
    }

    #[tokio::test]
    async fn when_nothing_was_saved_then_reads_are_empty() {
        let store = scratch_store();
        assert!(store.read_save().await.expect("read").is_none());
        assert!(store.read_profile().await.expect("read").is_none());
    }

    #[tokio::test]
    async fn save_and_profile_are_read_back() {
        let store = scratch_store();
        let record = SaveRecord {
            player: Player::new("p1", "Ana", ClassType::Medic),
            last_position: Some(Coordinates { lat: 1.0, lng: 2.0 }),
            timestamp: 42,
        };
        let profile = Profile {
            name: "Ana".to_string(),
            class_type: ClassType::Medic,
        };

        store.write_save(&record).await.expect("save");
        store.write_profile(&profile).await.expect("profile");

        assert_eq!(store.read_save().await.expect("read"), Some(record));
        assert_eq!(store.read_profile().await.expect("read"), Some(profile));
        let _ = tokio::fs::remove_dir_all(store.dir()).await;
    }

    #[tokio::test]
    async fn when_save_is_corrupt_then_read_fails() {
        let store = scratch_store();
        tokio::fs::create_dir_all(store.dir()).await.expect("dir");
        tokio::fs::write(store.dir().join(SAVE_FILE), b"{not json")
            .await
            .expect("write");

        assert!(matches!(store.read_save().await, Err(StoreError::Serde(_))));
        let _ = tokio::fs::remove_dir_all(store.dir()).await;
    }
}
