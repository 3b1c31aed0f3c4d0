//! Persistence implementations for file-based storage.

mod file_storage;
mod settings_repository;

pub use file_storage::{FileKeyValueStorage, MemoryKeyValueStorage, STORAGE_FILE_NAME};
pub use settings_repository::{
    ENV_API_URL, ENV_ENFORCE_AUTH, ENV_STORAGE_PATH, SettingsError, SettingsRepository,
    apply_overrides, storage_path,
};
