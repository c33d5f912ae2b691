use std::{
    collections::HashMap,
    fmt::Debug,
    io::ErrorKind,
    path::PathBuf,
    sync::{Arc, Mutex}
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{domain::Quantity, utils::error_fmt_chain};

use super::queue::SyncOperation;

pub const GUEST_CART_KEY: &str = "thebazaar_cart";
pub const SYNC_QUEUE_KEY: &str = "bazaar_sync_queue";
pub const VENDOR_GUEST_AUTH_KEY: &str = "vendor_guest_auth";
pub const VENDOR_PROFILE_DRAFT_KEY: &str = "vendor_profile_draft";

#[derive(Error)]
pub enum StorageError{
    #[error("Failed to access client storage")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode stored value")]
    Encoding(#[from] serde_json::Error)
}

impl Debug for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &std::error::Error::source(self))
    }
}

/// String key-value store that survives restarts of the client
pub trait LocalStorage{
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: LocalStorage + ?Sized> LocalStorage for Arc<T> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }
}

/// One `<key>.json` file per key inside `dir`
#[derive(Debug, Clone)]
pub struct FileStorage{
    dir: PathBuf
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self{
        FileStorage{ dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf{
        self.dir.join(format!("{}.json", key))
    }
}

impl LocalStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into())
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(())
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage{
    values: Mutex<HashMap<String, String>>
}

impl MemoryStorage {
    pub fn new() -> Self{
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>>{
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.values().remove(key);
        Ok(())
    }
}

/// Guest cart entry as persisted under [`GUEST_CART_KEY`]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GuestCartEntry{
    pub product_id: Uuid,
    #[serde(default)]
    pub variant_id: Option<Uuid>,
    pub quantity: Quantity
}

/// Vendor registration form saved between visits
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct VendorProfileDraft{
    pub business_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>
}

// Missing keys are `None`; unreadable or malformed values are logged and
// treated the same way.
fn read_json<T: DeserializeOwned>(storage: &impl LocalStorage, key: &str) -> Option<T>{
    let raw = match storage.get_item(key) {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!(error = ?e, key, "Failed to read client storage");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(error = %e, key, "Discarding malformed stored value");
            None
        }
    }
}

// Lists are decoded entry by entry so that one bad entry does not take the
// rest of the list down with it.
fn read_json_list<T: DeserializeOwned>(storage: &impl LocalStorage, key: &str) -> Vec<T>{
    let entries: Vec<serde_json::Value> = read_json(storage, key).unwrap_or_default();

    entries.into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, key, "Skipping malformed stored entry");
                None
            }
        })
        .collect()
}

fn write_json<T: Serialize + ?Sized>(storage: &impl LocalStorage, key: &str, value: &T){
    let result = serde_json::to_string(value)
        .map_err(StorageError::from)
        .and_then(|raw| storage.set_item(key, &raw));

    if let Err(e) = result {
        tracing::error!(error = ?e, key, "Failed to write client storage");
    }
}

fn remove(storage: &impl LocalStorage, key: &str){
    if let Err(e) = storage.remove_item(key) {
        tracing::error!(error = ?e, key, "Failed to remove client storage key");
    }
}

pub fn load_guest_cart(storage: &impl LocalStorage) -> Vec<GuestCartEntry>{
    read_json_list(storage, GUEST_CART_KEY)
}

pub fn save_guest_cart(storage: &impl LocalStorage, entries: &[GuestCartEntry]){
    write_json(storage, GUEST_CART_KEY, entries)
}

pub fn clear_guest_cart(storage: &impl LocalStorage){
    remove(storage, GUEST_CART_KEY)
}

pub fn load_sync_queue(storage: &impl LocalStorage) -> Vec<SyncOperation>{
    read_json_list(storage, SYNC_QUEUE_KEY)
}

pub fn save_sync_queue(storage: &impl LocalStorage, queue: &[SyncOperation]){
    if queue.is_empty() {
        remove(storage, SYNC_QUEUE_KEY)
    } else {
        write_json(storage, SYNC_QUEUE_KEY, queue)
    }
}

pub fn vendor_guest_auth(storage: &impl LocalStorage) -> bool{
    read_json(storage, VENDOR_GUEST_AUTH_KEY).unwrap_or(false)
}

pub fn set_vendor_guest_auth(storage: &impl LocalStorage, enabled: bool){
    if enabled {
        write_json(storage, VENDOR_GUEST_AUTH_KEY, &true)
    } else {
        remove(storage, VENDOR_GUEST_AUTH_KEY)
    }
}

pub fn load_vendor_draft(storage: &impl LocalStorage) -> Option<VendorProfileDraft>{
    read_json(storage, VENDOR_PROFILE_DRAFT_KEY)
}

pub fn save_vendor_draft(storage: &impl LocalStorage, draft: &VendorProfileDraft){
    write_json(storage, VENDOR_PROFILE_DRAFT_KEY, draft)
}

pub fn clear_vendor_draft(storage: &impl LocalStorage){
    remove(storage, VENDOR_PROFILE_DRAFT_KEY)
}

#[cfg(test)]
mod tests {
    use claim::{assert_none, assert_ok, assert_some_eq};
    use uuid::Uuid;

    use super::*;

    #[test]
    fn guest_cart_uses_the_storefront_layout(){
        let storage = MemoryStorage::new();
        let product_id = Uuid::new_v4();
        save_guest_cart(&storage, &[GuestCartEntry{ product_id, variant_id: None, quantity: Quantity::ONE }]);

        let raw = storage.get_item(GUEST_CART_KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json[0]["productId"], product_id.to_string());
        assert_eq!(json[0]["quantity"], 1);
    }

    #[test]
    fn malformed_guest_cart_reads_as_empty(){
        let storage = MemoryStorage::new();
        storage.set_item(GUEST_CART_KEY, "{not json").unwrap();
        assert!(load_guest_cart(&storage).is_empty());

        storage.set_item(GUEST_CART_KEY, r#"[{"productId":"not-a-uuid","quantity":1}]"#).unwrap();
        assert!(load_guest_cart(&storage).is_empty());
    }

    #[test]
    fn out_of_range_guest_entry_does_not_drop_its_neighbours(){
        let storage = MemoryStorage::new();
        let (kept, broken) = (Uuid::new_v4(), Uuid::new_v4());
        let raw = serde_json::json!([
            { "productId": broken, "quantity": 0 },
            { "productId": kept, "variantId": null, "quantity": 3 }
        ]);
        storage.set_item(GUEST_CART_KEY, &raw.to_string()).unwrap();

        let entries = load_guest_cart(&storage);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].product_id, kept);
        assert_eq!(entries[0].quantity.get(), 3);

        save_guest_cart(&storage, &entries);
        assert_eq!(load_guest_cart(&storage), entries);
    }

    #[test]
    fn vendor_draft_and_guest_flag_round_trip(){
        let storage = MemoryStorage::new();
        assert!(!vendor_guest_auth(&storage));
        assert_none!(load_vendor_draft(&storage));

        set_vendor_guest_auth(&storage, true);
        let draft = VendorProfileDraft{ business_name: Some("Kamau Crafts".into()), ..Default::default() };
        save_vendor_draft(&storage, &draft);

        assert!(vendor_guest_auth(&storage));
        assert_some_eq!(load_vendor_draft(&storage), draft);

        set_vendor_guest_auth(&storage, false);
        clear_vendor_draft(&storage);
        assert!(!vendor_guest_auth(&storage));
        assert_none!(load_vendor_draft(&storage));
    }

    #[test]
    fn file_storage_persists_across_instances(){
        let dir = tempfile::tempdir().unwrap();

        let first = FileStorage::new(dir.path());
        assert_ok!(first.set_item(SYNC_QUEUE_KEY, "[]"));

        let second = FileStorage::new(dir.path());
        assert_some_eq!(second.get_item(SYNC_QUEUE_KEY).unwrap(), "[]".to_string());

        assert_ok!(second.remove_item(SYNC_QUEUE_KEY));
        assert_ok!(second.remove_item(SYNC_QUEUE_KEY));
        assert_none!(first.get_item(SYNC_QUEUE_KEY).unwrap());
    }
}
