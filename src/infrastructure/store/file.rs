// src/infrastructure/store/file.rs
// JSON-file account store: one document per account

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::models::Account;
use crate::domain::repository::AccountRepository;

const ACCOUNTS_DIR: &str = "accounts";

pub struct FileAccountStore {
    root: PathBuf,
    // Serialises create/save so version checks and writes don't interleave
    write_lock: Mutex<()>,
}

impl FileAccountStore {
    /// Open (and create if needed) a store rooted at `data_dir`
    pub async fn open<P: AsRef<Path>>(data_dir: P) -> StoreResult<Self> {
        let root = data_dir.as_ref().join(ACCOUNTS_DIR);
        fs::create_dir_all(&root).await?;
        log::info!("Opened account store at {}", root.display());

        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.root.join(format!("{}.json", id))
    }

    async fn read(&self, path: &Path) -> StoreResult<Account> {
        let contents = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    async fn write(&self, account: &Account) -> StoreResult<()> {
        let path = self.path_for(account.id);
        let tmp = path.with_extension("json.tmp");

        let contents = serde_json::to_string_pretty(account)?;
        fs::write(&tmp, contents).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            fs::remove_file(&tmp).await.ok();
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for FileAccountStore {
    async fn create(&self, account: Account) -> StoreResult<Account> {
        let _guard = self.write_lock.lock().await;

        if fs::try_exists(self.path_for(account.id)).await?
            || self.find_by_email(&account.email).await?.is_some()
        {
            return Err(StoreError::AlreadyExists(account.email));
        }

        self.write(&account).await?;
        log::debug!("Created account file for {}", account.id);
        Ok(account)
    }

    async fn load(&self, id: Uuid) -> StoreResult<Account> {
        let path = self.path_for(id);
        if !fs::try_exists(&path).await? {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.read(&path).await
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|a| a.email.eq_ignore_ascii_case(email)))
    }

    async fn save(&self, mut account: Account, expected_version: u64) -> StoreResult<Account> {
        let _guard = self.write_lock.lock().await;

        let stored = self.load(account.id).await?;
        if stored.version != expected_version {
            return Err(StoreError::Conflict {
                id: account.id,
                expected: expected_version,
                found: stored.version,
            });
        }

        account.version = expected_version + 1;
        account.updated_at = Utc::now();
        self.write(&account).await?;

        log::debug!("Saved account {} at version {}", account.id, account.version);
        Ok(account)
    }

    async fn list(&self) -> StoreResult<Vec<Account>> {
        let mut accounts = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.read(&path).await {
                Ok(account) => accounts.push(account),
                Err(e) => log::warn!("Skipping unreadable account file {}: {}", path.display(), e),
            }
        }

        accounts.sort_by_key(|a| a.created_at);
        Ok(accounts)
    }
}
