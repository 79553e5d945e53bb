//! NVS persistence for the configuration record.
//!
//! The record is stored as one opaque blob under a schema-versioned
//! key. Anything unexpected (missing blob, wrong size, invalid bit
//! pattern, version from a newer firmware) falls back to compiled-in
//! defaults rather than failing the boot; the device must always come
//! up playable, and the next save rewrites the blob in the current
//! schema.
//!
//! Only ever written while the RT core is parked by the pause
//! handshake (see [`crate::save`]); there is no concurrent reader of
//! NVS during a write.

#[cfg(target_os = "espidf")]
use crate::config::{ControllerConfig, CONFIG_SIZE};
#[cfg(target_os = "espidf")]
use crate::hal::{Storage, StorageError};

#[cfg(target_os = "espidf")]
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::EspError;

/// Current blob schema version.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// NVS namespace for the controller.
pub const NVS_NAMESPACE: &str = "iidx_cfg";

/// NVS key for the schema version.
#[cfg(target_os = "espidf")]
const VERSION_KEY: &str = "schema_ver";

/// NVS key for the record blob.
#[cfg(target_os = "espidf")]
const BLOB_KEY: &str = "cfg";

/// How the startup load resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadResult {
    /// No stored version: first boot, defaults in use.
    FreshInstall,
    /// Blob loaded at the current schema.
    UpToDate,
    /// Blob present but unreadable; defaults in use.
    Corrupt,
    /// Written by a newer firmware; defaults in use, not overwritten
    /// until the next save.
    TooNew { stored_version: u32 },
}

/// NVS operation errors.
#[derive(Debug)]
pub enum NvsError {
    /// NVS initialization failed
    #[cfg(target_os = "espidf")]
    InitFailed(EspError),
    /// NVS read/write error
    #[cfg(target_os = "espidf")]
    IoError(EspError),
    /// Feature not available on this platform
    #[cfg(not(target_os = "espidf"))]
    NotAvailable,
}

#[cfg(target_os = "espidf")]
impl From<EspError> for NvsError {
    fn from(e: EspError) -> Self {
        NvsError::IoError(e)
    }
}

/// Storage collaborator backed by the default NVS partition.
#[cfg(target_os = "espidf")]
pub struct NvsStorage {
    nvs: EspNvs<NvsDefault>,
    last_load: LoadResult,
}

#[cfg(target_os = "espidf")]
impl NvsStorage {
    /// Take the default NVS partition and open the controller namespace.
    pub fn take() -> Result<Self, NvsError> {
        let partition = EspDefaultNvsPartition::take().map_err(NvsError::InitFailed)?;
        let nvs = EspNvs::new(partition, NVS_NAMESPACE, true).map_err(NvsError::InitFailed)?;
        Ok(Self {
            nvs,
            last_load: LoadResult::FreshInstall,
        })
    }

    /// How the most recent [`Storage::load`] resolved.
    pub fn last_load(&self) -> LoadResult {
        self.last_load
    }

    fn try_load(&mut self) -> Result<(LoadResult, ControllerConfig), NvsError> {
        let stored_version = self.nvs.get_u32(VERSION_KEY)?.unwrap_or(0);

        if stored_version == 0 {
            return Ok((LoadResult::FreshInstall, ControllerConfig::DEFAULT));
        }
        if stored_version > CURRENT_SCHEMA_VERSION {
            return Ok((
                LoadResult::TooNew { stored_version },
                ControllerConfig::DEFAULT,
            ));
        }

        let mut buf = [0u8; CONFIG_SIZE];
        match self.nvs.get_raw(BLOB_KEY, &mut buf)? {
            Some(bytes) => match ControllerConfig::from_bytes(bytes) {
                Some(config) => Ok((LoadResult::UpToDate, config)),
                None => Ok((LoadResult::Corrupt, ControllerConfig::DEFAULT)),
            },
            None => Ok((LoadResult::Corrupt, ControllerConfig::DEFAULT)),
        }
    }
}

#[cfg(target_os = "espidf")]
impl Storage for NvsStorage {
    fn load(&mut self) -> ControllerConfig {
        match self.try_load() {
            Ok((result, config)) => {
                self.last_load = result;
                config
            }
            Err(_) => {
                self.last_load = LoadResult::Corrupt;
                ControllerConfig::DEFAULT
            }
        }
    }

    fn write(&mut self, config: &ControllerConfig) -> Result<(), StorageError> {
        let map = |e: EspError| StorageError::Io(e.code());

        // Version first: a torn write then reads as current-version
        // with a bad blob, which the checked decode rejects.
        self.nvs
            .set_u32(VERSION_KEY, CURRENT_SCHEMA_VERSION)
            .map_err(map)?;
        self.nvs.set_raw(BLOB_KEY, config.as_bytes()).map_err(map)?;
        Ok(())
    }
}
