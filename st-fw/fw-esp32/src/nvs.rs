//! Flash-backed preference store.
//!
//! Preferences live in one 4 KiB flash block:
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ Magic: [u8; 4] = b"STPF"                      │  Offset: 0
//! ├───────────────────────────────────────────────┤
//! │ Version: u32 = 1                              │  Offset: 4
//! ├───────────────────────────────────────────────┤
//! │ Entry Count: u32                              │  Offset: 8
//! ├───────────────────────────────────────────────┤
//! │ Entries: [(key, value)]                       │  Offset: 12
//! │   key_len: u8, key bytes                      │
//! │   value_len: u16 LE, value bytes              │
//! ├───────────────────────────────────────────────┤
//! │ CRC32: u32                                    │  Offset: block_size - 4
//! └───────────────────────────────────────────────┘
//! ```
//!
//! A block that fails the magic, version or CRC check starts the store
//! empty; keys reappear as their owners seed defaults. Every put rewrites
//! the whole block, which the debounce layer above keeps rare.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

use embedded_storage::{ReadStorage, Storage};
use esp_storage::FlashStorage;
use hashbrown::HashMap;
use log::{info, warn};
use st_shared::{NvmError, PreferenceStore};

/// Preference block base address (flash offset).
const PREF_BLOCK_BASE: u32 = 0x9000;

/// Preference block size.
const PREF_BLOCK_SIZE: usize = 4096;

/// Magic number for the preference block.
const PREF_MAGIC: [u8; 4] = *b"STPF";

/// Preference format version.
const PREF_VERSION: u32 = 1;

/// Longest storable key.
const MAX_KEY_LEN: usize = 255;

/// Preference store over the on-chip flash.
pub struct FlashPrefStore {
    flash: FlashStorage,
    entries: HashMap<String, String>,
}

impl FlashPrefStore {
    /// Load the store, starting empty when no valid block exists.
    pub fn load() -> Self {
        let mut flash = FlashStorage::new();
        let entries = match Self::read_block(&mut flash) {
            Some(entries) => {
                info!("loaded {} preferences from flash", entries.len());
                entries
            }
            None => {
                warn!("no valid preference block, starting empty");
                HashMap::new()
            }
        };
        Self { flash, entries }
    }

    fn read_block(flash: &mut FlashStorage) -> Option<HashMap<String, String>> {
        let mut buf = [0u8; PREF_BLOCK_SIZE];
        flash.read(PREF_BLOCK_BASE, &mut buf).ok()?;

        if buf[0..4] != PREF_MAGIC {
            return None;
        }
        let version = u32::from_le_bytes(buf[4..8].try_into().ok()?);
        if version != PREF_VERSION {
            return None;
        }

        let stored_crc = u32::from_le_bytes(buf[PREF_BLOCK_SIZE - 4..].try_into().ok()?);
        let calculated_crc = crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC)
            .checksum(&buf[0..PREF_BLOCK_SIZE - 4]);
        if stored_crc != calculated_crc {
            return None;
        }

        let entry_count = u32::from_le_bytes(buf[8..12].try_into().ok()?) as usize;
        let mut entries = HashMap::new();
        let mut offset = 12;

        for _ in 0..entry_count {
            let key_len = *buf.get(offset)? as usize;
            offset += 1;
            let key = core::str::from_utf8(buf.get(offset..offset + key_len)?).ok()?;
            offset += key_len;

            let value_len =
                u16::from_le_bytes(buf.get(offset..offset + 2)?.try_into().ok()?) as usize;
            offset += 2;
            let value = core::str::from_utf8(buf.get(offset..offset + value_len)?).ok()?;
            offset += value_len;

            entries.insert(String::from(key), String::from(value));
        }

        Some(entries)
    }

    fn write_block(&mut self) -> Result<(), NvmError> {
        let mut buf = [0xFFu8; PREF_BLOCK_SIZE];
        buf[0..4].copy_from_slice(&PREF_MAGIC);
        buf[4..8].copy_from_slice(&PREF_VERSION.to_le_bytes());
        buf[8..12].copy_from_slice(&(self.entries.len() as u32).to_le_bytes());

        let mut offset = 12;
        let mut body = Vec::new();
        for (key, value) in &self.entries {
            body.push(key.len() as u8);
            body.extend_from_slice(key.as_bytes());
            body.extend_from_slice(&(value.len() as u16).to_le_bytes());
            body.extend_from_slice(value.as_bytes());
        }
        if offset + body.len() > PREF_BLOCK_SIZE - 4 {
            return Err(NvmError::CapacityExceeded);
        }
        buf[offset..offset + body.len()].copy_from_slice(&body);
        offset += body.len();
        // Zero-fill the gap so the CRC covers deterministic bytes.
        for b in buf[offset..PREF_BLOCK_SIZE - 4].iter_mut() {
            *b = 0;
        }

        let crc = crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC)
            .checksum(&buf[0..PREF_BLOCK_SIZE - 4]);
        buf[PREF_BLOCK_SIZE - 4..].copy_from_slice(&crc.to_le_bytes());

        self.flash
            .write(PREF_BLOCK_BASE, &buf)
            .map_err(|_| NvmError::WriteFailed)
    }
}

impl PreferenceStore for FlashPrefStore {
    fn is_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn get_string(&self, key: &str, default: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| String::from(default))
    }

    fn put_string(&mut self, key: &str, value: &str) -> Result<(), NvmError> {
        if key.len() > MAX_KEY_LEN || value.len() > u16::MAX as usize {
            return Err(NvmError::CapacityExceeded);
        }
        self.entries.insert(String::from(key), String::from(value));
        self.write_block()
    }
}
