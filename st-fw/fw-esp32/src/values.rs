//! This CPU's synchronized values.
//!
//! The audio controller owns the analysis outputs (sound state, band
//! levels, dominant band, connected source) and follows the user settings
//! the interface CPU owns (volume, band gain). Settings persist to flash;
//! analysis values are transient by design.

extern crate alloc;

use alloc::rc::Rc;
use core::cell::RefCell;

use fw_core::SerialMessageManager;
use st_model::{BtDeviceInfo, CommitMode, MaxBandFrame, ProcessedSoundFrame, RxTxPolicy};
use st_shared::PreferenceStore;
use st_sync::{DataItem, DataItemWithPreferences, ValidValueChecker};

/// Heartbeat period of the sound-state value.
const SOUND_STATE_RATE_MS: u64 = 100;

/// Band level transmit period.
const BAND_LEVEL_RATE_MS: u64 = 50;

/// Volume steps offered by the interface CPU.
const VOLUME_STEPS: [&str; 5] = ["0", "25", "50", "75", "100"];

/// Every value this CPU synchronizes, shared with the engine loop.
pub struct TowerValues {
    /// Overall analysis frame; heartbeat keeps the LED CPU's watchdog fed.
    pub sound_state: Rc<RefCell<DataItem<ProcessedSoundFrame, 1>>>,
    /// Eight frequency band levels for the tower rendering.
    pub band_levels: Rc<RefCell<DataItem<f32, 8>>>,
    /// Dominant band of the last frame.
    pub max_band: Rc<RefCell<DataItem<MaxBandFrame, 1>>>,
    /// Currently connected Bluetooth source.
    pub bt_source: Rc<RefCell<DataItem<BtDeviceInfo, 1>>>,
    /// User volume, stepped, persisted.
    pub volume: Rc<RefCell<DataItemWithPreferences<i32, 1>>>,
    /// Per-band gain applied before analysis, persisted.
    pub band_gain: Rc<RefCell<DataItemWithPreferences<f32, 1>>>,
}

/// Construct and register this CPU's values on `manager`'s link.
pub fn declare_values(
    manager: &mut SerialMessageManager,
    store: Rc<RefCell<dyn PreferenceStore>>,
) -> TowerValues {
    let sound_state = Rc::new(RefCell::new(DataItem::new(
        "SoundState",
        [ProcessedSoundFrame::default()],
        RxTxPolicy::TxOnChangeWithHeartbeat,
        SOUND_STATE_RATE_MS,
        manager.sender(),
    )));

    let band_levels = Rc::new(RefCell::new(DataItem::new(
        "BandLevels",
        [0.0f32; 8],
        RxTxPolicy::TxPeriodic,
        BAND_LEVEL_RATE_MS,
        manager.sender(),
    )));

    let max_band = Rc::new(RefCell::new(DataItem::new(
        "MaxBand",
        [MaxBandFrame::default()],
        RxTxPolicy::TxOnChange,
        0,
        manager.sender(),
    )));

    let bt_source = Rc::new(RefCell::new(DataItem::new(
        "BtSource",
        [BtDeviceInfo::default()],
        RxTxPolicy::TxOnChange,
        0,
        manager.sender(),
    )));

    let volume = Rc::new(RefCell::new(DataItemWithPreferences::new(
        DataItem::new("Volume", [50i32], RxTxPolicy::RxEcho, 0, manager.sender())
            .with_commit_mode(CommitMode::OnReceive)
            .with_validator(ValidValueChecker::new(VOLUME_STEPS)),
        store.clone(),
    )));

    let band_gain = Rc::new(RefCell::new(DataItemWithPreferences::new(
        DataItem::new("BandGain", [1.0f32], RxTxPolicy::RxOnly, 0, manager.sender())
            .with_commit_mode(CommitMode::OnReceive),
        store,
    )));

    manager.register(sound_state.clone());
    manager.register(band_levels.clone());
    manager.register(max_band.clone());
    manager.register(bt_source.clone());
    manager.register(volume.clone());
    manager.register(band_gain.clone());

    TowerValues {
        sound_state,
        band_levels,
        max_band,
        bt_source,
        volume,
        band_gain,
    }
}
