//! Configuration surface consumed by the RustFavorites core.
//! RustFavorites 核心使用的設定介面。

pub mod preferences;

pub use preferences::{
    Preferences, PreferencesError, PreferencesStore, SharedPreferences, PREFERENCES_FILE,
};
