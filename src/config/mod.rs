mod loader;

pub use loader::{load_settings, Settings, CONFIG_FILE_NAME};
