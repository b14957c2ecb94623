pub mod api;
pub mod audio;
pub mod error;
pub mod wav;

pub use api::*;
pub use audio::*;
pub use error::*;
pub use wav::*;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8001";
pub const DEFAULT_RECORD_SECS: u32 = 5;
pub const MODEM_NAME: &str = "mfsk";
pub const LIVE_RECORDING_FILE_NAME: &str = "live_recording.wav";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ModemMode {
    Default,
    Fast,
    Robust,
}

impl ModemMode {
    /// Mode name as the signal service expects it.
    pub fn wire_name(&self) -> &'static str {
        match self {
            ModemMode::Default => "DEFAULT",
            ModemMode::Fast => "FAST",
            ModemMode::Robust => "ROBUST",
        }
    }
}

// Display must match the clap value names so default_value_t round-trips.
impl std::fmt::Display for ModemMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ModemMode::Default => "default",
            ModemMode::Fast => "fast",
            ModemMode::Robust => "robust",
        };
        f.write_str(name)
    }
}
