use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpectraChirpError {
    #[error("Invalid audio buffer: {0}")]
    InvalidAudioBuffer(String),

    #[error("Invalid WAV data: {0}")]
    InvalidWav(String),

    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Server error ({status}): {detail}")]
    Api { status: u16, detail: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Recorder state error: {0}")]
    RecorderState(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SpectraChirpError>;
