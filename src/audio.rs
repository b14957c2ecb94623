use crate::error::{Result, SpectraChirpError};
use crate::wav::AudioBuffer;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, StreamConfig};
use std::sync::{Arc, Mutex};

pub const CAPTURE_SAMPLE_RATE: u32 = 48000;

pub struct AudioOutput {
    device: Device,
}

impl AudioOutput {
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| SpectraChirpError::AudioDevice("No output device found".into()))?;

        Ok(Self { device })
    }

    /// Play mono f32 samples at the given rate, blocking until done.
    pub fn play_samples(&self, samples: Vec<f32>, sample_rate: u32) -> Result<()> {
        let config = StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let samples = Arc::new(samples);
        let position = Arc::new(Mutex::new(0usize));
        let finished = Arc::new(Mutex::new(false));

        let samples_clone = Arc::clone(&samples);
        let position_clone = Arc::clone(&position);
        let finished_clone = Arc::clone(&finished);

        let stream = self
            .device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut pos = position_clone.lock().unwrap();

                    for sample in data.iter_mut() {
                        if *pos < samples_clone.len() {
                            *sample = samples_clone[*pos];
                            *pos += 1;
                        } else {
                            *sample = 0.0;
                            *finished_clone.lock().unwrap() = true;
                        }
                    }
                },
                |err| eprintln!("Audio output error: {}", err),
                None,
            )
            .map_err(|e| SpectraChirpError::AudioDevice(e.to_string()))?;

        stream
            .play()
            .map_err(|e| SpectraChirpError::AudioDevice(e.to_string()))?;

        loop {
            std::thread::sleep(std::time::Duration::from_millis(10));
            if *finished.lock().unwrap() {
                break;
            }
        }

        std::thread::sleep(std::time::Duration::from_millis(100));

        Ok(())
    }
}

pub struct AudioInput {
    device: Device,
    config: StreamConfig,
}

impl AudioInput {
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| SpectraChirpError::AudioDevice("No input device found".into()))?;

        let config = StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(CAPTURE_SAMPLE_RATE),
            buffer_size: cpal::BufferSize::Default,
        };

        Ok(Self { device, config })
    }

    /// Record mono audio from the default input device for a fixed duration.
    pub fn record_for(&self, duration_secs: u32) -> Result<AudioBuffer> {
        let num_samples = (CAPTURE_SAMPLE_RATE * duration_secs) as usize;
        let samples = Arc::new(Mutex::new(Vec::with_capacity(num_samples)));
        let samples_clone = Arc::clone(&samples);

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let mut samples = samples_clone.lock().unwrap();
                    samples.extend_from_slice(data);
                },
                |err| eprintln!("Audio input error: {}", err),
                None,
            )
            .map_err(|e| SpectraChirpError::AudioDevice(e.to_string()))?;

        stream
            .play()
            .map_err(|e| SpectraChirpError::AudioDevice(e.to_string()))?;

        std::thread::sleep(std::time::Duration::from_secs(duration_secs as u64));

        drop(stream);

        let captured = samples.lock().unwrap().clone();
        Ok(AudioBuffer::mono(captured, CAPTURE_SAMPLE_RATE))
    }
}

pub fn list_audio_devices() -> Vec<String> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    if let Ok(output_devices) = host.output_devices() {
        for device in output_devices {
            if let Ok(name) = device.name() {
                devices.push(format!("Output: {}", name));
            }
        }
    }

    if let Ok(input_devices) = host.input_devices() {
        for device in input_devices {
            if let Ok(name) = device.name() {
                devices.push(format!("Input: {}", name));
            }
        }
    }

    devices
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Stopped,
    Decoding,
}

/// One live-capture cycle: Idle -> Recording -> Stopped -> Decoding -> Idle.
/// Out-of-order transitions are rejected rather than silently ignored.
#[derive(Debug)]
pub struct RecorderSession {
    state: RecorderState,
    captured: Option<AudioBuffer>,
}

impl RecorderSession {
    pub fn new() -> Self {
        Self {
            state: RecorderState::Idle,
            captured: None,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn start(&mut self) -> Result<()> {
        self.expect(RecorderState::Idle, "start")?;
        self.state = RecorderState::Recording;
        Ok(())
    }

    /// Stop recording. Further capture is discarded; `buffer` is what the
    /// decode step will see.
    pub fn stop(&mut self, buffer: AudioBuffer) -> Result<()> {
        self.expect(RecorderState::Recording, "stop")?;
        self.captured = Some(buffer);
        self.state = RecorderState::Stopped;
        Ok(())
    }

    pub fn begin_decode(&mut self) -> Result<AudioBuffer> {
        self.expect(RecorderState::Stopped, "begin_decode")?;
        let buffer = self.captured.take().ok_or_else(|| {
            SpectraChirpError::RecorderState("no captured audio to decode".into())
        })?;
        self.state = RecorderState::Decoding;
        Ok(buffer)
    }

    pub fn finish(&mut self) -> Result<()> {
        self.expect(RecorderState::Decoding, "finish")?;
        self.state = RecorderState::Idle;
        Ok(())
    }

    fn expect(&self, wanted: RecorderState, operation: &str) -> Result<()> {
        if self.state != wanted {
            return Err(SpectraChirpError::RecorderState(format!(
                "{} called in state {:?}",
                operation, self.state
            )));
        }
        Ok(())
    }
}

impl Default for RecorderSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture() -> AudioBuffer {
        AudioBuffer::mono(vec![0.0, 0.1, -0.1], CAPTURE_SAMPLE_RATE)
    }

    #[test]
    fn test_recorder_full_cycle() {
        let mut session = RecorderSession::new();
        assert_eq!(session.state(), RecorderState::Idle);

        session.start().unwrap();
        assert_eq!(session.state(), RecorderState::Recording);

        session.stop(capture()).unwrap();
        assert_eq!(session.state(), RecorderState::Stopped);

        let buffer = session.begin_decode().unwrap();
        assert_eq!(buffer.sample_count(), 3);
        assert_eq!(session.state(), RecorderState::Decoding);

        session.finish().unwrap();
        assert_eq!(session.state(), RecorderState::Idle);

        // session is reusable after a full cycle
        session.start().unwrap();
    }

    #[test]
    fn test_recorder_rejects_out_of_order_transitions() {
        let mut session = RecorderSession::new();
        assert!(session.stop(capture()).is_err());
        assert!(session.begin_decode().is_err());
        assert!(session.finish().is_err());

        session.start().unwrap();
        assert!(session.start().is_err());
        assert!(session.finish().is_err());
    }
}
