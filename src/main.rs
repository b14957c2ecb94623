use anyhow::Result;
use clap::{Parser, Subcommand};
use spectrachirp_client::{
    api::{ApiClient, DecodeResponse},
    audio::{list_audio_devices, AudioInput, AudioOutput, RecorderSession},
    wav::{decode_wav, encode_wav},
    ModemMode, DEFAULT_RECORD_SECS, DEFAULT_SERVER_URL, LIVE_RECORDING_FILE_NAME,
};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "spectrachirp")]
#[command(about = "Client for the SpectraChirp MFSK acoustic modem service", long_about = None)]
#[command(version)]
struct Cli {
    /// Signal service base URL
    #[arg(long, global = true, env = "SPECTRACHIRP_SERVER", default_value = DEFAULT_SERVER_URL)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an audio signal from text
    Send {
        /// Text to encode (if not provided, reads from stdin)
        text: Option<String>,

        /// Modem mode
        #[arg(long, short, value_enum, default_value_t = ModemMode::Default)]
        mode: ModemMode,

        /// Where to write the generated WAV
        #[arg(long, short, default_value = "modem_signal.wav")]
        output: PathBuf,

        /// Play the signal after saving it
        #[arg(long)]
        play: bool,
    },

    /// Play back a generated WAV file
    Play {
        /// Path to the WAV file
        file: PathBuf,
    },

    /// Upload a WAV file and decode it back into text
    Decode {
        /// Path to the WAV file
        file: PathBuf,

        /// Write the decoded text to a file instead of stdout
        #[arg(long)]
        to_file: Option<PathBuf>,
    },

    /// Record from the microphone and decode the capture
    Listen {
        /// Recording duration in seconds
        #[arg(long, short, default_value_t = DEFAULT_RECORD_SECS)]
        duration: u32,
    },

    /// List available audio devices
    Devices,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Send {
            text,
            mode,
            output,
            play,
        } => {
            let message = match text {
                Some(t) => t,
                None => {
                    let mut buffer = String::new();
                    io::stdin().read_to_string(&mut buffer)?;
                    buffer
                }
            };

            if message.trim().is_empty() {
                eprintln!("Error: Please enter a message!");
                std::process::exit(1);
            }

            send_message(&cli.server, message.trim(), mode, &output, play)?;
        }

        Commands::Play { file } => {
            play_file(&file)?;
        }

        Commands::Decode { file, to_file } => {
            let result = decode_file(&cli.server, &file)?;
            match to_file {
                Some(path) => {
                    fs::write(&path, &result.decoded_text)?;
                    eprintln!("Saved decoded text to {}", path.display());
                    if let Some(mode) = &result.detected_mode {
                        eprintln!("Detected mode: {}", mode);
                    }
                }
                None => print_decoded(&result),
            }
        }

        Commands::Listen { duration } => {
            let result = listen_and_decode(&cli.server, duration)?;
            print_decoded(&result);
        }

        Commands::Devices => {
            println!("Available audio devices:");
            for device in list_audio_devices() {
                println!("  {}", device);
            }
        }
    }

    Ok(())
}

fn send_message(
    server: &str,
    message: &str,
    mode: ModemMode,
    output: &Path,
    play: bool,
) -> Result<()> {
    eprintln!("Generating signal ({} mode)...", mode);

    let client = ApiClient::new(server)?;
    let wav_bytes = client.generate_signal(message, mode)?;
    eprintln!("Received {} bytes of audio", wav_bytes.len());

    fs::write(output, &wav_bytes)?;
    eprintln!("Saved to {}", output.display());

    if play {
        let (samples, sample_rate) = decode_wav(&wav_bytes)?;
        eprintln!(
            "Playing {:.1} s of audio...",
            samples.len() as f32 / sample_rate as f32
        );
        let audio_output = AudioOutput::new()?;
        audio_output.play_samples(samples, sample_rate)?;
    }

    Ok(())
}

fn play_file(file: &Path) -> Result<()> {
    let wav_bytes = fs::read(file)?;
    let (samples, sample_rate) = decode_wav(&wav_bytes)?;

    eprintln!(
        "Playing {} ({:.1} s)...",
        file.display(),
        samples.len() as f32 / sample_rate as f32
    );
    let audio_output = AudioOutput::new()?;
    audio_output.play_samples(samples, sample_rate)?;

    Ok(())
}

fn decode_file(server: &str, file: &Path) -> Result<DecodeResponse> {
    let wav_bytes = fs::read(file)?;
    eprintln!("Uploading {} ({} bytes)...", file.display(), wav_bytes.len());

    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| LIVE_RECORDING_FILE_NAME.to_string());

    let client = ApiClient::new(server)?;
    Ok(client.decode_signal(wav_bytes, &file_name)?)
}

fn listen_and_decode(server: &str, duration_secs: u32) -> Result<DecodeResponse> {
    let mut session = RecorderSession::new();

    eprintln!("Recording for {} seconds...", duration_secs);
    session.start()?;

    let audio_input = AudioInput::new()?;
    let capture = audio_input.record_for(duration_secs)?;
    session.stop(capture)?;

    let buffer = session.begin_decode()?;
    eprintln!("Recorded {} samples, decoding...", buffer.sample_count());

    let wav_bytes = encode_wav(&buffer)?;

    let client = ApiClient::new(server)?;
    let result = client.decode_signal(wav_bytes, LIVE_RECORDING_FILE_NAME)?;

    session.finish()?;
    Ok(result)
}

fn print_decoded(result: &DecodeResponse) {
    if result.decoded_text.is_empty() {
        eprintln!("No message decoded.");
        return;
    }

    println!("{}", result.decoded_text);
    if let Some(mode) = &result.detected_mode {
        eprintln!("Detected mode: {}", mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_play_subcommand_parses() {
        let cli = Cli::try_parse_from(["spectrachirp", "play", "signal.wav"]).unwrap();
        assert!(
            matches!(cli.command, Commands::Play { file } if file == PathBuf::from("signal.wav"))
        );
    }

    #[test]
    fn test_decode_to_file_parses() {
        let cli =
            Cli::try_parse_from(["spectrachirp", "decode", "in.wav", "--to-file", "out.txt"])
                .unwrap();
        match cli.command {
            Commands::Decode { file, to_file } => {
                assert_eq!(file, PathBuf::from("in.wav"));
                assert_eq!(to_file, Some(PathBuf::from("out.txt")));
            }
            _ => panic!("expected decode subcommand"),
        }
    }
}
