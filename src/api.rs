use crate::error::{Result, SpectraChirpError};
use crate::{ModemMode, MODEM_NAME};
use log::debug;
use reqwest::blocking::{multipart, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    text: &'a str,
    modem: &'a str,
    mode: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecodeResponse {
    pub decoded_text: String,
    pub detected_mode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    detail: String,
}

/// HTTP client for the SpectraChirp signal service.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(format!("spectrachirp/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Ask the service to modulate `text` into an audio signal. Returns the
    /// WAV byte stream from the response body.
    pub fn generate_signal(&self, text: &str, mode: ModemMode) -> Result<Vec<u8>> {
        let url = format!("{}/generate_signal", self.base_url);
        debug!("POST {} (mode {})", url, mode);

        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest {
                text,
                modem: MODEM_NAME,
                mode: mode.wire_name(),
            })
            .send()?;

        if !response.status().is_success() {
            return Err(error_from_response(response));
        }

        Ok(response.bytes()?.to_vec())
    }

    /// Upload a WAV byte stream for demodulation. `file_name` is the name
    /// the service sees in the multipart `file` field.
    pub fn decode_signal(&self, wav_bytes: Vec<u8>, file_name: &str) -> Result<DecodeResponse> {
        let url = format!("{}/decode_signal", self.base_url);
        debug!("POST {} ({} bytes as {})", url, wav_bytes.len(), file_name);

        let part = multipart::Part::bytes(wav_bytes)
            .file_name(file_name.to_string())
            .mime_str("audio/wav")?;
        let form = multipart::Form::new().part("file", part);

        let response = self.client.post(&url).multipart(form).send()?;

        if !response.status().is_success() {
            return Err(error_from_response(response));
        }

        Ok(response.json()?)
    }
}

fn error_from_response(response: reqwest::blocking::Response) -> SpectraChirpError {
    let status = response.status().as_u16();
    let detail = response
        .json::<ErrorDetail>()
        .map(|e| e.detail)
        .unwrap_or_else(|_| format!("HTTP error {}", status));

    SpectraChirpError::Api { status, detail }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_stripped() {
        let client = ApiClient::new("http://127.0.0.1:8001/").unwrap();
        assert_eq!(client.base_url, "http://127.0.0.1:8001");
    }

    #[test]
    fn test_generate_request_serializes_expected_shape() {
        let request = GenerateRequest {
            text: "hello",
            modem: MODEM_NAME,
            mode: ModemMode::Fast.wire_name(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "text": "hello", "modem": "mfsk", "mode": "FAST" })
        );
    }

    #[test]
    fn test_decode_response_tolerates_missing_mode() {
        let response: DecodeResponse =
            serde_json::from_str(r#"{"decoded_text": "hi"}"#).unwrap();
        assert_eq!(response.decoded_text, "hi");
        assert!(response.detected_mode.is_none());
    }
}
