//! Prompt form state.
//!
//! The form moves `idle -> submitting -> {image | unrecognized | error}` and
//! back to submitting on the next submit. Nothing here survives the process.

pub const GENERIC_FAILURE: &str = "Failed to generate image";
pub const SRC_PREVIEW_CHARS: usize = 96;
pub const UNRECOGNIZED_FORMAT: &str =
    "Image generated but response format is unrecognized. Check debug info.";

/// A displayable image found in a proxy response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedImage {
    Base64(String),
    Url(String),
}

impl GeneratedImage {
    /// Value usable as an image source.
    pub fn src(&self) -> String {
        match self {
            GeneratedImage::Base64(data) => format!("data:image/png;base64,{}", data),
            GeneratedImage::Url(url) => url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    RecognizedImage(GeneratedImage),
    UnrecognizedPayload(serde_json::Value),
}

/// Probe a successful response for an image: the first base64 entry wins over
/// a direct URL.
pub fn probe_payload(payload: serde_json::Value) -> GenerationOutcome {
    let data = payload.get("data");

    let base64 = data
        .and_then(|d| d.get("binary_data_base64"))
        .and_then(serde_json::Value::as_array)
        .and_then(|images| images.first())
        .and_then(serde_json::Value::as_str)
        .filter(|b64| !b64.is_empty());
    if let Some(b64) = base64 {
        return GenerationOutcome::RecognizedImage(GeneratedImage::Base64(b64.to_string()));
    }

    let url = data
        .and_then(|d| d.get("image_url"))
        .and_then(serde_json::Value::as_str)
        .filter(|url| !url.is_empty());
    if let Some(url) = url {
        return GenerationOutcome::RecognizedImage(GeneratedImage::Url(url.to_string()));
    }

    GenerationOutcome::UnrecognizedPayload(payload)
}

/// What a round trip to the proxy produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// 2xx with a JSON body.
    Success(serde_json::Value),
    /// Non-2xx; carries the server's `error` message when there was one.
    Rejected(Option<String>),
    /// The request never produced a usable response.
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Idle,
    Submitting,
    Image,
    Unrecognized,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub prompt: String,
    pub loading: bool,
    pub image: Option<GeneratedImage>,
    pub error: Option<String>,
    pub debug_info: Option<String>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Editing stays allowed while a request is in flight.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn can_submit(&self) -> bool {
        !self.loading && !self.prompt.trim().is_empty()
    }

    /// Start a submission. Returns the prompt to send, or `None` when
    /// submitting is currently disabled.
    pub fn begin_submit(&mut self) -> Option<String> {
        if !self.can_submit() {
            return None;
        }
        self.loading = true;
        self.error = None;
        self.image = None;
        self.debug_info = None;
        Some(self.prompt.clone())
    }

    /// Apply the result of a round trip. Always clears the in-flight flag.
    pub fn settle(&mut self, settlement: Settlement) {
        match settlement {
            Settlement::Success(payload) => {
                self.debug_info = Some(
                    serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string()),
                );
                match probe_payload(payload) {
                    GenerationOutcome::RecognizedImage(image) => self.image = Some(image),
                    GenerationOutcome::UnrecognizedPayload(raw) => {
                        tracing::warn!("Unexpected response structure: {}", raw);
                        self.error = Some(UNRECOGNIZED_FORMAT.to_string());
                    }
                }
            }
            Settlement::Rejected(message) => {
                self.error = Some(message.unwrap_or_else(|| GENERIC_FAILURE.to_string()));
            }
            Settlement::Failed(message) => {
                self.error = Some(message);
            }
        }
        self.loading = false;
    }

    pub fn phase(&self) -> FormPhase {
        if self.loading {
            FormPhase::Submitting
        } else if self.image.is_some() {
            FormPhase::Image
        } else if self.error.is_some() && self.debug_info.is_some() {
            FormPhase::Unrecognized
        } else if self.error.is_some() {
            FormPhase::Error
        } else {
            FormPhase::Idle
        }
    }

    /// Settled with an image and no error.
    pub fn succeeded(&self) -> bool {
        !self.loading && self.image.is_some() && self.error.is_none()
    }

    /// Text rendering of the visible panels. Image sources are cut to their
    /// first `SRC_PREVIEW_CHARS` characters; the debug panel is shown when
    /// asked for or when there is no image to show.
    pub fn render(&self, show_debug: bool) -> String {
        let mut out = String::new();
        if self.loading {
            out.push_str("Generating...\n");
            return out;
        }
        if let Some(error) = &self.error {
            out.push_str(&format!("Error: {}\n", error));
        }
        if let Some(image) = &self.image {
            let src = image.src();
            let total = src.chars().count();
            if total > SRC_PREVIEW_CHARS {
                let head: String = src.chars().take(SRC_PREVIEW_CHARS).collect();
                out.push_str(&format!("Result: {}... ({} chars)\n", head, total));
            } else {
                out.push_str(&format!("Result: {}\n", src));
            }
        }
        if let Some(debug) = &self.debug_info {
            if show_debug || self.image.is_none() {
                out.push_str("Debug Info (API Response):\n");
                out.push_str(debug);
                out.push('\n');
            }
        }
        out
    }
}
