use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

use super::setup::{find_tessdata_dir, find_tesseract_executable};
use crate::error::PlateError;

/// Characters a plate can contain.
pub const PLATE_WHITELIST: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Symbols Tesseract likes to hallucinate around plate borders.
pub const SYMBOL_BLACKLIST: &str = "|@#$%^&*()+={}[]\\:\";'<>?,./~`";

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// One Tesseract configuration: page segmentation mode plus a character
/// whitelist or blacklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionConfig {
    pub id: String,
    pub psm: u8,
    #[serde(default)]
    pub whitelist: Option<String>,
    #[serde(default)]
    pub blacklist: Option<String>,
}

impl RecognitionConfig {
    /// `--psm N` restricted to plate characters.
    pub fn whitelisted(psm: u8) -> Self {
        Self {
            id: format!("psm{}-whitelist", psm),
            psm,
            whitelist: Some(PLATE_WHITELIST.to_string()),
            blacklist: None,
        }
    }

    /// `--psm N` with border symbols suppressed.
    pub fn blacklisted(psm: u8) -> Self {
        Self {
            id: format!("psm{}-blacklist", psm),
            psm,
            whitelist: None,
            blacklist: Some(SYMBOL_BLACKLIST.to_string()),
        }
    }

    /// Command-line arguments for this configuration.
    pub fn tesseract_args(&self) -> Vec<String> {
        let mut args = vec!["--psm".to_string(), self.psm.to_string()];
        if let Some(whitelist) = &self.whitelist {
            args.push("-c".to_string());
            args.push(format!("tessedit_char_whitelist={}", whitelist));
        }
        if let Some(blacklist) = &self.blacklist {
            args.push("-c".to_string());
            args.push(format!("tessedit_char_blacklist={}", blacklist));
        }
        args
    }
}

/// Named sets of recognition configs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognitionProfile {
    /// Single word, single line, uniform block, raw line; all whitelisted
    #[default]
    Standard,
    /// As `Standard`, but the uniform-block pass uses the symbol blacklist
    Relaxed,
}

impl RecognitionProfile {
    pub fn configs(&self) -> Vec<RecognitionConfig> {
        match self {
            RecognitionProfile::Standard => vec![
                RecognitionConfig::whitelisted(8),
                RecognitionConfig::whitelisted(7),
                RecognitionConfig::whitelisted(6),
                RecognitionConfig::whitelisted(13),
            ],
            RecognitionProfile::Relaxed => vec![
                RecognitionConfig::whitelisted(8),
                RecognitionConfig::whitelisted(7),
                RecognitionConfig::blacklisted(6),
                RecognitionConfig::whitelisted(13),
            ],
        }
    }
}

/// One line of OCR text with its mean word confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLine {
    pub text: String,
    pub confidence: f32,
}

impl RawLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: 0.0,
        }
    }
}

/// Black-box OCR: image plus config in, zero or more lines out.
///
/// Implementations are shared across the worker threads of one image.
pub trait TextRecognizer: Send + Sync {
    fn recognize_text(
        &self,
        image: &GrayImage,
        config: &RecognitionConfig,
    ) -> Result<Vec<RawLine>, PlateError>;
}

/// `ocr` section of config.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Explicit tesseract binary. Searched for when unset.
    pub executable: Option<PathBuf>,
    /// Explicit tessdata directory. Searched for when unset.
    pub tessdata_dir: Option<PathBuf>,
    pub language: String,
    /// Upper bound for a single tesseract invocation
    pub timeout_ms: u64,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            executable: None,
            tessdata_dir: None,
            language: "eng".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Runs the `tesseract` CLI once per call.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    executable: PathBuf,
    tessdata_dir: Option<PathBuf>,
    language: String,
    timeout: Duration,
}

impl TesseractRecognizer {
    /// Resolves the executable and tessdata directory from `settings`.
    pub fn new(settings: &OcrSettings) -> anyhow::Result<Self> {
        let executable = find_tesseract_executable(settings.executable.as_deref())?;
        let tessdata_dir = match find_tessdata_dir(settings.tessdata_dir.as_deref(), &settings.language) {
            Ok(dir) => Some(dir),
            Err(e) => {
                crate::log(&format!("{}; relying on tesseract's built-in tessdata path", e));
                None
            }
        };
        Ok(Self::with_executable(executable, tessdata_dir, settings))
    }

    /// Builds a recognizer without any filesystem probing.
    pub fn with_executable(
        executable: PathBuf,
        tessdata_dir: Option<PathBuf>,
        settings: &OcrSettings,
    ) -> Self {
        Self {
            executable,
            tessdata_dir,
            language: settings.language.clone(),
            timeout: Duration::from_millis(settings.timeout_ms),
        }
    }

    fn build_command(&self, input: &Path, config: &RecognitionConfig) -> Command {
        let mut command = Command::new(&self.executable);
        command.arg(input).arg("stdout");
        if let Some(dir) = &self.tessdata_dir {
            command.arg("--tessdata-dir").arg(dir);
        }
        command
            .arg("-l")
            .arg(&self.language)
            .args(config.tesseract_args())
            .arg("tsv");
        command
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize_text(
        &self,
        image: &GrayImage,
        config: &RecognitionConfig,
    ) -> Result<Vec<RawLine>, PlateError> {
        let io_err = |e: std::io::Error| PlateError::OcrFailed(e.to_string());

        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png").map_err(io_err)?;
        image
            .save(temp_input.path())
            .map_err(|e| PlateError::OcrFailed(e.to_string()))?;

        // Output goes to files so a chatty child never blocks on a full pipe
        let stdout_file = NamedTempFile::new().map_err(io_err)?;
        let stderr_file = NamedTempFile::new().map_err(io_err)?;

        let mut child = self
            .build_command(temp_input.path(), config)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout_file.reopen().map_err(io_err)?))
            .stderr(Stdio::from(stderr_file.reopen().map_err(io_err)?))
            .spawn()
            .map_err(io_err)?;

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait().map_err(io_err)? {
                Some(status) => break status,
                None if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(PlateError::OcrTimeout(self.timeout));
                }
                None => std::thread::sleep(POLL_INTERVAL),
            }
        };

        if !status.success() {
            let stderr = std::fs::read_to_string(stderr_file.path()).unwrap_or_default();
            return Err(PlateError::OcrFailed(format!(
                "{} ({})",
                stderr.trim(),
                status
            )));
        }

        let tsv = std::fs::read_to_string(stdout_file.path()).map_err(io_err)?;
        Ok(parse_tsv_output(&tsv))
    }
}

/// Parses Tesseract TSV output into lines.
///
/// Word rows (level 5) are grouped by (block, paragraph, line); each line's
/// confidence is the mean of its word confidences.
pub fn parse_tsv_output(tsv: &str) -> Vec<RawLine> {
    let mut lines: Vec<RawLine> = Vec::new();
    let mut current_key: Option<(i32, i32, i32)> = None;
    let mut current_words: Vec<&str> = Vec::new();
    let mut current_conf_sum: f32 = 0.0;

    for row in tsv.lines().skip(1) {
        // Skip header
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        // TSV fields: level, page_num, block_num, par_num, line_num, word_num,
        //             left, top, width, height, conf, text
        let level: i32 = fields[0].parse().unwrap_or(-1);
        if level != 5 {
            continue;
        }

        let key = (
            fields[2].parse().unwrap_or(-1),
            fields[3].parse().unwrap_or(-1),
            fields[4].parse().unwrap_or(-1),
        );
        let conf: f32 = fields[10].trim().parse().unwrap_or(-1.0);
        let text = fields[11].trim();

        if text.is_empty() || conf < 0.0 {
            continue;
        }

        if current_key != Some(key) {
            push_line(&mut lines, &current_words, current_conf_sum);
            current_words.clear();
            current_conf_sum = 0.0;
            current_key = Some(key);
        }

        current_words.push(text);
        current_conf_sum += conf;
    }

    push_line(&mut lines, &current_words, current_conf_sum);
    lines
}

fn push_line(lines: &mut Vec<RawLine>, words: &[&str], conf_sum: f32) {
    if words.is_empty() {
        return;
    }
    lines.push(RawLine {
        text: words.join(" "),
        confidence: conf_sum / words.len() as f32,
    });
}
