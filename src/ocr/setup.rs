use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::engine::OcrSettings;
use crate::log;
use crate::paths::get_local_tessdata_dir;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";

const COMMON_EXECUTABLES: [&str; 5] = [
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
];

const COMMON_TESSDATA_DIRS: [&str; 8] = [
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    "/opt/homebrew/share/tessdata",
    "/usr/local/share/tesseract-ocr/tessdata",
    r"C:\Program Files\Tesseract-OCR\tessdata",
    r"C:\Program Files (x86)\Tesseract-OCR\tessdata",
];

#[derive(Debug, Clone)]
pub struct TesseractPaths {
    pub executable: PathBuf,
    pub tessdata: PathBuf,
}

fn traineddata_file(language: &str) -> String {
    format!("{}.traineddata", language)
}

fn has_traineddata(dir: &Path, language: &str) -> bool {
    dir.join(traineddata_file(language)).exists()
}

/// Finds the Tesseract executable: configured path, then PATH, then common
/// install locations.
pub fn find_tesseract_executable(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(anyhow!(
            "Configured tesseract executable not found: {}",
            path.display()
        ));
    }

    // Check PATH
    if let Ok(output) = std::process::Command::new("tesseract")
        .arg("--version")
        .output()
    {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    COMMON_EXECUTABLES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .ok_or_else(|| anyhow!("Tesseract not found. Please install Tesseract-OCR."))
}

/// Finds a tessdata directory holding `<language>.traineddata`.
pub fn find_tessdata_dir(configured: Option<&Path>, language: &str) -> Result<PathBuf> {
    if let Some(dir) = configured {
        if has_traineddata(dir, language) {
            return Ok(dir.to_path_buf());
        }
        return Err(anyhow!(
            "Configured tessdata directory has no {}: {}",
            traineddata_file(language),
            dir.display()
        ));
    }

    let local = get_local_tessdata_dir();
    if has_traineddata(&local, language) {
        return Ok(local);
    }

    // Check TESSDATA_PREFIX environment variable
    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let p = PathBuf::from(&prefix);
        if has_traineddata(&p, language) {
            return Ok(p);
        }
        let p = p.join("tessdata");
        if has_traineddata(&p, language) {
            return Ok(p);
        }
    }

    COMMON_TESSDATA_DIRS
        .iter()
        .map(PathBuf::from)
        .find(|p| has_traineddata(p, language))
        .ok_or_else(|| {
            anyhow!(
                "tessdata directory not found. Please ensure {} is available.",
                traineddata_file(language)
            )
        })
}

/// Locates Tesseract and makes sure the configured language data exists,
/// downloading it into the local data directory if necessary.
pub fn ensure_tesseract(settings: &OcrSettings) -> Result<TesseractPaths> {
    let executable = find_tesseract_executable(settings.executable.as_deref())?;
    log(&format!("Tesseract found at: {}", executable.display()));

    let tessdata = match find_tessdata_dir(settings.tessdata_dir.as_deref(), &settings.language) {
        Ok(dir) => dir,
        Err(_) if settings.tessdata_dir.is_none() => {
            log(&format!(
                "{} not found locally, downloading...",
                traineddata_file(&settings.language)
            ));
            let dir = get_local_tessdata_dir();
            download_tessdata(&dir, &settings.language)?;
            dir
        }
        Err(e) => return Err(e),
    };

    log(&format!("Tessdata ready at: {}", tessdata.display()));

    Ok(TesseractPaths {
        executable,
        tessdata,
    })
}

/// Downloads `<language>.traineddata` from the tessdata repository.
fn download_tessdata(tessdata_dir: &Path, language: &str) -> Result<()> {
    fs::create_dir_all(tessdata_dir)
        .with_context(|| format!("Failed to create {}", tessdata_dir.display()))?;

    let file_name = traineddata_file(language);
    let url = format!("{}/{}", TESSDATA_REPO, file_name);
    let target = tessdata_dir.join(&file_name);

    log(&format!("Downloading {}...", file_name));

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&url)
        .header("User-Agent", "plate-restriction")
        .send()?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download {}: HTTP {}",
            file_name,
            response.status()
        ));
    }

    let bytes = response.bytes()?;
    let mut file = fs::File::create(&target)
        .with_context(|| format!("Failed to create {}", target.display()))?;
    file.write_all(&bytes)?;

    log(&format!("Downloaded {} ({} bytes)", file_name, bytes.len()));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_configured_executable_must_exist() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("tesseract");
        assert!(find_tesseract_executable(Some(&missing)).is_err());

        fs::write(&missing, b"").unwrap();
        assert_eq!(find_tesseract_executable(Some(&missing)).unwrap(), missing);
    }

    #[test]
    fn test_configured_tessdata_needs_language_file() {
        let dir = tempdir().unwrap();
        assert!(find_tessdata_dir(Some(dir.path()), "eng").is_err());

        fs::write(dir.path().join("eng.traineddata"), b"").unwrap();
        assert_eq!(
            find_tessdata_dir(Some(dir.path()), "eng").unwrap(),
            dir.path()
        );
        assert!(find_tessdata_dir(Some(dir.path()), "spa").is_err());
    }

    #[test]
    fn test_configured_tessdata_is_never_downloaded_into() {
        let dir = tempdir().unwrap();
        let exe = dir.path().join("tesseract");
        fs::write(&exe, b"").unwrap();

        let settings = OcrSettings {
            executable: Some(exe),
            tessdata_dir: Some(dir.path().join("empty")),
            ..OcrSettings::default()
        };
        assert!(ensure_tesseract(&settings).is_err());
        assert!(!dir.path().join("empty").exists());
    }
}
