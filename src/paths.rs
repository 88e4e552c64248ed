use std::path::PathBuf;
use std::sync::OnceLock;

static EXE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the directory containing the executable.
pub fn get_exe_dir() -> &'static PathBuf {
    EXE_DIR.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Returns the logs directory: `<exe_dir>/logs/`
pub fn get_logs_dir() -> PathBuf {
    get_exe_dir().join("logs")
}

/// Returns the default log file: `<exe_dir>/logs/plate_restriction.log`
pub fn get_default_log_file() -> PathBuf {
    get_logs_dir().join("plate_restriction.log")
}

/// Returns the default config file: `<exe_dir>/config.json`
pub fn get_default_config_file() -> PathBuf {
    get_exe_dir().join("config.json")
}

/// Returns the local data directory used for downloaded traineddata:
/// `<data_local_dir>/plate-restriction/tessdata/`
pub fn get_local_tessdata_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("plate-restriction")
        .join("tessdata")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_rooted_at_exe_dir() {
        let exe_dir = get_exe_dir();
        assert!(get_logs_dir().starts_with(exe_dir));
        assert!(get_default_config_file().starts_with(exe_dir));
        assert_eq!(
            get_default_log_file().file_name().unwrap(),
            "plate_restriction.log"
        );
    }

    #[test]
    fn test_local_tessdata_dir_is_namespaced() {
        let dir = get_local_tessdata_dir();
        assert!(dir.ends_with("plate-restriction/tessdata"));
    }
}
