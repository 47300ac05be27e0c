use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
#[error("Error loading settings{}: {message}", from_path(.path))]
pub struct SettingsError {
    pub path: Option<PathBuf>,
    pub message: String,
}

fn from_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|path| format!(" from {path:?}"))
        .unwrap_or_default()
}
