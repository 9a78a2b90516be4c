use engine::common::ObserverError;
use engine::model::Theme;
use engine::theme_source::{ClassListSignal, ThemeSignal};
use std::path::PathBuf;

/// Theme signal read from a file.
///
/// The file holds either a bare `light`/`dark` or a class attribute value that
/// is classified by the light class, like the page root element would be.
#[derive(Debug, Clone)]
pub struct FileThemeSignal {
    path: PathBuf,
    light_class: String,
}

impl FileThemeSignal {
    pub fn new(path: impl Into<PathBuf>, light_class: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            light_class: light_class.into(),
        }
    }
}

impl ThemeSignal for FileThemeSignal {
    fn read(&self) -> Result<Theme, ObserverError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            ObserverError::Unreadable(format!("{}: {e}", self.path.display()))
        })?;

        let content = content.trim();
        let theme = match content.to_lowercase().as_str() {
            "light" => Theme::Light,
            "dark" => Theme::Dark,
            _ => ClassListSignal::classify(content, &self.light_class),
        };
        Ok(theme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims::{assert_err, assert_ok_eq};

    #[test]
    fn test_reads_plain_and_class_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("theme");
        let signal = FileThemeSignal::new(&path, "hope-ui-light");

        std::fs::write(&path, "Light\n").unwrap();
        assert_ok_eq!(signal.read(), Theme::Light);

        std::fs::write(&path, "hope-ui hope-ui-light").unwrap();
        assert_ok_eq!(signal.read(), Theme::Light);

        std::fs::write(&path, "hope-ui").unwrap();
        assert_ok_eq!(signal.read(), Theme::Dark);
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let signal = FileThemeSignal::new(dir.path().join("absent"), "hope-ui-light");
        assert_err!(signal.read());
    }
}
