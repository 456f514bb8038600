//! Text-file classification for imports
//!
//! Both remote tree entries and local directory entries pass through a
//! [`TextClassifier`] before they become project files.

/// Decides whether a path is likely to hold editable text.
pub trait TextClassifier: Send + Sync {
    fn is_likely_text(&self, path: &str, mime_type: Option<&str>) -> bool;
}

const TEXT_EXTENSIONS: &[&str] = &[
    "c", "cc", "cfg", "conf", "cpp", "cs", "css", "csv", "dart", "dockerfile", "env", "go",
    "gradle", "h", "hpp", "html", "htm", "ini", "java", "js", "json", "jsx", "kt", "less",
    "lock", "lua", "md", "mdx", "mjs", "php", "pl", "properties", "proto", "py", "r", "rb",
    "rs", "rst", "sass", "scala", "scss", "sh", "sql", "svelte", "svg", "swift", "tf", "toml",
    "ts", "tsx", "txt", "vue", "xml", "yaml", "yml", "zsh",
];

const TEXT_FILE_NAMES: &[&str] = &[
    ".editorconfig",
    ".env.example",
    ".gitattributes",
    ".gitignore",
    ".npmrc",
    ".prettierrc",
    "dockerfile",
    "license",
    "makefile",
    "procfile",
    "readme",
];

const TEXT_MIME_TYPES: &[&str] = &[
    "application/javascript",
    "application/json",
    "application/toml",
    "application/xml",
    "application/x-sh",
    "application/yaml",
    "image/svg+xml",
];

/// Classifier based on file extensions, well-known file names and MIME types.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtensionClassifier;

impl ExtensionClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl TextClassifier for ExtensionClassifier {
    fn is_likely_text(&self, path: &str, mime_type: Option<&str>) -> bool {
        if let Some(mime) = mime_type {
            let mime = mime.to_ascii_lowercase();
            if mime.starts_with("text/") || TEXT_MIME_TYPES.contains(&mime.as_str()) {
                return true;
            }
        }

        let file_name = path.rsplit('/').next().unwrap_or(path).to_ascii_lowercase();
        if TEXT_FILE_NAMES.contains(&file_name.as_str()) {
            return true;
        }

        match file_name.rfind('.') {
            Some(idx) if idx > 0 => TEXT_EXTENSIONS.contains(&&file_name[idx + 1..]),
            _ => false,
        }
    }
}
