use std::path::PathBuf;

pub type Result<T, E = ProvisionError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("unable to find {marker} root directory above {}", start.display())]
    RootNotFound { marker: String, start: PathBuf },

    #[error("duplicate asset local name {name:?}")]
    DuplicateAsset { name: String },

    #[error("unsupported url {url:?} (expected http or https)")]
    UnsupportedUrl { url: String },

    #[error("GET {url}")]
    Network {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("GET {url}: HTTP {status}")]
    Http { url: String, status: u16 },

    #[error("read zip archive {}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("invalid archive entry {entry:?} in {}", path.display())]
    UnsafeArchiveEntry { path: PathBuf, entry: String },

    #[error("archive {} has no single top-level directory (found {roots:?})", path.display())]
    AmbiguousArchiveLayout { path: PathBuf, roots: Vec<String> },

    #[error("missing input {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("spawn {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with code {code}")]
    ProcessFailed { program: String, code: i32 },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ProvisionError {
    /// Exit code the whole run should terminate with when this error is fatal.
    pub fn exit_code(&self) -> i32 {
        match self {
            ProvisionError::ProcessFailed { code, .. } => *code,
            _ => 2,
        }
    }
}

pub(crate) trait IoResultExt<T> {
    fn with_io_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_io_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|source| ProvisionError::Io {
            context: f(),
            source,
        })
    }
}
