use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot open image `{}`", .path.display())]
    OpenImage {
        path: PathBuf,
        #[source]
        source: romfs_format::Error,
    },

    #[error("Cannot resolve `{path}`")]
    Lookup {
        path: String,
        #[source]
        source: romfs_format::Error,
    },

    #[error("Refusing to write entry with unsafe name `{name}`")]
    UnsafeName { name: String },

    #[error("Cannot read image data for `{}`", .path.display())]
    ReadImage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create `{}`", .path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write `{}`", .path.display())]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot render listing")]
    Render {
        #[source]
        source: serde_json::Error,
    },
}
