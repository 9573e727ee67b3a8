pub mod batch;
pub mod downloader;
pub mod library;

pub use batch::{BatchDownloader, FetchJob};
pub use downloader::{ArtifactStore, FetchedArtifact};
pub use library::{
    download_libraries, download_natives, library_path, native_path, should_include, split_name,
    NativeArchive,
};
