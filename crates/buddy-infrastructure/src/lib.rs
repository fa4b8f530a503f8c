pub mod profile_store;
pub mod uploaded_file;

pub use profile_store::TomlProfileStore;
pub use uploaded_file::UploadedFile;
