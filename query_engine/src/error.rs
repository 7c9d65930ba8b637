use snafu::Snafu;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("storage error: {}", source))]
    Storage { source: columnar_storage::Error },

    #[snafu(display("storage manager error: {}", source))]
    StorageManager { source: storage_manager::Error },

    #[snafu(display("type error: {}", source))]
    Type { source: columnar_types::Error },
}

impl From<columnar_storage::Error> for Error {
    fn from(source: columnar_storage::Error) -> Self {
        Self::Storage { source }
    }
}

impl From<storage_manager::Error> for Error {
    fn from(source: storage_manager::Error) -> Self {
        Self::StorageManager { source }
    }
}

impl From<columnar_types::Error> for Error {
    fn from(source: columnar_types::Error) -> Self {
        Self::Type { source }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
