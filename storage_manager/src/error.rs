use snafu::Snafu;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("no table named '{}' is registered", name))]
    TableNotFound { name: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
