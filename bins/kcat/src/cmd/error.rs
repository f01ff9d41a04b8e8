use kcat_api::ClientError;
use kcat_engine::EngineError;

#[derive(Debug, thiserror::Error)]
pub enum CatError {
    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Engine(#[from] EngineError),

    #[error("{0}")]
    Client(#[from] ClientError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("aborted by signal")]
    Aborted,
}
