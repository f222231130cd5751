#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error("codec: {0}")]
    Codec(#[from] transform_api::CodecError),

    #[error("{0}")]
    Transform(#[from] transform_engine::TransformError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
