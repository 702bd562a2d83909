#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("name is {len} code units long, the limit is 256")]
    TooLong { len: usize },

    #[error("character {ch:?} is outside the Latin-1 range the image names use")]
    Unrepresentable { ch: char },

    #[error("empty name")]
    Empty,
}

