use thiserror::Error;
use hlmrf_core::ReasonerError;

/// Model errors.
#[derive(Debug, Error)]
pub enum ModelError
{
    /// Error from the reasoner core.
    #[error(transparent)]
    Reasoner(#[from] ReasonerError),

    /// Atom name already registered.
    #[error("DuplicateAtom: atom {0:?} already exists")]
    DuplicateAtom(String),
    /// Atom id out of the store.
    #[error("UnknownAtom: atom {atom} is not in the store of {len} atoms")]
    UnknownAtom { atom: usize, len: usize },
    /// Atom value outside \[0, 1\] or not finite.
    #[error("AtomValueOutOfRange: value of atom {atom} must be in [0, 1]")]
    AtomValueOutOfRange { atom: usize },

    /// Malformed configuration.
    #[error("Config: {0}")]
    Config(#[from] toml::de::Error),
    #[error("Io: {0}")]
    Io(#[from] std::io::Error),
}
