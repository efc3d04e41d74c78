use serde::Deserialize;
use tracing_core::LevelFilter;

/// A deserializable counterpart of the `tracing` crate’s [`LevelFilter`].
///
/// A verbosity level is “higher” if it is more verbose: [`Trace`](Verbosity::Trace)
/// is higher than [`Error`](Verbosity::Error).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    /// Log **nothing**.
    #[serde(alias = "no", alias = "none")]
    Off,

    /// Log errors only.
    #[serde(alias = "err")]
    Error,

    /// Log warnings and errors.
    #[serde(alias = "warning")]
    Warn,

    /// Log informational events and everything less verbose.
    #[default]
    Info,

    /// Log debug events and everything less verbose.
    Debug,

    /// Log **everything**.
    Trace,
}

impl Verbosity {
    /// Translates this [`Verbosity`] into a [`LevelFilter`].
    pub const fn level_filter(&self) -> LevelFilter {
        match self {
            Self::Off => LevelFilter::OFF,
            Self::Error => LevelFilter::ERROR,
            Self::Warn => LevelFilter::WARN,
            Self::Info => LevelFilter::INFO,
            Self::Debug => LevelFilter::DEBUG,
            Self::Trace => LevelFilter::TRACE,
        }
    }
}

impl From<Verbosity> for LevelFilter {
    fn from(value: Verbosity) -> Self {
        value.level_filter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn aliases() {
        assert_eq!(Verbosity::Off, serde_yml::from_str::<Verbosity>("none").unwrap());
        assert_eq!(Verbosity::Warn, serde_yml::from_str::<Verbosity>("warning").unwrap());
        assert_eq!(Verbosity::Debug, serde_yml::from_str::<Verbosity>("debug").unwrap());
    }

    #[test]
    fn ordering() {
        assert!(Verbosity::Trace > Verbosity::Error);
        assert_eq!(LevelFilter::INFO, LevelFilter::from(Verbosity::default()));
    }
}
