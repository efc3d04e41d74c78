use serde::Deserialize;

/// Selects the event formatter of the `tracing_subscriber` formatted layer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatFlavor {
    /// The default, single-line [`Full`](tracing_subscriber::fmt::format::Full)
    /// format.
    #[default]
    Full,

    /// The shorter [`Compact`](tracing_subscriber::fmt::format::Compact) format.
    Compact,

    /// The multi-line [`Pretty`](tracing_subscriber::fmt::format::Pretty) format.
    Pretty,

    /// Newline-delimited [`Json`](tracing_subscriber::fmt::format::Json).
    #[cfg(feature = "json")]
    Json,
}
