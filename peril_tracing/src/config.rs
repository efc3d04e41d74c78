use crate::{FormatFlavor, Verbosity};
use serde::Deserialize;
use std::collections::BTreeMap;

pub mod flavor;
pub mod verbosity;

/// Represents the application-level configuration section that pre-configures
/// the [formatted layer](tracing_subscriber::fmt::Layer) of the
/// `tracing_subscriber` crate. In essence, this is the application **logging**
/// configuration.
///
/// Every key is optional. Missing keys fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    #[serde(alias = "level")]
    verbosity: Verbosity,
    #[serde(alias = "flavour")]
    flavor: FormatFlavor,
    #[serde(alias = "colour", alias = "show_color")]
    color: bool,
    #[serde(alias = "with_timestamp")]
    show_timestamp: bool,
    #[serde(alias = "with_target")]
    show_target: bool,
    #[serde(alias = "with_file")]
    show_file: bool,
    #[serde(alias = "show_line")]
    show_line_number: bool,
    #[serde(alias = "with_level")]
    show_level: bool,
    #[serde(alias = "with_thread_id")]
    show_thread_id: bool,
    #[serde(alias = "custom_targets")]
    targets: BTreeMap<String, Verbosity>,
}

impl TracingConfig {
    /// Re-creates this config with the given root [`Verbosity`].
    pub fn with_verbosity(self, verbosity: Verbosity) -> Self {
        Self { verbosity, ..self }
    }

    /// Re-creates this config with the given [`FormatFlavor`].
    pub fn with_flavor(self, flavor: FormatFlavor) -> Self {
        Self { flavor, ..self }
    }

    /// Merges an extra per-target [`Verbosity`] level into this config.
    pub fn with_target(mut self, target: impl Into<String>, verbosity: Verbosity) -> Self {
        self.targets.insert(target.into(), verbosity);

        self
    }
}

impl TracingConfig {
    /// Reports the root [verbosity level](Verbosity).
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Reports the [formatting flavor](FormatFlavor).
    pub fn flavor(&self) -> FormatFlavor {
        self.flavor
    }

    /// Reports whether the output is
    /// [colored](tracing_subscriber::fmt::Layer::with_ansi).
    pub fn color(&self) -> bool {
        self.color
    }

    /// Reports whether the output includes the timestamp.
    pub fn show_timestamp(&self) -> bool {
        self.show_timestamp
    }

    /// Reports whether the output includes the event target.
    pub fn show_target(&self) -> bool {
        self.show_target
    }

    /// Reports whether the output includes the source file.
    pub fn show_file(&self) -> bool {
        self.show_file
    }

    /// Reports whether the output includes the source line number.
    pub fn show_line_number(&self) -> bool {
        self.show_line_number
    }

    /// Reports whether the output includes the level.
    pub fn show_level(&self) -> bool {
        self.show_level
    }

    /// Reports whether the output includes the thread ID.
    pub fn show_thread_id(&self) -> bool {
        self.show_thread_id
    }

    /// Reports the per-target verbosity overrides.
    pub fn targets(&self) -> &BTreeMap<String, Verbosity> {
        &self.targets
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::default(),
            flavor: FormatFlavor::default(),
            color: true,
            show_timestamp: true,
            show_target: true,
            show_file: false,
            show_line_number: false,
            show_level: true,
            show_thread_id: false,
            targets: BTreeMap::default(),
        }
    }
}

impl AsRef<TracingConfig> for TracingConfig {
    fn as_ref(&self) -> &TracingConfig {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn from_empty() {
        // Given
        let input = "{}";
        let expected_output = TracingConfig::default();

        // When
        let actual_output = serde_yml::from_str::<TracingConfig>(input).unwrap();

        // Then
        assert_eq!(expected_output, actual_output);
    }

    #[test]
    fn from_map_sparse() {
        // Given
        let input = r#"
level: debug
targets:
  lapin: warn
"#;
        let expected_output = TracingConfig::default()
            .with_verbosity(Verbosity::Debug)
            .with_target("lapin", Verbosity::Warn);

        // When
        let actual_output = serde_yml::from_str::<TracingConfig>(input).unwrap();

        // Then
        assert_eq!(expected_output, actual_output);
    }

    #[test]
    fn from_map_full() {
        // Given
        let input = r#"
verbosity: warn
flavor: pretty
colour: false
show_timestamp: false
show_target: false
show_file: true
show_line_number: true
show_level: false
show_thread_id: true
targets:
  peril_pubsub: trace
  lapin: off
"#;
        let expected_output = TracingConfig {
            verbosity: Verbosity::Warn,
            flavor: FormatFlavor::Pretty,
            color: false,
            show_timestamp: false,
            show_target: false,
            show_file: true,
            show_line_number: true,
            show_level: false,
            show_thread_id: true,
            targets: BTreeMap::from([
                ("peril_pubsub".to_string(), Verbosity::Trace),
                ("lapin".to_string(), Verbosity::Off),
            ]),
        };

        // When
        let actual_output = serde_yml::from_str::<TracingConfig>(input).unwrap();

        // Then
        assert_eq!(expected_output, actual_output);
    }
}
