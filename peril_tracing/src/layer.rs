use crate::{FormatFlavor, TracingConfig};
use tracing_core::Subscriber;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt::layer as fmt_layer;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// The boxed layer returned by [`make_layer`].
type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

/// Applies the display toggles of a [`TracingConfig`] to a formatted layer,
/// drops the timestamp if requested, attaches the target filter, and boxes the
/// result. Every flavor yields a distinct layer type.
macro_rules! finish_layer {
    ($layer:expr, $config:expr, $targets:expr, $ansi:expr) => {{
        let layer = $layer
            .with_ansi($ansi)
            .with_target($config.show_target())
            .with_file($config.show_file())
            .with_line_number($config.show_line_number())
            .with_level($config.show_level())
            .with_thread_ids($config.show_thread_id());

        if $config.show_timestamp() {
            Box::new(layer.with_filter($targets)) as BoxedLayer<S>
        } else {
            Box::new(layer.without_time().with_filter($targets)) as BoxedLayer<S>
        }
    }};
}

/// Creates a [formatted layer](tracing_subscriber::fmt::Layer) filtered by
/// per-target verbosity, as chosen in the given [config](TracingConfig).
pub fn make_layer<S>(config: impl AsRef<TracingConfig>) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let config = config.as_ref();
    let targets = make_targets(config);

    match config.flavor() {
        FormatFlavor::Full => finish_layer!(fmt_layer::<S>(), config, targets, config.color()),
        FormatFlavor::Compact => {
            finish_layer!(fmt_layer::<S>().compact(), config, targets, config.color())
        }
        FormatFlavor::Pretty => {
            finish_layer!(fmt_layer::<S>().pretty(), config, targets, config.color())
        }
        #[cfg(feature = "json")]
        FormatFlavor::Json => {
            finish_layer!(fmt_layer::<S>().json().flatten_event(true), config, targets, false)
        }
    }
}

/// Creates the [per-target filter](Targets): the root verbosity plus the
/// configured overrides.
fn make_targets(config: &TracingConfig) -> Targets {
    Targets::new()
        .with_default(config.verbosity())
        .with_targets(
            config
                .targets()
                .iter()
                .map(|(target, verbosity)| (target.clone(), *verbosity)),
        )
}
