//! The [`Config`] entry point: wires argument and environment sources
//! through the document builder into the YAML decode path, and runs the
//! defaults walk.

use std::any::Any;
use std::io::Read;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use tracing::debug;

use crate::defaults::{ApplyDefaults, SetterRegistry};
use crate::document::{self, DocumentStream};
use crate::env;
use crate::error::YamlfigError;
use crate::fields::{Collector, FieldInfo, Fields};
use crate::merge;

/// Builds a typed configuration value from layered sources.
///
/// The destination stays caller-owned; every parse call mutates it in place
/// and layers are sparse — a source only overrides the fields it names, and
/// the last write wins per field.
///
/// ```ignore
/// let mut app = App::default();
/// Config::new(&mut app)
///     .env_prefix("APP_")
///     .auto_apply_defaults(true)
///     .parse_os_environment()?;
/// ```
pub struct Config<'a, T> {
    dest: &'a mut T,
    env_prefix: Option<String>,
    auto_apply_defaults: bool,
    registry: SetterRegistry,
}

impl<'a, T> Config<'a, T>
where
    T: Fields + ApplyDefaults + Serialize + DeserializeOwned,
{
    pub fn new(dest: &'a mut T) -> Self {
        Self {
            dest,
            env_prefix: None,
            auto_apply_defaults: false,
            registry: SetterRegistry::default(),
        }
    }

    /// Require this prefix on environment variable names.
    ///
    /// Environment parsing is inert until a non-empty prefix is set; without
    /// one, [`parse_environment`](Self::parse_environment) is a no-op
    /// returning success.
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Run the defaults walk automatically after each successful argument
    /// parse (default: off).
    pub fn auto_apply_defaults(mut self, enabled: bool) -> Self {
        self.auto_apply_defaults = enabled;
        self
    }

    /// Register a default-setting callback for `U`, invoked during the
    /// defaults walk after `U`'s own [`DefaultSetter`](crate::DefaultSetter).
    /// One callback per type; registering again replaces the earlier one.
    pub fn default_setter<U: Any>(mut self, setter: impl Fn(&mut U) + 'static) -> Self {
        self.registry.register(setter);
        self
    }

    /// Decode a YAML document onto the destination. Fields absent from the
    /// document keep their current values.
    pub fn parse_yaml(&mut self, reader: impl Read) -> Result<(), YamlfigError> {
        self.decode_stream(reader)
    }

    /// Parse the process arguments (`std::env::args()`, program name
    /// excluded).
    pub fn parse_os_arguments(&mut self) -> Result<(), YamlfigError> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        self.parse_arguments(args)
    }

    /// Parse explicit argument tokens (`key=value`, optionally `--`/`-`
    /// prefixed) onto the destination.
    pub fn parse_arguments<I>(&mut self, args: I) -> Result<(), YamlfigError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let stream = self.argument_reader(&args);
        self.decode_stream(stream)?;
        if self.auto_apply_defaults {
            self.apply_defaults();
        }
        Ok(())
    }

    /// Build the transient YAML stream for the given tokens without touching
    /// the destination. Construction failures are deferred to the stream's
    /// first read.
    pub fn argument_reader(&self, args: &[String]) -> DocumentStream {
        let built = self
            .field_infos()
            .and_then(|infos| document::build_document(args, &infos));
        match built {
            Ok(bytes) => DocumentStream::ready(bytes),
            Err(error) => DocumentStream::failed(error),
        }
    }

    /// Parse the process environment (`std::env::vars()`).
    pub fn parse_os_environment(&mut self) -> Result<(), YamlfigError> {
        let vars: Vec<String> = std::env::vars()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        self.parse_environment(vars)
    }

    /// Parse explicit `KEY=VALUE` environment entries onto the destination.
    /// A no-op returning success when no prefix is configured.
    pub fn parse_environment<I>(&mut self, vars: I) -> Result<(), YamlfigError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let vars: Vec<String> = vars.into_iter().map(Into::into).collect();
        let Some(stream) = self.environment_reader(&vars) else {
            return Ok(());
        };
        self.decode_stream(stream)
    }

    /// Build the argument stream for environment entries matching the
    /// configured prefix. `None` when environment parsing is disabled.
    pub fn environment_reader(&self, vars: &[String]) -> Option<DocumentStream> {
        let prefix = self.env_prefix.as_deref().filter(|p| !p.is_empty())?;
        match env::filter_env(prefix, vars) {
            Ok(args) => Some(self.argument_reader(&args)),
            Err(error) => Some(DocumentStream::failed(error)),
        }
    }

    /// Walk the destination graph and invoke every default-setting
    /// capability.
    pub fn apply_defaults(&mut self) {
        self.dest.apply_defaults(&self.registry);
    }

    /// Collect the field descriptors for the destination shape, for external
    /// help renderers and custom bridging.
    pub fn field_infos(&self) -> Result<Vec<FieldInfo>, YamlfigError> {
        let mut collector = Collector::new(&self.registry);
        T::collect(&mut collector);
        collector.finish()
    }

    /// Read the stream to end and layer it onto the destination.
    ///
    /// An empty stream means "nothing supplied" and is swallowed; it never
    /// reaches the YAML parser, keeping the end-of-input signal distinct
    /// from genuine decode failures.
    fn decode_stream(&mut self, mut reader: impl Read) -> Result<(), YamlfigError> {
        let mut buffer = Vec::new();
        reader
            .read_to_end(&mut buffer)
            .map_err(YamlfigError::from_stream_read)?;
        if buffer.iter().all(|byte| byte.is_ascii_whitespace()) {
            return Ok(());
        }
        debug!(bytes = buffer.len(), "decoding document stream");
        let overlay: Value = serde_yaml::from_slice(&buffer)?;
        if overlay.is_null() {
            return Ok(());
        }
        let base = serde_yaml::to_value(&*self.dest)?;
        *self.dest = serde_yaml::from_value(merge::deep_merge(base, overlay))?;
        Ok(())
    }
}
