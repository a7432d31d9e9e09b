//! Layered YAML configuration for Rust CLI apps. Define a struct, point it
//! at your sources, and go.
//!
//! Yamlfig materializes one typed configuration value from three
//! heterogeneous sources — a YAML document, command-line argument tokens,
//! and environment variables — then fills still-unset fields through
//! type-declared defaults.
//!
//! ```ignore
//! #[derive(Yamlfig, Serialize, Deserialize, Default)]
//! struct App {
//!     /// Display name.
//!     #[yamlfig(flag = "n")]
//!     name: String,
//!     server: Server,
//! }
//!
//! let mut app = App::default();
//! let mut config = Config::new(&mut app).env_prefix("APP_");
//! config.parse_yaml(File::open("app.yaml")?)?;
//! config.parse_os_environment()?;
//! config.parse_os_arguments()?;
//! config.apply_defaults();
//! ```
//!
//! # Design: struct as source of truth
//!
//! `#[derive(Yamlfig)]` turns the struct into a structural description —
//! one [`FieldInfo`] per reachable field, recursing through nested structs,
//! `Option`, `Box`, `Vec`, and maps. That one description drives
//! everything:
//!
//! - **Argument bridging.** Tokens like `--server.host=x` are resolved
//!   against the field paths and rewritten as a transient YAML document, so
//!   argv rides the exact same decode path as a config file. Separators are
//!   interchangeable: `SERVER_HOST`, `server.host`, and `server-host` all
//!   address the same field.
//! - **Environment bridging.** With an env prefix configured, matching
//!   `KEY=VALUE` entries are stripped of the prefix and fed through the same
//!   token pipeline. No prefix, no environment parsing — it's opt-in.
//! - **Help rendering.** [`Config::field_infos`] exposes paths, flag
//!   aliases, `///` doc comments, and declared defaults for external
//!   renderers. Yamlfig itself draws no help text.
//!
//! # Layer precedence
//!
//! There is none baked in: each parse call is a sparse overlay onto the
//! caller-owned destination, and the last write wins per field. Call order
//! is precedence order — YAML file first, environment next, argv last is the
//! common arrangement.
//!
//! # Defaults
//!
//! A type opts into defaulting by implementing [`DefaultSetter`] and marking
//! itself `#[yamlfig(defaults)]`. [`Config::apply_defaults`] walks the
//! actual destination graph — nested structs in place, `Some` pointees,
//! sequence elements in order, map values detached and written back — and
//! invokes each type's own setter, then any callback registered via
//! [`Config::default_setter`]. The walk never allocates and never decides
//! overwrite policy; a setter that only fills zero-valued fields makes the
//! whole pass idempotent.
//!
//! # Error handling
//!
//! All fallible operations return [`YamlfigError`]. Empty input is not an
//! error: zero tokens, zero matching environment entries, and an absent
//! prefix all succeed without touching the destination. A malformed env
//! prefix surfaces on the first read of the stream it would have produced,
//! so every call site handles it as an ordinary decode-time failure.

pub mod error;

mod config;
mod defaults;
mod document;
mod env;
mod fields;
pub(crate) mod merge;

pub use config::Config;
pub use defaults::{ApplyDefaults, DefaultSetter, SetterRegistry};
pub use document::DocumentStream;
pub use error::YamlfigError;
pub use fields::{
    Collector, FieldInfo, FieldKind, FieldMeta, Fields, PathSegment, declared_default,
};

#[cfg(feature = "derive")]
pub use yamlfig_derive::Yamlfig;
