//! Structural description of a destination type: one [`FieldInfo`] per
//! reachable field, collected by walking the type's declared shape.
//!
//! The [`Fields`] trait is the walk itself. This module implements it for
//! scalars and containers; `#[derive(Yamlfig)]` implements it for structs.
//! The same descriptors drive both the document builder (token-to-path
//! resolution) and external help renderers.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};

use serde_yaml::Value;

use crate::defaults::SetterRegistry;
use crate::error::YamlfigError;

/// One segment of a field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A named struct field.
    Field(String),
    /// Placeholder for a sequence index.
    Index,
    /// Placeholder for a mapping key.
    Key,
}

/// What shape of value a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    Struct,
    /// An `Option` field; absent in every source is valid.
    Optional,
    Sequence,
    Mapping,
}

/// Descriptor of one reachable field: its path, kind, flag alias,
/// documentation, declared default, and position in the source declaration.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub path: Vec<PathSegment>,
    pub kind: FieldKind,
    pub flag: Option<String>,
    pub description: Option<String>,
    /// The value a default-setting capability assigns, when it differs from
    /// the zero value.
    pub default: Option<Value>,
    pub order: usize,
}

impl FieldInfo {
    /// Render the path with `.` separators, `[]` for sequence index
    /// placeholders and `*` for mapping key placeholders.
    pub fn dotted(&self) -> String {
        let mut out = String::new();
        for segment in &self.path {
            if !out.is_empty() {
                out.push('.');
            }
            match segment {
                PathSegment::Field(name) => out.push_str(name),
                PathSegment::Index => out.push_str("[]"),
                PathSegment::Key => out.push('*'),
            }
        }
        out
    }
}

/// Per-field metadata supplied by the struct walk before recursing into the
/// field's type.
#[derive(Debug, Clone, Default)]
pub struct FieldMeta {
    pub flag: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub order: usize,
}

/// A type whose shape can be walked into [`FieldInfo`] descriptors.
///
/// Implemented here for scalars and containers; `#[derive(Yamlfig)]`
/// implements it for structs.
pub trait Fields {
    fn collect(ctx: &mut Collector<'_>);
}

/// Accumulates [`FieldInfo`] entries during a shape walk.
///
/// Tracks the current path, the metadata of the field being entered, and the
/// `TypeId`s of the structs on the walk path so cyclic type graphs fail with
/// a configuration error instead of recursing forever.
pub struct Collector<'r> {
    registry: &'r SetterRegistry,
    path: Vec<PathSegment>,
    pending: Option<FieldMeta>,
    optional: bool,
    stack: Vec<TypeId>,
    error: Option<YamlfigError>,
    out: Vec<FieldInfo>,
}

impl<'r> Collector<'r> {
    pub(crate) fn new(registry: &'r SetterRegistry) -> Self {
        Self {
            registry,
            path: Vec::new(),
            pending: None,
            optional: false,
            stack: Vec::new(),
            error: None,
            out: Vec::new(),
        }
    }

    /// Step into a named field, carrying its metadata.
    pub fn enter(&mut self, name: &str, meta: FieldMeta) {
        self.path.push(PathSegment::Field(name.to_string()));
        self.pending = Some(meta);
    }

    /// Step back out of a named field.
    pub fn exit(&mut self) {
        self.path.pop();
        self.pending = None;
    }

    /// Step into a placeholder segment (sequence index or mapping key).
    pub fn push(&mut self, segment: PathSegment) {
        self.path.push(segment);
    }

    pub fn pop(&mut self) {
        self.path.pop();
    }

    /// Mark the next emitted entry as optional (`Option` wrapper).
    pub fn mark_optional(&mut self) {
        self.optional = true;
    }

    /// Record a descriptor for the field at the current path.
    ///
    /// The root type itself is not a field; an empty path emits nothing.
    pub fn emit(&mut self, kind: FieldKind) {
        let optional = std::mem::take(&mut self.optional);
        if self.path.is_empty() {
            return;
        }
        let kind = if optional { FieldKind::Optional } else { kind };
        let meta = self.pending.take().unwrap_or_default();
        self.out.push(FieldInfo {
            path: self.path.clone(),
            kind,
            flag: meta.flag,
            description: meta.description,
            default: meta.default,
            order: meta.order,
        });
    }

    /// Guard against cyclic type graphs. Returns `false` (and records the
    /// error) when `id` is already on the walk path.
    pub fn enter_type(&mut self, id: TypeId, type_name: &str) -> bool {
        if self.stack.contains(&id) {
            if self.error.is_none() {
                self.error = Some(YamlfigError::CyclicShape {
                    type_name: type_name.to_string(),
                });
            }
            return false;
        }
        self.stack.push(id);
        true
    }

    pub fn exit_type(&mut self) {
        self.stack.pop();
    }

    /// Run the registered default-setting callback for the value's concrete
    /// type, if any. Used by derived impls to compute declared defaults.
    pub fn apply_registered(&self, value: &mut dyn Any) -> bool {
        self.registry.invoke(value)
    }

    pub(crate) fn finish(self) -> Result<Vec<FieldInfo>, YamlfigError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.out),
        }
    }
}

/// Serialize a field's defaulted value when it differs from its zero value.
///
/// Support function for derived [`Fields`] impls.
pub fn declared_default<F: serde::Serialize>(defaulted: &F, zero: &F) -> Option<Value> {
    let defaulted = serde_yaml::to_value(defaulted).ok()?;
    let zero = serde_yaml::to_value(zero).ok()?;
    (defaulted != zero).then_some(defaulted)
}

macro_rules! scalar_fields {
    ($($ty:ty),* $(,)?) => {$(
        impl Fields for $ty {
            fn collect(ctx: &mut Collector<'_>) {
                ctx.emit(FieldKind::Scalar);
            }
        }
    )*};
}

scalar_fields!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    String,
    std::path::PathBuf,
    std::net::IpAddr,
    std::net::Ipv4Addr,
    std::net::Ipv6Addr,
    std::net::SocketAddr,
);

impl<T: Fields> Fields for Option<T> {
    fn collect(ctx: &mut Collector<'_>) {
        ctx.mark_optional();
        T::collect(ctx);
    }
}

impl<T: Fields> Fields for Box<T> {
    fn collect(ctx: &mut Collector<'_>) {
        T::collect(ctx);
    }
}

impl<T: Fields> Fields for Vec<T> {
    fn collect(ctx: &mut Collector<'_>) {
        ctx.emit(FieldKind::Sequence);
        ctx.push(PathSegment::Index);
        T::collect(ctx);
        ctx.pop();
    }
}

impl<K, V: Fields> Fields for HashMap<K, V> {
    fn collect(ctx: &mut Collector<'_>) {
        ctx.emit(FieldKind::Mapping);
        ctx.push(PathSegment::Key);
        V::collect(ctx);
        ctx.pop();
    }
}

impl<K, V: Fields> Fields for BTreeMap<K, V> {
    fn collect(ctx: &mut Collector<'_>) {
        ctx.emit(FieldKind::Mapping);
        ctx.push(PathSegment::Key);
        V::collect(ctx);
        ctx.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A hand-written impl, the way the derive writes them.
    struct Server {
        _host: String,
        _port: u16,
    }

    impl Fields for Server {
        fn collect(ctx: &mut Collector<'_>) {
            if !ctx.enter_type(TypeId::of::<Self>(), "Server") {
                return;
            }
            ctx.emit(FieldKind::Struct);
            ctx.enter(
                "host",
                FieldMeta {
                    flag: Some("h".into()),
                    ..FieldMeta::default()
                },
            );
            <String as Fields>::collect(ctx);
            ctx.exit();
            ctx.enter(
                "port",
                FieldMeta {
                    order: 1,
                    ..FieldMeta::default()
                },
            );
            <u16 as Fields>::collect(ctx);
            ctx.exit();
            ctx.exit_type();
        }
    }

    fn collect<T: Fields>() -> Result<Vec<FieldInfo>, YamlfigError> {
        let registry = SetterRegistry::default();
        let mut ctx = Collector::new(&registry);
        T::collect(&mut ctx);
        ctx.finish()
    }

    #[test]
    fn flat_struct_yields_one_info_per_field() {
        let infos = collect::<Server>().unwrap();
        let paths: Vec<String> = infos.iter().map(FieldInfo::dotted).collect();
        assert_eq!(paths, vec!["host", "port"]);
        assert_eq!(infos[0].flag.as_deref(), Some("h"));
        assert_eq!(infos[1].order, 1);
    }

    #[test]
    fn sequence_emits_container_then_element() {
        let infos = collect::<Vec<Server>>().unwrap();
        let paths: Vec<String> = infos.iter().map(FieldInfo::dotted).collect();
        // The root container itself has an empty path and is skipped; the
        // element and its fields show up under the index placeholder.
        assert_eq!(paths, vec!["[]", "[].host", "[].port"]);
    }

    #[test]
    fn mapping_uses_key_placeholder() {
        let infos = collect::<HashMap<String, Server>>().unwrap();
        let paths: Vec<String> = infos.iter().map(FieldInfo::dotted).collect();
        assert_eq!(paths, vec!["*", "*.host", "*.port"]);
    }

    #[test]
    fn option_marks_field_optional() {
        struct Outer;
        impl Fields for Outer {
            fn collect(ctx: &mut Collector<'_>) {
                ctx.enter("server", FieldMeta::default());
                <Option<Server>>::collect(ctx);
                ctx.exit();
            }
        }
        let infos = collect::<Outer>().unwrap();
        assert_eq!(infos[0].kind, FieldKind::Optional);
        assert_eq!(infos[0].dotted(), "server");
        assert_eq!(infos[1].dotted(), "server.host");
    }

    #[test]
    fn cyclic_type_is_a_configuration_error() {
        struct Node;
        impl Fields for Node {
            fn collect(ctx: &mut Collector<'_>) {
                if !ctx.enter_type(TypeId::of::<Self>(), "Node") {
                    return;
                }
                ctx.emit(FieldKind::Struct);
                ctx.enter("next", FieldMeta::default());
                <Option<Box<Node>>>::collect(ctx);
                ctx.exit();
                ctx.exit_type();
            }
        }
        let err = collect::<Node>().unwrap_err();
        assert!(matches!(err, YamlfigError::CyclicShape { .. }));
    }

    #[test]
    fn declared_default_skips_unchanged_values() {
        assert_eq!(declared_default(&0u32, &0u32), None);
        assert_eq!(
            declared_default(&4u32, &0u32),
            Some(Value::Number(4.into()))
        );
    }
}
