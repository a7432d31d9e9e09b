//! The defaults walk: recursively visits the destination object graph and
//! invokes every default-setting capability it finds.
//!
//! Two capabilities exist per type: its own [`DefaultSetter`] impl, and an
//! externally registered callback in the [`SetterRegistry`]. Both are invoked
//! when present, in that order. The walker only traverses; whether an
//! existing value is overwritten is each setter's own policy, which also
//! makes repeated walks safe.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Opt-in capability: a type that knows how to populate its own zero-valued
/// fields.
pub trait DefaultSetter {
    fn set_defaults(&mut self);
}

type SetterFn = Box<dyn Fn(&mut dyn Any)>;

/// Default-setting callbacks keyed by concrete type.
///
/// Registered at configuration time on [`Config`](crate::Config); one
/// callback per type, re-registration replaces the earlier one. Explicit
/// state rather than a process-wide registry keeps behavior deterministic
/// and testable.
#[derive(Default)]
pub struct SetterRegistry {
    setters: HashMap<TypeId, SetterFn>,
}

impl SetterRegistry {
    pub(crate) fn register<T: Any>(&mut self, setter: impl Fn(&mut T) + 'static) {
        self.setters.insert(
            TypeId::of::<T>(),
            Box::new(move |value| {
                if let Some(concrete) = value.downcast_mut::<T>() {
                    setter(concrete);
                }
            }),
        );
    }

    /// Run the callback registered for the value's concrete type, if any.
    /// Returns whether one was registered.
    pub fn invoke(&self, value: &mut dyn Any) -> bool {
        match self.setters.get(&(*value).type_id()) {
            Some(setter) => {
                setter(value);
                true
            }
            None => false,
        }
    }
}

/// Recursive walk over a value graph, invoking default-setting capabilities
/// on every struct visited.
///
/// `#[derive(Yamlfig)]` implements this for structs: own setter first, then
/// the registered callback, then each field in declaration order. The impls
/// here cover containers and scalars.
pub trait ApplyDefaults {
    fn apply_defaults(&mut self, registry: &SetterRegistry);
}

macro_rules! scalar_apply_defaults {
    ($($ty:ty),* $(,)?) => {$(
        impl ApplyDefaults for $ty {
            fn apply_defaults(&mut self, _registry: &SetterRegistry) {}
        }
    )*};
}

scalar_apply_defaults!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    String,
    std::path::PathBuf,
    std::net::IpAddr,
    std::net::Ipv4Addr,
    std::net::Ipv6Addr,
    std::net::SocketAddr,
);

impl<T: ApplyDefaults> ApplyDefaults for Option<T> {
    /// `None` is left untouched; the walker never allocates.
    fn apply_defaults(&mut self, registry: &SetterRegistry) {
        if let Some(inner) = self {
            inner.apply_defaults(registry);
        }
    }
}

impl<T: ApplyDefaults> ApplyDefaults for Box<T> {
    fn apply_defaults(&mut self, registry: &SetterRegistry) {
        (**self).apply_defaults(registry);
    }
}

impl<T: ApplyDefaults> ApplyDefaults for Vec<T> {
    fn apply_defaults(&mut self, registry: &SetterRegistry) {
        for element in self {
            element.apply_defaults(registry);
        }
    }
}

impl<K: Eq + Hash + Clone, V: ApplyDefaults> ApplyDefaults for HashMap<K, V> {
    /// Each value is detached, mutated, and written back under the same key.
    /// Every key is visited exactly once; visit order is unspecified.
    fn apply_defaults(&mut self, registry: &SetterRegistry) {
        let keys: Vec<K> = self.keys().cloned().collect();
        for key in keys {
            if let Some(mut value) = self.remove(&key) {
                value.apply_defaults(registry);
                self.insert(key, value);
            }
        }
    }
}

impl<K: Ord + Clone, V: ApplyDefaults> ApplyDefaults for BTreeMap<K, V> {
    fn apply_defaults(&mut self, registry: &SetterRegistry) {
        let keys: Vec<K> = self.keys().cloned().collect();
        for key in keys {
            if let Some(mut value) = self.remove(&key) {
                value.apply_defaults(registry);
                self.insert(key, value);
            }
        }
    }
}
