//! Read-only object lookups against local caches.
//!
//! Reconciliation passes and probes never talk to the API server for reads;
//! they consult reflector stores maintained by a watch. The [`ObjectLister`]
//! trait is the seam between the decision logic and those caches.

use std::sync::Arc;

use crds::naming::manual_ref;
use kube::Resource;
use kube_runtime::reflector::{ObjectRef, Store};
use thiserror::Error;

/// Errors returned by an [`ObjectLister`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    /// The object is not present in the cache
    #[error("{kind} {key:?} not found")]
    NotFound { kind: String, key: String },

    /// The cache could not answer
    #[error("can't look up {kind} {key:?}: {reason}")]
    Unavailable {
        kind: String,
        key: String,
        reason: String,
    },
}

impl LookupError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LookupError::NotFound { .. })
    }
}

/// Get-by-namespace-and-name access to cached objects.
pub trait ObjectLister<K>: Send + Sync {
    fn get(&self, namespace: &str, name: &str) -> Result<Arc<K>, LookupError>;

    /// Like [`ObjectLister::get`], with absence reported as `Ok(None)`.
    fn get_optional(&self, namespace: &str, name: &str) -> Result<Option<Arc<K>>, LookupError> {
        match self.get(namespace, name) {
            Ok(obj) => Ok(Some(obj)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

impl<K> ObjectLister<K> for Store<K>
where
    K: Resource<DynamicType = ()> + Clone + Send + Sync + 'static,
{
    fn get(&self, namespace: &str, name: &str) -> Result<Arc<K>, LookupError> {
        let key = ObjectRef::<K>::new(name).within(namespace);
        Store::get(self, &key).ok_or_else(|| LookupError::NotFound {
            kind: K::kind(&()).to_string(),
            key: manual_ref(namespace, name),
        })
    }
}

/// Helpers for building listers in tests.
#[cfg(any(test, feature = "test-util"))]
pub mod testing {
    use super::*;
    use kube_runtime::reflector::store::Writer;
    use kube_runtime::watcher;

    /// Builds a reflector store pre-populated with `objects`.
    pub fn store_with<K>(objects: Vec<K>) -> Store<K>
    where
        K: Resource<DynamicType = ()> + Clone + Send + Sync + 'static,
    {
        let mut writer = Writer::<K>::default();
        for obj in objects {
            writer.apply_watcher_event(&watcher::Event::Apply(obj));
        }
        writer.as_reader()
    }

    /// Lister whose every lookup fails with [`LookupError::Unavailable`].
    #[derive(Debug, Clone, Default)]
    pub struct UnavailableLister;

    impl<K> ObjectLister<K> for UnavailableLister
    where
        K: Resource<DynamicType = ()>,
    {
        fn get(&self, namespace: &str, name: &str) -> Result<Arc<K>, LookupError> {
            Err(LookupError::Unavailable {
                kind: K::kind(&()).to_string(),
                key: manual_ref(namespace, name),
                reason: "cache unavailable".to_string(),
            })
        }
    }
}
