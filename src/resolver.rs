//! Descriptor resolution and the per-run resolver cache.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::schema::{DescriptorBundle, MessageDescriptor};

/// Source of message descriptors, looked up by `<namespace>/<name>`.
///
/// Implementations decide where descriptors come from: a JSON bundle, a
/// tree of `.msg` files, or anything else that can describe a message.
pub trait DescriptorResolver {
    /// Resolve one message type. An unknown name is
    /// [`Error::UnresolvableType`].
    fn resolve(&self, type_name: &str) -> Result<MessageDescriptor>;
}

impl DescriptorResolver for DescriptorBundle {
    fn resolve(&self, type_name: &str) -> Result<MessageDescriptor> {
        self.messages
            .get(type_name)
            .cloned()
            .ok_or_else(|| Error::UnresolvableType {
                type_name: type_name.to_string(),
                reason: "not present in descriptor bundle".to_string(),
            })
    }
}

/// Memoizes descriptor lookups for the duration of one generation run.
///
/// The first lookup of a name goes to the underlying resolver; later lookups
/// return the cached descriptor. Failed lookups are not cached.
pub struct ResolverCache<'a> {
    resolver: &'a dyn DescriptorResolver,
    descriptors: HashMap<String, Arc<MessageDescriptor>>,
}

impl<'a> ResolverCache<'a> {
    pub fn new(resolver: &'a dyn DescriptorResolver) -> Self {
        Self {
            resolver,
            descriptors: HashMap::new(),
        }
    }

    /// Resolve `type_name`, consulting the underlying resolver at most once.
    pub fn resolve(&mut self, type_name: &str) -> Result<Arc<MessageDescriptor>> {
        if let Some(descriptor) = self.descriptors.get(type_name) {
            return Ok(Arc::clone(descriptor));
        }

        tracing::debug!(type_name, "resolving descriptor");
        let mut descriptor = self.resolver.resolve(type_name)?;
        if descriptor.type_name.is_empty() {
            descriptor.type_name = type_name.to_string();
        } else if descriptor.type_name != type_name {
            return Err(Error::UnresolvableType {
                type_name: type_name.to_string(),
                reason: format!("resolver returned '{}'", descriptor.type_name),
            });
        }

        let descriptor = Arc::new(descriptor);
        self.descriptors
            .insert(type_name.to_string(), Arc::clone(&descriptor));
        Ok(descriptor)
    }

    /// Number of distinct descriptors resolved so far.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
