use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::thread;

use anyhow::{anyhow, bail, Result};
use dashmap::DashMap;
use tracing::debug;

use super::context::ExecutionContext;
use super::hook::Hook;

/// Builds a fresh hook from the shared context
pub type HookFactory = Arc<dyn Fn(Arc<ExecutionContext>) -> Box<dyn Hook> + Send + Sync>;

/// Wrap a constructor closure as a [`HookFactory`]
pub fn hook_factory<F, H>(build: F) -> HookFactory
where
    F: Fn(Arc<ExecutionContext>) -> H + Send + Sync + 'static,
    H: Hook + 'static,
{
    Arc::new(move |ctx| Box::new(build(ctx)) as Box<dyn Hook>)
}

struct Inner {
    factories: HashMap<String, HookFactory>,
    context: Arc<ExecutionContext>,
}

/// Key-to-factory map plus the context every created hook receives.
/// Mutations take the write lock; `create`, `keys` and `list` share the read lock
/// only long enough to copy what they need.
pub struct HookRegistry {
    inner: RwLock<Inner>,
}

impl HookRegistry {
    pub fn new(context: ExecutionContext) -> Self {
        Self {
            inner: RwLock::new(Inner {
                factories: HashMap::new(),
                context: Arc::new(context),
            }),
        }
    }

    /// Register a factory; an existing key is never overwritten
    pub fn register(&self, key: impl Into<String>, factory: HookFactory) -> Result<()> {
        let key = key.into();
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if inner.factories.contains_key(&key) {
            bail!("hook '{}' already registered", key);
        }
        debug!(hook = %key, "Registered hook");
        inner.factories.insert(key, factory);
        Ok(())
    }

    /// Register all factories or none of them
    pub fn register_batch(&self, batch: HashMap<String, HookFactory>) -> Result<()> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let mut taken: Vec<&String> = batch
            .keys()
            .filter(|key| inner.factories.contains_key(*key))
            .collect();
        if !taken.is_empty() {
            taken.sort();
            bail!("hooks already registered: {:?}", taken);
        }
        debug!(count = batch.len(), "Registered hook batch");
        inner.factories.extend(batch);
        Ok(())
    }

    /// Instantiate the hook registered under `key`
    pub fn create(&self, key: &str) -> Result<Box<dyn Hook>> {
        let (factory, context) = {
            let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
            let factory = inner
                .factories
                .get(key)
                .cloned()
                .ok_or_else(|| anyhow!("hook '{}' not registered", key))?;
            (factory, inner.context.clone())
        };
        Ok(factory(context))
    }

    pub fn contains(&self, key: &str) -> bool {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.factories.contains_key(key)
    }

    /// Registered keys in lexicographic order
    pub fn keys(&self) -> Vec<String> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<String> = inner.factories.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Instantiate every registered hook, fanning out over a bounded set of threads
    pub fn list(&self) -> HashMap<String, Box<dyn Hook>> {
        let (entries, context) = {
            let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
            let entries: Vec<(String, HookFactory)> = inner
                .factories
                .iter()
                .map(|(k, f)| (k.clone(), f.clone()))
                .collect();
            (entries, inner.context.clone())
        };

        if entries.is_empty() {
            return HashMap::new();
        }

        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
            .min(entries.len());
        let chunk_size = entries.len().div_ceil(workers);
        let hooks: DashMap<String, Box<dyn Hook>> = DashMap::with_capacity(entries.len());

        thread::scope(|scope| {
            for chunk in entries.chunks(chunk_size) {
                let hooks = &hooks;
                let context = &context;
                scope.spawn(move || {
                    for (key, factory) in chunk {
                        let hook = factory(context.clone());
                        hooks.insert(key.clone(), hook);
                    }
                });
            }
        });

        hooks.into_iter().collect()
    }

    /// Swap the context used by subsequent `create` and `list` calls
    pub fn set_context(&self, context: ExecutionContext) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.context = Arc::new(context);
    }

    pub fn context(&self) -> Arc<ExecutionContext> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.context.clone()
    }
}
