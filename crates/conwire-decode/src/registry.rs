use std::collections::HashMap;

/// Renderer for one struct type: receives the type id and the raw bytes,
/// returns display text. Handlers must not assume anything outside the
/// slice they are given.
pub type StructHandler = Box<dyn Fn(u16, &[u8]) -> String + Send + Sync>;

/// Registry of struct-typed payload renderers, keyed by struct type id.
///
/// The registry is not owned by any decoder: it is populated once at
/// startup and shared (read-only) across however many decoder instances a
/// session runs. Unknown type ids fall back to a placeholder renderer so a
/// newer firmware never breaks an older host tool.
#[derive(Default)]
pub struct StructRegistry {
    handlers: HashMap<u16, StructHandler>,
}

impl StructRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-loaded with the built-in firmware handlers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::handlers::register_builtins(&mut registry);
        registry
    }

    /// Register (or replace) the handler for a struct type.
    pub fn register<H>(&mut self, stype: u16, handler: H)
    where
        H: Fn(u16, &[u8]) -> String + Send + Sync + 'static,
    {
        self.handlers.insert(stype, Box::new(handler));
    }

    /// True if a handler is registered for `stype`.
    pub fn contains(&self, stype: u16) -> bool {
        self.handlers.contains_key(&stype)
    }

    /// Registered struct type ids, sorted.
    pub fn types(&self) -> Vec<u16> {
        let mut types: Vec<u16> = self.handlers.keys().copied().collect();
        types.sort_unstable();
        types
    }

    /// Render `buf` through the handler for `stype`, or through the default
    /// placeholder if none is registered.
    pub fn render(&self, stype: u16, buf: &[u8]) -> String {
        match self.handlers.get(&stype) {
            Some(handler) => handler(stype, buf),
            None => default_handler(stype, buf),
        }
    }
}

impl std::fmt::Debug for StructRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructRegistry")
            .field("types", &self.types())
            .finish()
    }
}

fn default_handler(stype: u16, buf: &[u8]) -> String {
    format!("BadStruct#{stype}({})", buf.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_type_uses_default() {
        let registry = StructRegistry::new();
        assert_eq!(registry.render(7, &[1, 2, 3]), "BadStruct#7(3)");
    }

    #[test]
    fn registered_handler_wins() {
        let mut registry = StructRegistry::new();
        registry.register(7, |stype, buf| format!("type{stype}:{}", buf.len()));
        assert_eq!(registry.render(7, &[1, 2, 3]), "type7:3");
        assert!(registry.contains(7));
        assert!(!registry.contains(8));
    }

    #[test]
    fn re_registration_replaces() {
        let mut registry = StructRegistry::new();
        registry.register(1, |_, _| "first".to_string());
        registry.register(1, |_, _| "second".to_string());
        assert_eq!(registry.render(1, &[]), "second");
    }

    #[test]
    fn builtins_cover_known_types() {
        let registry = StructRegistry::with_builtins();
        assert_eq!(
            registry.types(),
            vec![
                crate::handlers::STRUCT_SCRATCH_REGS,
                crate::handlers::STRUCT_EXCEPTION_FRAME,
                crate::handlers::STRUCT_COVERAGE_COUNTERS,
                crate::handlers::STRUCT_TASK_ENTRY,
                crate::handlers::STRUCT_SHMEM_ENTRY,
                crate::handlers::STRUCT_PTR64,
            ]
        );
    }
}
