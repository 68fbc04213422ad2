use super::command::JobCommand;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("command `{0}` is already registered")]
    Duplicate(String),
    #[error("command name must be non-empty")]
    EmptyName,
    #[error("command registry is frozen; `{0}` must be registered before the runner initializes")]
    Frozen(String),
}

#[derive(Clone, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Arc<dyn JobCommand>>,
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.names())
            .finish()
    }
}

fn registry_key(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        crate::commands::register_builtins(&mut registry)?;
        Ok(registry)
    }

    pub fn register(&mut self, command: Arc<dyn JobCommand>) -> Result<(), RegistryError> {
        let key = registry_key(command.name());
        if key.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.commands.contains_key(&key) {
            return Err(RegistryError::Duplicate(command.name().to_string()));
        }
        self.commands.insert(key, command);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn JobCommand>> {
        self.commands.get(&registry_key(name)).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(&registry_key(name))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .commands
            .values()
            .map(|command| command.name().to_string())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
