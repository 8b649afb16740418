//! Plugin-registered command registry.
//!
//! The CLI parses its built-in surface statically; anything it does not
//! recognize is dispatched here by name, letting plugins contribute commands
//! without touching the core.

use std::sync::{Arc, RwLock};

use futures::future::BoxFuture;

use crate::{ExtensionHost, Project};

/// Everything a command handler gets to work with.
pub struct CommandContext {
    pub project: Arc<Project>,
    pub host: Arc<ExtensionHost>,
    /// Arguments following the command name, unparsed.
    pub args: Vec<String>,
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext").field("args", &self.args).finish()
    }
}

type HandlerFn = dyn Fn(CommandContext) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync;

/// A named command contributed by a plugin.
#[derive(Clone)]
pub struct CommandSpec {
    pub name: String,
    pub about: String,
    handler: Arc<HandlerFn>,
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec").field("name", &self.name).finish()
    }
}

impl CommandSpec {
    pub fn new<F, Fut>(name: &str, about: &str, handler: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            name: name.to_string(),
            about: about.to_string(),
            handler: Arc::new(move |ctx| Box::pin(handler(ctx))),
        }
    }
}

/// Append-only command registry keyed by command name.
#[derive(Default, Debug)]
pub struct CommandRegistry {
    commands: RwLock<Vec<CommandSpec>>,
}

impl CommandRegistry {
    /// Register a command for the current session.
    pub fn register(&self, command: CommandSpec) {
        self.commands.write().unwrap().push(command);
    }

    /// Register a list of commands for the current session.
    pub fn register_many(&self, commands: Vec<CommandSpec>) {
        self.commands.write().unwrap().extend(commands);
    }

    /// Names of all registered commands, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.commands
            .read()
            .unwrap()
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }

    /// Dispatch a command by name. Unknown names are an error.
    pub async fn dispatch(&self, name: &str, ctx: CommandContext) -> anyhow::Result<()> {
        let handler = {
            let commands = self.commands.read().unwrap();
            commands
                .iter()
                .find(|c| c.name == name)
                .map(|c| Arc::clone(&c.handler))
        };
        match handler {
            Some(handler) => handler(ctx).await,
            None => anyhow::bail!("unknown command: {name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn test_ctx(args: Vec<String>) -> CommandContext {
        CommandContext {
            project: Arc::new(Project::new(std::env::temp_dir())),
            host: ExtensionHost::new(),
            args,
        }
    }

    #[tokio::test]
    async fn registered_commands_dispatch() {
        let registry = CommandRegistry::default();
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        registry.register(CommandSpec::new("tidy", "tidy the project", move |ctx| {
            let flag = Arc::clone(&flag);
            async move {
                assert_eq!(ctx.args, vec!["--dry".to_string()]);
                flag.store(true, Ordering::SeqCst);
                Ok(())
            }
        }));

        registry
            .dispatch("tidy", test_ctx(vec!["--dry".into()]))
            .await
            .unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn unknown_commands_fail() {
        let registry = CommandRegistry::default();
        let err = registry.dispatch("nope", test_ctx(vec![])).await.unwrap_err();
        assert!(err.to_string().contains("unknown command"));
    }

    #[tokio::test]
    async fn register_many_keeps_order() {
        let registry = CommandRegistry::default();
        registry.register_many(vec![
            CommandSpec::new("a", "", |_| async { Ok(()) }),
            CommandSpec::new("b", "", |_| async { Ok(()) }),
        ]);
        assert_eq!(registry.names(), vec!["a", "b"]);
    }
}
