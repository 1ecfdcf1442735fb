use std::sync::Arc;

use tracing::debug;

use floofbot_core::{CallbackEvent, HandlerResult, LoaderError};

use crate::callback::CallbackRegistry;
use crate::command::CommandRegistry;
use crate::handler::{CommandHandler, RawCallback, SetupHandler, StructuredCallback, infer_name};
use crate::host::Host;
use crate::schema::{ArgumentSchema, Args};

use super::loader::PendingSetup;

/// Registration surface handed to a plugin during the load phase.
///
/// Everything registered here is attributed to the plugin being loaded, so
/// duplicate errors can name the offender.
pub struct Registrar<'a> {
    plugin: &'static str,
    commands: &'a mut CommandRegistry,
    callbacks: &'a mut CallbackRegistry,
    setups: &'a mut Vec<PendingSetup>,
}

impl<'a> Registrar<'a> {
    pub(crate) fn new(
        plugin: &'static str,
        commands: &'a mut CommandRegistry,
        callbacks: &'a mut CallbackRegistry,
        setups: &'a mut Vec<PendingSetup>,
    ) -> Self {
        Self {
            plugin,
            commands,
            callbacks,
            setups,
        }
    }

    /// Name of the plugin being loaded.
    pub fn plugin(&self) -> &'static str {
        self.plugin
    }

    /// Starts declaring a command called `name`.
    pub fn command(&mut self, name: impl Into<String>) -> CommandBuilder<'_, 'a> {
        CommandBuilder {
            registrar: self,
            name: Some(name.into()),
            help: None,
            schema: None,
        }
    }

    /// Registers a command named after the handler function itself.
    pub fn command_fn<H>(&mut self, handler: H) -> Result<(), LoaderError>
    where
        H: CommandHandler,
    {
        CommandBuilder {
            registrar: self,
            name: None,
            help: None,
            schema: None,
        }
        .handler(handler)
    }

    /// Starts declaring a callback action routed by `key`.
    pub fn callback(&mut self, key: impl Into<String>) -> CallbackBuilder<'_, 'a> {
        CallbackBuilder {
            registrar: self,
            key: key.into(),
            schema: None,
        }
    }

    /// Defers `f` until the host is live. Setups run once, in registration
    /// order.
    pub fn setup<F>(&mut self, f: F)
    where
        F: SetupHandler,
    {
        self.setups.push(PendingSetup::new(self.plugin, Arc::new(f)));
    }
}

/// Builder returned by [`Registrar::command`].
pub struct CommandBuilder<'r, 'a> {
    registrar: &'r mut Registrar<'a>,
    name: Option<String>,
    help: Option<String>,
    schema: Option<ArgumentSchema>,
}

impl CommandBuilder<'_, '_> {
    /// Help text shown above the syntax line. Defaults to the schema
    /// description.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Declares the command's arguments.
    pub fn schema(mut self, schema: ArgumentSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Registers the command with `handler`.
    pub fn handler<H>(self, handler: H) -> Result<(), LoaderError>
    where
        H: CommandHandler,
    {
        let name = match self.name {
            Some(name) => name,
            None => infer_name::<H>()
                .ok_or_else(|| LoaderError::UnnamedHandler {
                    type_name: std::any::type_name::<H>().to_string(),
                })?
                .to_string(),
        };

        let registrar = self.registrar;
        registrar.commands.register(
            registrar.plugin,
            &name,
            handler,
            self.schema.as_ref(),
            self.help,
        )?;
        debug!(plugin = registrar.plugin, command = %name, "Registered command");
        Ok(())
    }
}

/// Builder returned by [`Registrar::callback`].
pub struct CallbackBuilder<'r, 'a> {
    registrar: &'r mut Registrar<'a>,
    key: String,
    schema: Option<ArgumentSchema>,
}

impl CallbackBuilder<'_, '_> {
    /// Declares the payload fields for structured decoding.
    pub fn schema(mut self, schema: ArgumentSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Registers a handler receiving the decoded payload.
    ///
    /// Without a [`schema`](Self::schema) the payload must be an empty
    /// mapping.
    pub fn handler<F, Fut>(self, handler: F) -> Result<(), LoaderError>
    where
        F: Fn(Host, CallbackEvent, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let schema = self.schema.unwrap_or_default();
        let registrar = self.registrar;
        registrar.callbacks.register(
            registrar.plugin,
            &self.key,
            StructuredCallback(handler),
            Some(&schema),
        )?;
        debug!(plugin = registrar.plugin, key = %self.key, "Registered callback");
        Ok(())
    }

    /// Registers a handler receiving the payload text unmodified.
    pub fn raw_handler<F, Fut>(self, handler: F) -> Result<(), LoaderError>
    where
        F: Fn(Host, CallbackEvent, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let registrar = self.registrar;
        registrar
            .callbacks
            .register(registrar.plugin, &self.key, RawCallback(handler), None)?;
        debug!(plugin = registrar.plugin, key = %self.key, "Registered raw callback");
        Ok(())
    }
}
