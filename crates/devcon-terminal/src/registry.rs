//! Command descriptors, providers, live instances, and the registry.
//!
//! A provider is any host type exposing console commands. It describes them
//! once with [`CommandDescriptor::builder`]; the registry aggregates those
//! descriptors at start-up. Handlers run against a live instance of the
//! provider taken from the [`Scene`], so a provider's commands only work
//! while the host keeps at least one instance spawned.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;

use devcon_types::error::{ConsoleError, Result};

use crate::convert::{Args, ParamType};
use crate::writer::Writer;

/// Identity of a provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderKey {
    id: TypeId,
    name: &'static str,
}

impl ProviderKey {
    pub fn of<P: Any>() -> Self {
        let full = std::any::type_name::<P>();
        Self {
            id: TypeId::of::<P>(),
            name: full.rsplit("::").next().unwrap_or(full),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// A host type that exposes console commands.
pub trait CommandProvider: Any {
    /// Every command this provider exposes.
    fn commands() -> Vec<CommandDescriptor>
    where
        Self: Sized;
}

/// One declared parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: ParamType,
    pub hint: Option<String>,
}

impl Param {
    /// Label shown in usage strings.
    pub fn label(&self) -> &str {
        self.hint.as_deref().unwrap_or(&self.name)
    }
}

/// What a handler gets when it runs.
pub struct Call<'a> {
    /// Output sink of the active transport.
    pub out: Writer<'a>,
    /// Converted arguments in declaration order.
    pub args: Args,
    /// Name of the instance the command runs against.
    pub instance: &'a str,
}

type Handler = Box<dyn Fn(&mut (dyn Any + 'static), &mut Call<'_>) -> Result<()>>;

/// Commands the console itself implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Help,
    CHelp,
    Quit,
    Close,
    Clear,
}

pub(crate) enum Binding {
    Builtin(Builtin),
    Provider { key: ProviderKey, handler: Handler },
}

/// Static metadata and binding for one command.
pub struct CommandDescriptor {
    name: String,
    description: String,
    params: Vec<Param>,
    pub(crate) binding: Binding,
}

impl std::fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("provider", &self.provider().map(|p| p.name()))
            .finish()
    }
}

impl CommandDescriptor {
    /// Start describing a command handled by provider `P`.
    pub fn builder<P: CommandProvider>(name: &str, description: &str) -> CommandBuilder<P> {
        CommandBuilder {
            name: name.to_string(),
            description: description.to_string(),
            params: Vec::new(),
            _provider: PhantomData,
        }
    }

    pub(crate) fn builtin(
        name: &str,
        description: &str,
        params: Vec<Param>,
        builtin: Builtin,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            params,
            binding: Binding::Builtin(builtin),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Owning provider, or `None` for console built-ins.
    pub fn provider(&self) -> Option<ProviderKey> {
        match &self.binding {
            Binding::Builtin(_) => None,
            Binding::Provider { key, .. } => Some(*key),
        }
    }

    /// `<b>name</b> [hint-or-param] ...`
    pub fn usage(&self) -> String {
        let mut usage = format!("<b>{}</b>", self.name);
        for param in &self.params {
            usage.push_str(&format!(" [{}]", param.label()));
        }
        usage
    }
}

/// Builder returned by [`CommandDescriptor::builder`].
pub struct CommandBuilder<P> {
    name: String,
    description: String,
    params: Vec<Param>,
    _provider: PhantomData<fn(&mut P)>,
}

impl<P: CommandProvider> CommandBuilder<P> {
    pub fn param(mut self, name: &str, ty: ParamType) -> Self {
        self.params.push(Param {
            name: name.to_string(),
            ty,
            hint: None,
        });
        self
    }

    /// Parameter with a human-readable hint for usage strings.
    pub fn hinted_param(mut self, name: &str, ty: ParamType, hint: &str) -> Self {
        self.params.push(Param {
            name: name.to_string(),
            ty,
            hint: Some(hint.to_string()),
        });
        self
    }

    /// Bind the handler and finish the descriptor.
    pub fn handler<F>(self, handler: F) -> CommandDescriptor
    where
        F: Fn(&mut P, &mut Call<'_>) -> Result<()> + 'static,
    {
        let erased: Handler = Box::new(move |target: &mut (dyn Any + 'static), call: &mut Call<'_>| {
            let provider = target
                .downcast_mut::<P>()
                .ok_or(ConsoleError::NoInstance)?;
            handler(provider, call)
        });
        CommandDescriptor {
            name: self.name,
            description: self.description,
            params: self.params,
            binding: Binding::Provider {
                key: ProviderKey::of::<P>(),
                handler: erased,
            },
        }
    }
}

/// Handle to a spawned provider instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(u64);

struct Instance {
    id: InstanceId,
    name: String,
    provider: TypeId,
    object: Box<dyn Any>,
}

/// The host's live provider instances, in spawn order.
#[derive(Default)]
pub struct Scene {
    instances: Vec<Instance>,
    next_id: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a live instance of a provider.
    pub fn spawn<P: CommandProvider>(&mut self, name: &str, provider: P) -> InstanceId {
        let id = InstanceId(self.next_id);
        self.next_id += 1;
        self.instances.push(Instance {
            id,
            name: name.to_string(),
            provider: TypeId::of::<P>(),
            object: Box::new(provider),
        });
        log::debug!("Spawned {} as {name}", ProviderKey::of::<P>().name());
        id
    }

    /// Remove an instance. Returns `false` if it was not live.
    pub fn despawn(&mut self, id: InstanceId) -> bool {
        let before = self.instances.len();
        self.instances.retain(|i| i.id != id);
        before != self.instances.len()
    }

    pub fn get<P: Any>(&self, id: InstanceId) -> Option<&P> {
        self.instances
            .iter()
            .find(|i| i.id == id)
            .and_then(|i| i.object.downcast_ref::<P>())
    }

    pub fn get_mut<P: Any>(&mut self, id: InstanceId) -> Option<&mut P> {
        self.instances
            .iter_mut()
            .find(|i| i.id == id)
            .and_then(|i| i.object.downcast_mut::<P>())
    }

    /// Number of live instances of a provider.
    pub fn count(&self, key: ProviderKey) -> usize {
        self.instances.iter().filter(|i| i.provider == key.id).count()
    }

    pub fn is_live(&self, key: ProviderKey) -> bool {
        self.instances.iter().any(|i| i.provider == key.id)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub(crate) fn target_mut(&mut self, id: InstanceId) -> Option<(&str, &mut (dyn Any + 'static))> {
        self.instances
            .iter_mut()
            .find(|i| i.id == id)
            .map(|i| (i.name.as_str(), i.object.as_mut()))
    }
}

/// All known command descriptors, keyed by name.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, CommandDescriptor>,
}

impl CommandRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor. A later registration under the same name replaces
    /// the earlier one.
    pub fn register(&mut self, descriptor: CommandDescriptor) {
        let name = descriptor.name().to_string();
        if let Some(previous) = self.commands.insert(name.clone(), descriptor) {
            log::warn!(
                "Command '{name}' registered twice; replacing the one from {}",
                previous.provider().map_or("console", |p| p.name())
            );
        }
    }

    /// Register every command of provider `P`.
    pub fn register_provider<P: CommandProvider>(&mut self) {
        let descriptors = P::commands();
        log::debug!(
            "Registering {} commands from {}",
            descriptors.len(),
            ProviderKey::of::<P>().name()
        );
        for descriptor in descriptors {
            self.register(descriptor);
        }
    }

    /// Descriptor for `name` (case-sensitive), live or not.
    pub fn resolve(&self, name: &str) -> Option<&CommandDescriptor> {
        self.commands.get(name)
    }

    /// Descriptors whose provider has a live instance, sorted by name.
    /// Built-ins are always included.
    pub fn list_commands(&self, scene: &Scene) -> Vec<&CommandDescriptor> {
        let mut live: Vec<&CommandDescriptor> = self
            .commands
            .values()
            .filter(|d| d.provider().is_none_or(|key| scene.is_live(key)))
            .collect();
        live.sort_by(|a, b| a.name().cmp(b.name()));
        live
    }

    /// Descriptor for `name` if its provider is live.
    pub fn resolve_live(&self, name: &str, scene: &Scene) -> Option<&CommandDescriptor> {
        self.resolve(name)
            .filter(|d| d.provider().is_none_or(|key| scene.is_live(key)))
    }

    /// Pick the instance a provider's command runs against.
    ///
    /// With several live instances the first spawned wins and a warning
    /// naming it goes to `out`.
    pub fn find_instance(
        &self,
        scene: &Scene,
        key: ProviderKey,
        out: &mut Writer<'_>,
    ) -> Result<InstanceId> {
        let mut matches = scene.instances.iter().filter(|i| i.provider == key.id);
        let first = matches.next().ok_or(ConsoleError::NoInstance)?;
        if matches.next().is_some() {
            let msg = format!(
                "More than one instance found for type <b>{}</b>. Choosing <b>{}</b> for execution.",
                key.name(),
                first.name
            );
            log::warn!("{msg}");
            out.write_warning(&msg);
        }
        Ok(first.id)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LocalTransport;
    use devcon_types::config::OutputColors;

    struct Lamp {
        on: bool,
    }

    impl CommandProvider for Lamp {
        fn commands() -> Vec<CommandDescriptor> {
            vec![
                CommandDescriptor::builder::<Lamp>("lamp_toggle", "Toggles the lamp.").handler(
                    |lamp: &mut Lamp, _call: &mut Call<'_>| {
                        lamp.on = !lamp.on;
                        Ok(())
                    },
                ),
                CommandDescriptor::builder::<Lamp>("lamp_dim", "Dims the lamp.")
                    .hinted_param("level", ParamType::Float, "0-1")
                    .param("fade", ParamType::Bool)
                    .handler(|_: &mut Lamp, _: &mut Call<'_>| Ok(())),
            ]
        }
    }

    struct Fan;

    impl CommandProvider for Fan {
        fn commands() -> Vec<CommandDescriptor> {
            vec![
                CommandDescriptor::builder::<Fan>("lamp_toggle", "Fan hijacks the lamp.")
                    .handler(|_: &mut Fan, _: &mut Call<'_>| Ok(())),
            ]
        }
    }

    #[test]
    fn usage_prefers_hint() {
        let mut reg = CommandRegistry::new();
        reg.register_provider::<Lamp>();
        let dim = reg.resolve("lamp_dim").unwrap();
        assert_eq!(dim.usage(), "<b>lamp_dim</b> [0-1] [fade]");
        assert_eq!(dim.params().len(), 2);
        assert_eq!(dim.provider(), Some(ProviderKey::of::<Lamp>()));
    }

    #[test]
    fn resolve_is_case_sensitive() {
        let mut reg = CommandRegistry::new();
        reg.register_provider::<Lamp>();
        assert!(reg.resolve("lamp_toggle").is_some());
        assert!(reg.resolve("LAMP_TOGGLE").is_none());
    }

    #[test]
    fn last_registration_wins() {
        let mut reg = CommandRegistry::new();
        reg.register_provider::<Lamp>();
        reg.register_provider::<Fan>();
        assert_eq!(reg.len(), 2);
        let toggle = reg.resolve("lamp_toggle").unwrap();
        assert_eq!(toggle.provider(), Some(ProviderKey::of::<Fan>()));
    }

    #[test]
    fn list_only_live_providers() {
        let mut reg = CommandRegistry::new();
        reg.register_provider::<Lamp>();
        let mut scene = Scene::new();
        assert!(reg.list_commands(&scene).is_empty());
        assert!(reg.resolve_live("lamp_dim", &scene).is_none());

        let id = scene.spawn("desk lamp", Lamp { on: false });
        let names: Vec<&str> = reg.list_commands(&scene).iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["lamp_dim", "lamp_toggle"]);

        assert!(scene.despawn(id));
        assert!(!scene.despawn(id));
        assert!(reg.list_commands(&scene).is_empty());
    }

    #[test]
    fn find_instance_none() {
        let reg = CommandRegistry::new();
        let scene = Scene::new();
        let mut sink = LocalTransport::new();
        let mut out = Writer::new(&mut sink, OutputColors::default());
        let err = reg
            .find_instance(&scene, ProviderKey::of::<Lamp>(), &mut out)
            .unwrap_err();
        assert!(matches!(err, ConsoleError::NoInstance));
    }

    #[test]
    fn find_instance_ambiguous_picks_first_and_warns() {
        let reg = CommandRegistry::new();
        let mut scene = Scene::new();
        let first = scene.spawn("desk", Lamp { on: false });
        scene.spawn("floor", Lamp { on: true });
        assert_eq!(scene.count(ProviderKey::of::<Lamp>()), 2);

        let mut sink = LocalTransport::new();
        let mut out = Writer::new(&mut sink, OutputColors::default());
        let picked = reg
            .find_instance(&scene, ProviderKey::of::<Lamp>(), &mut out)
            .unwrap();
        assert_eq!(picked, first);
        assert!(sink.output().contains("More than one instance"));
        assert!(sink.output().contains("<b>desk</b>"));
    }

    #[test]
    fn scene_typed_access() {
        let mut scene = Scene::new();
        let id = scene.spawn("lamp", Lamp { on: false });
        scene.get_mut::<Lamp>(id).unwrap().on = true;
        assert!(scene.get::<Lamp>(id).unwrap().on);
        assert!(scene.get::<Fan>(id).is_none());
        assert_eq!(scene.len(), 1);
    }
}
