//! Addressing tree: application -> module -> component -> method.
//!
//! References are created lazily and cached by name. They never touch the
//! network; a [`MethodReference`] validates its call kind against the
//! application schema and then hands the call to the shared invoker.
//!
//! # Example
//!
//! ```ignore
//! let app = client.app_reference("TodoApp")?;
//! let method = app.module("TodoModule").component("TodoComponent").method("addTodo");
//! let created = method.call(json!({ "text": "write docs" }), None).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::control::{AppSchema, MethodKind};
use crate::error::{OnixError, Result};
use crate::invoker::Invoker;
use crate::subscription::Subscription;

/// State shared by every node below one application.
struct AppConfig {
    name: String,
    schema: AppSchema,
    invoker: Arc<Invoker>,
}

/// Cache of child references by name.
struct Children<T> {
    cache: Mutex<HashMap<String, T>>,
}

impl<T: Clone> Children<T> {
    fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn get_or_insert_with(&self, name: &str, create: impl FnOnce() -> T) -> T {
        self.cache
            .lock()
            .entry(name.to_string())
            .or_insert_with(create)
            .clone()
    }
}

/// Reference to a server application.
#[derive(Clone)]
pub struct AppReference {
    inner: Arc<AppNode>,
}

struct AppNode {
    config: Arc<AppConfig>,
    modules: Children<ModuleReference>,
}

impl AppReference {
    pub(crate) fn new(name: &str, schema: AppSchema, invoker: Arc<Invoker>) -> Self {
        Self {
            inner: Arc::new(AppNode {
                config: Arc::new(AppConfig {
                    name: name.to_string(),
                    schema,
                    invoker,
                }),
                modules: Children::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    /// The application's schema.
    pub fn schema(&self) -> &AppSchema {
        &self.inner.config.schema
    }

    /// Reference to a module of this application.
    pub fn module(&self, name: &str) -> ModuleReference {
        self.inner.modules.get_or_insert_with(name, || ModuleReference {
            inner: Arc::new(ModuleNode {
                config: self.inner.config.clone(),
                name: name.to_string(),
                components: Children::new(),
            }),
        })
    }

    /// Whether both handles point at the same cached node.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Reference to a module.
#[derive(Clone)]
pub struct ModuleReference {
    inner: Arc<ModuleNode>,
}

struct ModuleNode {
    config: Arc<AppConfig>,
    name: String,
    components: Children<ComponentReference>,
}

impl ModuleReference {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Reference to a component of this module.
    pub fn component(&self, name: &str) -> ComponentReference {
        self.inner.components.get_or_insert_with(name, || ComponentReference {
            inner: Arc::new(ComponentNode {
                config: self.inner.config.clone(),
                module: self.inner.name.clone(),
                name: name.to_string(),
                methods: Children::new(),
            }),
        })
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Reference to a component.
#[derive(Clone)]
pub struct ComponentReference {
    inner: Arc<ComponentNode>,
}

struct ComponentNode {
    config: Arc<AppConfig>,
    module: String,
    name: String,
    methods: Children<MethodReference>,
}

impl ComponentReference {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Reference to a method of this component.
    pub fn method(&self, name: &str) -> MethodReference {
        self.inner.methods.get_or_insert_with(name, || MethodReference {
            inner: Arc::new(MethodNode {
                config: self.inner.config.clone(),
                module: self.inner.module.clone(),
                component: self.inner.name.clone(),
                name: name.to_string(),
            }),
        })
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Reference to a remote method.
#[derive(Clone)]
pub struct MethodReference {
    inner: Arc<MethodNode>,
}

struct MethodNode {
    config: Arc<AppConfig>,
    module: String,
    component: String,
    name: String,
}

impl MethodReference {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Dotted path `app.module.component.method`.
    pub fn endpoint(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.inner.config.name, self.inner.module, self.inner.component, self.inner.name
        )
    }

    /// Whether the schema does NOT declare this method with `kind`.
    pub fn invalid(&self, kind: MethodKind) -> bool {
        !self.inner.config.schema.allows(
            &self.inner.module,
            &self.inner.component,
            &self.inner.name,
            kind,
        )
    }

    fn check(&self, kind: MethodKind) -> Result<()> {
        if self.invalid(kind) {
            return Err(OnixError::MethodUnavailable(self.endpoint()));
        }
        Ok(())
    }

    /// Call an `rpc` method and return the response payload.
    ///
    /// # Errors
    ///
    /// `MethodUnavailable` without sending anything when the schema does not
    /// declare the method as `rpc`; `Timeout` or `ConnectionLost` when no
    /// reply arrives.
    pub async fn call(&self, payload: Value, filter: Option<Value>) -> Result<Value> {
        self.check(MethodKind::Rpc)?;
        self.inner
            .config
            .invoker
            .call(&self.endpoint(), payload, filter)
            .await
    }

    /// Typed variant of [`call`](Self::call).
    pub async fn call_as<P, R>(&self, payload: &P, filter: Option<Value>) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let payload = serde_json::to_value(payload)?;
        let response = self.call(payload, filter).await?;
        Ok(serde_json::from_value(response)?)
    }

    /// Subscribe to a `stream` method.
    ///
    /// Resolves once the server acknowledges the subscription; `on_data`
    /// then runs for every pushed payload until the subscription is
    /// unsubscribed or the connection drops.
    ///
    /// # Errors
    ///
    /// `MethodUnavailable` without sending anything when the schema does not
    /// declare the method as `stream`.
    pub async fn stream<F>(&self, on_data: F, filter: Option<Value>) -> Result<Subscription>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.check(MethodKind::Stream)?;
        self.inner
            .config
            .invoker
            .stream(&self.endpoint(), on_data, filter)
            .await
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Metadata, OperationKind};
    use crate::testing::{deliver, invoker, RecordingTransport};
    use serde::Deserialize;
    use serde_json::json;

    fn app(transport: Arc<RecordingTransport>) -> AppReference {
        let schema = AppSchema::from_value(&json!({
            "Mod": { "Comp": { "greet": "rpc", "feed": "stream" } }
        }))
        .unwrap();
        AppReference::new("App", schema, invoker(transport))
    }

    #[test]
    fn test_references_are_cached() {
        let app = app(RecordingTransport::new());

        assert!(app.module("Mod").ptr_eq(&app.module("Mod")));
        assert!(!app.module("Mod").ptr_eq(&app.module("Other")));

        let component = app.module("Mod").component("Comp");
        assert!(component.ptr_eq(&app.module("Mod").component("Comp")));
        assert!(component.method("greet").ptr_eq(&component.method("greet")));
    }

    #[test]
    fn test_endpoint() {
        let method = app(RecordingTransport::new())
            .module("Mod")
            .component("Comp")
            .method("greet");
        assert_eq!(method.endpoint(), "App.Mod.Comp.greet");
        assert_eq!(method.name(), "greet");
    }

    #[test]
    fn test_invalid() {
        let component = app(RecordingTransport::new()).module("Mod").component("Comp");

        assert!(!component.method("greet").invalid(MethodKind::Rpc));
        assert!(component.method("greet").invalid(MethodKind::Stream));
        assert!(!component.method("feed").invalid(MethodKind::Stream));
        assert!(component.method("missing").invalid(MethodKind::Rpc));
    }

    #[tokio::test]
    async fn test_call_on_stream_method_sends_nothing() {
        let transport = RecordingTransport::new();
        let component = app(transport.clone()).module("Mod").component("Comp");

        let result = component.method("feed").call(json!({}), None).await;

        match result {
            Err(OnixError::MethodUnavailable(endpoint)) => {
                assert_eq!(endpoint, "App.Mod.Comp.feed")
            }
            other => panic!("expected MethodUnavailable, got {:?}", other),
        }
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_stream_on_rpc_method_sends_nothing() {
        let transport = RecordingTransport::new();
        let component = app(transport.clone()).module("Mod").component("Comp");

        let result = component.method("greet").stream(|_| {}, None).await;

        assert!(matches!(result, Err(OnixError::MethodUnavailable(_))));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_call_as_typed() {
        #[derive(Serialize)]
        struct Greet<'a> {
            name: &'a str,
        }
        #[derive(Deserialize, Debug, PartialEq)]
        struct Greeting {
            text: String,
        }

        let transport = RecordingTransport::new();
        let method = app(transport.clone())
            .module("Mod")
            .component("Comp")
            .method("greet");
        let invoker = method.inner.config.invoker.clone();

        let call = tokio::spawn(async move {
            method
                .call_as::<_, Greeting>(&Greet { name: "x" }, None)
                .await
        });

        let request = transport.nth_envelope(0).await;
        assert_eq!(request.payload(), &json!({ "name": "x" }));
        deliver(
            &invoker,
            request.reply(
                OperationKind::CallProcedureResponse,
                Metadata::default(),
                json!({ "text": "hello x" }),
            ),
        );

        assert_eq!(
            call.await.unwrap().unwrap(),
            Greeting {
                text: "hello x".into()
            }
        );
    }
}
