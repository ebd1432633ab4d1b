pub mod explorer;
pub mod gas;
pub mod params;
pub mod transfer;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::ethereum::EthereumClient;
use crate::explorer::ExplorerClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// A named capability the chat model may ask us to run. Schema and execution
/// live on the same type, so a tool cannot be advertised without a handler.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn schema(&self) -> Value;
    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<Value>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.schema(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Collaborators every tool may reach.
#[derive(Clone)]
pub struct ToolContext {
    pub explorer: ExplorerClient,
    pub chain: EthereumClient,
    pub token_icon_base_url: String,
}

impl ToolContext {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            explorer: ExplorerClient::new(config.explorer_api_url.clone()),
            chain: EthereumClient::new(&config.rpc_url, config.private_key.as_deref())?,
            token_icon_base_url: config.token_icon_base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Ordered, name-unique catalogue of tools.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<&'static str, usize>,
    definitions: Vec<ToolDefinition>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every explorer, gas and transfer tool, in the order the model sees them.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for tool in explorer::catalogue() {
            registry.register(Box::new(tool));
        }
        registry.register(Box::new(transfer::SendNativeTokenTool));
        registry.register(Box::new(transfer::SendErc20TokenTool));
        registry.register(Box::new(gas::GetGasPriceTool));
        registry.register(Box::new(gas::EstimateGasTool));
        registry
    }

    /// Registering an existing name replaces that entry in place.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name();
        let definition = tool.definition();
        match self.index.get(name) {
            Some(&slot) => {
                warn!("Replacing already registered tool {}", name);
                self.tools[slot] = tool;
                self.definitions[slot] = definition;
            }
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
                self.definitions.push(definition);
            }
        }
    }

    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        self.register(Box::new(tool));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&slot| self.tools[slot].as_ref())
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Dispatches a tool name + arguments to the registered handler.
pub struct ToolExecutor {
    registry: ToolRegistry,
    context: ToolContext,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry, context: ToolContext) -> Self {
        Self { registry, context }
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        self.registry.definitions()
    }

    pub async fn execute(&self, name: &str, args: Value) -> Result<Value> {
        let tool = self
            .registry
            .get(name)
            .ok_or_else(|| Error::UnknownTool(name.to_string()))?;

        debug!("Executing tool {} with {}", name, args);
        tool.call(&self.context, args).await
    }
}
