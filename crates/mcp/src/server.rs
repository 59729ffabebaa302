//! MCP Server Implementation
//!
//! Implements the Model Context Protocol server for Parcelo.

use rmcp::{
    handler::server::ServerHandler,
    model::*,
    schemars::{self, JsonSchema},
    serde::{Deserialize, Serialize},
    tool, ServiceExt,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use parcelo_agent::{
    FallbackExtractor, GeminiClient, InformationExtractor, ParcelOrchestrator, ParcelOutcome,
    RequestExtractor,
};
use parcelo_client::{EntityCache, EntityKind, HttpLogisticsClient};
use parcelo_core::build_clarifying_question;
use parcelo_core::config::AppConfig;

use crate::McpError;

/// Main MCP server for Parcelo
#[derive(Clone)]
pub struct ParceloMcpServer {
    orchestrator: Arc<ParcelOrchestrator<HttpLogisticsClient>>,
    extractor: Arc<dyn RequestExtractor>,
}

impl ParceloMcpServer {
    /// Create a new MCP server instance from loaded configuration
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        info!("Initializing Parcelo MCP Server");

        let extractor: Arc<dyn RequestExtractor> = if config.llm.enabled {
            Arc::new(InformationExtractor::new(GeminiClient::new(&config.llm)?))
        } else {
            Arc::new(FallbackExtractor::new())
        };

        let api = Arc::new(HttpLogisticsClient::new(&config.api)?);
        let orchestrator = Arc::new(ParcelOrchestrator::new(
            Arc::clone(&extractor),
            api,
            Arc::new(EntityCache::new()),
            &config.api,
        ));

        Ok(Self { orchestrator, extractor })
    }

    /// Run the server with stdio transport
    pub async fn run_stdio(self) -> anyhow::Result<()> {
        use tokio::io::{stdin, stdout};

        info!("Starting MCP server with stdio transport");

        let service = self.serve((stdin(), stdout())).await?;

        // Wait for shutdown
        let _quit = service.waiting().await?;

        info!("MCP server shutdown complete");
        Ok(())
    }
}

// Implement ServerHandler trait for MCP protocol
#[tool(tool_box)]
impl ServerHandler for ParceloMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
                logging: Some(JsonObject::default()),
                ..Default::default()
            },
            server_info: Implementation {
                name: "parcelo-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(
                "Parcelo MCP Server - free-text parcel booking for AI agents. \
                 Create parcels from one message, preview what a message would \
                 submit, and list known cities and materials."
                    .to_string(),
            ),
        }
    }
}

// ============================================================================
// Parcel Tools
// ============================================================================

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ParcelCreateInput {
    #[schemars(
        description = "Free-text shipment request, e.g. 'parcel for ABC from jaipur to kolkata 200kg electronics'"
    )]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ParcelCreateResult {
    pub success: bool,
    pub message: String,
    pub parcel_id: Option<String>,
    pub cost: Option<i64>,
    pub needs_input: bool,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ParcelPreviewInput {
    #[schemars(description = "Free-text shipment request to preview without submitting")]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ParcelPreviewResult {
    pub complete: bool,
    pub company: Option<String>,
    pub from_city: Option<String>,
    pub to_city: Option<String>,
    pub weight: Option<f64>,
    pub weight_unit: Option<String>,
    pub material: Option<String>,
    pub price: Option<i64>,
    pub question: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct EntityListInput {
    #[schemars(description = "Entity kind to list: cities, materials, or companies")]
    pub kind: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct EntityListResult {
    pub kind: String,
    pub count: usize,
    pub names: Vec<String>,
}

#[tool(tool_box)]
impl ParceloMcpServer {
    /// Create a parcel from a free-text shipment request
    #[tool(
        name = "create_parcel",
        description = "Create a parcel from a free-text shipment request, booking a trip and submitting to the logistics backend"
    )]
    async fn create_parcel(
        &self,
        #[tool(aggr)] input: ParcelCreateInput,
    ) -> Result<CallToolResult, rmcp::Error> {
        debug!(message_len = input.message.len(), "create_parcel called");

        if input.message.trim().is_empty() {
            return Ok(tool_failure(McpError::Validation(
                "message must not be empty".to_string(),
            )));
        }

        let result = match self.orchestrator.process_message(&input.message).await {
            ParcelOutcome::Created { message, parcel_id, cost, .. } => ParcelCreateResult {
                success: true,
                message,
                parcel_id,
                cost: Some(cost),
                needs_input: false,
            },
            ParcelOutcome::NeedsClarification { question } => ParcelCreateResult {
                success: false,
                message: question,
                parcel_id: None,
                cost: None,
                needs_input: true,
            },
            ParcelOutcome::Failed { message } => ParcelCreateResult {
                success: false,
                message,
                parcel_id: None,
                cost: None,
                needs_input: false,
            },
        };

        let content = serde_json::to_string_pretty(&result)
            .map_err(|e| rmcp::Error::internal_error(e.to_string(), None))?;

        Ok(CallToolResult {
            content: vec![Content::text(content)],
            is_error: Some(false),
        })
    }

    /// Extract and validate a message without submitting anything
    #[tool(
        name = "parcel_preview",
        description = "Extract shipment details from a message and report what is still missing, without creating anything"
    )]
    async fn parcel_preview(
        &self,
        #[tool(aggr)] input: ParcelPreviewInput,
    ) -> Result<CallToolResult, rmcp::Error> {
        debug!(message_len = input.message.len(), "parcel_preview called");

        let request = self.extractor.extract(&input.message).await;
        let question = build_clarifying_question(&request);

        let result = ParcelPreviewResult {
            complete: question.is_none(),
            company: request.company,
            from_city: request.from_city,
            to_city: request.to_city,
            weight: request.weight,
            weight_unit: request.weight_unit,
            material: request.material,
            price: request.price,
            question,
        };

        let content = serde_json::to_string_pretty(&result)
            .map_err(|e| rmcp::Error::internal_error(e.to_string(), None))?;

        Ok(CallToolResult {
            content: vec![Content::text(content)],
            is_error: Some(false),
        })
    }

    /// List the entity names the backend knows for one catalog
    #[tool(
        name = "entity_list",
        description = "List the known cities, materials, or companies from the logistics backend"
    )]
    async fn entity_list(
        &self,
        #[tool(aggr)] input: EntityListInput,
    ) -> Result<CallToolResult, rmcp::Error> {
        debug!(kind = %input.kind, "entity_list called");

        let kind = match entity_kind_of(&input.kind) {
            Ok(kind) => kind,
            Err(error) => return Ok(tool_failure(error)),
        };

        let listing = self.orchestrator.resolver().bulk_listing(kind).await;
        let mut names: Vec<String> = listing.into_keys().collect();
        names.sort();

        let result =
            EntityListResult { kind: kind.as_str().to_string(), count: names.len(), names };

        let content = serde_json::to_string_pretty(&result)
            .map_err(|e| rmcp::Error::internal_error(e.to_string(), None))?;

        Ok(CallToolResult {
            content: vec![Content::text(content)],
            is_error: Some(false),
        })
    }
}

// ============================================================================
// Helper functions
// ============================================================================

fn entity_kind_of(kind: &str) -> Result<EntityKind, McpError> {
    match kind.trim().to_lowercase().as_str() {
        "city" | "cities" => Ok(EntityKind::City),
        "material" | "materials" => Ok(EntityKind::Material),
        "company" | "companies" => Ok(EntityKind::Company),
        other => Err(McpError::Validation(format!(
            "unknown entity kind '{other}', expected cities, materials, or companies"
        ))),
    }
}

fn tool_failure(error: McpError) -> CallToolResult {
    warn!(code = error.error_code(), error = %error, "tool call failed");
    CallToolResult {
        content: vec![Content::text(error.to_string())],
        is_error: Some(true),
    }
}

#[cfg(test)]
mod tests {
    use parcelo_client::EntityKind;

    use super::{entity_kind_of, ParcelCreateInput};

    #[test]
    fn entity_kinds_accept_singular_and_plural_spellings() {
        assert_eq!(entity_kind_of("cities").unwrap(), EntityKind::City);
        assert_eq!(entity_kind_of("City").unwrap(), EntityKind::City);
        assert_eq!(entity_kind_of("materials").unwrap(), EntityKind::Material);
        assert_eq!(entity_kind_of("companies").unwrap(), EntityKind::Company);

        let error = entity_kind_of("warehouses").err().expect("unknown kind");
        assert!(error.to_string().contains("warehouses"));
    }

    #[test]
    fn create_parcel_input_deserializes_from_plain_json() {
        let input: ParcelCreateInput =
            serde_json::from_str(r#"{"message":"from jaipur to kolkata 200kg electronics"}"#)
                .expect("input");

        assert!(input.message.contains("jaipur"));
    }
}
