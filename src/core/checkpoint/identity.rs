//! Source identity for checkpoint naming
//!
//! Checkpoints are only valid for the broker namespace and entity they were
//! written against. The identity is derived from configuration, either from
//! explicit values or from an Event Hubs connection string of the form
//! `Endpoint=sb://<namespace>/;SharedAccessKeyName=..;SharedAccessKey=..;EntityPath=<hub>`.

use crate::domain::{Result, VitalStreamError};
use url::Url;

/// Consumer group used when none is configured
pub const DEFAULT_CONSUMER_GROUP: &str = "$default";

/// Namespace, entity and consumer group that checkpoints belong to
///
/// All components are stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceIdentity {
    namespace: String,
    entity: String,
    consumer_group: String,
}

impl SourceIdentity {
    /// Create an identity from explicit components
    ///
    /// `namespace` may be a bare host (`ns.servicebus.windows.net`) or a URL
    /// (`sb://ns.servicebus.windows.net/`). An empty consumer group falls back
    /// to `$default`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the namespace or entity is empty.
    pub fn new(namespace: &str, entity: &str, consumer_group: &str) -> Result<Self> {
        let namespace = normalize_namespace(namespace)?;
        let entity = entity.trim().trim_matches('/').to_lowercase();
        if entity.is_empty() {
            return Err(VitalStreamError::Validation(
                "Event hub name is required for checkpointing".to_string(),
            ));
        }
        let consumer_group = match consumer_group.trim() {
            "" => DEFAULT_CONSUMER_GROUP.to_string(),
            group => group.to_lowercase(),
        };

        Ok(Self {
            namespace,
            entity,
            consumer_group,
        })
    }

    /// Resolve an identity from configuration
    ///
    /// Explicit values win; missing ones are taken from the connection string.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a namespace or entity cannot be derived.
    pub fn resolve(
        namespace: Option<&str>,
        entity: Option<&str>,
        connection_string: Option<&str>,
        consumer_group: &str,
    ) -> Result<Self> {
        let parsed = connection_string.map(ConnectionStringParts::parse).transpose()?;

        let namespace = non_empty(namespace)
            .map(str::to_string)
            .or_else(|| parsed.as_ref().and_then(|p| p.namespace.clone()))
            .ok_or_else(|| {
                VitalStreamError::Validation(
                    "Unable to determine the event hub namespace: set event_hub.fully_qualified_namespace or provide a connection string with an Endpoint".to_string(),
                )
            })?;

        let entity = non_empty(entity)
            .map(str::to_string)
            .or_else(|| parsed.as_ref().and_then(|p| p.entity_path.clone()))
            .ok_or_else(|| {
                VitalStreamError::Validation(
                    "Unable to determine the event hub name: set event_hub.event_hub_name or provide a connection string with an EntityPath".to_string(),
                )
            })?;

        Self::new(&namespace, &entity, consumer_group)
    }

    /// Fully qualified namespace host
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Event hub (entity) name
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn consumer_group(&self) -> &str {
        &self.consumer_group
    }
}

impl std::fmt::Display for SourceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.entity, self.consumer_group)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn normalize_namespace(namespace: &str) -> Result<String> {
    let namespace = namespace.trim();
    if namespace.is_empty() {
        return Err(VitalStreamError::Validation(
            "Event hub namespace is required for checkpointing".to_string(),
        ));
    }

    let host = if namespace.contains("://") {
        let url = Url::parse(namespace).map_err(|e| {
            VitalStreamError::Validation(format!("Invalid namespace URL '{namespace}': {e}"))
        })?;
        url.host_str()
            .map(str::to_string)
            .ok_or_else(|| {
                VitalStreamError::Validation(format!("Namespace URL '{namespace}' has no host"))
            })?
    } else {
        namespace.trim_end_matches('/').to_string()
    };

    Ok(host.to_lowercase())
}

/// The parts of an Event Hubs connection string relevant to checkpointing
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct ConnectionStringParts {
    namespace: Option<String>,
    entity_path: Option<String>,
}

impl ConnectionStringParts {
    fn parse(connection_string: &str) -> Result<Self> {
        let mut parts = Self::default();
        for pair in connection_string.split(';') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "endpoint" if !value.is_empty() => {
                    parts.namespace = Some(normalize_namespace(value)?);
                }
                "entitypath" if !value.is_empty() => {
                    parts.entity_path = Some(value.to_string());
                }
                _ => {}
            }
        }
        Ok(parts)
    }
}
