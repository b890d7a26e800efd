use serde::{Deserialize, Serialize};

use crate::ir::Target;

/// Settings document schema version understood by this crate.
pub const FORMAT_VERSION: u32 = 1;

/// A per-target pair of layer settings; either side may be absent.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Targeted<T> {
    pub backend: Option<T>,
    pub frontend: Option<T>,
}

impl<T> Default for Targeted<T> {
    fn default() -> Self {
        Targeted {
            backend: None,
            frontend: None,
        }
    }
}

impl<T> Targeted<T> {
    pub fn get(&self, target: Target) -> Option<&T> {
        match target {
            Target::Backend => self.backend.as_ref(),
            Target::Frontend => self.frontend.as_ref(),
        }
    }

    /// Configured sides in canonical target order.
    pub fn configured(&self) -> impl Iterator<Item = (Target, &T)> {
        Target::ALL
            .into_iter()
            .filter_map(move |t| self.get(t).map(|s| (t, s)))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct EnumSettings {
    pub namespace: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct DtoSettings {
    pub namespace: String,
    #[serde(default)]
    pub validators_namespace: Option<String>,
    #[serde(default)]
    pub notify_property_changes: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct PersistenceSettings {
    pub entities_namespace: String,
    #[serde(default)]
    pub entity_prefix: String,
    #[serde(default = "default_true")]
    pub generate_database_entity: bool,
    #[serde(default)]
    pub generate_type_configuration: bool,
    #[serde(default)]
    pub configurations_namespace: Option<String>,
    #[serde(default)]
    pub generate_db_context: bool,
    #[serde(default)]
    pub context_namespace: Option<String>,
    #[serde(default = "default_context_name")]
    pub context_name: String,
    #[serde(default)]
    pub repositories_namespace: Option<String>,
    #[serde(default)]
    pub mapper_namespace: Option<String>,
    /// Identity user type; switches the context base to the identity context.
    #[serde(default)]
    pub identity_user_class: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_context_name() -> String {
    "ApplicationDbContext".to_string()
}

fn default_route_prefix() -> String {
    "/api".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ServiceSettings {
    pub namespace: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ApiSettings {
    pub namespace: String,
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ApiClientSettings {
    pub namespace: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct AuthSettings {
    pub user_class: String,
}

/// The single settings document of a pass. A missing section disables the
/// corresponding layer.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub format_version: u32,
    #[serde(default)]
    pub enums: Targeted<EnumSettings>,
    #[serde(default)]
    pub entities: Targeted<DtoSettings>,
    #[serde(default)]
    pub custom_requests: Targeted<DtoSettings>,
    #[serde(default)]
    pub custom_responses: Targeted<DtoSettings>,
    #[serde(default)]
    pub persistence: Option<PersistenceSettings>,
    #[serde(default)]
    pub services: Option<ServiceSettings>,
    #[serde(default)]
    pub api: Option<ApiSettings>,
    #[serde(default)]
    pub api_client: Option<ApiClientSettings>,
    #[serde(default)]
    pub auth: Option<AuthSettings>,
}

impl Settings {
    pub fn entities_namespace(&self, target: Target) -> Option<&str> {
        self.entities.get(target).map(|s| s.namespace.as_str())
    }

    pub fn enums_namespace(&self, target: Target) -> Option<&str> {
        self.enums.get(target).map(|s| s.namespace.as_str())
    }

    pub fn storage_namespace(&self) -> Option<&str> {
        self.persistence
            .as_ref()
            .filter(|p| p.generate_database_entity)
            .map(|p| p.entities_namespace.as_str())
    }

    pub fn context_namespace(&self) -> Option<&str> {
        self.persistence
            .as_ref()
            .filter(|p| p.generate_db_context)
            .and_then(|p| p.context_namespace.as_deref())
    }

    pub fn context_name(&self) -> &str {
        self.persistence
            .as_ref()
            .map(|p| p.context_name.as_str())
            .unwrap_or("ApplicationDbContext")
    }

    pub fn repositories_namespace(&self) -> Option<&str> {
        self.persistence
            .as_ref()
            .and_then(|p| p.repositories_namespace.as_deref())
    }

    pub fn entity_prefix(&self) -> &str {
        self.persistence
            .as_ref()
            .map(|p| p.entity_prefix.as_str())
            .unwrap_or("")
    }

    pub fn services_namespace(&self) -> Option<&str> {
        self.services.as_ref().map(|s| s.namespace.as_str())
    }
}
