use serde::{Deserialize, Serialize};

/// Emission side an element or field is written to.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    #[default]
    Both,
    Backend,
    Frontend,
}

/// Concrete emission target of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Target {
    Backend,
    Frontend,
}

impl Target {
    pub const ALL: [Target; 2] = [Target::Backend, Target::Frontend];

    pub fn dir_name(self) -> &'static str {
        match self {
            Target::Backend => "backend",
            Target::Frontend => "frontend",
        }
    }
}

impl Location {
    pub fn includes(self, target: Target) -> bool {
        matches!(
            (self, target),
            (Location::Both, _)
                | (Location::Backend, Target::Backend)
                | (Location::Frontend, Target::Frontend)
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    Int,
    Guid,
}

/// Variant of a schema field. The declaration order of the variants is the
/// order in which field sets are traversed.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Key,
    String,
    Bool,
    DateTime,
    DateTimeOffset,
    Decimal,
    Int,
    Collection,
    EntityCollection,
    Summary,
    Enum,
    Entity,
}

impl FieldKind {
    pub fn is_storage_field(self) -> bool {
        !matches!(self, FieldKind::Collection | FieldKind::Summary)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub max_length: u32,
    #[serde(default)]
    pub precision: Option<u8>,
    #[serde(default)]
    pub scale: Option<u8>,
    #[serde(default)]
    pub key_type: Option<KeyType>,
    #[serde(default, rename = "type")]
    pub type_name: Option<String>,
    #[serde(default)]
    pub custom_attributes: Vec<String>,
}

impl FieldDef {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        FieldDef {
            name: name.to_string(),
            kind,
            location: Location::Both,
            required: false,
            max_length: 0,
            precision: None,
            scale: None,
            key_type: None,
            type_name: None,
            custom_attributes: Vec::new(),
        }
    }

    pub fn emits_to(&self, target: Target) -> bool {
        self.location.includes(target)
    }
}

/// Ordered collection of fields belonging to one element or directive.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct FieldSet(pub Vec<FieldDef>);

impl FieldSet {
    /// Every declared field exactly once, grouped by kind in traversal order
    /// and in declaration order within a kind.
    pub fn visit(&self) -> Vec<&FieldDef> {
        let mut fields: Vec<&FieldDef> = self.0.iter().collect();
        fields.sort_by_key(|f| f.kind);
        fields
    }

    pub fn visit_for(&self, target: Target) -> Vec<&FieldDef> {
        self.visit()
            .into_iter()
            .filter(|f| f.emits_to(target))
            .collect()
    }

    pub fn key(&self) -> Option<&FieldDef> {
        self.0.iter().find(|f| f.kind == FieldKind::Key)
    }

    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.0.iter().find(|f| f.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldDef> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Cross-cutting capability marker. Variant order is the canonical
/// rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Capability {
    DataState,
    Key(KeyType),
    RowVersion,
    AuditLog,
}

impl Capability {
    pub fn marker(self) -> &'static str {
        match self {
            Capability::DataState => "IHasDataState",
            Capability::Key(KeyType::Int) => "IHasIntegerKey",
            Capability::Key(KeyType::Guid) => "IHasGuidKey",
            Capability::RowVersion => "IHasRowVersionControl",
            Capability::AuditLog => "IHasAuditLog",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Lifetime {
    #[default]
    Transient,
    Scoped,
    Singleton,
}

impl Lifetime {
    pub fn registration_method(self) -> &'static str {
        match self {
            Lifetime::Transient => "AddTransient",
            Lifetime::Scoped => "AddScoped",
            Lifetime::Singleton => "AddSingleton",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServiceDirective {
    #[serde(default)]
    pub persistence_backed: bool,
    #[serde(default)]
    pub lifetime: Lifetime,
    #[serde(default)]
    pub additional_usings: Vec<String>,
    #[serde(default)]
    pub custom_attributes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EndpointDirective {
    #[serde(default)]
    pub authentication_required: bool,
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Overrides the injected service interface, e.g. `ICountryLookup`.
    #[serde(default)]
    pub interface_service_name: Option<String>,
    #[serde(default)]
    pub service_method_name: Option<String>,
    #[serde(default)]
    pub generate_client: bool,
    #[serde(default)]
    pub additional_usings: Vec<String>,
    #[serde(default)]
    pub custom_attributes: Vec<String>,
}

/// Handler, single-getter and collection-getter directives share one shape.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OperationDirective {
    #[serde(default)]
    pub additional_usings: Vec<String>,
    #[serde(default)]
    pub custom_attributes: Vec<String>,
    #[serde(default)]
    pub request_fields: FieldSet,
    #[serde(default)]
    pub service: Option<ServiceDirective>,
    #[serde(default)]
    pub endpoint: Option<EndpointDirective>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ForeignKeyDef {
    /// Navigation field on the storage entity.
    pub field: String,
    /// Scalar field holding the referenced key.
    pub key_field: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DatabaseEntityDirective {
    #[serde(default)]
    pub ignore_fields: Vec<String>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyDef>,
    #[serde(default)]
    pub indexes: Vec<String>,
    #[serde(default)]
    pub additional_fields: FieldSet,
    #[serde(default)]
    pub additional_usings: Vec<String>,
    #[serde(default)]
    pub custom_attributes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MappingDirection {
    ToStorage,
    FromStorage,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MappingDirective {
    pub direction: MappingDirection,
    /// Storage entity name without prefix; defaults to the owning element.
    #[serde(default)]
    pub database_entity: Option<String>,
    #[serde(default)]
    pub ignore_fields: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EntityDef {
    pub name: String,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub include_data_state: bool,
    #[serde(default)]
    pub include_row_version: bool,
    #[serde(default)]
    pub include_audit_log: bool,
    #[serde(default)]
    pub additional_usings: Vec<String>,
    #[serde(default)]
    pub custom_attributes: Vec<String>,
    #[serde(default)]
    pub fields: FieldSet,
    #[serde(default)]
    pub handler: Option<OperationDirective>,
    #[serde(default)]
    pub getter: Option<OperationDirective>,
    #[serde(default)]
    pub collection_getter: Option<OperationDirective>,
    #[serde(default)]
    pub database_entity: Option<DatabaseEntityDirective>,
    #[serde(default)]
    pub mappings: Vec<MappingDirective>,
}

impl EntityDef {
    pub fn capabilities(&self) -> Vec<Capability> {
        let mut caps = Vec::new();
        if self.include_data_state {
            caps.push(Capability::DataState);
        }
        if let Some(key_type) = self.fields.key().and_then(|k| k.key_type) {
            caps.push(Capability::Key(key_type));
        }
        if self.include_row_version {
            caps.push(Capability::RowVersion);
        }
        if self.include_audit_log {
            caps.push(Capability::AuditLog);
        }
        caps.sort();
        caps
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SummaryDef {
    pub name: String,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub include_row_version: bool,
    #[serde(default)]
    pub include_audit_log: bool,
    /// Storage entity (unprefixed) a summary is projected from.
    #[serde(default)]
    pub database_entity: Option<String>,
    #[serde(default)]
    pub additional_usings: Vec<String>,
    #[serde(default)]
    pub custom_attributes: Vec<String>,
    #[serde(default)]
    pub fields: FieldSet,
    #[serde(default)]
    pub getter: Option<OperationDirective>,
    #[serde(default)]
    pub collection_getter: Option<OperationDirective>,
    #[serde(default)]
    pub mappings: Vec<MappingDirective>,
}

impl SummaryDef {
    pub fn capabilities(&self) -> Vec<Capability> {
        let mut caps = Vec::new();
        if let Some(key_type) = self.fields.key().and_then(|k| k.key_type) {
            caps.push(Capability::Key(key_type));
        }
        if self.include_row_version {
            caps.push(Capability::RowVersion);
        }
        if self.include_audit_log {
            caps.push(Capability::AuditLog);
        }
        caps.sort();
        caps
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EnumValueDef {
    pub name: String,
    #[serde(default)]
    pub value: Option<i64>,
    #[serde(default)]
    pub location: Location,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EnumDef {
    pub name: String,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub auto_sequence: bool,
    #[serde(default)]
    pub additional_usings: Vec<String>,
    #[serde(default)]
    pub custom_attributes: Vec<String>,
    #[serde(default)]
    pub values: Vec<EnumValueDef>,
}

/// Free-standing request or response DTO.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CustomDtoDef {
    pub name: String,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub additional_usings: Vec<String>,
    #[serde(default)]
    pub custom_attributes: Vec<String>,
    #[serde(default)]
    pub fields: FieldSet,
}

/// One parsed schema document.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    pub format_version: u32,
    #[serde(default, rename = "entity")]
    pub entities: Vec<EntityDef>,
    #[serde(default, rename = "summary")]
    pub summaries: Vec<SummaryDef>,
    #[serde(default, rename = "enum")]
    pub enums: Vec<EnumDef>,
    #[serde(default, rename = "custom_request")]
    pub custom_requests: Vec<CustomDtoDef>,
    #[serde(default, rename = "custom_response")]
    pub custom_responses: Vec<CustomDtoDef>,
}

/// All schema documents of a pass, merged in load order.
#[derive(Debug, Clone, Default)]
pub struct SchemaModel {
    pub entities: Vec<EntityDef>,
    pub summaries: Vec<SummaryDef>,
    pub enums: Vec<EnumDef>,
    pub custom_requests: Vec<CustomDtoDef>,
    pub custom_responses: Vec<CustomDtoDef>,
}

impl SchemaModel {
    pub fn entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn summary(&self, name: &str) -> Option<&SummaryDef> {
        self.summaries.iter().find(|s| s.name == name)
    }

    pub fn enumeration(&self, name: &str) -> Option<&EnumDef> {
        self.enums.iter().find(|e| e.name == name)
    }

    /// Entities that carry a persistence directive, in declaration order.
    pub fn persisted_entities(&self) -> impl Iterator<Item = (&EntityDef, &DatabaseEntityDirective)> {
        self.entities
            .iter()
            .filter_map(|e| e.database_entity.as_ref().map(|d| (e, d)))
    }
}
