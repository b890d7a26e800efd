use crate::ir::{FieldDef, Location, OperationDirective, SchemaModel};
use crate::naming;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    EntityHandler,
    EntityGetter,
    EntitiesGetter,
    SummaryGetter,
    SummariesGetter,
}

impl DirectiveKind {
    pub fn is_handler(self) -> bool {
        self == DirectiveKind::EntityHandler
    }

    pub fn role(self) -> &'static str {
        if self.is_handler() {
            "Handler"
        } else {
            "Getter"
        }
    }

    /// Generic base name of services and service interfaces.
    fn service_base(self) -> &'static str {
        match self {
            DirectiveKind::EntityHandler => "EntityHandlerService",
            DirectiveKind::EntityGetter => "EntityGetterService",
            DirectiveKind::EntitiesGetter => "EntitiesGetterService",
            DirectiveKind::SummaryGetter => "SummaryGetterService",
            DirectiveKind::SummariesGetter => "SummariesGetterService",
        }
    }
}

/// A handler or getter directive resolved against its owning element. Every
/// writer derives the names of directive artifacts from this view.
#[derive(Debug, Clone)]
pub struct Directive<'a> {
    pub kind: DirectiveKind,
    /// Entity or summary name.
    pub element: &'a str,
    /// Element name, pluralized for collection getters.
    pub base: String,
    pub location: Location,
    pub key: Option<&'a FieldDef>,
    /// Unprefixed storage entity behind persistence-backed services.
    pub storage: Option<&'a str>,
    pub op: &'a OperationDirective,
}

impl<'a> Directive<'a> {
    fn new(
        kind: DirectiveKind,
        element: &'a str,
        location: Location,
        key: Option<&'a FieldDef>,
        storage: Option<&'a str>,
        op: &'a OperationDirective,
    ) -> Self {
        let base = match kind {
            DirectiveKind::EntitiesGetter | DirectiveKind::SummariesGetter => naming::plural(element),
            _ => element.to_string(),
        };
        Directive {
            kind,
            element,
            base,
            location,
            key,
            storage,
            op,
        }
    }

    fn stem(&self) -> String {
        format!("{}{}", self.base, self.kind.role())
    }

    pub fn request_type(&self) -> String {
        format!("{}Request", self.stem())
    }

    pub fn response_type(&self) -> String {
        format!("{}Response", self.stem())
    }

    pub fn service_interface(&self) -> String {
        format!("I{}Service", self.stem())
    }

    pub fn service_type(&self) -> String {
        format!("{}Service", self.stem())
    }

    pub fn controller_type(&self) -> String {
        format!("{}Controller", self.stem())
    }

    pub fn client_interface(&self) -> String {
        format!("I{}Client", self.stem())
    }

    /// Route segment identifying the controller.
    pub fn route_segment(&self) -> String {
        self.stem()
    }

    pub fn is_persistence_backed(&self) -> bool {
        self.op.service.as_ref().is_some_and(|s| s.persistence_backed)
    }

    /// Interface the endpoint injects: the override when declared.
    pub fn endpoint_service_interface(&self) -> String {
        self.op
            .endpoint
            .as_ref()
            .and_then(|e| e.interface_service_name.clone())
            .unwrap_or_else(|| self.service_interface())
    }

    /// Field holding the injected service. Overrides are named after the
    /// override interface with its marker stripped; the role suffix is kept
    /// in both cases.
    pub fn service_field(&self) -> String {
        let suffix = format!("{}Service", self.kind.role());
        match self
            .op
            .endpoint
            .as_ref()
            .and_then(|e| e.interface_service_name.as_deref())
        {
            Some(name) => format!("{}{}", naming::lower_camel(naming::strip_marker(name)), suffix),
            None => format!("{}{}", naming::lower_camel(&self.base), suffix),
        }
    }

    pub fn service_method(&self) -> String {
        self.op
            .endpoint
            .as_ref()
            .and_then(|e| e.service_method_name.clone())
            .unwrap_or_else(|| {
                if self.kind.is_handler() {
                    "SaveAsync".to_string()
                } else {
                    "GetAsync".to_string()
                }
            })
    }

    pub fn request_marker(&self) -> String {
        match self.kind {
            DirectiveKind::EntityHandler => format!("IEntityHandlerRequest<{}>", self.element),
            DirectiveKind::EntityGetter => "IEntityGetterRequest".to_string(),
            DirectiveKind::EntitiesGetter => "IEntitiesGetterRequest".to_string(),
            DirectiveKind::SummaryGetter => "ISummaryGetterRequest".to_string(),
            DirectiveKind::SummariesGetter => "ISummariesGetterRequest".to_string(),
        }
    }

    pub fn response_marker(&self) -> String {
        let marker = match self.kind {
            DirectiveKind::EntityHandler => "IEntityHandlerResponse",
            DirectiveKind::EntityGetter => "IEntityGetterResponse",
            DirectiveKind::EntitiesGetter => "IEntitiesGetterResponse",
            DirectiveKind::SummaryGetter => "ISummaryGetterResponse",
            DirectiveKind::SummariesGetter => "ISummariesGetterResponse",
        };
        format!("{}<{}>", marker, self.element)
    }

    /// Nested payload property of the response: type, name, initial value.
    pub fn response_payload(&self) -> (String, &'static str, String) {
        match self.kind {
            DirectiveKind::EntityHandler | DirectiveKind::EntityGetter => (
                format!("{}?", self.element),
                "Entity",
                String::new(),
            ),
            DirectiveKind::EntitiesGetter => (
                format!("IList<{}>", self.element),
                "Entities",
                format!("new List<{}>()", self.element),
            ),
            DirectiveKind::SummaryGetter => (format!("{}?", self.element), "Summary", String::new()),
            DirectiveKind::SummariesGetter => (
                format!("IList<{}>", self.element),
                "Summaries",
                format!("new List<{}>()", self.element),
            ),
        }
    }

    /// Single-item getters are addressed by the element key.
    pub fn request_key(&self) -> Option<&'a FieldDef> {
        match self.kind {
            DirectiveKind::EntityGetter | DirectiveKind::SummaryGetter => self.key,
            _ => None,
        }
    }

    /// Service base type and interface base type.
    pub fn service_bases(&self, context: &str, prefix: &str) -> (String, String) {
        let plain = self.kind.service_base();
        let args = format!("{}, {}, {}", self.element, self.request_type(), self.response_type());
        match self.storage.filter(|_| self.is_persistence_backed()) {
            Some(storage) => {
                let storage = naming::storage_entity(prefix, storage);
                (
                    format!("Database{}<{}, {}, {}>", plain, context, storage, args),
                    format!("IDatabase{}<{}, {}>", plain, storage, args),
                )
            }
            None => (format!("{}<{}>", plain, args), format!("I{}<{}>", plain, args)),
        }
    }
}

/// All directives of the schema in declaration order: entities first, then
/// summaries; handler, getter, collection getter within an element.
pub fn directives(schema: &SchemaModel) -> Vec<Directive<'_>> {
    let mut out = Vec::new();
    for e in &schema.entities {
        let key = e.fields.key();
        let storage = e.database_entity.as_ref().map(|_| e.name.as_str());
        let ops = [
            (DirectiveKind::EntityHandler, &e.handler),
            (DirectiveKind::EntityGetter, &e.getter),
            (DirectiveKind::EntitiesGetter, &e.collection_getter),
        ];
        for (kind, op) in ops {
            if let Some(op) = op {
                out.push(Directive::new(kind, &e.name, e.location, key, storage, op));
            }
        }
    }
    for s in &schema.summaries {
        let key = s.fields.key();
        let storage = s.database_entity.as_deref();
        let ops = [
            (DirectiveKind::SummaryGetter, &s.getter),
            (DirectiveKind::SummariesGetter, &s.collection_getter),
        ];
        for (kind, op) in ops {
            if let Some(op) = op {
                out.push(Directive::new(kind, &s.name, s.location, key, storage, op));
            }
        }
    }
    out
}
