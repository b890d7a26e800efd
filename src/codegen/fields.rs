use crate::emit::{Method, Property, TypeWriter};
use crate::error::GenerateError;
use crate::ir::{Capability, FieldDef, FieldKind, FieldSet, KeyType, SchemaModel, Target};
use crate::naming;

/// Rendered type of a field. Fails for fields the type system cannot map.
pub fn field_type(owner: &str, field: &FieldDef) -> Result<String, GenerateError> {
    let unmapped = || GenerateError::UnmappedField {
        owner: owner.to_string(),
        field: field.name.clone(),
        kind: format!("{:?}", field.kind),
    };
    let typed = || {
        field
            .type_name
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(unmapped)
    };
    Ok(match field.kind {
        FieldKind::Key => key_type_name(field.key_type.ok_or_else(unmapped)?).to_string(),
        FieldKind::String => "string".to_string(),
        FieldKind::Bool => "bool".to_string(),
        FieldKind::DateTime => "DateTime".to_string(),
        FieldKind::DateTimeOffset => "DateTimeOffset".to_string(),
        FieldKind::Decimal => "decimal".to_string(),
        FieldKind::Int => "int".to_string(),
        FieldKind::EntityCollection => format!("IList<{}>", typed()?),
        FieldKind::Collection | FieldKind::Summary | FieldKind::Enum | FieldKind::Entity => {
            typed()?.to_string()
        }
    })
}

/// Rendered type on the storage side; entity references point at storage
/// entities.
pub fn storage_field_type(owner: &str, field: &FieldDef, prefix: &str) -> Result<String, GenerateError> {
    match field.kind {
        FieldKind::Entity => Ok(naming::storage_entity(prefix, &field_type(owner, field)?)),
        FieldKind::EntityCollection => {
            field_type(owner, field)?;
            let element = field.type_name.as_deref().unwrap_or_default();
            Ok(format!("IList<{}>", naming::storage_entity(prefix, element)))
        }
        _ => field_type(owner, field),
    }
}

pub fn key_type_name(key_type: KeyType) -> &'static str {
    match key_type {
        KeyType::Int => "int",
        KeyType::Guid => "Guid",
    }
}

/// Initial value for collection-valued properties.
pub fn default_value(rendered_type: &str) -> Option<String> {
    rendered_type
        .strip_prefix("IList<")
        .and_then(|t| t.strip_suffix('>'))
        .map(|element| format!("new List<{}>()", element))
}

/// Writes one property per field emitted to `target`, in traversal order.
pub fn write_fields(
    writer: &mut TypeWriter,
    owner: &str,
    fields: &FieldSet,
    target: Target,
    notify: bool,
) -> Result<(), GenerateError> {
    for field in fields.visit_for(target) {
        let ty = field_type(owner, field)?;
        let value = default_value(&ty).unwrap_or_default();
        writer.write_property(
            Property::auto(&ty, &field.name)
                .value(&value)
                .notify(notify)
                .attributes(&field.custom_attributes),
        );
    }
    Ok(())
}

/// Properties contributed by the row-version, audit-log and data-state
/// capabilities, in that order.
pub fn write_capability_properties(writer: &mut TypeWriter, capabilities: &[Capability], notify: bool) {
    if capabilities.contains(&Capability::RowVersion) {
        writer.write_property(
            Property::auto("byte[]?", "RowVersion")
                .notify(notify)
                .attribute("Timestamp"),
        );
    }
    if capabilities.contains(&Capability::AuditLog) {
        writer.write_property(
            Property::auto("string", "CreatedByUserName")
                .value("string.Empty")
                .notify(notify)
                .attribute("Required")
                .attribute("MaxLength(510)"),
        );
        writer.write_property(
            Property::auto("DateTimeOffset", "CreatedAt")
                .notify(notify)
                .attribute("Required"),
        );
        writer.write_property(
            Property::auto("string?", "UpdatedByUserName")
                .notify(notify)
                .attribute("MaxLength(510)"),
        );
        writer.write_property(Property::auto("DateTimeOffset?", "UpdatedAt").notify(notify));
    }
    if capabilities.contains(&Capability::DataState) {
        writer.write_property(
            Property::auto("DataState", "DataState")
                .notify(notify)
                .attribute("NotMapped"),
        );
    }
}

/// `GetKey` / `SetKey` accessors for types carrying a key capability.
pub fn write_key_accessors(writer: &mut TypeWriter, key: Option<&FieldDef>) {
    let Some((key, key_type)) = key.and_then(|k| k.key_type.map(|t| (k, t))) else {
        return;
    };
    let ty = key_type_name(key_type);
    writer.write_method(
        Method::new("GetKey")
            .returns(ty)
            .line(format!("return this.{};", key.name)),
    );
    writer.write_method(
        Method::new("SetKey")
            .params(&format!("{} key", ty))
            .line(format!("this.{} = key;", key.name)),
    );
}

/// Validation statements for the fields of `owner` emitted to `target`.
pub fn validation_rules(schema: &SchemaModel, fields: &FieldSet, target: Target) -> Vec<String> {
    let mut rules = Vec::new();
    for field in fields.visit_for(target) {
        let mut chain = String::new();
        if field.required {
            chain.push_str(".NotNull()");
            if field.kind != FieldKind::Bool {
                chain.push_str(".NotEmpty()");
            }
        }
        if field.kind == FieldKind::String && field.max_length > 0 {
            chain.push_str(&format!(".MaximumLength({})", field.max_length));
        }
        if !chain.is_empty() {
            rules.push(format!("this.RuleFor(x => x.{}){};", field.name, chain));
        }

        let nested = field
            .type_name
            .as_deref()
            .filter(|t| schema.entity(t).is_some_and(|e| e.location.includes(target)));
        match (field.kind, nested) {
            (FieldKind::Entity, Some(t)) => rules.push(format!(
                "this.RuleFor(x => x.{}).SetValidator(new {}());",
                field.name,
                naming::validator(t)
            )),
            (FieldKind::EntityCollection, Some(t)) => rules.push(format!(
                "this.RuleForEach(x => x.{}).SetValidator(new {}());",
                field.name,
                naming::validator(t)
            )),
            _ => {}
        }
    }
    rules
}

/// Companion validator for `type_name`, finished with the custom-rules hook.
pub fn validator_writer(
    namespace: &str,
    type_name: &str,
    type_namespace: &str,
    rules: Vec<String>,
) -> TypeWriter {
    let name = naming::validator(type_name);
    let mut w = TypeWriter::class(namespace, &name);
    w.write_using("FluentValidation");
    w.write_using(naming::runtime::VALIDATION);
    w.write_using(type_namespace);
    w.inherit(&format!("AbstractValidator<{}>", type_name));
    for rule in &rules {
        w.write_constructor_line(rule);
    }
    let hook = w.write_hook(
        &format!("IValidationRules<{}>", type_name),
        &format!("NoValidationRules<{}>", type_name),
        "customRules",
    );
    w.write_constructor_line(&format!("{}.Apply(this);", hook));
    w
}
