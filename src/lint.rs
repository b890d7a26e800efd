use std::collections::HashSet;

use regex::Regex;

use crate::codegen::directives::directives;
use crate::ir::{FieldKind, FieldSet, Location, SchemaModel};
use crate::settings::Settings;

fn identifier() -> Regex {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
}

fn check_fields(
    schema: &SchemaModel,
    ident: &Regex,
    owner: &str,
    fields: &FieldSet,
    errors: &mut Vec<String>,
) {
    let keys = fields.iter().filter(|f| f.kind == FieldKind::Key).count();
    if keys > 1 {
        errors.push(format!("{} declares {} key fields; at most one is allowed", owner, keys));
    }
    let mut seen = HashSet::new();
    for field in fields.iter() {
        if !ident.is_match(&field.name) {
            errors.push(format!("{} has invalid field name {:?}", owner, field.name));
        } else if !field.name.starts_with(|c: char| c.is_ascii_uppercase()) {
            // Backing fields are the lower-camel property name.
            errors.push(format!(
                "Field {} of {} must start with an upper-case letter",
                field.name, owner
            ));
        }
        if !seen.insert(field.name.as_str()) {
            errors.push(format!("{} declares field {} more than once", owner, field.name));
        }
        if field.kind == FieldKind::Key && field.location != Location::Both {
            errors.push(format!("Key field {} of {} must be emitted to both sides", field.name, owner));
        }
        let Some(type_name) = field.type_name.as_deref() else {
            continue;
        };
        let known = match field.kind {
            FieldKind::Entity | FieldKind::EntityCollection => schema.entity(type_name).is_some(),
            FieldKind::Summary => schema.summary(type_name).is_some(),
            FieldKind::Enum => schema.enumeration(type_name).is_some(),
            _ => true,
        };
        if !known {
            errors.push(format!(
                "Field {} of {} references unknown {:?} type {}",
                field.name, owner, field.kind, type_name
            ));
        }
    }
}

/// Checks the schema for structural problems that would produce
/// inconsistent artifacts. Returns human-readable messages; empty means
/// valid.
pub fn lint_schema(schema: &SchemaModel, settings: &Settings) -> Vec<String> {
    let mut errors = Vec::new();
    let ident = identifier();

    for entity in &schema.entities {
        if !ident.is_match(&entity.name) {
            errors.push(format!("Entity name {:?} is not a valid identifier", entity.name));
        }
        let owner = format!("Entity {}", entity.name);
        check_fields(schema, &ident, &owner, &entity.fields, &mut errors);

        if let Some(db) = &entity.database_entity {
            check_fields(schema, &ident, &owner, &db.additional_fields, &mut errors);
            let has = |name: &str| entity.fields.get(name).is_some() || db.additional_fields.get(name).is_some();
            for name in db.ignore_fields.iter().chain(&db.indexes) {
                if !has(name) {
                    errors.push(format!("{} persistence refers to unknown field {}", owner, name));
                }
            }
            for fk in &db.foreign_keys {
                for name in [&fk.field, &fk.key_field] {
                    if !has(name) {
                        errors.push(format!("{} foreign key refers to unknown field {}", owner, name));
                    }
                }
            }
        }
        for mapping in &entity.mappings {
            let storage = mapping.database_entity.as_deref().unwrap_or(&entity.name);
            if !schema.entity(storage).is_some_and(|e| e.database_entity.is_some()) {
                errors.push(format!("{} maps to {} which is not persisted", owner, storage));
            }
        }
    }

    for summary in &schema.summaries {
        if !ident.is_match(&summary.name) {
            errors.push(format!("Summary name {:?} is not a valid identifier", summary.name));
        }
        let owner = format!("Summary {}", summary.name);
        check_fields(schema, &ident, &owner, &summary.fields, &mut errors);
        if let Some(storage) = &summary.database_entity {
            if !schema.entity(storage).is_some_and(|e| e.database_entity.is_some()) {
                errors.push(format!("{} is projected from {} which is not persisted", owner, storage));
            }
        }
    }

    for en in &schema.enums {
        let mut seen = HashSet::new();
        for value in &en.values {
            if !ident.is_match(&value.name) {
                errors.push(format!("Enum {} has invalid value name {:?}", en.name, value.name));
            }
            if !seen.insert(value.name.as_str()) {
                errors.push(format!("Enum {} declares value {} more than once", en.name, value.name));
            }
        }
    }

    for dto in schema.custom_requests.iter().chain(&schema.custom_responses) {
        check_fields(schema, &ident, &format!("Custom type {}", dto.name), &dto.fields, &mut errors);
    }

    for d in directives(schema) {
        let owner = format!("{} {}", d.kind.role(), d.base);
        check_fields(schema, &ident, &owner, &d.op.request_fields, &mut errors);
        if d.is_persistence_backed() && d.storage.is_none() {
            errors.push(format!("{} is persistence backed but {} has no storage entity", owner, d.element));
        }
        if let Some(endpoint) = &d.op.endpoint {
            if d.op.service.is_none() && endpoint.interface_service_name.is_none() {
                errors.push(format!(
                    "{} exposes an endpoint without a service or interface_service_name",
                    owner
                ));
            }
            if !endpoint.permissions.is_empty() && !endpoint.authentication_required {
                errors.push(format!(
                    "{} lists permissions but does not require authentication",
                    owner
                ));
            }
            if endpoint.generate_client && settings.api_client.is_some() && settings.api.is_none() {
                errors.push(format!("{} requests a client but no [api] section is configured", owner));
            }
        }
    }

    errors
}
