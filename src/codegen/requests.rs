use crate::codegen::contract::{AuthOperation, AUTH_OPERATIONS};
use crate::codegen::directives::{directives, Directive, DirectiveKind};
use crate::codegen::fields::{
    field_type, validation_rules, validator_writer, write_fields, write_key_accessors,
};
use crate::codegen::ArtifactSet;
use crate::emit::{Property, TypeWriter};
use crate::error::GenerateError;
use crate::ir::{Capability, CustomDtoDef, SchemaModel, Target};
use crate::naming;
use crate::settings::{DtoSettings, Settings};

/// Request/response pairs for every directive and, when account management
/// is configured, for the fixed authentication operations.
pub fn generate(schema: &SchemaModel, settings: &Settings, set: &mut ArtifactSet) -> Result<(), GenerateError> {
    let all = directives(schema);
    for (target, dto) in settings.entities.configured() {
        for d in all.iter().filter(|d| d.location.includes(target)) {
            set.push(target, &request_writer(settings, dto, d, target)?)?;
            set.push(target, &response_writer(settings, dto, d, target))?;
            if let Some(ns) = &dto.validators_namespace {
                let rules = request_rules(schema, d, target);
                set.push(target, &validator_writer(ns, &d.request_type(), &dto.namespace, rules))?;
            }
        }
        if settings.auth.is_some() {
            for op in &AUTH_OPERATIONS {
                write_auth_dtos(set, dto, op, target)?;
            }
        }
    }
    Ok(())
}

fn dto_usings(w: &mut TypeWriter, settings: &Settings, target: Target) {
    w.write_using("System");
    w.write_using("System.Collections.Generic");
    w.write_using(naming::runtime::MODELS);
    w.write_using(naming::runtime::REQUESTS);
    w.write_optional_using(settings.enums_namespace(target));
}

pub fn request_writer(
    settings: &Settings,
    dto: &DtoSettings,
    d: &Directive<'_>,
    target: Target,
) -> Result<TypeWriter, GenerateError> {
    let mut w = TypeWriter::class(&dto.namespace, &d.request_type());
    dto_usings(&mut w, settings, target);
    w.write_usings(&d.op.additional_usings);
    w.write_attributes(&d.op.custom_attributes);
    w.inherit(&d.request_marker());

    let notify = dto.notify_property_changes;
    if d.kind == DirectiveKind::EntityHandler {
        w.write_property(
            Property::auto(d.element, "Entity")
                .value(&format!("new {}()", d.element))
                .notify(notify),
        );
    }
    if let Some(key) = d.request_key() {
        if let Some(key_type) = key.key_type {
            w.inherit(Capability::Key(key_type).marker());
        }
        let ty = field_type(&d.request_type(), key)?;
        w.write_property(Property::auto(&ty, &key.name).notify(notify));
        write_key_accessors(&mut w, Some(key));
    }
    write_fields(&mut w, &d.request_type(), &d.op.request_fields, target, notify)?;
    Ok(w)
}

pub fn response_writer(settings: &Settings, dto: &DtoSettings, d: &Directive<'_>, target: Target) -> TypeWriter {
    let mut w = TypeWriter::class(&dto.namespace, &d.response_type());
    dto_usings(&mut w, settings, target);
    w.write_usings(&d.op.additional_usings);
    w.inherit(&d.response_marker());
    let (ty, name, value) = d.response_payload();
    w.write_property(
        Property::auto(&ty, name)
            .value(&value)
            .notify(dto.notify_property_changes),
    );
    w
}

/// Nested payloads are always required; their own validator runs on them.
fn request_rules(schema: &SchemaModel, d: &Directive<'_>, target: Target) -> Vec<String> {
    let mut rules = Vec::new();
    if d.kind == DirectiveKind::EntityHandler {
        rules.push("this.RuleFor(x => x.Entity).NotNull();".to_string());
        rules.push(format!(
            "this.RuleFor(x => x.Entity).SetValidator(new {}());",
            naming::validator(d.element)
        ));
    }
    if let Some(key) = d.request_key() {
        rules.push(format!("this.RuleFor(x => x.{}).NotNull().NotEmpty();", key.name));
    }
    rules.extend(validation_rules(schema, &d.op.request_fields, target));
    rules
}

fn write_auth_dtos(
    set: &mut ArtifactSet,
    dto: &DtoSettings,
    op: &AuthOperation,
    target: Target,
) -> Result<(), GenerateError> {
    let notify = dto.notify_property_changes;

    let mut request = TypeWriter::class(&dto.namespace, &op.request_type());
    request.write_using(naming::runtime::REQUESTS);
    request.inherit("IRequest");
    for field in op.request_fields {
        request.write_property(Property::auto("string", field).value("string.Empty").notify(notify));
    }
    set.push(target, &request)?;

    let mut response = TypeWriter::class(&dto.namespace, &op.response_type());
    response.write_using(naming::runtime::REQUESTS);
    response.inherit("IResponse");
    for field in op.response_fields {
        response.write_property(Property::auto("string", field).value("string.Empty").notify(notify));
    }
    set.push(target, &response)?;

    if let Some(ns) = &dto.validators_namespace {
        let rules = op
            .request_fields
            .iter()
            .map(|f| format!("this.RuleFor(x => x.{}).NotNull().NotEmpty();", f))
            .collect();
        set.push(target, &validator_writer(ns, &op.request_type(), &dto.namespace, rules))?;
    }
    Ok(())
}

/// Free-standing requests and responses.
pub fn generate_custom(schema: &SchemaModel, settings: &Settings, set: &mut ArtifactSet) -> Result<(), GenerateError> {
    let groups = [
        (&settings.custom_requests, &schema.custom_requests, "Request", "IRequest"),
        (&settings.custom_responses, &schema.custom_responses, "Response", "IResponse"),
    ];
    for (layer, defs, suffix, marker) in groups {
        for (target, dto) in layer.configured() {
            for def in defs.iter().filter(|d| d.location.includes(target)) {
                let name = format!("{}{}", def.name, suffix);
                set.push(target, &custom_writer(settings, dto, def, &name, marker, target)?)?;
                if let Some(ns) = &dto.validators_namespace {
                    let rules = validation_rules(schema, &def.fields, target);
                    set.push(target, &validator_writer(ns, &name, &dto.namespace, rules))?;
                }
            }
        }
    }
    Ok(())
}

fn custom_writer(
    settings: &Settings,
    dto: &DtoSettings,
    def: &CustomDtoDef,
    name: &str,
    marker: &str,
    target: Target,
) -> Result<TypeWriter, GenerateError> {
    let mut w = TypeWriter::class(&dto.namespace, name);
    dto_usings(&mut w, settings, target);
    w.write_optional_using(settings.entities_namespace(target));
    w.write_usings(&def.additional_usings);
    w.write_attributes(&def.custom_attributes);
    w.inherit(marker);
    if let Some(key_type) = def.fields.key().and_then(|k| k.key_type) {
        w.inherit(Capability::Key(key_type).marker());
    }
    write_fields(&mut w, name, &def.fields, target, dto.notify_property_changes)?;
    write_key_accessors(&mut w, def.fields.key());
    Ok(w)
}
