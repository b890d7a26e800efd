use crate::codegen::fields::{
    validation_rules, validator_writer, write_capability_properties, write_fields, write_key_accessors,
};
use crate::codegen::ArtifactSet;
use crate::emit::TypeWriter;
use crate::error::GenerateError;
use crate::ir::{EntityDef, SchemaModel, SummaryDef, Target};
use crate::naming;
use crate::settings::{DtoSettings, Settings};

/// Domain entities and summaries with their validators, for every configured
/// target the element is located on.
pub fn generate(schema: &SchemaModel, settings: &Settings, set: &mut ArtifactSet) -> Result<(), GenerateError> {
    for (target, dto) in settings.entities.configured() {
        for entity in schema.entities.iter().filter(|e| e.location.includes(target)) {
            let writer = entity_writer(settings, dto, entity, target)?;
            set.push(target, &writer)?;
            if let Some(ns) = &dto.validators_namespace {
                let rules = validation_rules(schema, &entity.fields, target);
                set.push(target, &validator_writer(ns, &entity.name, &dto.namespace, rules))?;
            }
        }
        for summary in schema.summaries.iter().filter(|s| s.location.includes(target)) {
            let writer = summary_writer(settings, dto, summary, target)?;
            set.push(target, &writer)?;
            if let Some(ns) = &dto.validators_namespace {
                let rules = validation_rules(schema, &summary.fields, target);
                set.push(target, &validator_writer(ns, &summary.name, &dto.namespace, rules))?;
            }
        }
    }
    Ok(())
}

fn base_usings(w: &mut TypeWriter, settings: &Settings, target: Target) {
    w.write_using("System");
    w.write_using("System.Collections.Generic");
    w.write_using("System.ComponentModel.DataAnnotations");
    w.write_using("System.ComponentModel.DataAnnotations.Schema");
    w.write_using(naming::runtime::MODELS);
    w.write_using(naming::runtime::ENTITIES);
    w.write_optional_using(settings.enums_namespace(target));
}

pub fn entity_writer(
    settings: &Settings,
    dto: &DtoSettings,
    entity: &EntityDef,
    target: Target,
) -> Result<TypeWriter, GenerateError> {
    let mut w = TypeWriter::class(&dto.namespace, &entity.name);
    base_usings(&mut w, settings, target);
    w.write_usings(&entity.additional_usings);
    w.write_attributes(&entity.custom_attributes);

    let capabilities = entity.capabilities();
    w.inherit("IEntity");
    for cap in &capabilities {
        w.inherit(cap.marker());
    }

    let notify = dto.notify_property_changes;
    write_fields(&mut w, &entity.name, &entity.fields, target, notify)?;
    write_capability_properties(&mut w, &capabilities, notify);
    write_key_accessors(&mut w, entity.fields.key());
    Ok(w)
}

pub fn summary_writer(
    settings: &Settings,
    dto: &DtoSettings,
    summary: &SummaryDef,
    target: Target,
) -> Result<TypeWriter, GenerateError> {
    let mut w = TypeWriter::class(&dto.namespace, &summary.name);
    base_usings(&mut w, settings, target);
    w.write_usings(&summary.additional_usings);
    w.write_attributes(&summary.custom_attributes);

    let capabilities = summary.capabilities();
    w.inherit("ISummary");
    for cap in &capabilities {
        w.inherit(cap.marker());
    }

    let notify = dto.notify_property_changes;
    write_fields(&mut w, &summary.name, &summary.fields, target, notify)?;
    write_capability_properties(&mut w, &capabilities, notify);
    write_key_accessors(&mut w, summary.fields.key());
    Ok(w)
}
