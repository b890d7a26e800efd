use crate::codegen::ArtifactSet;
use crate::emit::TypeWriter;
use crate::error::GenerateError;
use crate::ir::{EnumDef, SchemaModel, Target};
use crate::settings::Settings;

pub fn generate(schema: &SchemaModel, settings: &Settings, set: &mut ArtifactSet) -> Result<(), GenerateError> {
    for (target, enum_settings) in settings.enums.configured() {
        for en in schema.enums.iter().filter(|e| e.location.includes(target)) {
            let writer = enum_writer(&enum_settings.namespace, en, target);
            set.push(target, &writer)?;
        }
    }
    Ok(())
}

/// Values located on the other side are skipped; auto-sequenced values are
/// numbered by declaration position so both sides agree.
pub fn enum_writer(namespace: &str, en: &EnumDef, target: Target) -> TypeWriter {
    let mut w = TypeWriter::enumeration(namespace, &en.name);
    w.write_usings(&en.additional_usings);
    w.write_attributes(&en.custom_attributes);
    for (index, value) in en.values.iter().enumerate() {
        if !value.location.includes(target) {
            continue;
        }
        let number = if en.auto_sequence {
            Some(index as i64)
        } else {
            value.value
        };
        w.write_enum_member(&value.name, number);
    }
    w
}
