use crate::codegen::fields::{
    default_value, storage_field_type, write_capability_properties, write_key_accessors,
};
use crate::codegen::ArtifactSet;
use crate::emit::{Access, Method, Modifier, Property, TypeWriter};
use crate::error::GenerateError;
use crate::ir::{
    DatabaseEntityDirective, EntityDef, FieldDef, FieldKind, MappingDirection, MappingDirective,
    SchemaModel, Target,
};
use crate::naming;
use crate::settings::{PersistenceSettings, Settings};

/// Storage entities, type configurations, the mapping context, the
/// repository pair and the mapping profile. Everything here is backend-only.
pub fn generate(schema: &SchemaModel, settings: &Settings, set: &mut ArtifactSet) -> Result<(), GenerateError> {
    let Some(persistence) = &settings.persistence else {
        return Ok(());
    };
    let target = Target::Backend;

    for (entity, directive) in schema.persisted_entities() {
        if persistence.generate_database_entity {
            set.push(target, &storage_entity_writer(settings, persistence, entity, directive)?)?;
        }
        if let (true, Some(ns)) = (
            persistence.generate_type_configuration,
            persistence.configurations_namespace.as_deref(),
        ) {
            set.push(target, &configuration_writer(persistence, ns, entity, directive))?;
        }
    }

    if let Some(ns) = settings.context_namespace() {
        set.push(target, &context_writer(schema, persistence, ns))?;
        if let Some(repo_ns) = persistence.repositories_namespace.as_deref() {
            let (iface, repo) = repository_writers(persistence, repo_ns, ns);
            set.push(target, &iface)?;
            set.push(target, &repo)?;
        }
    }

    if let Some(ns) = persistence.mapper_namespace.as_deref() {
        set.push(target, &mapping_profile_writer(schema, settings, persistence, ns))?;
    }
    Ok(())
}

fn field_attributes(field: &FieldDef, directive: &DatabaseEntityDirective) -> Vec<String> {
    let mut attrs = field.custom_attributes.clone();
    if field.kind == FieldKind::Key {
        attrs.push("Key".to_string());
    }
    if field.required {
        attrs.push("Required".to_string());
    }
    if field.kind == FieldKind::String && field.max_length > 0 {
        attrs.push(format!("MaxLength({})", field.max_length));
    }
    if let Some(fk) = directive.foreign_keys.iter().find(|fk| fk.field == field.name) {
        attrs.push(format!("ForeignKey(nameof({}))", fk.key_field));
    }
    attrs
}

pub fn storage_entity_writer(
    settings: &Settings,
    persistence: &PersistenceSettings,
    entity: &EntityDef,
    directive: &DatabaseEntityDirective,
) -> Result<TypeWriter, GenerateError> {
    let prefix = persistence.entity_prefix.as_str();
    let name = naming::storage_entity(prefix, &entity.name);
    let mut w = TypeWriter::class(&persistence.entities_namespace, &name);
    w.write_using("System");
    w.write_using("System.Collections.Generic");
    w.write_using("System.ComponentModel.DataAnnotations");
    w.write_using("System.ComponentModel.DataAnnotations.Schema");
    w.write_using(naming::runtime::MODELS);
    w.write_using(naming::runtime::ENTITIES);
    w.write_using(naming::runtime::PERSISTENCE);
    w.write_optional_using(settings.enums_namespace(Target::Backend));
    w.write_usings(&directive.additional_usings);
    w.write_attributes(&directive.custom_attributes);

    let capabilities = entity.capabilities();
    w.inherit("IDatabaseEntity");
    for cap in &capabilities {
        w.inherit(cap.marker());
    }

    let declared = entity.fields.visit_for(Target::Backend);
    let additional = directive.additional_fields.visit_for(Target::Backend);
    for field in declared.into_iter().chain(additional) {
        if !field.kind.is_storage_field() || directive.ignore_fields.contains(&field.name) {
            continue;
        }
        let ty = storage_field_type(&name, field, prefix)?;
        let mut property = Property::auto(&ty, &field.name).attributes(&field_attributes(field, directive));
        match field.kind {
            FieldKind::Entity => property = property.virtual_(),
            FieldKind::EntityCollection => {
                let value = default_value(&ty).unwrap_or_default();
                property = property.virtual_().value(&value);
            }
            _ => {}
        }
        w.write_property(property);
    }
    write_capability_properties(&mut w, &capabilities, false);
    write_key_accessors(&mut w, entity.fields.key());
    Ok(w)
}

pub fn configuration_writer(
    persistence: &PersistenceSettings,
    namespace: &str,
    entity: &EntityDef,
    directive: &DatabaseEntityDirective,
) -> TypeWriter {
    let prefix = persistence.entity_prefix.as_str();
    let storage = naming::storage_entity(prefix, &entity.name);
    let mut w = TypeWriter::class(namespace, &naming::type_configuration(prefix, &entity.name));
    w.write_using("Microsoft.EntityFrameworkCore");
    w.write_using("Microsoft.EntityFrameworkCore.Metadata.Builders");
    w.write_using(naming::runtime::HOOKS);
    w.write_using(&persistence.entities_namespace);
    w.inherit(&format!("IEntityTypeConfiguration<{}>", storage));

    let hook = w.write_hook(
        &format!("IEntityConfigurationHook<{}>", storage),
        &format!("NoEntityConfigurationHook<{}>", storage),
        "configurationHook",
    );
    let mut configure = Method::new("Configure").params(&format!("EntityTypeBuilder<{}> builder", storage));
    for index in &directive.indexes {
        configure = configure.line(format!("builder.HasIndex(x => x.{});", index));
    }
    let decimals = entity
        .fields
        .visit_for(Target::Backend)
        .into_iter()
        .chain(directive.additional_fields.visit_for(Target::Backend))
        .filter(|f| f.kind == FieldKind::Decimal && !directive.ignore_fields.contains(&f.name));
    for field in decimals {
        configure = configure.line(format!(
            "builder.Property(x => x.{}).HasPrecision({}, {});",
            field.name,
            field.precision.unwrap_or(18),
            field.scale.unwrap_or(2)
        ));
    }
    configure = configure.line(format!("{}.Configure(builder);", hook));
    w.write_method(configure);
    w
}

pub fn context_writer(schema: &SchemaModel, persistence: &PersistenceSettings, namespace: &str) -> TypeWriter {
    let name = persistence.context_name.as_str();
    let prefix = persistence.entity_prefix.as_str();
    let mut w = TypeWriter::class(namespace, name);
    w.write_using("Microsoft.EntityFrameworkCore");
    w.write_using(naming::runtime::HOOKS);
    w.write_using(&persistence.entities_namespace);
    let configurations = persistence
        .configurations_namespace
        .as_deref()
        .filter(|_| persistence.generate_type_configuration);
    w.write_optional_using(configurations);

    match &persistence.identity_user_class {
        Some(user) => {
            w.write_using("Microsoft.AspNetCore.Identity.EntityFrameworkCore");
            w.inherit(&format!("IdentityDbContext<{}>", user));
        }
        None => w.inherit("DbContext"),
    }
    w.write_base_dependency(&format!("DbContextOptions<{}>", name), "options");

    let mut on_model_creating = Method::new("OnModelCreating")
        .access(Access::Protected)
        .modifier(Modifier::Override)
        .params("ModelBuilder modelBuilder")
        .line("base.OnModelCreating(modelBuilder);");
    for (entity, _) in schema.persisted_entities() {
        let storage = naming::storage_entity(prefix, &entity.name);
        w.write_property(
            Property::auto(&format!("DbSet<{}>", storage), &naming::plural(&entity.name)).value("null!"),
        );
        if configurations.is_some() {
            on_model_creating = on_model_creating.line(format!(
                "modelBuilder.ApplyConfiguration(new {}());",
                naming::type_configuration(prefix, &entity.name)
            ));
        }
    }
    let hook = w.write_hook("IModelCreatingHook", "NoModelCreatingHook", "modelCreatingHook");
    on_model_creating = on_model_creating.line(format!("{}.OnModelCreating(modelBuilder);", hook));
    w.write_method(on_model_creating);
    w
}

pub fn repository_writers(
    persistence: &PersistenceSettings,
    namespace: &str,
    context_namespace: &str,
) -> (TypeWriter, TypeWriter) {
    let context = persistence.context_name.as_str();

    let mut iface = TypeWriter::interface(namespace, naming::REPOSITORY_INTERFACE);
    iface.write_using(naming::runtime::PERSISTENCE);
    iface.write_using(context_namespace);
    iface.inherit(&format!("IDatabaseRepository<{}>", context));

    let mut repo = TypeWriter::class(namespace, naming::REPOSITORY);
    repo.write_using("AutoMapper");
    repo.write_using(naming::runtime::PERSISTENCE);
    repo.write_using(context_namespace);
    repo.inherit(&format!("DatabaseRepository<{}>", context));
    repo.inherit(naming::REPOSITORY_INTERFACE);
    repo.write_base_dependency(context, "dbContext");
    repo.write_base_dependency("IMapper", "mapper");
    (iface, repo)
}

fn map_line(hook: &str, source: &str, destination: &str, ignore: &[String]) -> String {
    let mut expr = format!("this.CreateMap<{}, {}>()", source, destination);
    for field in ignore {
        expr.push_str(&format!(".ForMember(x => x.{}, x => x.Ignore())", field));
    }
    format!("{}.OnMapping({});", hook, expr)
}

fn mapping_lines(
    hook: &str,
    element: &str,
    prefix: &str,
    mappings: &[MappingDirective],
    default_storage: Option<&str>,
) -> Vec<String> {
    if mappings.is_empty() {
        return default_storage
            .map(|storage| {
                let storage = naming::storage_entity(prefix, storage);
                vec![
                    map_line(hook, element, &storage, &[]),
                    map_line(hook, &storage, element, &[]),
                ]
            })
            .unwrap_or_default();
    }
    mappings
        .iter()
        .filter_map(|m| {
            let storage = m.database_entity.as_deref().or(default_storage)?;
            let storage = naming::storage_entity(prefix, storage);
            Some(match m.direction {
                MappingDirection::ToStorage => map_line(hook, element, &storage, &m.ignore_fields),
                MappingDirection::FromStorage => map_line(hook, &storage, element, &m.ignore_fields),
            })
        })
        .collect()
}

pub fn mapping_profile_writer(
    schema: &SchemaModel,
    settings: &Settings,
    persistence: &PersistenceSettings,
    namespace: &str,
) -> TypeWriter {
    let prefix = persistence.entity_prefix.as_str();
    let mut w = TypeWriter::class(namespace, naming::MAPPING_PROFILE);
    w.write_using("AutoMapper");
    w.write_using(naming::runtime::HOOKS);
    w.write_using(&persistence.entities_namespace);
    w.write_optional_using(settings.entities_namespace(Target::Backend));
    w.inherit("Profile");
    let hook = w.write_hook("IMappingProfileHook", "NoMappingProfileHook", "mappingHook");

    for entity in &schema.entities {
        let storage = entity.database_entity.as_ref().map(|_| entity.name.as_str());
        for line in mapping_lines(&hook, &entity.name, prefix, &entity.mappings, storage) {
            w.write_constructor_line(&line);
        }
    }
    for summary in &schema.summaries {
        let storage = summary.database_entity.as_deref();
        let lines = if summary.mappings.is_empty() {
            storage
                .map(|s| {
                    vec![map_line(
                        &hook,
                        &naming::storage_entity(prefix, s),
                        &summary.name,
                        &[],
                    )]
                })
                .unwrap_or_default()
        } else {
            mapping_lines(&hook, &summary.name, prefix, &summary.mappings, storage)
        };
        for line in lines {
            w.write_constructor_line(&line);
        }
    }
    w.write_constructor_line(&format!("{}.Configure(this);", hook));
    w
}
