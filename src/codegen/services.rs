use crate::codegen::contract::AUTH_OPERATIONS;
use crate::codegen::directives::{directives, Directive};
use crate::codegen::ArtifactSet;
use crate::emit::{Method, Modifier, TypeWriter};
use crate::error::GenerateError;
use crate::ir::{Lifetime, SchemaModel, Target};
use crate::naming;
use crate::settings::{ServiceSettings, Settings};

/// One row of the generated registration table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub lifetime: Lifetime,
    pub interface: String,
    pub implementation: String,
}

/// Service interfaces and implementations for every directive with a service
/// sub-directive, the account service, and the registration table.
pub fn generate(schema: &SchemaModel, settings: &Settings, set: &mut ArtifactSet) -> Result<(), GenerateError> {
    let Some(services) = &settings.services else {
        return Ok(());
    };
    let target = Target::Backend;
    let mut registrations = Vec::new();

    for d in directives(schema).into_iter().filter(|d| d.location.includes(target)) {
        let Some(service) = &d.op.service else {
            continue;
        };
        let (iface, implementation) = service_writers(settings, services, &d);
        set.push(target, &iface)?;
        set.push(target, &implementation)?;
        registrations.push(Registration {
            lifetime: service.lifetime,
            interface: d.service_interface(),
            implementation: d.service_type(),
        });
    }

    if let Some(auth) = &settings.auth {
        let (iface, implementation) = auth_service_writers(settings, services, &auth.user_class);
        set.push(target, &iface)?;
        set.push(target, &implementation)?;
        registrations.push(Registration {
            lifetime: Lifetime::Transient,
            interface: naming::AUTH_SERVICE_INTERFACE.to_string(),
            implementation: naming::AUTH_SERVICE.to_string(),
        });
    }

    let repository = settings
        .repositories_namespace()
        .filter(|_| settings.context_namespace().is_some());
    if repository.is_some() {
        registrations.push(Registration {
            lifetime: Lifetime::Scoped,
            interface: naming::REPOSITORY_INTERFACE.to_string(),
            implementation: naming::REPOSITORY.to_string(),
        });
    }

    if !registrations.is_empty() {
        set.push(target, &registration_writer(services, repository, &registrations))?;
    }
    Ok(())
}

fn service_usings(w: &mut TypeWriter, settings: &Settings, d: &Directive<'_>) {
    w.write_using("AutoMapper");
    w.write_using(naming::runtime::SERVICES);
    w.write_optional_using(settings.entities_namespace(Target::Backend));
    if d.is_persistence_backed() {
        w.write_optional_using(settings.storage_namespace());
        w.write_optional_using(settings.context_namespace());
        w.write_optional_using(settings.repositories_namespace());
    }
}

pub fn service_writers(
    settings: &Settings,
    services: &ServiceSettings,
    d: &Directive<'_>,
) -> (TypeWriter, TypeWriter) {
    let (base, iface_base) = d.service_bases(settings.context_name(), settings.entity_prefix());
    let service = d.op.service.clone().unwrap_or_default();

    let mut iface = TypeWriter::interface(&services.namespace, &d.service_interface());
    service_usings(&mut iface, settings, d);
    iface.write_usings(&service.additional_usings);
    iface.inherit(&iface_base);

    let mut implementation = TypeWriter::class(&services.namespace, &d.service_type());
    service_usings(&mut implementation, settings, d);
    implementation.write_usings(&service.additional_usings);
    implementation.write_attributes(&service.custom_attributes);
    implementation.inherit(&base);
    implementation.inherit(&d.service_interface());
    if d.is_persistence_backed() {
        implementation.write_base_dependency(naming::REPOSITORY_INTERFACE, "applicationDatabaseRepository");
    }
    if d.is_persistence_backed() || d.kind.is_handler() {
        implementation.write_base_dependency("IMapper", "mapper");
    }
    (iface, implementation)
}

pub fn auth_service_writers(
    settings: &Settings,
    services: &ServiceSettings,
    user_class: &str,
) -> (TypeWriter, TypeWriter) {
    let mut iface = TypeWriter::interface(&services.namespace, naming::AUTH_SERVICE_INTERFACE);
    iface.write_using("System.Threading");
    iface.write_using("System.Threading.Tasks");
    iface.write_using(naming::runtime::AUTH);
    iface.write_optional_using(settings.entities_namespace(Target::Backend));
    iface.inherit("IUserLogoutHandler");
    for op in &AUTH_OPERATIONS {
        let params = if op.anonymous {
            format!("{} request, CancellationToken cancellationToken = default", op.request_type())
        } else {
            format!(
                "{} request, CurrentUserContext currentUser, CancellationToken cancellationToken = default",
                op.request_type()
            )
        };
        iface.write_method(
            Method::new(op.action)
                .returns(&format!("Task<{}>", op.response_type()))
                .params(&params),
        );
    }

    let mut implementation = TypeWriter::class(&services.namespace, naming::AUTH_SERVICE);
    implementation.write_using("Microsoft.AspNetCore.Identity");
    implementation.write_using("Microsoft.Extensions.Caching.Distributed");
    implementation.write_using(naming::runtime::AUTH);
    implementation.write_optional_using(settings.entities_namespace(Target::Backend));
    implementation.write_optional_using(settings.context_namespace());
    implementation.inherit(&format!("AuthServiceBase<{}>", user_class));
    implementation.inherit(naming::AUTH_SERVICE_INTERFACE);
    implementation.write_base_dependency(&format!("UserManager<{}>", user_class), "userManager");
    implementation.write_base_dependency("ITokenIssuer", "tokenIssuer");
    implementation.write_base_dependency("IDistributedCache", "cache");
    (iface, implementation)
}

/// Static registration table replacing discovery by reflection.
pub fn registration_writer(
    services: &ServiceSettings,
    repositories_namespace: Option<&str>,
    registrations: &[Registration],
) -> TypeWriter {
    let mut w = TypeWriter::class(&services.namespace, naming::SERVICE_REGISTRATIONS);
    w.set_static();
    w.write_using("Microsoft.Extensions.DependencyInjection");
    w.write_optional_using(repositories_namespace);

    let mut register = Method::new("AddGeneratedServices")
        .modifier(Modifier::Static)
        .returns("IServiceCollection")
        .params("this IServiceCollection services");
    for r in registrations {
        register = register.line(format!(
            "services.{}<{}, {}>();",
            r.lifetime.registration_method(),
            r.interface,
            r.implementation
        ));
    }
    register = register.line("return services;");
    w.write_method(register);
    w
}
