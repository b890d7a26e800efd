use crate::codegen::contract::{
    auth_contract, route_contract, Binding, RouteContract, AUTH_OPERATIONS, IDENTITY_CONTROLLER,
};
use crate::codegen::directives::directives;
use crate::codegen::ArtifactSet;
use crate::emit::{Method, TypeWriter};
use crate::error::GenerateError;
use crate::ir::{SchemaModel, Target};
use crate::naming;
use crate::settings::{ApiSettings, Settings};

pub fn generate(schema: &SchemaModel, settings: &Settings, set: &mut ArtifactSet) -> Result<(), GenerateError> {
    let Some(api) = &settings.api else {
        return Ok(());
    };
    for d in directives(schema).into_iter().filter(|d| d.location.includes(Target::Backend)) {
        let Some(contract) = route_contract(api, &d) else {
            continue;
        };
        let mut w = controller_writer(settings, api, &d.controller_type());
        if let Some(endpoint) = &d.op.endpoint {
            w.write_usings(&endpoint.additional_usings);
            w.write_attributes(&endpoint.custom_attributes);
        }
        for attr in contract.access.attributes() {
            w.write_attribute(&attr);
        }
        let field = d.service_field();
        w.write_dependency(&d.endpoint_service_interface(), &field);
        w.write_method(action(&contract, &field, false));
        set.push(Target::Backend, &w)?;
    }

    if settings.auth.is_some() {
        let mut w = controller_writer(settings, api, IDENTITY_CONTROLLER);
        let field = naming::lower_camel(naming::AUTH_SERVICE);
        w.write_dependency(naming::AUTH_SERVICE_INTERFACE, &field);
        for op in &AUTH_OPERATIONS {
            w.write_method(action(&auth_contract(api, op), &field, true));
        }
        set.push(Target::Backend, &w)?;
    }
    Ok(())
}

fn controller_writer(settings: &Settings, api: &ApiSettings, name: &str) -> TypeWriter {
    let mut w = TypeWriter::class(&api.namespace, name);
    w.write_using("System.Threading");
    w.write_using("System.Threading.Tasks");
    w.write_using("Microsoft.AspNetCore.Authorization");
    w.write_using("Microsoft.AspNetCore.Mvc");
    w.write_using(naming::runtime::API);
    w.write_optional_using(settings.services_namespace());
    w.write_optional_using(settings.entities_namespace(Target::Backend));
    w.write_attribute("ApiController");
    w.inherit("ControllerBase");
    w
}

/// Action delegating to the injected service. Per-action authorization
/// attributes are used when the controller mixes access levels.
pub fn action(contract: &RouteContract, service_field: &str, attribute_access: bool) -> Method {
    let binding = match contract.binding {
        Binding::Body => "FromBody",
        Binding::Query => "FromQuery",
    };
    let mut method = Method::new(&contract.action)
        .asynchronous()
        .returns(&format!("Task<ActionResult<{}>>", contract.response_type))
        .params(&format!(
            "[{}] {} request, CancellationToken cancellationToken = default",
            binding, contract.request_type
        ))
        .attribute(&format!("{}(\"{}\")", contract.verb.server_attribute(), contract.template));
    if attribute_access {
        for attr in contract.access.attributes() {
            method = method.attribute(&attr);
        }
    }
    let call = if contract.passes_current_user {
        method = method.line("var currentUser = this.User.ToCurrentUserContext();");
        format!(
            "await this.{}.{}(request, currentUser, cancellationToken)",
            service_field, contract.service_method
        )
    } else {
        format!(
            "await this.{}.{}(request, cancellationToken)",
            service_field, contract.service_method
        )
    };
    method.line(format!("return this.Ok({});", call))
}

