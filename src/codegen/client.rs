use crate::codegen::contract::{
    auth_contract, route_contract, Binding, RouteContract, AUTH_OPERATIONS, BEARER_HEADER, IDENTITY_CLIENT,
};
use crate::codegen::directives::directives;
use crate::codegen::ArtifactSet;
use crate::emit::{Method, TypeWriter};
use crate::error::GenerateError;
use crate::ir::{Location, SchemaModel, Target};
use crate::naming;
use crate::settings::{ApiClientSettings, Settings};

/// Typed remote clients mirroring the generated endpoints. Clients need the
/// endpoint settings because routes are derived from them.
pub fn generate(schema: &SchemaModel, settings: &Settings, set: &mut ArtifactSet) -> Result<(), GenerateError> {
    let (Some(api), Some(client)) = (&settings.api, &settings.api_client) else {
        return Ok(());
    };
    // A client needs the frontend DTOs and the backend controller.
    for d in directives(schema).into_iter().filter(|d| d.location == Location::Both) {
        if !d.op.endpoint.as_ref().is_some_and(|e| e.generate_client) {
            continue;
        }
        let Some(contract) = route_contract(api, &d) else {
            continue;
        };
        let mut w = client_writer(settings, client, &d.client_interface());
        w.write_method(client_method(&contract));
        set.push(Target::Frontend, &w)?;
    }

    if settings.auth.is_some() {
        let mut w = client_writer(settings, client, IDENTITY_CLIENT);
        for op in &AUTH_OPERATIONS {
            w.write_method(client_method(&auth_contract(api, op)));
        }
        set.push(Target::Frontend, &w)?;
    }
    Ok(())
}

fn client_writer(settings: &Settings, client: &ApiClientSettings, name: &str) -> TypeWriter {
    let mut w = TypeWriter::interface(&client.namespace, name);
    w.write_using("System.Threading");
    w.write_using("System.Threading.Tasks");
    w.write_using("Refit");
    w.write_using(naming::runtime::CLIENT);
    w.write_optional_using(settings.entities_namespace(Target::Frontend));
    w
}

pub fn client_method(contract: &RouteContract) -> Method {
    let binding = match contract.binding {
        Binding::Body => "Body",
        Binding::Query => "Query",
    };
    let mut method = Method::new(&contract.action)
        .returns(&format!("Task<{}>", contract.response_type))
        .params(&format!(
            "[{}] {} request, CancellationToken cancellationToken = default",
            binding, contract.request_type
        ))
        .attribute(&format!("{}(\"{}\")", contract.verb.client_attribute(), contract.template));
    if contract.access.requires_token() {
        method = method.attribute(&format!("Headers(\"{}\")", BEARER_HEADER));
    }
    method
}
