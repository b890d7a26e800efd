//! Every derived name used by more than one writer is computed here so that
//! separately generated artifacts agree on how they reference each other.

/// Lower-cases the first character only: `CountryId` -> `countryId`.
pub fn lower_camel(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Removes a leading interface marker: `ICountryService` -> `CountryService`.
/// Names that do not follow the `I` + upper-case convention are unchanged.
pub fn strip_marker(name: &str) -> &str {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some('I'), Some(second)) if second.is_uppercase() => &name[1..],
        _ => name,
    }
}

/// English plural used for collection getters and context sets.
pub fn plural(name: &str) -> String {
    let lower = name.to_lowercase();
    if let Some(stem) = name.strip_suffix('y') {
        let before = stem.chars().last().map(|c| c.to_ascii_lowercase());
        if !matches!(before, Some('a' | 'e' | 'i' | 'o' | 'u') | None) {
            return format!("{}ies", stem);
        }
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        return format!("{}es", name);
    }
    format!("{}s", name)
}

/// Storage entity type name: prefix + element name.
pub fn storage_entity(prefix: &str, name: &str) -> String {
    format!("{}{}", prefix, name)
}

pub fn type_configuration(prefix: &str, name: &str) -> String {
    format!("{}Configuration", storage_entity(prefix, name))
}

pub fn validator(type_name: &str) -> String {
    format!("{}Validator", type_name)
}

/// Backing field of a full property.
pub fn backing_field(property: &str) -> String {
    lower_camel(property)
}

pub fn file_name(type_name: &str) -> String {
    format!("{}.g.cs", type_name)
}

pub const REPOSITORY_INTERFACE: &str = "IApplicationDatabaseRepository";
pub const REPOSITORY: &str = "ApplicationDatabaseRepository";
pub const MAPPING_PROFILE: &str = "ApplicationMappingProfile";
pub const SERVICE_REGISTRATIONS: &str = "ServiceRegistrations";
pub const AUTH_SERVICE_INTERFACE: &str = "IAuthService";
pub const AUTH_SERVICE: &str = "AuthService";

/// Namespaces of the runtime library the generated code compiles against.
pub mod runtime {
    pub const MODELS: &str = "Layered.Runtime.Models";
    pub const ENTITIES: &str = "Layered.Runtime.Models.Entities";
    pub const REQUESTS: &str = "Layered.Runtime.Models.Requests";
    pub const VALIDATION: &str = "Layered.Runtime.Validation";
    pub const HOOKS: &str = "Layered.Runtime.Hooks";
    pub const PERSISTENCE: &str = "Layered.Runtime.Persistence";
    pub const SERVICES: &str = "Layered.Runtime.Services";
    pub const AUTH: &str = "Layered.Runtime.Auth";
    pub const API: &str = "Layered.Runtime.Api";
    pub const CLIENT: &str = "Layered.Runtime.Client";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plurals() {
        assert_eq!(plural("Country"), "Countries");
        assert_eq!(plural("Day"), "Days");
        assert_eq!(plural("Address"), "Addresses");
        assert_eq!(plural("Box"), "Boxes");
        assert_eq!(plural("Branch"), "Branches");
        assert_eq!(plural("City"), "Cities");
        assert_eq!(plural("User"), "Users");
    }

    #[test]
    fn marker_stripping() {
        assert_eq!(strip_marker("ICountryLookup"), "CountryLookup");
        assert_eq!(strip_marker("Item"), "Item");
        assert_eq!(strip_marker("I"), "I");
    }

    #[test]
    fn lower_camel_only_touches_first_char() {
        assert_eq!(lower_camel("CountryId"), "countryId");
        assert_eq!(lower_camel("URL"), "uRL");
        assert_eq!(lower_camel(""), "");
    }
}
