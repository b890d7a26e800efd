use layergen::codegen::Artifact;
use layergen::error::GenerateError;
use layergen::generate_from_paths;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn fixture_dir(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn generate() -> Vec<Artifact> {
    generate_from_paths(&[fixture_dir("shop")]).unwrap()
}

fn generate_logistics() -> Vec<Artifact> {
    generate_from_paths(&[fixture_dir("logistics")]).unwrap()
}

fn exists(artifacts: &[Artifact], path: &str) -> bool {
    artifacts.iter().any(|a| a.path() == PathBuf::from(path))
}

fn artifact<'a>(artifacts: &'a [Artifact], path: &str) -> &'a str {
    artifacts
        .iter()
        .find(|a| a.path() == PathBuf::from(path))
        .unwrap_or_else(|| panic!("missing artifact {}", path))
        .content
        .as_str()
}

fn before(text: &str, first: &str, second: &str) -> bool {
    text.find(first).unwrap() < text.find(second).unwrap()
}

#[test]
fn entity_round_trip_produces_domain_and_getter_artifacts() {
    let artifacts = generate();
    let country = artifact(&artifacts, "backend/Country.g.cs");
    assert!(country.starts_with("// <auto-generated>"));
    assert!(country.contains("namespace Shop.Server.Models"));
    assert!(country.contains("public Guid Id { get; set; }"));
    assert!(country.contains("public string Name { get; set; }"));
    assert!(country.contains("public Guid GetKey()"));
    assert!(country.contains("public void SetKey(Guid key)"));

    let request = artifact(&artifacts, "backend/CountryGetterRequest.g.cs");
    assert!(request.contains("public partial class CountryGetterRequest : IEntityGetterRequest, IHasGuidKey"));
    let response = artifact(&artifacts, "backend/CountryGetterResponse.g.cs");
    assert!(response.contains("IEntityGetterResponse<Country>"));
    assert!(response.contains("public Country? Entity { get; set; }"));

    let service = artifact(&artifacts, "backend/ICountryGetterService.g.cs");
    assert!(service.contains(
        "public partial interface ICountryGetterService : \
         IDatabaseEntityGetterService<TbCountry, Country, CountryGetterRequest, CountryGetterResponse>"
    ));
}

#[test]
fn generation_is_deterministic() {
    assert_eq!(generate(), generate());
}

#[test]
fn fields_are_emitted_in_traversal_order() {
    let artifacts = generate();
    let country = artifact(&artifacts, "backend/Country.g.cs");
    assert!(before(country, "Guid Id", "string Name"));
    assert!(before(country, "string Name", "decimal Area"));
    assert!(before(country, "decimal Area", "int Population"));
    assert!(before(country, "int Population", "CountryStatus Status"));
}

#[test]
fn capabilities_are_declared_in_canonical_order() {
    let artifacts = generate();
    let country = artifact(&artifacts, "backend/Country.g.cs");
    assert!(country.contains(
        "public partial class Country : IEntity, IHasDataState, IHasGuidKey, IHasRowVersionControl, IHasAuditLog\n"
    ));
    assert!(country.contains("[Timestamp]\n        public byte[]? RowVersion { get; set; }"));
    assert!(country.contains("public string CreatedByUserName { get; set; } = string.Empty;"));
    assert!(country.contains("[NotMapped]\n        public DataState DataState { get; set; }"));
    assert!(before(country, "CountryStatus Status", "byte[]? RowVersion"));
    assert!(before(country, "byte[]? RowVersion", "string CreatedByUserName"));
    assert!(before(country, "DateTimeOffset? UpdatedAt", "DataState DataState"));

    let storage = artifact(&artifacts, "backend/TbCountry.g.cs");
    assert!(storage.contains(
        "public partial class TbCountry : IDatabaseEntity, IHasDataState, IHasGuidKey, IHasRowVersionControl, IHasAuditLog\n"
    ));
}

#[test]
fn auto_sequence_numbers_by_declaration_and_skips_foreign_values() {
    let artifacts = generate();
    let backend = artifact(&artifacts, "backend/CountryStatus.g.cs");
    assert!(backend.contains("public enum CountryStatus\n"));
    assert!(backend.contains("Draft = 0,"));
    assert!(backend.contains("Active = 1,"));
    assert!(backend.contains("Retired = 2,"));
    assert!(before(backend, "Draft", "Active"));

    let frontend = artifact(&artifacts, "frontend/CountryStatus.g.cs");
    assert!(frontend.contains("namespace Shop.Client.Enums"));
    assert!(frontend.contains("Active = 1,"));
    assert!(!frontend.contains("Retired"));
}

#[test]
fn notification_scaffolding_is_emitted_once() {
    let artifacts = generate();
    let country = artifact(&artifacts, "frontend/Country.g.cs");
    assert_eq!(country.matches("INotifyPropertyChanged").count(), 1);
    assert_eq!(country.matches("public event PropertyChangedEventHandler? PropertyChanged;").count(), 1);
    assert_eq!(country.matches("private void NotifyPropertyChanged(").count(), 1);
    assert_eq!(country.matches("using System.ComponentModel;").count(), 1);
    assert_eq!(country.matches("IPropertyChangeHook? propertyChangeHook = null").count(), 1);
    assert!(country.contains("private string name;"));
    assert!(country.contains("this.OnPropertyChanging(this.name, value);"));

    let backend = artifact(&artifacts, "backend/Country.g.cs");
    assert!(!backend.contains("INotifyPropertyChanged"));
}

#[test]
fn service_fields_follow_default_and_override_names() {
    let artifacts = generate();
    let getter = artifact(&artifacts, "backend/CountryGetterController.g.cs");
    assert!(getter.contains("private readonly ICountryGetterService countryGetterService;"));
    assert!(getter.contains("return this.Ok(await this.countryGetterService.GetAsync(request, cancellationToken));"));

    let collection = artifact(&artifacts, "backend/CountriesGetterController.g.cs");
    assert!(collection.contains("private readonly ICountryLookup countryLookupGetterService;"));
    assert!(collection.contains("await this.countryLookupGetterService.ListAsync(request, cancellationToken)"));
    assert!(!collection.contains("countriesGetterService"));
}

#[test]
fn handler_endpoint_passes_the_current_user() {
    let artifacts = generate();
    let handler = artifact(&artifacts, "backend/CountryHandlerController.g.cs");
    assert!(handler.contains("[Authorize(Roles = \"Admin\")]\n    public partial class CountryHandlerController"));
    assert!(handler.contains("var currentUser = this.User.ToCurrentUserContext();"));
    assert!(handler.contains("await this.countryHandlerService.SaveAsync(request, currentUser, cancellationToken)"));
    assert!(handler.contains("[FromBody] CountryHandlerRequest request"));
}

#[test]
fn collection_getters_use_plural_names() {
    let artifacts = generate();
    let response = artifact(&artifacts, "backend/CountriesGetterResponse.g.cs");
    assert!(response.contains("public IList<Country> Entities { get; set; } = new List<Country>();"));
    let summaries = artifact(&artifacts, "backend/CountrySummariesGetterResponse.g.cs");
    assert!(summaries.contains("ISummariesGetterResponse<CountrySummary>"));
    assert!(summaries.contains("public IList<CountrySummary> Summaries { get; set; }"));
}

#[test]
fn services_are_registered_in_a_static_table() {
    let artifacts = generate();
    let table = artifact(&artifacts, "backend/ServiceRegistrations.g.cs");
    assert!(table.contains("public static partial class ServiceRegistrations"));
    assert!(table.contains("public static IServiceCollection AddGeneratedServices(this IServiceCollection services)"));
    assert!(table.contains("services.AddScoped<ICountryHandlerService, CountryHandlerService>();"));
    assert!(table.contains("services.AddTransient<ICountryGetterService, CountryGetterService>();"));
    assert!(table.contains("services.AddTransient<IAuthService, AuthService>();"));
    assert!(table.contains("services.AddScoped<IApplicationDatabaseRepository, ApplicationDatabaseRepository>();"));
    assert!(before(table, "ICountryHandlerService", "IAuthService"));
}

#[test]
fn persistence_backed_services_forward_repository_and_mapper() {
    let artifacts = generate();
    let service = artifact(&artifacts, "backend/CountryHandlerService.g.cs");
    assert!(service.contains(
        "DatabaseEntityHandlerService<ApplicationDbContext, TbCountry, Country, CountryHandlerRequest, CountryHandlerResponse>, ICountryHandlerService"
    ));
    assert!(service.contains("public CountryHandlerService(IApplicationDatabaseRepository applicationDatabaseRepository, IMapper mapper)"));
    assert!(service.contains(": base(applicationDatabaseRepository, mapper)"));
}

#[test]
fn persistence_layer_is_generated_for_backend() {
    let artifacts = generate();
    let storage = artifact(&artifacts, "backend/TbCountry.g.cs");
    assert!(storage.contains("[Key]\n        public Guid Id { get; set; }"));
    assert!(storage.contains("[Required]\n        [MaxLength(100)]\n        public string Name { get; set; }"));

    let config = artifact(&artifacts, "backend/TbCountryConfiguration.g.cs");
    assert!(config.contains("builder.HasIndex(x => x.Name);"));
    assert!(config.contains("builder.Property(x => x.Area).HasPrecision(12, 3);"));
    assert!(config.contains("this.configurationHook.Configure(builder);"));

    let context = artifact(&artifacts, "backend/ApplicationDbContext.g.cs");
    assert!(context.contains("IdentityDbContext<ApplicationUser>"));
    assert!(context.contains("public DbSet<TbCountry> Countries { get; set; } = null!;"));
    assert!(context.contains("modelBuilder.ApplyConfiguration(new TbCountryConfiguration());"));
    assert!(context.contains(": base(options)"));

    let profile = artifact(&artifacts, "backend/ApplicationMappingProfile.g.cs");
    assert!(profile.contains("this.mappingHook.OnMapping(this.CreateMap<Country, TbCountry>());"));
    assert!(profile.contains("this.mappingHook.OnMapping(this.CreateMap<TbCountry, Country>());"));
    assert!(profile.contains("this.mappingHook.OnMapping(this.CreateMap<TbCountry, CountrySummary>());"));
    assert!(before(profile, "CreateMap<TbCountry, CountrySummary>", "this.mappingHook.Configure(this);"));

    assert!(!exists(&artifacts, "frontend/TbCountry.g.cs"));
}

#[test]
fn validators_use_the_custom_rules_hook() {
    let artifacts = generate();
    let validator = artifact(&artifacts, "backend/CountryValidator.g.cs");
    assert!(validator.contains("public partial class CountryValidator : AbstractValidator<Country>"));
    assert!(validator.contains("this.RuleFor(x => x.Name).NotNull().NotEmpty().MaximumLength(100);"));
    assert!(validator.contains("IValidationRules<Country>? customRules = null"));
    assert!(before(validator, "this.customRules = customRules ?? new NoValidationRules<Country>();", "this.customRules.Apply(this);"));

    let request = artifact(&artifacts, "backend/CountryHandlerRequestValidator.g.cs");
    assert!(request.contains("this.RuleFor(x => x.Entity).SetValidator(new CountryValidator());"));
}

#[test]
fn custom_requests_and_auth_dtos_are_generated() {
    let artifacts = generate();
    let import = artifact(&artifacts, "backend/CountryImportRequest.g.cs");
    assert!(import.contains("namespace Shop.Server.Requests"));
    assert!(import.contains("public partial class CountryImportRequest : IRequest"));
    assert!(!exists(&artifacts, "frontend/CountryImportRequest.g.cs"));

    for name in ["ApplicationUserInsert", "Login", "RefreshToken", "Logout", "ChangePassword"] {
        artifact(&artifacts, &format!("backend/{}Request.g.cs", name));
        artifact(&artifacts, &format!("frontend/{}Response.g.cs", name));
    }
    let login = artifact(&artifacts, "backend/LoginResponse.g.cs");
    assert!(login.contains("public string Token { get; set; } = string.Empty;"));
}

#[test]
fn every_field_kind_maps_to_its_type_in_traversal_order() {
    let artifacts = generate_logistics();
    let shipment = artifact(&artifacts, "backend/Shipment.g.cs");
    let expected = [
        "public Guid Id { get; set; }",
        "public string Label { get; set; }",
        "public bool Fragile { get; set; }",
        "public DateTime PackedOn { get; set; }",
        "public DateTimeOffset ShippedAt { get; set; }",
        "public decimal Weight { get; set; }",
        "public int Count { get; set; }",
        "public int WarehouseId { get; set; }",
        "public IList<string> Notes { get; set; } = new List<string>();",
        "public IList<Parcel> Parcels { get; set; } = new List<Parcel>();",
        "public WarehouseSummary Snapshot { get; set; }",
        "public ShipmentPriority Priority { get; set; }",
        "public Warehouse Origin { get; set; }",
    ];
    for pair in expected.windows(2) {
        assert!(before(shipment, pair[0], pair[1]), "{} should precede {}", pair[0], pair[1]);
    }

    let frontend = artifact(&artifacts, "frontend/Shipment.g.cs");
    assert!(frontend.contains("public Warehouse Origin { get; set; }"));
    assert!(!frontend.contains("Priority"));
}

#[test]
fn entity_references_get_nested_validators() {
    let artifacts = generate_logistics();
    let validator = artifact(&artifacts, "backend/ShipmentValidator.g.cs");
    assert!(validator.contains("this.RuleFor(x => x.Fragile).NotNull();"));
    assert!(validator.contains("this.RuleForEach(x => x.Parcels).SetValidator(new ParcelValidator());"));
    assert!(validator.contains("this.RuleFor(x => x.Origin).SetValidator(new WarehouseValidator());"));
    assert!(!validator.contains("x.Snapshot"));
}

#[test]
fn storage_entities_reference_storage_navigations() {
    let artifacts = generate_logistics();
    let storage = artifact(&artifacts, "backend/TbShipment.g.cs");
    assert!(storage.contains("[Key]\n        public Guid Id { get; set; }"));
    assert!(storage.contains(
        "[ForeignKey(nameof(WarehouseId))]\n        public virtual TbWarehouse Origin { get; set; }"
    ));
    assert!(storage.contains("public virtual IList<TbParcel> Parcels { get; set; } = new List<TbParcel>();"));
    assert!(storage.contains("public ShipmentPriority Priority { get; set; }"));
    assert!(!storage.contains("Notes"));
    assert!(!storage.contains("Snapshot"));
}

#[test]
fn frontend_directives_get_no_backend_services_or_endpoints() {
    let artifacts = generate_logistics();
    assert!(exists(&artifacts, "frontend/DraftHandlerRequest.g.cs"));
    assert!(!exists(&artifacts, "backend/DraftHandlerRequest.g.cs"));
    assert!(!exists(&artifacts, "backend/IDraftHandlerService.g.cs"));
    assert!(!exists(&artifacts, "backend/DraftHandlerService.g.cs"));
    assert!(!exists(&artifacts, "backend/DraftHandlerController.g.cs"));
    assert!(!exists(&artifacts, "backend/ServiceRegistrations.g.cs"));
}

#[test]
fn typed_field_without_type_is_unmapped() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("app.settings.toml"),
        "format_version = 1\n\n[entities.backend]\nnamespace = \"Demo.Models\"\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("shipment.schema.toml"),
        "format_version = 1\n\n[[entity]]\nname = \"Shipment\"\n\n[[entity.fields]]\nname = \"Origin\"\nkind = \"entity\"\n",
    )
    .unwrap();
    let err = generate_from_paths(&[dir.path().to_path_buf()]).unwrap_err();
    assert!(matches!(
        err,
        GenerateError::UnmappedField { ref owner, ref field, ref kind }
            if owner == "Shipment" && field == "Origin" && kind == "Entity"
    ));
}
