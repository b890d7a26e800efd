use chrono::{Duration, Utc};
use layergen::runtime::auth::{cache_key, DistributedCache, InMemoryCache, LogoutHandler, REFRESH_TOKEN_KEY};
use layergen::runtime::error::{translate, translate_to_json, InternalErrorCode, ServiceError};
use layergen::runtime::model::{AuditLog, Capabilities, DataState, HasKey};
use layergen::runtime::repository::{DatabaseRepository, InMemoryRepository, Projection};
use layergen::runtime::service::{
    stamp_audit, DatabaseEntityGetterService, DatabaseEntityHandlerService, EntityHandlerService, GetterRequest, GetterResponse,
    HandlerHooks, HandlerRequest, RepositoryStore,
};
use layergen::runtime::user::CurrentUserContext;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Default)]
struct Country {
    id: Uuid,
    name: String,
    state: DataState,
    audit: AuditLog,
}

impl Capabilities for Country {
    fn data_state(&self) -> Option<DataState> {
        Some(self.state)
    }

    fn audit_log_mut(&mut self) -> Option<&mut AuditLog> {
        Some(&mut self.audit)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct TbCountry {
    id: Uuid,
    name: String,
    audit: AuditLog,
}

impl HasKey for TbCountry {
    type Key = Uuid;

    fn key(&self) -> Uuid {
        self.id
    }

    fn set_key(&mut self, key: Uuid) {
        self.id = key;
    }
}

struct CountryMapper;

impl Projection<TbCountry, Country> for CountryMapper {
    fn to_storage(&self, domain: &Country) -> TbCountry {
        TbCountry {
            id: domain.id,
            name: domain.name.clone(),
            audit: domain.audit.clone(),
        }
    }

    fn to_domain(&self, storage: &TbCountry) -> Country {
        Country {
            id: storage.id,
            name: storage.name.clone(),
            state: DataState::Unchanged,
            audit: storage.audit.clone(),
        }
    }
}

fn user() -> CurrentUserContext {
    CurrentUserContext::new("42", "ada@example.com", "Ada Lovelace")
}

fn country(name: &str, state: DataState) -> Country {
    Country {
        id: Uuid::new_v4(),
        name: name.to_string(),
        state,
        audit: AuditLog::default(),
    }
}

#[test]
fn audit_stamping_follows_data_state() {
    let now = Utc::now();

    let mut inserted = country("Peru", DataState::Inserted);
    stamp_audit(&mut inserted, &user(), now);
    assert_eq!(inserted.audit.created_by_user_name, "Ada Lovelace");
    assert_eq!(inserted.audit.created_at, Some(now));
    assert_eq!(inserted.audit.updated_at, None);

    let mut updated = country("Chile", DataState::Updated);
    stamp_audit(&mut updated, &user(), now);
    assert_eq!(updated.audit.updated_by_user_name.as_deref(), Some("Ada Lovelace"));
    assert_eq!(updated.audit.updated_at, Some(now));
    assert_eq!(updated.audit.created_by_user_name, "");

    let mut unchanged = country("Bolivia", DataState::Unchanged);
    stamp_audit(&mut unchanged, &user(), now);
    assert_eq!(unchanged.audit, AuditLog::default());
}

#[tokio::test]
async fn handler_stamps_and_saves_through_the_repository() {
    let service: DatabaseEntityHandlerService<InMemoryRepository<TbCountry>, CountryMapper> =
        EntityHandlerService::with_repository(InMemoryRepository::new(), CountryMapper);
    let entity = country("Peru", DataState::Inserted);
    let id = entity.id;

    let response = service
        .save(HandlerRequest { entity }, &user())
        .await
        .unwrap();
    assert_eq!(response.entity.audit.created_by_user_name, "Ada Lovelace");
    assert!(response.entity.audit.created_at.is_some());
    // The response is the stored row mapped back through the projection.
    assert_eq!(response.entity.id, id);
    assert_eq!(response.entity.state, DataState::Unchanged);

    let rows = service.store().repository.get_all().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, id);
    assert_eq!(rows[0].audit.created_by_user_name, "Ada Lovelace");
}

#[tokio::test]
async fn deleted_entities_are_removed() {
    let existing = TbCountry {
        id: Uuid::new_v4(),
        name: "Peru".to_string(),
        audit: AuditLog::default(),
    };
    let service = EntityHandlerService::with_repository(
        InMemoryRepository::with_rows(vec![existing.clone()]),
        CountryMapper,
    );
    let mut entity = CountryMapper.to_domain(&existing);
    entity.state = DataState::Deleted;
    service.save(HandlerRequest { entity }, &user()).await.unwrap();
    assert!(service.store().repository.get_all().await.unwrap().is_empty());
}

struct RejectEmptyName;

impl HandlerHooks<Country> for RejectEmptyName {
    fn validate(&self, entity: &Country) -> Result<(), ServiceError> {
        if entity.name.is_empty() {
            return Err(ServiceError::tagged(
                InternalErrorCode::Others,
                Some(10),
                Some("name is required".to_string()),
            ));
        }
        Ok(())
    }
}

#[tokio::test]
async fn failed_validation_skips_the_store() {
    let store = RepositoryStore {
        repository: InMemoryRepository::<TbCountry>::new(),
        mapper: CountryMapper,
    };
    let service = EntityHandlerService::with_hooks(store, RejectEmptyName);
    let err = service
        .save(HandlerRequest { entity: country("", DataState::Inserted) }, &user())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Tagged { error_code: Some(10), .. }));
    assert!(service.store().repository.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn getter_maps_rows_back_to_entities() {
    let peru = TbCountry {
        id: Uuid::new_v4(),
        name: "Peru".to_string(),
        audit: AuditLog::default(),
    };
    let chile = TbCountry {
        id: Uuid::new_v4(),
        name: "Chile".to_string(),
        audit: AuditLog::default(),
    };
    let getter = DatabaseEntityGetterService::new(
        InMemoryRepository::with_rows(vec![peru.clone(), chile]),
        CountryMapper,
    );

    let found: GetterResponse<Country> = getter.get(GetterRequest { key: peru.id }).await.unwrap();
    assert_eq!(found.entity.map(|c| c.name), Some("Peru".to_string()));

    let missing: GetterResponse<Country> = getter
        .get(GetterRequest { key: Uuid::new_v4() })
        .await
        .unwrap();
    assert!(missing.entity.is_none());

    let all = getter.get_all::<Country>().await.unwrap();
    assert_eq!(all.entities.len(), 2);
}

#[test]
fn logout_blocks_the_user_and_drops_refresh_tokens() {
    let handler = LogoutHandler::new(InMemoryCache::new());
    let email = "ada@example.com";
    let now = Utc::now();
    handler
        .store_refresh_token(email, "refresh-1", now + Duration::hours(1))
        .unwrap();
    handler.validate_refresh_token(email, "refresh-1", now).unwrap();
    assert!(handler.validate_refresh_token(email, "other", now).is_err());

    handler.logout(email).unwrap();
    assert!(matches!(
        handler.check_user_is_not_logged_out(email),
        Err(ServiceError::Security { .. })
    ));
    assert_eq!(handler.cache().get(&cache_key(REFRESH_TOKEN_KEY, email)), None);
    assert_eq!(handler.cache().get("UserHasLogout_ada@example.com").as_deref(), Some("true"));

    handler
        .store_refresh_token(email, "refresh-2", now + Duration::hours(1))
        .unwrap();
    handler.check_user_is_not_logged_out(email).unwrap();
}

#[test]
fn logout_flags_expire_with_their_ttl() {
    let handler = LogoutHandler::new(InMemoryCache::new()).with_logout_ttl(std::time::Duration::ZERO);
    handler.logout("ada@example.com").unwrap();
    handler.check_user_is_not_logged_out("ada@example.com").unwrap();
}

#[test]
fn expired_refresh_tokens_and_blank_emails_are_rejected() {
    let handler = LogoutHandler::new(InMemoryCache::new());
    let now = Utc::now();
    handler
        .store_refresh_token("ada@example.com", "refresh-1", now - Duration::minutes(1))
        .unwrap();
    assert!(handler.validate_refresh_token("ada@example.com", "refresh-1", now).is_err());
    assert!(handler.logout("  ").is_err());
    assert!(handler.check_user_is_not_logged_out("").is_err());
}

#[test]
fn errors_translate_to_status_and_payload() {
    let (status, payload) = translate(&ServiceError::security("token revoked"));
    assert_eq!(status.as_u16(), 401);
    assert_eq!(payload.internal_error_code, Some(1));
    assert_eq!(payload.additional_info.as_deref(), Some("token revoked"));

    let (status, payload) = translate(&ServiceError::tagged(InternalErrorCode::InvalidPassword, Some(42), None));
    assert_eq!(status.as_u16(), 500);
    assert_eq!(payload.internal_error_code, Some(2));
    assert_eq!(payload.error_code, Some(42));

    let (status, body) = translate_to_json(&ServiceError::Internal(anyhow::anyhow!("connection reset")));
    assert_eq!(status.as_u16(), 500);
    assert_eq!(body, r#"{"internalErrorCode":null,"errorCode":null,"additionalInfo":null}"#);
}

#[test]
fn user_context_requires_every_claim() {
    let mut claims = HashMap::new();
    claims.insert("sub".to_string(), "42".to_string());
    claims.insert("email".to_string(), "ada@example.com".to_string());
    assert!(CurrentUserContext::from_claims(&claims).is_err());

    claims.insert("name".to_string(), "Ada Lovelace".to_string());
    let user = CurrentUserContext::from_claims(&claims).unwrap();
    assert_eq!(user.audit_name(), "Ada Lovelace");
}
