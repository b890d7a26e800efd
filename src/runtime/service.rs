use chrono::{DateTime, Utc};

use crate::runtime::error::ServiceError;
use crate::runtime::model::{Capabilities, DataState, HasKey};
use crate::runtime::repository::{DatabaseRepository, Projection};
use crate::runtime::user::CurrentUserContext;

#[derive(Debug, Clone, PartialEq)]
pub struct HandlerRequest<E> {
    pub entity: E,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse<E> {
    pub entity: E,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetterRequest<K> {
    pub key: K,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetterResponse<E> {
    pub entity: Option<E>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionResponse<E> {
    pub entities: Vec<E>,
}

/// Fills the audit columns for entities that carry both the data-state and
/// the audit-log capability. Inserted entities get creation stamps, updated
/// ones modification stamps; nothing else is touched.
pub fn stamp_audit<E: Capabilities>(entity: &mut E, user: &CurrentUserContext, now: DateTime<Utc>) {
    let Some(state) = entity.data_state() else {
        return;
    };
    let Some(audit) = entity.audit_log_mut() else {
        return;
    };
    match state {
        DataState::Inserted => {
            audit.created_at = Some(now);
            audit.created_by_user_name = user.audit_name().to_string();
        }
        DataState::Updated => {
            audit.updated_at = Some(now);
            audit.updated_by_user_name = Some(user.audit_name().to_string());
        }
        DataState::Unchanged | DataState::Deleted => {}
    }
}

/// Customization points of a handler. Every step defaults to a no-op.
pub trait HandlerHooks<E> {
    fn before_saving(&self, _entity: &mut E, _user: &CurrentUserContext) -> Result<(), ServiceError> {
        Ok(())
    }

    fn validate(&self, _entity: &E) -> Result<(), ServiceError> {
        Ok(())
    }

    fn after_saving(&self, _entity: &E) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl<E> HandlerHooks<E> for NoHooks {}

/// Destination a handler persists entities to.
#[allow(async_fn_in_trait)]
pub trait EntityStore<E> {
    async fn save_to(&self, entity: E) -> Result<E, ServiceError>;
}

/// Store writing through a repository and a projection. The saved entity is
/// the stored record mapped back, not the submitted one.
#[derive(Debug)]
pub struct RepositoryStore<R, M> {
    pub repository: R,
    pub mapper: M,
}

impl<E, R, M> EntityStore<E> for RepositoryStore<R, M>
where
    E: Capabilities,
    R: DatabaseRepository,
    M: Projection<R::Record, E>,
{
    async fn save_to(&self, entity: E) -> Result<E, ServiceError> {
        let state = entity.data_state().unwrap_or(DataState::Updated);
        let record = self.mapper.to_storage(&entity);
        self.repository.apply_changes(record.clone(), state)?;
        let applied = self.repository.save().await?;
        tracing::debug!(applied, ?state, "changes saved");
        Ok(self.mapper.to_domain(&record))
    }
}

#[derive(Debug)]
pub struct EntityHandlerService<St, H = NoHooks> {
    store: St,
    hooks: H,
}

pub type DatabaseEntityHandlerService<R, M, H = NoHooks> = EntityHandlerService<RepositoryStore<R, M>, H>;

impl<St> EntityHandlerService<St, NoHooks> {
    pub fn new(store: St) -> Self {
        EntityHandlerService { store, hooks: NoHooks }
    }
}

impl<R, M> EntityHandlerService<RepositoryStore<R, M>, NoHooks> {
    pub fn with_repository(repository: R, mapper: M) -> Self {
        Self::new(RepositoryStore { repository, mapper })
    }
}

impl<St, H> EntityHandlerService<St, H> {
    pub fn with_hooks(store: St, hooks: H) -> Self {
        EntityHandlerService { store, hooks }
    }

    pub fn store(&self) -> &St {
        &self.store
    }

    /// Stamps audit columns, runs the hooks around the store and answers
    /// with the saved entity.
    pub async fn save<E>(
        &self,
        request: HandlerRequest<E>,
        user: &CurrentUserContext,
    ) -> Result<HandlerResponse<E>, ServiceError>
    where
        E: Capabilities,
        St: EntityStore<E>,
        H: HandlerHooks<E>,
    {
        let mut entity = request.entity;
        stamp_audit(&mut entity, user, Utc::now());
        self.hooks.before_saving(&mut entity, user)?;
        self.hooks.validate(&entity)?;
        let saved = self.store.save_to(entity).await?;
        self.hooks.after_saving(&saved);
        Ok(HandlerResponse { entity: saved })
    }
}

/// Read side over a repository.
#[derive(Debug)]
pub struct DatabaseEntityGetterService<R, M> {
    repository: R,
    mapper: M,
}

impl<R: DatabaseRepository, M> DatabaseEntityGetterService<R, M> {
    pub fn new(repository: R, mapper: M) -> Self {
        DatabaseEntityGetterService { repository, mapper }
    }

    pub async fn get<E>(
        &self,
        request: GetterRequest<<R::Record as HasKey>::Key>,
    ) -> Result<GetterResponse<E>, ServiceError>
    where
        M: Projection<R::Record, E>,
    {
        let rows = self
            .repository
            .get_by_condition(|r| r.key() == request.key)
            .await?;
        Ok(GetterResponse {
            entity: rows.first().map(|r| self.mapper.to_domain(r)),
        })
    }

    pub async fn get_all<E>(&self) -> Result<CollectionResponse<E>, ServiceError>
    where
        M: Projection<R::Record, E>,
    {
        let rows = self.repository.get_all().await?;
        Ok(CollectionResponse {
            entities: rows.iter().map(|r| self.mapper.to_domain(r)).collect(),
        })
    }
}
