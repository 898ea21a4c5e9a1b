// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::UserRole,
};

/// 1. O Trait que define qual papel uma rota exige
pub trait RoleDef: Send + Sync + 'static {
    fn role() -> UserRole;
}

/// 2. O Extractor (Guardião). Entrega o usuário já conferido.
pub struct RequireRole<T>(pub AuthenticatedUser, pub PhantomData<T>);

pub fn ensure_role(user: &AuthenticatedUser, required: UserRole) -> Result<(), AppError> {
    if user.role != required {
        tracing::warn!("🔒 Usuário {} sem o papel exigido ({:?})", user.id, required);
        return Err(AppError::Forbidden);
    }
    Ok(())
}

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;
        ensure_role(&user, T::role())?;
        Ok(RequireRole(user, PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS PAPÉIS (TIPOS)
// ---

pub struct Admin;
impl RoleDef for Admin {
    fn role() -> UserRole { UserRole::Admin }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn students_cannot_use_admin_routes() {
        let student = AuthenticatedUser {
            id: Uuid::new_v4(),
            role: UserRole::Student,
        };
        let admin = AuthenticatedUser {
            id: Uuid::new_v4(),
            role: UserRole::Admin,
        };

        assert!(matches!(
            ensure_role(&student, Admin::role()),
            Err(AppError::Forbidden)
        ));
        assert!(ensure_role(&admin, Admin::role()).is_ok());
    }
}
