use tracing::{info, warn};
use uuid::Uuid;

use super::password::{hash_password, verify_against_dummy, verify_password};
use crate::{
    error::AppError,
    store::{NewUser, Store, StoreError, User},
};

/// A registration that already passed boundary validation.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("password task failed: {e}")))?
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Creates the account; the email's uniqueness is decided by the store.
pub async fn register(store: &dyn Store, reg: &Registration) -> Result<Uuid, AppError> {
    let plain = reg.password.clone();
    let password_hash = blocking(move || hash_password(&plain)).await?;

    let new_user = NewUser {
        id: Uuid::new_v4(),
        email: reg.email.clone(),
        first_name: reg.first_name.clone(),
        last_name: reg.last_name.clone(),
        password_hash,
    };
    match store.create_user(&new_user).await {
        Ok(user) => {
            info!(user_id = %user.id, "user registered");
            Ok(user.id)
        }
        Err(StoreError::AlreadyExists) => {
            warn!("registration with an email already in use");
            Err(AppError::EmailInUse)
        }
        Err(e) => Err(e.into()),
    }
}

/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn verify_credentials(
    store: &dyn Store,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    let user = match store.find_user_by_email(email).await {
        Ok(u) => u,
        Err(StoreError::NotFound) => {
            let plain = password.to_string();
            blocking(move || {
                verify_against_dummy(&plain);
                Ok(())
            })
            .await?;
            warn!("login for unknown email");
            return Err(AppError::InvalidCredentials);
        }
        Err(e) => return Err(e.into()),
    };

    let plain = password.to_string();
    let hash = user.password_hash.clone();
    if !blocking(move || verify_password(&plain, &hash)).await? {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(AppError::InvalidCredentials);
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn registration(email: &str) -> Registration {
        Registration {
            email: email.into(),
            first_name: "Alice".into(),
            last_name: "Liddell".into(),
            password: "Wonder1and!".into(),
        }
    }

    #[tokio::test]
    async fn register_then_verify_returns_same_user() {
        let store = MemoryStore::new();
        let id = register(&store, &registration("alice@example.com")).await.unwrap();
        let user = verify_credentials(&store, "alice@example.com", "Wonder1and!")
            .await
            .unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.first_name, "Alice");
        assert_ne!(user.password_hash, "Wonder1and!");
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_without_new_row() {
        let store = MemoryStore::new();
        let first = register(&store, &registration("alice@example.com")).await.unwrap();
        let mut again = registration("alice@example.com");
        again.password = "Different1!".into();
        assert!(matches!(register(&store, &again).await, Err(AppError::EmailInUse)));

        // the original account is untouched
        let user = verify_credentials(&store, "alice@example.com", "Wonder1and!")
            .await
            .unwrap();
        assert_eq!(user.id, first);
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_the_same() {
        let store = MemoryStore::new();
        register(&store, &registration("alice@example.com")).await.unwrap();

        let unknown = verify_credentials(&store, "bob@example.com", "Wonder1and!")
            .await
            .unwrap_err();
        let wrong = verify_credentials(&store, "alice@example.com", "nope")
            .await
            .unwrap_err();
        assert!(matches!(unknown, AppError::InvalidCredentials));
        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }
}
