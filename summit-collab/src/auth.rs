use argon2::{
    password_hash::{Encoding, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::warn;
use rand::{rngs::OsRng, thread_rng, Rng};
use std::sync::Arc;
use summit_core::{
    time, DomainError, Gender, Identifier, Member, MemberId, MemberImage, MemberProfile,
    NewMember, Nickname, Password, PhoneNumber,
};
use thiserror::Error;

use crate::{
    events, util::random_string, CollabContext, CollabEvent, Config, Database, DatabaseError,
    DatabaseResult, EventSender, NewSession, SessionData,
};

pub struct Auth<Db> {
    db: Arc<Db>,
    config: Arc<Config>,
    events: EventSender,
    argon: Argon2<'static>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Identifier or password is incorrect
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// The token is unknown or expired
    #[error("Unauthenticated")]
    Unauthenticated,
    /// A registration value was rejected
    #[error(transparent)]
    Domain(DomainError),
    /// Something else went wrong with the database
    #[error(transparent)]
    Db(DatabaseError),
    #[error("HashError: {0}")]
    HashError(String),
}

/// Turns a bearer credential into the member it belongs to
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, credential: &str) -> Result<MemberId, AuthError>;
}

impl<Db> Auth<Db>
where
    Db: Database,
{
    const TOKEN_LENGTH: usize = 32;

    pub fn new<Blob>(context: &CollabContext<Db, Blob>) -> Self {
        Self {
            db: context.database.clone(),
            config: context.config.clone(),
            events: context.events.clone(),
            argon: Argon2::default(),
        }
    }

    /// Registers a member with one of the default profile images
    pub async fn register(&self, new_member: NewPlainMember) -> Result<Member, AuthError> {
        let identifier = Identifier::new(new_member.identifier).map_err(AuthError::Domain)?;
        let password = Password::new(new_member.password).map_err(AuthError::Domain)?;
        let nickname = Nickname::new(new_member.nickname).map_err(AuthError::Domain)?;
        let phone_number = PhoneNumber::new(new_member.phone_number).map_err(AuthError::Domain)?;
        let gender: Gender = new_member.gender.parse().map_err(AuthError::Domain)?;

        self.db
            .member_by_identifier(identifier.as_str())
            .await
            .conflict_or_ok("member", "identifier", identifier.as_str())
            .map_err(AuthError::Db)?;

        self.db
            .member_by_nickname(nickname.as_str())
            .await
            .conflict_or_ok("member", "nickname", nickname.as_str())
            .map_err(AuthError::Db)?;

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = self
            .argon
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        let member = self
            .db
            .create_member(NewMember {
                identifier,
                nickname,
                password_hash,
                profile: MemberProfile {
                    gender,
                    birthday: new_member.birthday,
                    phone_number,
                },
                image: self.default_image(),
            })
            .await
            .map_err(AuthError::Db)?;

        events::emit(
            &self.events,
            CollabEvent::MemberRegistered {
                member_id: member.id,
                identifier: member.identifier.as_str().to_string(),
            },
        );

        Ok(member)
    }

    /// Logs in a member, returning a new session
    pub async fn login(&self, credentials: Credentials) -> Result<SessionData, AuthError> {
        self.clear_expired().await;

        let member = self
            .db
            .member_by_identifier(&credentials.identifier)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound { .. } => AuthError::InvalidCredentials,
                err => AuthError::Db(err),
            })?;

        let stored_password = PasswordHash::parse(&member.password_hash, Encoding::default())
            .map_err(|e| AuthError::HashError(e.to_string()))?;

        self.argon
            .verify_password(credentials.password.as_bytes(), &stored_password)
            .map_err(|_| AuthError::InvalidCredentials)?;

        self.create_session(member.id).await
    }

    /// Trades a refresh token for a new session. The old one stops working.
    pub async fn reissue(&self, refresh_token: &str) -> Result<SessionData, AuthError> {
        let session = self
            .db
            .session_by_refresh_token(refresh_token)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound { .. } => AuthError::Unauthenticated,
                err => AuthError::Db(err),
            })?;

        self.db
            .delete_session_by_token(&session.access_token)
            .await
            .map_err(AuthError::Db)?;

        if session.refresh_expires_at <= time::now() {
            return Err(AuthError::Unauthenticated);
        }

        self.create_session(session.member_id).await
    }

    /// Deletes the associated session, if it exists
    pub async fn logout(&self, access_token: &str) -> Result<(), DatabaseError> {
        self.db.delete_session_by_token(access_token).await
    }

    async fn create_session(&self, member_id: MemberId) -> Result<SessionData, AuthError> {
        let now = time::now();

        let new_session = NewSession {
            access_token: random_string(Self::TOKEN_LENGTH),
            refresh_token: random_string(Self::TOKEN_LENGTH),
            member_id,
            expires_at: now + self.config.session_duration,
            refresh_expires_at: now + self.config.refresh_duration,
        };

        self.db
            .create_session(new_session)
            .await
            .map_err(AuthError::Db)
    }

    fn default_image(&self) -> MemberImage {
        let image = &self.config.default_image;
        let number = thread_rng().gen_range(1..=image.count.max(1));

        MemberImage {
            original_file_name: image.original_file_name.clone(),
            server_file_path: format!("{}{}", image.server_file_path_prefix, number),
            content_type: image.content_type,
        }
    }

    async fn clear_expired(&self) {
        if let Err(error) = self.db.clear_expired_sessions().await {
            warn!("Could not clear expired sessions: {}", error);
        }
    }
}

#[async_trait]
impl<Db> IdentityResolver for Auth<Db>
where
    Db: Database,
{
    async fn resolve(&self, credential: &str) -> Result<MemberId, AuthError> {
        let session = self
            .db
            .session_by_access_token(credential)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound { .. } => AuthError::Unauthenticated,
                err => AuthError::Db(err),
            })?;

        if session.expires_at <= time::now() {
            return Err(AuthError::Unauthenticated);
        }

        Ok(session.member_id)
    }
}

#[derive(Debug)]
pub struct Credentials {
    pub identifier: String,
    pub password: String,
}

/// Registration input, before any value is validated
#[derive(Debug)]
pub struct NewPlainMember {
    pub identifier: String,
    pub password: String,
    pub nickname: String,
    /// `MALE` or `FEMALE`
    pub gender: String,
    pub birthday: NaiveDate,
    pub phone_number: String,
}

#[cfg(test)]
mod test {
    use tempfile::tempdir;

    use crate::{
        test_support::{collab, plain_member, register},
        CollabEvent, DatabaseError,
    };

    use super::{AuthError, Credentials, IdentityResolver};

    fn credentials(identifier: &str, password: &str) -> Credentials {
        Credentials {
            identifier: identifier.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn register_and_login() {
        let dir = tempdir().unwrap();
        let collab = collab(dir.path());

        let member_id = register(&collab, "runner1").await;
        assert_eq!(
            collab.events().try_recv().unwrap(),
            CollabEvent::MemberRegistered {
                member_id,
                identifier: "runner1".to_string()
            }
        );

        let session = collab
            .auth
            .login(credentials("runner1", "password1!"))
            .await
            .unwrap();

        assert_eq!(session.member_id, member_id);
        assert_eq!(
            collab.auth.resolve(&session.access_token).await.unwrap(),
            member_id
        );
    }

    #[tokio::test]
    async fn new_members_get_a_default_image() {
        let dir = tempdir().unwrap();
        let collab = collab(dir.path());

        let member = collab
            .auth
            .register(plain_member("runner1", "runner"))
            .await
            .unwrap();

        let number: u32 = member
            .image
            .server_file_path
            .strip_prefix("member/default/")
            .unwrap()
            .parse()
            .unwrap();
        assert!((1..=5).contains(&number));
        assert_ne!(member.password_hash, "password1!");
    }

    #[tokio::test]
    async fn duplicates_are_rejected() {
        let dir = tempdir().unwrap();
        let collab = collab(dir.path());
        register(&collab, "runner1").await;

        let same_identifier = collab
            .auth
            .register(plain_member("runner1", "other"))
            .await;
        assert!(matches!(
            same_identifier,
            Err(AuthError::Db(DatabaseError::Conflict {
                field: "identifier",
                ..
            }))
        ));

        let same_nickname = collab
            .auth
            .register(plain_member("runner2", "runner1"))
            .await;
        assert!(matches!(
            same_nickname,
            Err(AuthError::Db(DatabaseError::Conflict {
                field: "nickname",
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn invalid_values_are_rejected() {
        let dir = tempdir().unwrap();
        let collab = collab(dir.path());

        let mut member = plain_member("runner1", "runner");
        member.password = "short".to_string();

        assert!(matches!(
            collab.auth.register(member).await,
            Err(AuthError::Domain(_))
        ));
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let dir = tempdir().unwrap();
        let collab = collab(dir.path());
        register(&collab, "runner1").await;

        assert!(matches!(
            collab.auth.login(credentials("runner1", "password2!")).await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            collab.auth.login(credentials("nobody", "password1!")).await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn reissue_replaces_the_session() {
        let dir = tempdir().unwrap();
        let collab = collab(dir.path());
        register(&collab, "runner1").await;

        let old = collab
            .auth
            .login(credentials("runner1", "password1!"))
            .await
            .unwrap();
        let new = collab.auth.reissue(&old.refresh_token).await.unwrap();

        assert_ne!(old.access_token, new.access_token);
        assert!(matches!(
            collab.auth.resolve(&old.access_token).await,
            Err(AuthError::Unauthenticated)
        ));
        assert!(matches!(
            collab.auth.reissue(&old.refresh_token).await,
            Err(AuthError::Unauthenticated)
        ));
        assert_eq!(
            collab.auth.resolve(&new.access_token).await.unwrap(),
            new.member_id
        );
    }

    #[tokio::test]
    async fn logout_ends_the_session() {
        let dir = tempdir().unwrap();
        let collab = collab(dir.path());
        register(&collab, "runner1").await;

        let session = collab
            .auth
            .login(credentials("runner1", "password1!"))
            .await
            .unwrap();
        collab.auth.logout(&session.access_token).await.unwrap();

        assert!(matches!(
            collab.auth.resolve(&session.access_token).await,
            Err(AuthError::Unauthenticated)
        ));
    }
}
