use async_trait::async_trait;
use auth::Permission;
use auth::Profile;
use auth::Role;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::user::models::AssignedRole;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::RoleId;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

const USER_COLUMNS: &str =
    "id, email, password_hash, name, surname, phone_number, activated, created_at";

// Every role row is joined with its permissions; a role without any yields
// one row with NULL resource and action.
const ROLE_GRANTS: &str = r#"
    SELECT r.id AS role_id, r.name AS role_name, p.resource, p.action
    FROM roles r
    LEFT JOIN role_permissions rp ON rp.role_id = r.id
    LEFT JOIN permissions p ON p.id = rp.permission_id
"#;

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn roles_of(&self, user_id: Uuid) -> Result<Vec<AssignedRole>, UserError> {
        let rows = sqlx::query_as::<_, RoleGrantRow>(&format!(
            "{ROLE_GRANTS} JOIN user_roles ur ON ur.role_id = r.id \
             WHERE ur.user_id = $1 ORDER BY r.name"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(assemble_roles(rows))
    }

    async fn hydrate(&self, row: Option<UserRow>) -> Result<Option<User>, UserError> {
        match row {
            Some(row) => {
                let roles = self.roles_of(row.id).await?;
                Ok(Some(row.into_user(roles)?))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        let mut transaction = self.pool.begin().await.map_err(database_error)?;

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, name, surname, phone_number, activated, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id.0)
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(&user.profile.name)
        .bind(&user.profile.surname)
        .bind(&user.profile.phone_number)
        .bind(user.activated)
        .bind(user.created_at)
        .execute(&mut *transaction)
        .await
        .map_err(|e| write_error(e, &user.email))?;

        for assigned in &user.roles {
            sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
                .bind(user.id.0)
                .bind(assigned.id.0)
                .execute(&mut *transaction)
                .await
                .map_err(database_error)?;
        }

        transaction.commit().await.map_err(database_error)?;

        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        self.hydrate(row).await
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        self.hydrate(row).await
    }

    async fn find_roles_by_ids(&self, ids: &[RoleId]) -> Result<Vec<AssignedRole>, UserError> {
        let ids: Vec<Uuid> = ids.iter().map(|id| id.0).collect();

        let rows = sqlx::query_as::<_, RoleGrantRow>(&format!(
            "{ROLE_GRANTS} WHERE r.id = ANY($1) ORDER BY r.name"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(assemble_roles(rows))
    }

    async fn update(&self, user: User) -> Result<User, UserError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = $2, password_hash = $3, name = $4, surname = $5,
                phone_number = $6, activated = $7
            WHERE id = $1
            "#,
        )
        .bind(user.id.0)
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(&user.profile.name)
        .bind(&user.profile.surname)
        .bind(&user.profile.phone_number)
        .bind(user.activated)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &user.email))?;

        if result.rows_affected() == 0 {
            return Err(UserError::NotFound(user.id.to_string()));
        }

        Ok(user)
    }

    async fn delete(&self, id: &UserId) -> Result<(), UserError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(UserError::NotFound(id.to_string()));
        }

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    name: Option<String>,
    surname: Option<String>,
    phone_number: Option<String>,
    activated: bool,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, roles: Vec<AssignedRole>) -> Result<User, UserError> {
        Ok(User {
            id: UserId(self.id),
            email: EmailAddress::new(self.email)?,
            password_hash: self.password_hash,
            profile: Profile {
                name: self.name,
                surname: self.surname,
                phone_number: self.phone_number,
            },
            activated: self.activated,
            roles,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RoleGrantRow {
    role_id: Uuid,
    role_name: String,
    resource: Option<String>,
    action: Option<String>,
}

/// Fold joined role/permission rows into one entry per role, keeping row order.
fn assemble_roles(rows: Vec<RoleGrantRow>) -> Vec<AssignedRole> {
    let mut grouped: Vec<(Uuid, String, Vec<Permission>)> = Vec::new();

    for row in rows {
        let index = match grouped.iter().position(|(id, _, _)| *id == row.role_id) {
            Some(index) => index,
            None => {
                grouped.push((row.role_id, row.role_name, Vec::new()));
                grouped.len() - 1
            }
        };

        if let (Some(resource), Some(action)) = (row.resource, row.action) {
            grouped[index].2.push(Permission::new(resource, action));
        }
    }

    grouped
        .into_iter()
        .map(|(id, name, permissions)| AssignedRole {
            id: RoleId(id),
            role: Role::new(name).with_permissions(permissions),
        })
        .collect()
}

fn database_error(e: sqlx::Error) -> UserError {
    tracing::error!(error = %e, "Database operation failed");
    UserError::DatabaseError(e.to_string())
}

fn write_error(e: sqlx::Error, email: &EmailAddress) -> UserError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() && db_err.constraint() == Some("users_email_key") {
            return UserError::EmailAlreadyExists(email.as_str().to_string());
        }
    }
    database_error(e)
}
