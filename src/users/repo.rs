use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub skillsets: String,
    pub hobby: String,
}

/// The mutable fields of a user. The store assigns ids; callers never do.
#[derive(Debug, Clone)]
pub struct UserDraft {
    pub username: String,
    pub email: String,
    pub phone: String,
    pub skillsets: String,
    pub hobby: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Total matching count plus one page, ordered by id ascending so page
    /// boundaries are stable between calls.
    async fn list(
        &self,
        skillset: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<(i64, Vec<User>)>;

    async fn get(&self, id: i64) -> anyhow::Result<Option<User>>;

    async fn create(&self, draft: &UserDraft) -> anyhow::Result<User>;

    /// Full replace of the mutable fields. Returns false when the id does not
    /// exist; nothing is mutated in that case.
    async fn update(&self, id: i64, draft: &UserDraft) -> anyhow::Result<bool>;

    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
}

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn list(
        &self,
        skillset: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<(i64, Vec<User>)> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT count(*)
            FROM users
            WHERE $1::text IS NULL OR skillsets LIKE '%' || $1 || '%'
            "#,
        )
        .bind(skillset)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, phone, skillsets, hobby
            FROM users
            WHERE $1::text IS NULL OR skillsets LIKE '%' || $1 || '%'
            ORDER BY id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(skillset)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok((total, rows))
    }

    async fn get(&self, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, phone, skillsets, hobby
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, draft: &UserDraft) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, phone, skillsets, hobby)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, phone, skillsets, hobby
            "#,
        )
        .bind(&draft.username)
        .bind(&draft.email)
        .bind(&draft.phone)
        .bind(&draft.skillsets)
        .bind(&draft.hobby)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn update(&self, id: i64, draft: &UserDraft) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = $2, email = $3, phone = $4, skillsets = $5, hobby = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&draft.username)
        .bind(&draft.email)
        .bind(&draft.phone)
        .bind(&draft.skillsets)
        .bind(&draft.hobby)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// In-memory store backing the handler tests. Mirrors the Postgres contract:
/// ids start at 1 and are never reused within a run, listing is id-ascending.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryUserStore {
    inner: std::sync::Mutex<MemoryInner>,
}

#[cfg(test)]
#[derive(Default)]
struct MemoryInner {
    next_id: i64,
    users: Vec<User>,
}

#[cfg(test)]
#[async_trait]
impl UserStore for MemoryUserStore {
    async fn list(
        &self,
        skillset: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<(i64, Vec<User>)> {
        let inner = self.inner.lock().unwrap();
        let matching: Vec<User> = inner
            .users
            .iter()
            .filter(|u| skillset.map_or(true, |s| u.skillsets.contains(s)))
            .cloned()
            .collect();
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((total, page))
    }

    async fn get(&self, id: i64) -> anyhow::Result<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, draft: &UserDraft) -> anyhow::Result<User> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let user = User {
            id: inner.next_id,
            username: draft.username.clone(),
            email: draft.email.clone(),
            phone: draft.phone.clone(),
            skillsets: draft.skillsets.clone(),
            hobby: draft.hobby.clone(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: i64, draft: &UserDraft) -> anyhow::Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        match inner.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.username = draft.username.clone();
                user.email = draft.email.clone();
                user.phone = draft.phone.clone();
                user.skillsets = draft.skillsets.clone();
                user.hobby = draft.hobby.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.users.len();
        inner.users.retain(|u| u.id != id);
        Ok(inner.users.len() < before)
    }
}
