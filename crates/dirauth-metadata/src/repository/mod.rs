//! SQLite identity store

use async_trait::async_trait;
use dirauth_core::types::UserRecord;
use dirauth_core::{Error, Result};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use tracing::{debug, info};

use crate::model::UserModel;
use crate::traits::{Filter, UserStore};

pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| Error::DatabaseError(e.to_string()))?;

        let store = Self { pool };
        store.init().await?;

        Ok(store)
    }

    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT,
                email TEXT,
                name TEXT,
                remember_token TEXT,
                created_at TEXT,
                updated_at TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

        sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_users_username ON users(username)"#)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::DatabaseError(e.to_string()))?;

        sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)"#)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::DatabaseError(e.to_string()))?;

        info!("Identity store initialized");
        Ok(())
    }

    fn row_to_user(model: &UserModel, row: &SqliteRow) -> Result<UserRecord> {
        let mut user = UserRecord::new(String::new());

        for column in row.columns() {
            let value = Self::column_text(row, column.ordinal())?;
            let name = column.name();

            if name == model.key_name {
                user.id = value.unwrap_or_default();
            } else if name == model.remember_token_name {
                user.remember_token = value;
            } else if let Some(value) = value {
                user.attributes.insert(name.to_string(), value);
            }
        }

        Ok(user.persisted())
    }

    /// Render a column as text by its stored type, so tables with INTEGER
    /// keys or REAL columns load too.
    fn column_text(row: &SqliteRow, index: usize) -> Result<Option<String>> {
        let raw = row
            .try_get_raw(index)
            .map_err(|e| Error::DatabaseError(e.to_string()))?;
        if raw.is_null() {
            return Ok(None);
        }
        let type_name = raw.type_info().name().to_string();

        let value = match type_name.as_str() {
            "INTEGER" => row.try_get::<i64, _>(index).map(|v| v.to_string()),
            "REAL" => row.try_get::<f64, _>(index).map(|v| v.to_string()),
            "BLOB" => row
                .try_get::<Vec<u8>, _>(index)
                .map(|v| String::from_utf8_lossy(&v).into_owned()),
            _ => row.try_get::<String, _>(index),
        }
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

        Ok(Some(value))
    }
}

/// Column and table names are spliced into SQL, so only plain identifiers pass.
fn quote_ident(name: &str) -> Result<String> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(format!("\"{}\"", name))
    } else {
        Err(Error::InvalidColumn(name.to_string()))
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn find(&self, model: &UserModel, id: &str) -> Result<Option<UserRecord>> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ? LIMIT 1",
            quote_ident(&model.table)?,
            quote_ident(&model.key_name)?
        );

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::DatabaseError(e.to_string()))?;

        row.map(|r| Self::row_to_user(model, &r)).transpose()
    }

    async fn first(&self, model: &UserModel, filters: &[Filter]) -> Result<Option<UserRecord>> {
        let mut sql = format!("SELECT * FROM {}", quote_ident(&model.table)?);

        let clauses = filters
            .iter()
            .map(|(column, _)| quote_ident(column).map(|c| format!("{} = ?", c)))
            .collect::<Result<Vec<_>>>()?;
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" LIMIT 1");

        debug!("User query: {}", sql);

        let mut query = sqlx::query(&sql);
        for (_, value) in filters {
            query = query.bind(value);
        }

        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::DatabaseError(e.to_string()))?;

        row.map(|r| Self::row_to_user(model, &r)).transpose()
    }

    async fn save(&self, model: &UserModel, user: &UserRecord) -> Result<()> {
        let key = quote_ident(&model.key_name)?;
        let mut columns = vec![key.clone(), quote_ident(&model.remember_token_name)?];
        for name in user.attributes.keys() {
            columns.push(quote_ident(name)?);
        }

        let placeholders = vec!["?"; columns.len()].join(", ");
        let updates = columns[1..]
            .iter()
            .map(|c| format!("{} = excluded.{}", c, c))
            .collect::<Vec<_>>()
            .join(", ");

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT({}) DO UPDATE SET {}",
            quote_ident(&model.table)?,
            columns.join(", "),
            placeholders,
            key,
            updates
        );

        let mut query = sqlx::query(&sql)
            .bind(&user.id)
            .bind(&user.remember_token);
        for value in user.attributes.values() {
            query = query.bind(value);
        }

        query
            .execute(&self.pool)
            .await
            .map_err(|e| Error::DatabaseError(e.to_string()))?;

        debug!("Saved user: {}", user.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteUserStore {
        SqliteUserStore::new("sqlite::memory:", 1).await.unwrap()
    }

    fn users() -> UserModel {
        UserModel::new("users", "users")
    }

    #[test]
    fn test_identifier_validation() {
        assert_eq!(quote_ident("email").unwrap(), "\"email\"");
        assert_eq!(quote_ident("_private2").unwrap(), "\"_private2\"");
        assert!(quote_ident("").is_err());
        assert!(quote_ident("1st").is_err());
        assert!(quote_ident("email\" OR 1=1 --").is_err());
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let store = store().await;
        let model = users();

        let user = UserRecord::new("42")
            .with_attribute("username", "alice")
            .with_attribute("email", "alice@example.com");
        store.save(&model, &user).await.unwrap();

        let found = store.find(&model, "42").await.unwrap().unwrap();
        assert!(found.exists);
        assert_eq!(found.get("username"), Some("alice"));
        assert_eq!(found.remember_token, None);

        assert!(store.find(&model, "43").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_first_with_filters() {
        let store = store().await;
        let model = users();

        store
            .save(&model, &UserRecord::new("1").with_attribute("email", "a@b.com"))
            .await
            .unwrap();
        store
            .save(&model, &UserRecord::new("2").with_attribute("email", "c@d.com"))
            .await
            .unwrap();

        let found = store
            .first(&model, &[("email".to_string(), "c@d.com".to_string())])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "2");

        let none = store
            .first(&model, &[("email".to_string(), "nobody@b.com".to_string())])
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_remember_token_upsert() {
        let store = store().await;
        let model = users();

        let mut user = UserRecord::new("1").with_attribute("username", "alice");
        store.save(&model, &user).await.unwrap();
        user.set_remember_token("tok123");
        store.save(&model, &user).await.unwrap();

        let found = store
            .first(
                &model,
                &[
                    ("id".to_string(), "1".to_string()),
                    ("remember_token".to_string(), "tok123".to_string()),
                ],
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.get("username"), Some("alice"));
    }

    #[tokio::test]
    async fn test_integer_keyed_table() {
        let store = store().await;
        sqlx::query(
            "CREATE TABLE members (id INTEGER PRIMARY KEY, email TEXT, score REAL, remember_token TEXT)",
        )
        .execute(&store.pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO members (id, email, score) VALUES (1, 'a@b.com', 2.5)")
            .execute(&store.pool)
            .await
            .unwrap();

        let model = UserModel::new("members", "members");

        let found = store
            .first(&model, &[("email".to_string(), "a@b.com".to_string())])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "1");
        assert_eq!(found.get("score"), Some("2.5"));
        assert_eq!(found.remember_token, None);

        let mut user = store.find(&model, "1").await.unwrap().unwrap();
        assert_eq!(user.get("email"), Some("a@b.com"));

        user.set_remember_token("tok123");
        store.save(&model, &user).await.unwrap();

        let remembered = store
            .first(
                &model,
                &[
                    ("id".to_string(), "1".to_string()),
                    ("remember_token".to_string(), "tok123".to_string()),
                ],
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(remembered.id, "1");
        assert_eq!(remembered.get("email"), Some("a@b.com"));
    }

    #[tokio::test]
    async fn test_rejects_unsafe_column() {
        let store = store().await;
        let err = store
            .first(&users(), &[("email = '' OR 1".to_string(), "x".to_string())])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidColumn(_)));
    }
}
