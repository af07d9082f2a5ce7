//! # Customer Repository
//!
//! The customer directory, keyed by external document id (cédula/RUC).
//!
//! ## Checkout Upsert
//! ```text
//! doc_id blank ─────────────────────────────► None (anonymous sale)
//!      │
//!      ▼
//! customer with doc_id exists? ── yes ──► overwrite supplied fields ──► Some(id)
//!      │ no
//!      ▼
//! name supplied? ── yes ──► insert ──► Some(new id)
//!      │ no
//!      ▼
//!     None
//! ```
//! The sale keeps its own copy of whatever the cashier typed, so a `None`
//! here still leaves the typed fields on the invoice.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult, StoreError, StoreResult};
use tienda_core::validation::validate_customer_input;
use tienda_core::{CoreError, Customer, CustomerInput, ValidationError, MIN_DOC_ID_LOOKUP_LEN};

const CUSTOMER_COLUMNS: &str =
    "id, doc_id, name, phone, address, email, created_at, updated_at";

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Looks up a customer by document id.
    ///
    /// Ids shorter than 5 characters are treated as "still typing" and
    /// return `None` without querying.
    pub async fn find_by_doc_id(&self, doc_id: &str) -> DbResult<Option<Customer>> {
        let doc_id = doc_id.trim();
        if doc_id.chars().count() < MIN_DOC_ID_LOOKUP_LEN {
            return Ok(None);
        }

        let mut conn = self.pool.acquire().await?;
        fetch_by_doc_id(&mut conn, doc_id).await
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Creates a customer. Document id and name are required.
    pub async fn create(&self, input: CustomerInput) -> StoreResult<Customer> {
        let (doc_id, name, input) = required_fields(input)?;
        let now = Utc::now();

        debug!(doc_id = %doc_id, "Inserting customer");

        let result = sqlx::query(
            r#"
            INSERT INTO customers (doc_id, name, phone, address, email, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
        )
        .bind(&doc_id)
        .bind(&name)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.email)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)
        .map_err(|e| duplicate_doc_id(e, &doc_id))?;

        Ok(Customer {
            id: result.last_insert_rowid(),
            doc_id,
            name,
            phone: input.phone,
            address: input.address,
            email: input.email,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces every field of a customer. Blank optional fields are cleared.
    pub async fn update(&self, id: i64, input: CustomerInput) -> StoreResult<Customer> {
        let (doc_id, name, input) = required_fields(input)?;

        debug!(id = %id, doc_id = %doc_id, "Updating customer");

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                doc_id = ?2,
                name = ?3,
                phone = ?4,
                address = ?5,
                email = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&doc_id)
        .bind(&name)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.email)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)
        .map_err(|e| duplicate_doc_id(e, &doc_id))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id).into());
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id).into())
    }

    /// Checkout upsert on a pooled connection. See [`upsert`].
    pub async fn upsert(&self, input: CustomerInput) -> DbResult<Option<i64>> {
        let mut conn = self.pool.acquire().await?;
        upsert(&mut conn, input).await
    }

    /// Counts directory entries.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-level operations (used inside the checkout transaction)
// =============================================================================

async fn fetch_by_doc_id(conn: &mut SqliteConnection, doc_id: &str) -> DbResult<Option<Customer>> {
    let customer = sqlx::query_as::<_, Customer>(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE doc_id = ?1"
    ))
    .bind(doc_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(customer)
}

/// Resolves the checkout customer to a directory id, creating or updating
/// the record as needed.
///
/// Only supplied (non-blank) fields overwrite an existing record; a
/// customer is only created when a name is given.
pub async fn upsert(conn: &mut SqliteConnection, input: CustomerInput) -> DbResult<Option<i64>> {
    let input = input.normalized();

    let Some(doc_id) = input.doc_id.as_deref() else {
        return Ok(None);
    };

    let now = Utc::now();

    if let Some(existing) = fetch_by_doc_id(conn, doc_id).await? {
        debug!(customer_id = %existing.id, "Updating customer from checkout");

        sqlx::query(
            r#"
            UPDATE customers SET
                name = COALESCE(?2, name),
                phone = COALESCE(?3, phone),
                address = COALESCE(?4, address),
                email = COALESCE(?5, email),
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(existing.id)
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.email)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        return Ok(Some(existing.id));
    }

    let Some(name) = input.name.as_deref() else {
        debug!(doc_id = %doc_id, "Unknown document without a name, not creating customer");
        return Ok(None);
    };

    let result = sqlx::query(
        r#"
        INSERT INTO customers (doc_id, name, phone, address, email, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
        "#,
    )
    .bind(doc_id)
    .bind(name)
    .bind(&input.phone)
    .bind(&input.address)
    .bind(&input.email)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let id = result.last_insert_rowid();
    debug!(customer_id = %id, "Created customer from checkout");
    Ok(Some(id))
}

fn required_fields(input: CustomerInput) -> StoreResult<(String, String, CustomerInput)> {
    let input = validate_customer_input(input)?;

    let doc_id = input.doc_id.clone().ok_or_else(|| ValidationError::Required {
        field: "doc_id".to_string(),
    })?;
    let name = input.name.clone().ok_or_else(|| ValidationError::Required {
        field: "customer name".to_string(),
    })?;

    Ok((doc_id, name, input))
}

fn duplicate_doc_id(err: DbError, doc_id: &str) -> StoreError {
    if err.is_unique_violation_on("customers.doc_id") {
        CoreError::DuplicateDocId(doc_id.to_string()).into()
    } else {
        err.into()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn input(doc: &str, name: &str) -> CustomerInput {
        CustomerInput {
            doc_id: Some(doc.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_upsert_anonymous() {
        let db = db().await;
        let id = db
            .customers()
            .upsert(CustomerInput {
                name: Some("Juan Perez".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(id, None);
        assert_eq!(db.customers().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_upsert_creates_then_updates() {
        let db = db().await;
        let repo = db.customers();

        let first = repo.upsert(input("0102030405", "Juan Perez")).await.unwrap();
        let second = repo.upsert(input("0102030405", "Juan P. Perez")).await.unwrap();

        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(repo.count().await.unwrap(), 1);

        let customer = repo.find_by_doc_id("0102030405").await.unwrap().unwrap();
        assert_eq!(customer.name, "Juan P. Perez");
    }

    #[tokio::test]
    async fn test_upsert_only_overwrites_supplied_fields() {
        let db = db().await;
        let repo = db.customers();

        repo.upsert(CustomerInput {
            phone: Some("0999999999".into()),
            email: Some("juan@example.com".into()),
            ..input("0102030405", "Juan Perez")
        })
        .await
        .unwrap();

        repo.upsert(CustomerInput {
            doc_id: Some("0102030405".into()),
            phone: Some("  ".into()),
            address: Some("Av. Amazonas".into()),
            ..Default::default()
        })
        .await
        .unwrap();

        let customer = repo.find_by_doc_id("0102030405").await.unwrap().unwrap();
        assert_eq!(customer.name, "Juan Perez");
        assert_eq!(customer.phone.as_deref(), Some("0999999999"));
        assert_eq!(customer.address.as_deref(), Some("Av. Amazonas"));
        assert_eq!(customer.email.as_deref(), Some("juan@example.com"));
    }

    #[tokio::test]
    async fn test_upsert_unknown_doc_without_name() {
        let db = db().await;
        let id = db
            .customers()
            .upsert(CustomerInput {
                doc_id: Some("0102030405".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(id, None);
        assert_eq!(db.customers().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_by_doc_id_needs_five_characters() {
        let db = db().await;
        let repo = db.customers();
        repo.create(input("1234", "Corto")).await.unwrap();

        assert!(repo.find_by_doc_id("1234").await.unwrap().is_none());
        assert!(repo.find_by_doc_id("99999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_and_duplicate() {
        let db = db().await;
        let repo = db.customers();

        let created = repo.create(input("0102030405", "Juan Perez")).await.unwrap();
        assert_eq!(repo.get_by_id(created.id).await.unwrap().unwrap().name, "Juan Perez");

        let err = repo.create(input("0102030405", "Otro")).await.unwrap_err();
        assert!(matches!(err, StoreError::Core(CoreError::DuplicateDocId(_))));

        let err = repo
            .create(CustomerInput {
                doc_id: Some("0911111111".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update() {
        let db = db().await;
        let repo = db.customers();

        let created = repo
            .create(CustomerInput {
                phone: Some("0999".into()),
                ..input("0102030405", "Juan Perez")
            })
            .await
            .unwrap();

        let updated = repo
            .update(created.id, input("0102030405", "Juan Perez Lopez"))
            .await
            .unwrap();
        assert_eq!(updated.name, "Juan Perez Lopez");
        assert_eq!(updated.phone, None);

        let err = repo.update(404, input("0911111111", "Nadie")).await.unwrap_err();
        assert!(matches!(err, StoreError::Db(DbError::NotFound { .. })));
    }
}
