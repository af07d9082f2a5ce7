//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - Barcode lookup (scanner path)
//! - Quick search by name or barcode
//! - Create / edit with barcode uniqueness
//! - Stock decrement for checkout, stock adjustment for restocking
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  ❌ Read, subtract in Rust, write back                              │
//! │     UPDATE products SET stock = 7 WHERE id = ?                      │
//! │                                                                     │
//! │  ✅ Delta with a guard, in one statement                            │
//! │     UPDATE products SET stock = stock - 3                           │
//! │     WHERE id = ? AND stock >= 3                                     │
//! │                                                                     │
//! │  0 rows affected  ⇒  someone else took the stock first              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult, StoreResult};
use tienda_core::validation::{validate_new_product, validate_search_query};
use tienda_core::{CoreError, NewProduct, Product, MIN_SEARCH_LEN, SEARCH_LIMIT};

const PRODUCT_COLUMNS: &str = "id, barcode, name, price_cents, stock, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let product = repo.get_by_barcode("7501031311309").await?;
/// let results = repo.quick_search("coca").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its barcode (exact match after trimming).
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1"
        ))
        .bind(barcode.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets every product whose id is in `ids`. Missing ids are skipped.
    pub async fn get_many(&self, ids: &[i64]) -> DbResult<Vec<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_many(&mut conn, ids).await
    }

    /// Lists products ordered by name.
    pub async fn list(&self, limit: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name, id LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Searches products by case-insensitive substring of name or barcode,
    /// ordered by name. An empty query lists the catalog.
    pub async fn search(&self, query: &str, limit: i64) -> DbResult<Vec<Product>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.list(limit).await;
        }

        let pattern = like_pattern(query);

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE name LIKE ?1 ESCAPE '\' OR barcode LIKE ?1 ESCAPE '\'
            ORDER BY name, id
            LIMIT ?2
            "#
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Cashier quick search: at least 2 characters, at most 10 results.
    pub async fn quick_search(&self, query: &str) -> StoreResult<Vec<Product>> {
        let query = validate_search_query(query)?;

        if query.chars().count() < MIN_SEARCH_LEN {
            return Ok(Vec::new());
        }

        Ok(self.search(&query, SEARCH_LIMIT).await?)
    }

    /// Products with `stock <= threshold`, lowest stock first.
    pub async fn low_stock(&self, threshold: i64, limit: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE stock <= ?1
            ORDER BY stock ASC, name
            LIMIT ?2
            "#
        ))
        .bind(threshold)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Counts catalog entries.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Creates a product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The stored product with its new id
    /// * `Err(CoreError::DuplicateBarcode)` - Barcode already used
    /// * `Err(CoreError::Validation)` - Blank/long fields, negative price or stock
    pub async fn create(&self, product: NewProduct) -> StoreResult<Product> {
        let product = validate_new_product(product)?;
        let now = Utc::now();

        debug!(barcode = %product.barcode, "Inserting product");

        let result = sqlx::query(
            r#"
            INSERT INTO products (barcode, name, price_cents, stock, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
        )
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(product.stock)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)
        .map_err(|e| duplicate_barcode(e, &product.barcode))?;

        Ok(Product {
            id: result.last_insert_rowid(),
            barcode: product.barcode,
            name: product.name,
            price_cents: product.price.cents(),
            stock: product.stock,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces barcode, name, price and stock of an existing product.
    ///
    /// ## Returns
    /// * `Err(CoreError::DuplicateBarcode)` - Barcode used by *another* product
    /// * `Err(DbError::NotFound)` - No product with this id
    pub async fn update(&self, id: i64, product: NewProduct) -> StoreResult<Product> {
        let product = validate_new_product(product)?;
        let now = Utc::now();

        debug!(id = %id, barcode = %product.barcode, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                barcode = ?2,
                name = ?3,
                price_cents = ?4,
                stock = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(product.stock)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)
        .map_err(|e| duplicate_barcode(e, &product.barcode))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id).into());
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id).into())
    }

    /// Adds `delta` units to stock (negative to remove). Stock never goes
    /// below zero.
    pub async fn adjust_stock(&self, id: i64, delta: i64) -> StoreResult<Product> {
        debug!(id = %id, delta = %delta, "Adjusting stock");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + ?2, updated_at = ?3
            WHERE id = ?1 AND stock + ?2 >= 0
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let product = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::InsufficientStock {
                barcode: product.barcode,
                name: product.name,
                available: product.stock,
                requested: -delta,
            }
            .into());
        }

        Ok(product)
    }
}

// =============================================================================
// Connection-level operations (used inside the checkout transaction)
// =============================================================================

/// Loads the products with the given ids on an existing connection.
pub async fn fetch_many(conn: &mut SqliteConnection, ids: &[i64]) -> DbResult<Vec<Product>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id IN ("));
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let products = builder
        .build_query_as::<Product>()
        .fetch_all(&mut *conn)
        .await?;

    Ok(products)
}

/// Reads the current stock of a product on an existing connection.
pub async fn fetch_stock(conn: &mut SqliteConnection, id: i64) -> DbResult<i64> {
    let stock: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    stock.ok_or_else(|| DbError::not_found("Product", id))
}

/// Takes `quantity` units from stock if at least that many are on hand.
///
/// Returns `false` when the guard fails (stock would go negative).
pub async fn decrement_stock(conn: &mut SqliteConnection, id: i64, quantity: i64) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock - ?2, updated_at = ?3
        WHERE id = ?1 AND stock >= ?2
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

fn duplicate_barcode(err: DbError, barcode: &str) -> crate::error::StoreError {
    if err.is_unique_violation_on("products.barcode") {
        CoreError::DuplicateBarcode(barcode.to_string()).into()
    } else {
        err.into()
    }
}

/// Builds a `LIKE` pattern matching `query` anywhere, with `%`, `_` and `\`
/// escaped.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::pool::{Database, DbConfig};
    use tienda_core::Money;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn new_product(barcode: &str, name: &str, cents: i64, stock: i64) -> NewProduct {
        NewProduct {
            barcode: barcode.to_string(),
            name: name.to_string(),
            price: Money::from_cents(cents),
            stock,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = db().await;
        let repo = db.products();

        let created = repo
            .create(new_product("7501031311309", "Coca Cola 500ml", 75, 100))
            .await
            .unwrap();
        assert!(created.id > 0);

        let by_barcode = repo.get_by_barcode(" 7501031311309 ").await.unwrap().unwrap();
        assert_eq!(by_barcode.id, created.id);
        assert_eq!(by_barcode.price_cents, 75);

        let by_id = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.name, "Coca Cola 500ml");

        assert!(repo.get_by_barcode("000").await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_barcode() {
        let db = db().await;
        let repo = db.products();

        repo.create(new_product("123", "Pan", 165, 5)).await.unwrap();
        let err = repo.create(new_product("123", "Otro", 100, 1)).await.unwrap_err();

        assert!(matches!(
            err,
            StoreError::Core(CoreError::DuplicateBarcode(ref b)) if b == "123"
        ));
    }

    #[tokio::test]
    async fn test_update() {
        let db = db().await;
        let repo = db.products();

        let a = repo.create(new_product("A1", "Arroz", 125, 80)).await.unwrap();
        let b = repo.create(new_product("B1", "Galletas", 50, 200)).await.unwrap();

        let updated = repo
            .update(a.id, new_product("A1", "Arroz 1kg", 130, 70))
            .await
            .unwrap();
        assert_eq!(updated.name, "Arroz 1kg");
        assert_eq!(updated.price_cents, 130);
        assert_eq!(updated.stock, 70);

        // Taking another product's barcode is rejected
        let err = repo
            .update(b.id, new_product("A1", "Galletas", 50, 200))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Core(CoreError::DuplicateBarcode(_))));

        let err = repo
            .update(999, new_product("Z9", "Nada", 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Db(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid() {
        let db = db().await;
        let err = db
            .products()
            .create(new_product("", "Sin codigo", 100, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_search() {
        let db = db().await;
        let repo = db.products();

        repo.create(new_product("7501031311309", "Coca Cola 500ml", 75, 100)).await.unwrap();
        repo.create(new_product("7861001240017", "Pan Bimbo", 165, 50)).await.unwrap();
        repo.create(new_product("50_OFF", "Cola Light", 80, 10)).await.unwrap();

        let results = repo.search("COLA", 10).await.unwrap();
        let names: Vec<_> = results.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Coca Cola 500ml", "Cola Light"]);

        let by_barcode = repo.search("78610", 10).await.unwrap();
        assert_eq!(by_barcode.len(), 1);

        // Wildcards are literal
        assert_eq!(repo.search("_", 10).await.unwrap().len(), 1);
        assert_eq!(repo.search("%", 10).await.unwrap().len(), 0);

        assert_eq!(repo.search("", 10).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_quick_search_needs_two_characters() {
        let db = db().await;
        let repo = db.products();
        repo.create(new_product("1", "Pan", 165, 50)).await.unwrap();

        assert!(repo.quick_search("p").await.unwrap().is_empty());
        assert_eq!(repo.quick_search("pa").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_low_stock() {
        let db = db().await;
        let repo = db.products();

        repo.create(new_product("1", "Pan", 165, 5)).await.unwrap();
        repo.create(new_product("2", "Leche", 90, 0)).await.unwrap();
        repo.create(new_product("3", "Arroz", 125, 80)).await.unwrap();

        let low = repo.low_stock(5, 10).await.unwrap();
        let names: Vec<_> = low.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Leche", "Pan"]);
    }

    #[tokio::test]
    async fn test_adjust_stock() {
        let db = db().await;
        let repo = db.products();
        let p = repo.create(new_product("1", "Pan", 165, 5)).await.unwrap();

        assert_eq!(repo.adjust_stock(p.id, 10).await.unwrap().stock, 15);
        assert_eq!(repo.adjust_stock(p.id, -15).await.unwrap().stock, 0);

        let err = repo.adjust_stock(p.id, -1).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Core(CoreError::InsufficientStock { available: 0, requested: 1, .. })
        ));

        let err = repo.adjust_stock(999, 1).await.unwrap_err();
        assert!(matches!(err, StoreError::Db(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_decrement_stock_guard() {
        let db = db().await;
        let p = db.products().create(new_product("1", "Pan", 165, 2)).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(!decrement_stock(&mut conn, p.id, 3).await.unwrap());
        assert!(decrement_stock(&mut conn, p.id, 2).await.unwrap());
        assert_eq!(fetch_stock(&mut conn, p.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_many() {
        let db = db().await;
        let repo = db.products();
        let a = repo.create(new_product("1", "Pan", 165, 2)).await.unwrap();
        let b = repo.create(new_product("2", "Leche", 90, 2)).await.unwrap();

        let mut found = repo.get_many(&[a.id, b.id, 404]).await.unwrap();
        found.sort_by_key(|p| p.id);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, a.id);

        assert!(repo.get_many(&[]).await.unwrap().is_empty());
    }

    #[test]
    fn test_like_pattern_escapes() {
        assert_eq!(like_pattern("coca"), "%coca%");
        assert_eq!(like_pattern("50%_"), "%50\\%\\_%");
    }
}
