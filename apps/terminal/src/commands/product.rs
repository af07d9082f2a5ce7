//! # Product Commands
//!
//! Catalog lookup for the sales screen and catalog maintenance for the
//! back office.

use serde::Serialize;
use tracing::{debug, info};

use tienda_core::{Money, NewProduct, Product, LOW_STOCK_THRESHOLD, SEARCH_LIMIT};

use crate::error::ApiError;
use crate::state::DbState;

/// Product as shown to the cashier.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: i64,
    pub barcode: String,
    pub name: String,
    pub price: Money,
    pub stock: i64,
    pub low_stock: bool,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        ProductDto {
            id: p.id,
            price: p.price(),
            low_stock: p.stock <= LOW_STOCK_THRESHOLD,
            barcode: p.barcode,
            name: p.name,
            stock: p.stock,
        }
    }
}

/// Catalog form as typed: the price is still text.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub barcode: String,
    pub name: String,
    pub price: String,
    pub stock: i64,
}

impl ProductForm {
    fn into_new_product(self) -> Result<NewProduct, ApiError> {
        Ok(NewProduct {
            barcode: self.barcode,
            name: self.name,
            price: Money::parse(&self.price)?,
            stock: self.stock,
        })
    }
}

/// Checks if a query looks like a scanned barcode (8-13 digits).
///
/// Scanners type a full code at once; an exact lookup answers before the
/// substring search would.
fn is_barcode_query(query: &str) -> bool {
    let len = query.len();
    (8..=13).contains(&len) && query.chars().all(|c| c.is_ascii_digit())
}

/// Quick search by name or barcode.
///
/// Queries shorter than 2 characters return nothing; at most 10 results,
/// ordered by name.
pub async fn search_products(db: &DbState, query: &str) -> Result<Vec<ProductDto>, ApiError> {
    let query = query.trim();
    debug!(query = %query, "search_products command");

    let products = db.inner().products();

    if is_barcode_query(query) {
        if let Some(product) = products.get_by_barcode(query).await? {
            return Ok(vec![ProductDto::from(product)]);
        }
        debug!("Barcode not found, falling back to substring search");
    }

    let found = products.quick_search(query).await?;
    Ok(found.into_iter().map(ProductDto::from).collect())
}

/// Gets a single product by id.
pub async fn get_product(db: &DbState, id: i64) -> Result<ProductDto, ApiError> {
    let product = db
        .inner()
        .products()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;
    Ok(ProductDto::from(product))
}

/// Gets a single product by barcode.
pub async fn get_product_by_barcode(db: &DbState, barcode: &str) -> Result<ProductDto, ApiError> {
    let product = db
        .inner()
        .products()
        .get_by_barcode(barcode)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", barcode.trim()))?;
    Ok(ProductDto::from(product))
}

/// Adds a product to the catalog.
pub async fn create_product(db: &DbState, form: ProductForm) -> Result<ProductDto, ApiError> {
    let product = db
        .inner()
        .products()
        .create(form.into_new_product()?)
        .await?;

    info!(id = product.id, barcode = %product.barcode, "Product created");
    Ok(ProductDto::from(product))
}

/// Replaces a product's barcode, name, price and stock.
pub async fn update_product(
    db: &DbState,
    id: i64,
    form: ProductForm,
) -> Result<ProductDto, ApiError> {
    let product = db
        .inner()
        .products()
        .update(id, form.into_new_product()?)
        .await?;

    info!(id = product.id, "Product updated");
    Ok(ProductDto::from(product))
}

/// Adds (restock) or removes units. Stock never goes below zero.
pub async fn adjust_stock(db: &DbState, id: i64, delta: i64) -> Result<ProductDto, ApiError> {
    let product = db.inner().products().adjust_stock(id, delta).await?;
    info!(id, delta, stock = product.stock, "Stock adjusted");
    Ok(ProductDto::from(product))
}

/// Dashboard list: products at or below the low-stock threshold.
pub async fn low_stock(db: &DbState) -> Result<Vec<ProductDto>, ApiError> {
    let products = db
        .inner()
        .products()
        .low_stock(LOW_STOCK_THRESHOLD, SEARCH_LIMIT)
        .await?;
    Ok(products.into_iter().map(ProductDto::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{fixture, product};
    use crate::error::ErrorCode;

    fn form(barcode: &str, name: &str, price: &str, stock: i64) -> ProductForm {
        ProductForm {
            barcode: barcode.into(),
            name: name.into(),
            price: price.into(),
            stock,
        }
    }

    #[test]
    fn test_is_barcode_query() {
        assert!(is_barcode_query("7501031311309"));
        assert!(is_barcode_query("12345678"));
        assert!(!is_barcode_query("1234567"));
        assert!(!is_barcode_query("coca"));
    }

    #[tokio::test]
    async fn test_search_by_name_and_barcode() {
        let fx = fixture().await;
        product(&fx, "7501031311309", "Coca Cola 500ml", "0.75", 100).await;
        product(&fx, "1234567890123", "Galletas", "0.50", 200).await;

        let found = search_products(&fx.db, "coca").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Coca Cola 500ml");

        let found = search_products(&fx.db, "1234567890123").await.unwrap();
        assert_eq!(found[0].name, "Galletas");

        assert!(search_products(&fx.db, "c").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_parses_price() {
        let fx = fixture().await;

        let created = create_product(&fx.db, form("7862104340108", "Arroz 1kg", "1.25", 80))
            .await
            .unwrap();
        assert_eq!(created.price.cents(), 125);

        let err = create_product(&fx.db, form("999", "Azucar", "uno", 1))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_create_duplicate_barcode() {
        let fx = fixture().await;
        product(&fx, "7501031311309", "Coca Cola 500ml", "0.75", 100).await;

        let err = create_product(&fx.db, form("7501031311309", "Otra", "1.00", 1))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("7501031311309"));
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let fx = fixture().await;
        let err = update_product(&fx.db, 77, form("1", "X", "1.00", 1)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_adjust_stock_and_low_stock() {
        let fx = fixture().await;
        let pan = product(&fx, "7861001240017", "Pan Bimbo", "1.65", 10).await;

        let adjusted = adjust_stock(&fx.db, pan.id, -7).await.unwrap();
        assert_eq!(adjusted.stock, 3);
        assert!(adjusted.low_stock);

        let low = low_stock(&fx.db).await.unwrap();
        assert_eq!(low.len(), 1);

        let err = adjust_stock(&fx.db, pan.id, -4).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(get_product(&fx.db, pan.id).await.unwrap().stock, 3);
    }
}
