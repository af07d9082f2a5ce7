//! # Customer Commands

use tracing::{debug, info};

use tienda_core::{Customer, CustomerInput};

use crate::error::ApiError;
use crate::state::DbState;

/// Looks a customer up by document id while the cashier types it.
///
/// Fewer than 5 characters is "still typing" and finds nothing.
pub async fn lookup_customer(db: &DbState, doc_id: &str) -> Result<Option<Customer>, ApiError> {
    debug!(doc_id = %doc_id.trim(), "lookup_customer command");
    Ok(db.inner().customers().find_by_doc_id(doc_id).await?)
}

/// Gets a customer by id.
pub async fn get_customer(db: &DbState, id: i64) -> Result<Customer, ApiError> {
    db.inner()
        .customers()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", id))
}

/// Registers a customer. Document id and name are required.
pub async fn create_customer(db: &DbState, input: CustomerInput) -> Result<Customer, ApiError> {
    let customer = db.inner().customers().create(input).await?;
    info!(id = customer.id, doc_id = %customer.doc_id, "Customer created");
    Ok(customer)
}

/// Replaces a customer's details. Past invoices keep their snapshot.
pub async fn update_customer(
    db: &DbState,
    id: i64,
    input: CustomerInput,
) -> Result<Customer, ApiError> {
    let customer = db.inner().customers().update(id, input).await?;
    info!(id = customer.id, "Customer updated");
    Ok(customer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::fixture;
    use crate::error::ErrorCode;

    fn input(doc_id: &str, name: &str) -> CustomerInput {
        CustomerInput {
            doc_id: Some(doc_id.into()),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_lookup_requires_five_chars() {
        let fx = fixture().await;
        create_customer(&fx.db, input("0102030405", "Juan Perez")).await.unwrap();

        assert!(lookup_customer(&fx.db, "0102").await.unwrap().is_none());

        let found = lookup_customer(&fx.db, "0102030405").await.unwrap().unwrap();
        assert_eq!(found.name, "Juan Perez");
    }

    #[tokio::test]
    async fn test_duplicate_doc_id() {
        let fx = fixture().await;
        create_customer(&fx.db, input("0102030405", "Juan Perez")).await.unwrap();

        let err = create_customer(&fx.db, input("0102030405", "Otro"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_missing_name() {
        let fx = fixture().await;
        let err = create_customer(
            &fx.db,
            CustomerInput {
                doc_id: Some("0102030405".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_update_and_get() {
        let fx = fixture().await;
        let created = create_customer(&fx.db, input("0102030405", "Juan Perez")).await.unwrap();

        update_customer(&fx.db, created.id, input("0102030405", "Juan P. Perez"))
            .await
            .unwrap();

        assert_eq!(get_customer(&fx.db, created.id).await.unwrap().name, "Juan P. Perez");
        assert_eq!(get_customer(&fx.db, 999).await.unwrap_err().code, ErrorCode::NotFound);
    }
}
