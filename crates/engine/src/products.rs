use std::future::Future;

use api_types::product::{Product, ProductStatus};

use crate::{
    EngineError,
    backend::{ApiResult, ProductApi},
    editor::{Draft, Persist},
    listing::Faceted,
};

pub const DEFAULT_CATEGORY: &str = "produce";
pub const DEFAULT_UNIT: &str = "kg";

impl Draft for Product {
    fn defaults() -> Self {
        Self {
            id: None,
            farmer_id: None,
            name: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
            quantity: 0.0,
            unit: DEFAULT_UNIT.to_string(),
            price_minor: 0,
            status: ProductStatus::Available,
            description: None,
        }
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.name.trim().is_empty() {
            return Err(EngineError::validation("Product name is required."));
        }
        if self.category.trim().is_empty() {
            return Err(EngineError::validation("Category is required."));
        }
        if self.unit.trim().is_empty() {
            return Err(EngineError::validation("Unit is required."));
        }
        if !self.quantity.is_finite() || self.quantity < 0.0 {
            return Err(EngineError::validation("Quantity cannot be negative."));
        }
        if self.price_minor < 0 {
            return Err(EngineError::validation("Price cannot be negative."));
        }
        Ok(())
    }

    fn attach_owner(&mut self, owner_id: &str) {
        if self.farmer_id.is_none() {
            self.farmer_id = Some(owner_id.to_string());
        }
    }
}

impl<A: ProductApi + Sync + ?Sized> Persist<A> for Product {
    fn create<'a>(
        api: &'a A,
        draft: &'a Self,
        idempotency_key: &'a str,
    ) -> impl Future<Output = ApiResult<Self>> + Send + 'a {
        api.create_product(draft, idempotency_key)
    }

    fn update<'a>(
        api: &'a A,
        id: &'a str,
        draft: &'a Self,
    ) -> impl Future<Output = ApiResult<Self>> + Send + 'a {
        api.update_product(id, draft)
    }
}

impl Faceted for Product {
    fn category(&self) -> Option<&str> {
        Some(&self.category)
    }

    fn facet(&self) -> Option<&str> {
        Some(self.status.as_str())
    }
}

/// Next status in the edit form's status toggle.
pub fn next_status(status: ProductStatus) -> ProductStatus {
    match status {
        ProductStatus::Available => ProductStatus::Reserved,
        ProductStatus::Reserved => ProductStatus::SoldOut,
        ProductStatus::SoldOut => ProductStatus::Available,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{Editor, SaveVerb};

    #[test]
    fn new_product_draft_matches_documented_defaults() {
        let editor = Editor::<Product>::open(None);
        let draft = editor.draft();
        assert_eq!(draft.status, ProductStatus::Available);
        assert_eq!(draft.quantity, 0.0);
        assert_eq!(draft.price_minor, 0);
        assert_eq!(draft.category, "produce");
        assert_eq!(draft.id, None);
        assert_eq!(draft, &Product::defaults());
    }

    #[test]
    fn owner_is_attached_to_submitted_copy_only() {
        let mut editor = Editor::<Product>::open(None);
        editor.draft_mut().name = "Maize".to_string();
        let ticket = editor.begin_save(Some("farmer-7")).unwrap();
        assert_eq!(ticket.verb, SaveVerb::Create);
        assert_eq!(ticket.payload.farmer_id.as_deref(), Some("farmer-7"));
        assert_eq!(editor.draft().farmer_id, None);
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let mut product = Product::defaults();
        product.name = "Beans".to_string();
        product.quantity = -1.0;
        assert!(product.validate().is_err());
    }

    #[test]
    fn status_toggle_cycles() {
        let mut status = ProductStatus::Available;
        for _ in 0..3 {
            status = next_status(status);
        }
        assert_eq!(status, ProductStatus::Available);
    }
}
