use std::future::Future;

use api_types::market::MarketPrice;

use crate::{
    EngineError,
    backend::{ApiResult, MarketApi},
    editor::{Draft, Persist},
    listing::Faceted,
    products::{DEFAULT_CATEGORY, DEFAULT_UNIT},
};

impl Draft for MarketPrice {
    fn defaults() -> Self {
        Self {
            id: None,
            product: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
            region: String::new(),
            market: String::new(),
            unit: DEFAULT_UNIT.to_string(),
            price_minor: 0,
            date: None,
            is_benchmark: false,
            source: None,
        }
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), EngineError> {
        let required = [
            (&self.product, "Product is required."),
            (&self.region, "Region is required."),
            (&self.market, "Market is required."),
            (&self.unit, "Unit is required."),
        ];
        if let Some((_, message)) = required.iter().find(|(value, _)| value.trim().is_empty()) {
            return Err(EngineError::validation(*message));
        }
        if self.price_minor <= 0 {
            return Err(EngineError::validation("Price must be greater than zero."));
        }
        Ok(())
    }
}

impl<A: MarketApi + Sync + ?Sized> Persist<A> for MarketPrice {
    fn create<'a>(
        api: &'a A,
        draft: &'a Self,
        idempotency_key: &'a str,
    ) -> impl Future<Output = ApiResult<Self>> + Send + 'a {
        api.create_market_price(draft, idempotency_key)
    }

    fn update<'a>(
        api: &'a A,
        id: &'a str,
        draft: &'a Self,
    ) -> impl Future<Output = ApiResult<Self>> + Send + 'a {
        api.update_market_price(id, draft)
    }
}

impl Faceted for MarketPrice {
    fn category(&self) -> Option<&str> {
        Some(&self.category)
    }

    fn facet(&self) -> Option<&str> {
        Some(&self.region)
    }
}

/// Validated `(product, region)` pair for a price prediction.
pub fn prediction_target(product: &str, region: &str) -> Result<(String, String), EngineError> {
    let product = product.trim();
    let region = region.trim();
    if product.is_empty() || region.is_empty() {
        return Err(EngineError::validation(
            "Pick a product and a region to predict a price.",
        ));
    }
    Ok((product.to_string(), region.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{Editor, SaveVerb};

    fn price() -> MarketPrice {
        MarketPrice {
            product: "Maize".to_string(),
            region: "Nakuru".to_string(),
            market: "Wakulima".to_string(),
            price_minor: 4_500,
            ..MarketPrice::defaults()
        }
    }

    #[test]
    fn new_price_draft_matches_documented_defaults() {
        let editor = Editor::<MarketPrice>::open(None);
        let draft = editor.draft();
        assert_eq!(draft.id, None);
        assert_eq!(draft.category, "produce");
        assert_eq!(draft.unit, "kg");
        assert_eq!(draft.price_minor, 0);
        assert!(!draft.is_benchmark);
        assert!(draft.product.is_empty());
        assert!(draft.region.is_empty());
        assert!(draft.market.is_empty());
        assert_eq!(draft.date, None);
        assert_eq!(draft.source, None);
        assert_eq!(editor.verb(), SaveVerb::Create);
    }

    #[test]
    fn existing_price_opens_as_update_with_equal_draft() {
        let record = MarketPrice {
            id: Some("mp-3".to_string()),
            ..price()
        };
        let editor = Editor::open(Some(record.clone()));
        assert_eq!(editor.draft(), &record);
        assert_eq!(editor.verb(), SaveVerb::Update("mp-3".to_string()));
    }

    #[test]
    fn complete_price_is_valid() {
        assert!(price().validate().is_ok());
    }

    #[test]
    fn missing_region_is_reported() {
        let mut p = price();
        p.region = " ".to_string();
        let err = p.validate().unwrap_err();
        assert_eq!(err.alert_message(), "Region is required.");
    }

    #[test]
    fn zero_price_is_rejected() {
        let mut p = price();
        p.price_minor = 0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn prediction_needs_both_fields() {
        assert!(prediction_target("maize", "").is_err());
        assert_eq!(
            prediction_target(" maize ", "Nakuru").unwrap(),
            ("maize".to_string(), "Nakuru".to_string())
        );
    }
}
