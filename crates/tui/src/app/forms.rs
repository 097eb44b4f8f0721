//! Text-field forms over the engine's record editors.
use api_types::{
    loan::Loan,
    market::MarketPrice,
    product::{Product, ProductStatus},
};
use engine::{
    EngineError, Money,
    editor::{Draft, Editor},
    money::parse_whole,
    planner::parse_date,
};

/// Index of the product form's status input, cycled with Left/Right.
pub const PRODUCT_STATUS_FIELD: usize = 5;

/// A record editable as a list of labelled text inputs.
pub trait FormSpec: Draft {
    const LABELS: &'static [&'static str];

    fn to_inputs(&self) -> Vec<String>;

    /// Writes the inputs into the draft, field by field.
    fn apply_inputs(&mut self, inputs: &[String]) -> Result<(), EngineError>;
}

#[derive(Debug)]
pub struct EditForm<D> {
    pub editor: Editor<D>,
    pub inputs: Vec<String>,
    pub focus: usize,
}

impl<D: FormSpec> EditForm<D> {
    pub fn open(existing: Option<D>) -> Self {
        let editor = Editor::open(existing);
        let inputs = editor.draft().to_inputs();
        Self {
            editor,
            inputs,
            focus: 0,
        }
    }

    pub fn focused_input(&mut self) -> Option<&mut String> {
        self.inputs.get_mut(self.focus)
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % D::LABELS.len();
    }

    pub fn prev_field(&mut self) {
        self.focus = self.focus.checked_sub(1).unwrap_or(D::LABELS.len() - 1);
    }

    /// Copies the inputs into the draft; the editor keeps them on failure.
    pub fn sync(&mut self) -> Result<(), EngineError> {
        self.editor.draft_mut().apply_inputs(&self.inputs)
    }
}

fn input(inputs: &[String], idx: usize) -> &str {
    inputs.get(idx).map_or("", |s| s.trim())
}

fn optional(value: &str) -> Option<String> {
    Some(value.to_string()).filter(|v| !v.is_empty())
}

fn price_input(minor: i64) -> String {
    if minor == 0 {
        return String::new();
    }
    format!("{}.{:02}", minor / 100, (minor % 100).abs())
}

fn parse_price(value: &str) -> Result<i64, EngineError> {
    if value.is_empty() {
        return Ok(0);
    }
    Ok(value.parse::<Money>()?.minor())
}

pub fn parse_product_status(value: &str) -> Result<ProductStatus, EngineError> {
    match value.to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
        "" | "available" => Ok(ProductStatus::Available),
        "reserved" => Ok(ProductStatus::Reserved),
        "sold_out" | "sold" => Ok(ProductStatus::SoldOut),
        other => Err(EngineError::validation(format!(
            "Status must be available, reserved or sold out, not '{other}'."
        ))),
    }
}

impl FormSpec for Product {
    const LABELS: &'static [&'static str] = &[
        "Name",
        "Category",
        "Quantity",
        "Unit",
        "Price (KES)",
        "Status",
        "Description",
    ];

    fn to_inputs(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.category.clone(),
            self.quantity.to_string(),
            self.unit.clone(),
            price_input(self.price_minor),
            self.status.as_str().to_string(),
            self.description.clone().unwrap_or_default(),
        ]
    }

    fn apply_inputs(&mut self, inputs: &[String]) -> Result<(), EngineError> {
        self.name = input(inputs, 0).to_string();
        self.category = input(inputs, 1).to_string();
        let quantity = input(inputs, 2);
        self.quantity = if quantity.is_empty() {
            0.0
        } else {
            quantity
                .replace(',', ".")
                .parse()
                .map_err(|_| EngineError::validation("Quantity must be a number."))?
        };
        self.unit = input(inputs, 3).to_string();
        self.price_minor = parse_price(input(inputs, 4))?;
        self.status = parse_product_status(input(inputs, 5))?;
        self.description = optional(input(inputs, 6));
        Ok(())
    }
}

impl FormSpec for MarketPrice {
    const LABELS: &'static [&'static str] = &[
        "Product",
        "Category",
        "Region",
        "Market",
        "Unit",
        "Price (KES)",
        "Date (YYYY-MM-DD)",
        "Benchmark (y/n)",
        "Source",
    ];

    fn to_inputs(&self) -> Vec<String> {
        vec![
            self.product.clone(),
            self.category.clone(),
            self.region.clone(),
            self.market.clone(),
            self.unit.clone(),
            price_input(self.price_minor),
            self.date.map(|d| d.to_string()).unwrap_or_default(),
            if self.is_benchmark { "y" } else { "n" }.to_string(),
            self.source.clone().unwrap_or_default(),
        ]
    }

    fn apply_inputs(&mut self, inputs: &[String]) -> Result<(), EngineError> {
        self.product = input(inputs, 0).to_string();
        self.category = input(inputs, 1).to_string();
        self.region = input(inputs, 2).to_string();
        self.market = input(inputs, 3).to_string();
        self.unit = input(inputs, 4).to_string();
        self.price_minor = parse_price(input(inputs, 5))?;
        let date = input(inputs, 6);
        self.date = if date.is_empty() {
            None
        } else {
            Some(parse_date(date)?)
        };
        self.is_benchmark = matches!(
            input(inputs, 7).to_ascii_lowercase().as_str(),
            "y" | "yes" | "true"
        );
        self.source = optional(input(inputs, 8));
        Ok(())
    }
}

impl FormSpec for Loan {
    const LABELS: &'static [&'static str] = &["Amount (KES)", "Purpose", "Term (months)"];

    fn to_inputs(&self) -> Vec<String> {
        vec![
            if self.amount == 0 {
                String::new()
            } else {
                self.amount.to_string()
            },
            self.purpose.clone(),
            self.term_months.to_string(),
        ]
    }

    fn apply_inputs(&mut self, inputs: &[String]) -> Result<(), EngineError> {
        self.amount = parse_whole(input(inputs, 0))?;
        self.purpose = input(inputs, 1).to_string();
        self.term_months = input(inputs, 2)
            .parse()
            .map_err(|_| EngineError::validation("Term must be a whole number of months."))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::editor::SaveVerb;

    #[test]
    fn new_product_form_shows_defaults() {
        let form = EditForm::<Product>::open(None);
        assert_eq!(form.inputs[1], "produce");
        assert_eq!(form.inputs[3], "kg");
        assert_eq!(form.inputs[5], "available");
        assert_eq!(form.editor.verb(), SaveVerb::Create);
    }

    #[test]
    fn inputs_flow_into_the_draft() {
        let mut form = EditForm::<Product>::open(None);
        form.inputs[0] = "Sukuma wiki".to_string();
        form.inputs[2] = "12,5".to_string();
        form.inputs[4] = "30.50".to_string();
        form.inputs[5] = "sold out".to_string();
        form.sync().unwrap();
        let draft = form.editor.draft();
        assert_eq!(draft.quantity, 12.5);
        assert_eq!(draft.price_minor, 3050);
        assert_eq!(draft.status, ProductStatus::SoldOut);
    }

    #[test]
    fn bad_date_is_a_validation_error() {
        let mut form = EditForm::<MarketPrice>::open(None);
        form.inputs[6] = "01/03/2025".to_string();
        let err = form.sync().unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn focus_wraps_both_ways() {
        let mut form = EditForm::<Loan>::open(None);
        form.prev_field();
        assert_eq!(form.focus, 2);
        form.next_field();
        assert_eq!(form.focus, 0);
    }

    #[test]
    fn price_round_trips_through_the_form() {
        assert_eq!(price_input(4_505), "45.05");
        assert_eq!(parse_price("45.05").unwrap(), 4_505);
    }
}
