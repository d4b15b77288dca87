//! Product Aggregate

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::events::{DomainEvent, ProductEvent};
use crate::domain::value_objects::{Money, Quantity};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    id: String,
    name: String,
    description: String,
    price: Money,
    weight: String,
    stock: Quantity,
    image_url: String,
    category: String,
    #[serde(default)]
    featured: bool,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

impl Product {
    /// Build a catalog record from an admin draft. The draft must already carry an id.
    pub fn create(draft: ProductDraft) -> Result<Self, ProductError> {
        let id = draft.id.as_deref().map(str::trim).filter(|id| !id.is_empty()).ok_or(ProductError::MissingId)?.to_string();
        let mut product = Self {
            id: id.clone(), name: draft.name.trim().to_string(), description: draft.description.trim().to_string(),
            price: draft.price, weight: draft.weight.trim().to_string(), stock: draft.stock,
            image_url: draft.image_url.trim().to_string(), category: draft.category.trim().to_string(),
            featured: draft.featured, tags: draft.tags, created_at: Utc::now(), events: vec![],
        };
        product.raise_event(DomainEvent::Product(ProductEvent::Created { product_id: id }));
        Ok(product)
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn description(&self) -> &str { &self.description }
    pub fn price(&self) -> Money { self.price }
    pub fn weight(&self) -> &str { &self.weight }
    pub fn stock(&self) -> Quantity { self.stock }
    pub fn image_url(&self) -> &str { &self.image_url }
    pub fn category(&self) -> &str { &self.category }
    pub fn is_featured(&self) -> bool { self.featured }
    pub fn tags(&self) -> &[String] { &self.tags }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

    /// Replace every editable field. `id` and `createdAt` never change.
    pub fn apply(&mut self, draft: ProductDraft) {
        self.name = draft.name.trim().to_string();
        self.description = draft.description.trim().to_string();
        self.price = draft.price;
        self.weight = draft.weight.trim().to_string();
        self.stock = draft.stock;
        self.image_url = draft.image_url.trim().to_string();
        self.category = draft.category.trim().to_string();
        self.featured = draft.featured;
        self.tags = draft.tags;
        self.raise_event(DomainEvent::Product(ProductEvent::Updated { product_id: self.id.clone() }));
    }

    pub fn mark_deleted(&mut self) {
        self.raise_event(DomainEvent::Product(ProductEvent::Deleted { product_id: self.id.clone() }));
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}

/// Admin product form.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    #[serde(default)]
    pub id: Option<String>,
    #[validate(custom = "validate_product_name")]
    pub name: String,
    #[validate(custom = "validate_description")]
    pub description: String,
    #[validate(custom = "validate_price")]
    pub price: Money,
    #[validate(custom = "validate_weight")]
    pub weight: String,
    #[serde(default)]
    pub stock: Quantity,
    #[validate(url(message = "Please enter a valid image URL"))]
    pub image_url: String,
    #[validate(length(min = 1, message = "Please select a category"))]
    pub category: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

fn validate_product_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().chars().count() < 2 { return Err(invalid("name", "Product name must be at least 2 characters long")); }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), ValidationError> {
    if description.trim().chars().count() < 10 { return Err(invalid("description", "Description must be at least 10 characters long")); }
    Ok(())
}

fn validate_price(price: &Money) -> Result<(), ValidationError> {
    if price.is_zero() { return Err(invalid("price", "Please enter a valid price greater than 0")); }
    Ok(())
}

fn validate_weight(weight: &str) -> Result<(), ValidationError> {
    if weight.trim().chars().count() < 2 { return Err(invalid("weight", "Please enter a valid weight (e.g., 100g, 250g)")); }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductError {
    #[error("Product ID is required")]
    MissingId,
}

// =============================================================================
// Catalog queries
// =============================================================================

/// Filter and sort parameters accepted by the catalog listing.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub featured: Option<String>,
    pub tags: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey { Name, Price, Date, Featured }

impl ProductQuery {
    pub fn sort_key(&self) -> SortKey {
        match self.sort_by.as_deref() {
            Some("price") => SortKey::Price,
            Some("date") => SortKey::Date,
            Some("featured") => SortKey::Featured,
            _ => SortKey::Name,
        }
    }

    fn descending(&self) -> bool { self.sort_order.as_deref() == Some("desc") }

    fn tag_set(&self) -> Vec<&str> {
        self.tags.as_deref().map(|t| t.split(',').map(str::trim).filter(|t| !t.is_empty()).collect()).unwrap_or_default()
    }

    pub fn matches(&self, p: &Product) -> bool {
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty() && *c != "All") {
            if p.category != category { return false; }
        }
        if let Some(needle) = self.search.as_deref().map(str::to_lowercase).filter(|s| !s.is_empty()) {
            if !p.name.to_lowercase().contains(&needle) && !p.description.to_lowercase().contains(&needle) { return false; }
        }
        if self.min_price.is_some_and(|min| p.price.amount() < min) { return false; }
        if self.max_price.is_some_and(|max| p.price.amount() > max) { return false; }
        match self.featured.as_deref() {
            Some("true") if !p.featured => return false,
            Some("false") if p.featured => return false,
            _ => {}
        }
        let tags = self.tag_set();
        tags.is_empty() || p.tags.iter().any(|t| tags.contains(&t.as_str()))
    }

    fn compare(&self, a: &Product, b: &Product) -> Ordering {
        let ord = match self.sort_key() {
            SortKey::Name => a.name.cmp(&b.name),
            SortKey::Price => a.price.cmp(&b.price),
            SortKey::Date => a.created_at.cmp(&b.created_at),
            // featured first regardless of order, then by name
            SortKey::Featured => return b.featured.cmp(&a.featured).then_with(|| a.name.cmp(&b.name)),
        };
        if self.descending() { ord.reverse() } else { ord }
    }

    /// Filter then sort. The sort is stable so equal keys keep store order.
    pub fn apply(&self, products: Vec<Product>) -> Vec<Product> {
        let mut out: Vec<Product> = products.into_iter().filter(|p| self.matches(p)).collect();
        out.sort_by(|a, b| self.compare(a, b));
        out
    }
}

/// Distinct categories in first-seen order, then sorted.
pub fn categories(products: &[Product]) -> Vec<String> {
    let mut cats: Vec<String> = products.iter().map(|p| p.category.clone()).collect();
    cats.sort();
    cats.dedup();
    cats
}

#[cfg(test)]
pub(crate) fn sample(id: &str, name: &str, price: u64, category: &str, featured: bool, tags: &[&str]) -> Product {
    Product::create(ProductDraft {
        id: Some(id.into()), name: name.into(), description: format!("{name} - high quality, packed with nutrients."),
        price: Money::whole(price), weight: "250g".into(), stock: Quantity::new(30),
        image_url: format!("https://cdn.example.com/{id}.jpg"), category: category.into(), featured,
        tags: tags.iter().map(|t| t.to_string()).collect(),
    })
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Product> {
        vec![
            sample("badam-250g", "Badam", 270, "Nuts", false, &["almond"]),
            sample("kaju-500g", "Kaju", 600, "Nuts", true, &["cashew"]),
            sample("anjeer-250g", "Anjeer", 450, "Dried Fruits", true, &["fig"]),
        ]
    }

    fn ids(products: &[Product]) -> Vec<&str> { products.iter().map(|p| p.id()).collect() }

    #[test]
    fn test_product_create_requires_id() {
        let mut p = sample("x", "Pista", 100, "Nuts", false, &[]);
        assert_eq!(p.take_events().len(), 1);
        assert_eq!(p.stock().value(), 30);
        let draft = ProductDraft { id: Some("  ".into()), name: "Pista".into(), description: "Salted pistachios".into(), price: Money::whole(1),
            weight: "1kg".into(), stock: Quantity::new(1), image_url: "https://x.io/a.png".into(), category: "Nuts".into(), featured: false, tags: vec![] };
        assert_eq!(Product::create(draft).unwrap_err(), ProductError::MissingId);
    }

    #[test]
    fn test_draft_validation() {
        let draft = ProductDraft { id: None, name: "P".into(), description: "short".into(), price: Money::ZERO,
            weight: "g".into(), stock: Quantity::default(), image_url: "not a url".into(), category: String::new(), featured: false, tags: vec![] };
        let errors = draft.validate().unwrap_err();
        let fields = errors.field_errors();
        for f in ["name", "description", "price", "weight", "image_url", "category"] {
            assert!(fields.contains_key(f), "missing error for {f}");
        }
    }

    #[test]
    fn test_query_default_sort_by_name() {
        assert_eq!(ids(&ProductQuery::default().apply(catalog())), vec!["anjeer-250g", "badam-250g", "kaju-500g"]);
    }

    #[test]
    fn test_query_filters() {
        let q = ProductQuery { category: Some("Nuts".into()), sort_by: Some("price".into()), sort_order: Some("desc".into()), ..Default::default() };
        assert_eq!(ids(&q.apply(catalog())), vec!["kaju-500g", "badam-250g"]);

        let q = ProductQuery { search: Some("KAJ".into()), ..Default::default() };
        assert_eq!(ids(&q.apply(catalog())), vec!["kaju-500g"]);

        let q = ProductQuery { min_price: Some(Decimal::from(300)), max_price: Some(Decimal::from(500)), ..Default::default() };
        assert_eq!(ids(&q.apply(catalog())), vec!["anjeer-250g"]);

        let q = ProductQuery { featured: Some("false".into()), ..Default::default() };
        assert_eq!(ids(&q.apply(catalog())), vec!["badam-250g"]);

        let q = ProductQuery { tags: Some("fig, almond".into()), category: Some("All".into()), ..Default::default() };
        assert_eq!(ids(&q.apply(catalog())), vec!["anjeer-250g", "badam-250g"]);
    }

    #[test]
    fn test_featured_sort_puts_featured_first() {
        let q = ProductQuery { sort_by: Some("featured".into()), ..Default::default() };
        assert_eq!(ids(&q.apply(catalog())), vec!["anjeer-250g", "kaju-500g", "badam-250g"]);
    }

    #[test]
    fn test_categories_are_distinct() {
        assert_eq!(categories(&catalog()), vec!["Dried Fruits".to_string(), "Nuts".to_string()]);
    }
}
