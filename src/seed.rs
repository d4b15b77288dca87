//! Development catalog.
//!
//! Every product family comes in four packs. The 250g price is the base and
//! larger packs scale linearly; the 500g and 1kg packs are featured.

use crate::domain::aggregates::{Product, ProductDraft};
use crate::domain::value_objects::{Money, Quantity};
use crate::store::{CatalogStore, StoreResult};

static PACKS: [(&str, u64, bool); 4] = [("250g", 1, false), ("500g", 2, true), ("1kg", 4, true), ("2kg", 8, false)];

const SEED_STOCK: u32 = 30;

struct Family { slug: &'static str, name: &'static str, category: &'static str, base_price: u64, tags: &'static [&'static str] }

const FAMILIES: &[Family] = &[
    Family { slug: "badam-normal", name: "Badam (Normal)", category: "Nuts", base_price: 270, tags: &["normal", "almond"] },
    Family { slug: "badam-premium", name: "Badam (Premium)", category: "Nuts", base_price: 390, tags: &["premium", "almond"] },
    Family { slug: "akroot", name: "Akroot", category: "Nuts", base_price: 540, tags: &["normal"] },
    Family { slug: "anjeer-normal", name: "Anjeer (Normal)", category: "Dried Fruits", base_price: 630, tags: &["normal", "fig"] },
    Family { slug: "anjeer-premium", name: "Anjeer (Premium)", category: "Dried Fruits", base_price: 660, tags: &["premium", "fig"] },
    Family { slug: "roasted-pista", name: "Roasted Pista", category: "Dried Fruits", base_price: 420, tags: &["normal", "pistachio"] },
    Family { slug: "kismis", name: "Kismis", category: "Dried Fruits", base_price: 330, tags: &["normal", "raisins"] },
    Family { slug: "kaju---gullu", name: "Kaju / Gullu", category: "Nuts", base_price: 375, tags: &["normal", "cashew"] },
    Family { slug: "pecans", name: "Pecans", category: "Nuts", base_price: 990, tags: &["normal"] },
    Family { slug: "macadamia", name: "Macadamia", category: "Nuts", base_price: 1260, tags: &["normal"] },
    Family { slug: "brazil-nuts", name: "Brazil Nuts", category: "Nuts", base_price: 960, tags: &["normal"] },
    Family { slug: "black-berrys", name: "Black Berrys", category: "Dried Fruits", base_price: 720, tags: &["normal"] },
    Family { slug: "blue-berrys", name: "Blue Berrys", category: "Dried Fruits", base_price: 960, tags: &["normal"] },
    Family { slug: "cran-berry", name: "Cran Berry", category: "Dried Fruits", base_price: 540, tags: &["normal"] },
    Family { slug: "apricot", name: "Apricot", category: "Dried Fruits", base_price: 600, tags: &["normal"] },
    Family { slug: "himalayan-garlic", name: "Himalayan Garlic", category: "Spices", base_price: 600, tags: &["normal"] },
    Family { slug: "dry-khajoor", name: "Dry Khajoor", category: "Dried Fruits", base_price: 180, tags: &["normal"] },
    Family { slug: "prunes", name: "Prunes", category: "Dried Fruits", base_price: 480, tags: &["normal"] },
    Family { slug: "hazelnuts", name: "Hazelnuts", category: "Nuts", base_price: 870, tags: &["normal"] },
    Family { slug: "chia-seeds", name: "Chia Seeds", category: "Seeds", base_price: 600, tags: &["normal"] },
];

pub fn catalog() -> Vec<ProductDraft> {
    FAMILIES
        .iter()
        .flat_map(|f| {
            PACKS.iter().map(move |(weight, factor, featured)| ProductDraft {
                id: Some(format!("{}-{weight}", f.slug)),
                name: f.name.to_string(),
                description: format!("{} - high quality, packed with nutrients.", f.name),
                price: Money::whole(f.base_price * factor),
                weight: weight.to_string(),
                stock: Quantity::new(SEED_STOCK),
                image_url: format!("/images/{}.jpg", f.slug),
                category: f.category.to_string(),
                featured: *featured,
                tags: f.tags.iter().map(|t| t.to_string()).collect(),
            })
        })
        .collect()
}

/// Insert the sample catalog when the store holds no products. Returns the number inserted.
pub async fn seed_if_empty(store: &dyn CatalogStore) -> StoreResult<usize> {
    if !store.list_products().await?.is_empty() {
        tracing::info!("catalog already populated, skipping seed");
        return Ok(0);
    }
    let mut inserted = 0;
    for draft in catalog() {
        let Ok(product) = Product::create(draft) else { continue };
        store.insert_product(&product).await?;
        inserted += 1;
    }
    tracing::info!(inserted, "seeded sample catalog");
    Ok(inserted)
}
