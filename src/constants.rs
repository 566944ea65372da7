/// Application-wide static reference data
///
/// Bucket configurations, the adoption catalog, placeholder imagery and the
/// food-safety tables are injected configuration, not design surface; they
/// live here so the handlers stay free of literals.

// ============================================================================
// Rate Limiting
// ============================================================================

#[derive(Clone, Copy, Debug)]
pub struct BucketConfig {
    pub capacity: u32,
    pub refill_per_sec: f64,
}

pub const PREDICT_BUCKET: BucketConfig = BucketConfig { capacity: 5, refill_per_sec: 5.0 };
pub const VOICE_BUCKET: BucketConfig = BucketConfig { capacity: 5, refill_per_sec: 5.0 };
pub const CAPTION_BUCKET: BucketConfig = BucketConfig { capacity: 5, refill_per_sec: 5.0 };
pub const RECOMMEND_BUCKET: BucketConfig = BucketConfig { capacity: 5, refill_per_sec: 5.0 };
pub const TRAIN_BUCKET: BucketConfig = BucketConfig { capacity: 5, refill_per_sec: 5.0 };
pub const FOOD_BUCKET: BucketConfig = BucketConfig { capacity: 5, refill_per_sec: 5.0 };
/// Health-log analysis refills slower; the journal view polls it.
pub const HEALTH_LOG_BUCKET: BucketConfig = BucketConfig { capacity: 5, refill_per_sec: 2.0 };

// ============================================================================
// Response Cache
// ============================================================================

/// Default cap on per-feature cache entries; oldest entries are evicted past
/// this point. Overridable via `CACHE_MAX_ENTRIES`.
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 4096;

// ============================================================================
// Placeholder Images (stable Unsplash photos keyed by canonical breed name)
// ============================================================================

pub const PLACEHOLDER_IMAGES: &[(&str, &str)] = &[
    ("golden retriever", "https://images.unsplash.com/photo-1507149833265-60c372daea22?auto=format&fit=crop&w=1200&q=60"),
    ("labrador retriever", "https://images.unsplash.com/photo-1518717758536-85ae29035b6d?auto=format&fit=crop&w=1200&q=60"),
    ("german shepherd", "https://images.unsplash.com/photo-1552053831-71594a27632d?auto=format&fit=crop&w=1200&q=60"),
    ("beagle", "https://images.unsplash.com/photo-1548199973-03cce0bbc87b?auto=format&fit=crop&w=1200&q=60"),
    ("siberian husky", "https://images.unsplash.com/photo-1507149833265-60c372daea22?auto=format&fit=crop&w=1200&q=60"),
    ("poodle (mini)", "https://images.unsplash.com/photo-1525253013412-55c1a69a5738?auto=format&fit=crop&w=1200&q=60"),
    ("poodle", "https://images.unsplash.com/photo-1525253013412-55c1a69a5738?auto=format&fit=crop&w=1200&q=60"),
    ("great dane", "https://images.unsplash.com/photo-1517849845537-4d257902454a?auto=format&fit=crop&w=1200&q=60"),
    ("dachshund", "https://images.unsplash.com/photo-1548191265-cc70d3d45ba1?auto=format&fit=crop&w=1200&q=60"),
    ("shih tzu", "https://images.unsplash.com/photo-1548191265-cc70d3d45ba1?auto=format&fit=crop&w=1200&q=60"),
    ("pug", "https://images.unsplash.com/photo-1517841905240-472988babdf9?auto=format&fit=crop&w=1200&q=60"),
    ("chihuahua", "https://images.unsplash.com/photo-1505628346881-b72b27e84530?auto=format&fit=crop&w=1200&q=60"),
    ("border collie", "https://images.unsplash.com/photo-1534361960057-19889db9621e?auto=format&fit=crop&w=1200&q=60"),
    ("australian shepherd", "https://images.unsplash.com/photo-1537151625747-768eb6cf92b6?auto=format&fit=crop&w=1200&q=60"),
    ("boxer", "https://images.unsplash.com/photo-1522276498395-f4f68f7f8455?auto=format&fit=crop&w=1200&q=60"),
    ("french bulldog", "https://images.unsplash.com/photo-1517841905240-472988babdf9?auto=format&fit=crop&w=1200&q=60"),
    ("bulldog", "https://images.unsplash.com/photo-1517841905240-472988babdf9?auto=format&fit=crop&w=1200&q=60"),
    ("doberman", "https://images.unsplash.com/photo-1529927052301-0eecbf1be1dc?auto=format&fit=crop&w=1200&q=60"),
    ("rottweiler", "https://images.unsplash.com/photo-1548191265-cc70d3d45ba1?auto=format&fit=crop&w=1200&q=60"),
    ("cocker spaniel", "https://images.unsplash.com/photo-1548191265-cc70d3d45ba1?auto=format&fit=crop&w=1200&q=60"),
    ("pomeranian", "https://images.unsplash.com/photo-1517849845537-4d257902454a?auto=format&fit=crop&w=1200&q=60"),
    ("indian pariah dog", "https://images.unsplash.com/photo-1583511655826-05700d52f4d9?auto=format&fit=crop&w=1200&q=60"),
    ("domestic shorthair cat", "https://images.unsplash.com/photo-1518791841217-8f162f1e1131?auto=format&fit=crop&w=1200&q=60"),
    ("bengal cat", "https://images.unsplash.com/photo-1543852786-1cf6624b9987?auto=format&fit=crop&w=1200&q=60"),
    ("ragdoll cat", "https://images.unsplash.com/photo-1518791841217-8f162f1e1131?auto=format&fit=crop&w=1200&q=60"),
    ("sphynx cat", "https://images.unsplash.com/photo-1526336024174-e58f5cdd8e13?auto=format&fit=crop&w=1200&q=60"),
    ("devon rex cat", "https://images.unsplash.com/photo-1526336024174-e58f5cdd8e13?auto=format&fit=crop&w=1200&q=60"),
    ("siberian cat", "https://images.unsplash.com/photo-1555685812-4b943f1cb0eb?auto=format&fit=crop&w=1200&q=60"),
    ("persian cat", "https://images.unsplash.com/photo-1555685812-4b943f1cb0eb?auto=format&fit=crop&w=1200&q=60"),
    ("siamese cat", "https://images.unsplash.com/photo-1518791841217-8f162f1e1131?auto=format&fit=crop&w=1200&q=60"),
    ("maine coon", "https://images.unsplash.com/photo-1574158622682-e40e69881006?auto=format&fit=crop&w=1200&q=60"),
    ("british shorthair", "https://images.unsplash.com/photo-1574158622682-e40e69881006?auto=format&fit=crop&w=1200&q=60"),
    ("scottish fold", "https://images.unsplash.com/photo-1574158622682-e40e69881006?auto=format&fit=crop&w=1200&q=60"),
    ("guinea pig", "https://images.unsplash.com/photo-1564349683136-77e08dba1ef7?auto=format&fit=crop&w=1200&q=60"),
    ("hamster", "https://images.unsplash.com/photo-1583511655903-48058f2a5b51?auto=format&fit=crop&w=1200&q=60"),
    ("rabbit", "https://images.unsplash.com/photo-1501706362039-c06b2d715385?auto=format&fit=crop&w=1200&q=60"),
    ("betta fish", "https://images.unsplash.com/photo-1579783902614-a3fb3927b6a5?auto=format&fit=crop&w=1200&q=60"),
    ("goldfish", "https://images.unsplash.com/photo-1507149833265-60c372daea22?auto=format&fit=crop&w=1200&q=60"),
    ("budgerigar", "https://images.unsplash.com/photo-1589656966895-2f33e7653819?auto=format&fit=crop&w=1200&q=60"),
    ("parakeet", "https://images.unsplash.com/photo-1589656966895-2f33e7653819?auto=format&fit=crop&w=1200&q=60"),
    ("cockatiel", "https://images.unsplash.com/photo-1589656966895-2f33e7653819?auto=format&fit=crop&w=1200&q=60"),
    ("canary", "https://images.unsplash.com/photo-1469474968028-56623f02e42e?auto=format&fit=crop&w=1200&q=60"),
    ("tortoise", "https://images.unsplash.com/photo-1519066629447-267fffa62d5b?auto=format&fit=crop&w=1200&q=60"),
    ("turtle", "https://images.unsplash.com/photo-1500530855697-b586d89ba3ee?auto=format&fit=crop&w=1200&q=60"),
    ("leopard gecko", "https://images.unsplash.com/photo-1619855329421-6f4b9d24dd47?auto=format&fit=crop&w=1200&q=60"),
];

pub const SYNONYMS: &[(&str, &str)] = &[
    ("miniature poodle", "poodle (mini)"),
    ("toy poodle", "poodle (mini)"),
    ("standard poodle", "poodle"),
    ("domestic shorthair", "domestic shorthair cat"),
    ("budgie", "budgerigar"),
    ("parrot", "parakeet"),
];

// ============================================================================
// Adoption Catalog
// ============================================================================

#[derive(Clone, Copy, Debug)]
pub struct CatalogPet {
    pub pet: &'static str,
    pub hypoallergenic: bool,
    pub monthly_cost: &'static str,
}

pub const CATALOG: &[CatalogPet] = &[
    CatalogPet { pet: "Beagle", hypoallergenic: false, monthly_cost: "₹4,000–₹7,000" },
    CatalogPet { pet: "Domestic Shorthair Cat", hypoallergenic: false, monthly_cost: "₹2,500–₹5,500" },
    CatalogPet { pet: "Guinea Pig", hypoallergenic: true, monthly_cost: "₹1,000–₹2,500" },
    CatalogPet { pet: "Poodle (Mini)", hypoallergenic: true, monthly_cost: "₹3,500–₹6,500" },
    CatalogPet { pet: "Betta Fish", hypoallergenic: true, monthly_cost: "₹500–₹1,200" },
    CatalogPet { pet: "Budgerigar (Parakeet)", hypoallergenic: true, monthly_cost: "₹800–₹1,800" },
    CatalogPet { pet: "Labrador Retriever", hypoallergenic: false, monthly_cost: "₹5,000–₹8,500" },
    CatalogPet { pet: "Siberian Cat", hypoallergenic: true, monthly_cost: "₹3,500–₹6,500" },
];

// ============================================================================
// Food Safety Tables
// ============================================================================

pub const DOG_HARMFUL: &[&str] = &[
    "xylitol", "chocolate", "cocoa", "caffeine", "grapes", "raisins", "onion", "garlic",
    "leek", "chives", "macadamia", "ethoxyquin", "bht", "bha", "propylene glycol",
    "sorbitol (xylitol mix)", "alcohol", "maltitol",
];

pub const CAT_HARMFUL: &[&str] = &[
    "onion", "garlic", "leek", "chives", "grapes", "raisins", "alcohol", "caffeine",
    "propylene glycol", "ethylene glycol", "lilies", "chocolate", "cocoa", "xylitol",
];

pub const UNIVERSAL_CAUTION: &[&str] = &[
    "salt", "sugar", "artificial color", "artificial colours", "artificial color(s)",
    "artificial flavour", "artificial flavours", "caramel color", "msg",
    "monosodium glutamate", "corn syrup", "glucose syrup", "maltodextrin",
    "by-product", "meat by-product",
];

pub const BETTER_BRANDS: &[&str] = &["Orijen", "Acana", "Royal Canin", "Farmina N&D", "Drools Focus"];

/// Energy density and pet-safety verdicts for common photographed foods.
#[derive(Clone, Copy, Debug)]
pub struct FoodInfo {
    pub name: &'static str,
    pub kcal_per_g: f64,
    pub pet_ok: bool,
    pub tags: &'static [&'static str],
}

pub const FOOD_DB: &[FoodInfo] = &[
    FoodInfo { name: "burger", kcal_per_g: 2.6, pet_ok: false, tags: &["greasy", "salt"] },
    FoodInfo { name: "fried chicken", kcal_per_g: 2.5, pet_ok: false, tags: &["bones", "greasy", "salt"] },
    FoodInfo { name: "donut", kcal_per_g: 4.3, pet_ok: false, tags: &["sugar", "fat"] },
    FoodInfo { name: "cookies", kcal_per_g: 4.5, pet_ok: false, tags: &["sugar", "chocolate?"] },
    FoodInfo { name: "pizza", kcal_per_g: 2.7, pet_ok: false, tags: &["salt", "fat", "onion?", "garlic?"] },
    FoodInfo { name: "french fries", kcal_per_g: 3.1, pet_ok: false, tags: &["salt", "oil"] },
    FoodInfo { name: "soda", kcal_per_g: 0.4, pet_ok: false, tags: &["sugar", "caffeine?"] },
    FoodInfo { name: "chocolate", kcal_per_g: 5.3, pet_ok: false, tags: &["toxic (theobromine)"] },
    FoodInfo { name: "cake", kcal_per_g: 3.8, pet_ok: false, tags: &["sugar", "fat", "raisins?"] },
    FoodInfo { name: "ice cream", kcal_per_g: 2.0, pet_ok: false, tags: &["lactose", "sugar"] },
    FoodInfo { name: "boiled chicken", kcal_per_g: 1.7, pet_ok: true, tags: &["lean protein"] },
    FoodInfo { name: "rice", kcal_per_g: 1.3, pet_ok: true, tags: &["carb"] },
    FoodInfo { name: "egg", kcal_per_g: 1.6, pet_ok: true, tags: &["protein", "fat"] },
    FoodInfo { name: "carrot", kcal_per_g: 0.4, pet_ok: true, tags: &["veggie"] },
];
