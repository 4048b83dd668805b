//! # Shopify Client
//!
//! Typed wrapper over the Shopify Admin API. Every call is classified for
//! the rate limiter (`Rest` or `Graphql` with a declared point cost) and
//! submitted through the store's [`RateLimiter`]; transport failures are
//! normalized into the [`SyncError`] taxonomy so the limiter's retry policy
//! can act on them.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ShopifyClient                                    │
//! │                                                                         │
//! │  resolve_skus()          GraphQL, 8 pts per ≤30-SKU chunk              │
//! │  set_inventory()         REST POST inventory_levels/set.json           │
//! │  evaluate_for_drafting() GraphQL 12 pts read, then conditionally:      │
//! │                          REST PUT products/{id}.json (status: draft)   │
//! │                          REST POST redirects.json                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Product Evaluation State Machine
//! ```text
//! fetch product ──► already draft? ──► AlreadyDraft (no-op)
//!       │
//!       ├──► any sibling variant qty > 0? ──► HasStock (no-op)
//!       │
//!       └──► draft write
//!                 │
//!                 ├──► no collections ──► DraftedNoCollections
//!                 │
//!                 └──► redirect to longest-titled collection
//!                           ├──► ok          ──► DraftedRedirected
//!                           └──► any failure ──► DraftedRedirectFailed
//!                                (draft already landed: still a success)
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use crate::error::{SyncError, SyncResult};
use crate::limiter::{Operation, RateLimiter};
use crate::logger::SyncLog;

// =============================================================================
// Constants
// =============================================================================

/// Admin API version all endpoints are pinned to.
const API_VERSION: &str = "2024-04";

/// Maximum SKUs per lookup query (query-size and cost ceiling).
const SKU_CHUNK_SIZE: usize = 30;

/// Declared cost of one SKU-lookup chunk.
const SKU_LOOKUP_POINTS: u32 = 8;

/// Declared cost of the product-evaluation read (product + variants +
/// collections).
const PRODUCT_QUERY_POINTS: u32 = 12;

/// Auth header carrying the Admin API access token.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

// =============================================================================
// Configuration
// =============================================================================

/// Connection settings for one Shopify account.
#[derive(Debug, Clone)]
pub struct ShopifyConfig {
    /// The `*.myshopify.com` subdomain.
    pub shop: String,

    /// Admin API access token.
    pub access_token: String,

    /// Timeout for GraphQL calls.
    pub graphql_timeout: Duration,

    /// Timeout for REST calls.
    pub rest_timeout: Duration,
}

impl ShopifyConfig {
    /// Creates a config with default timeouts (30s GraphQL, 15s REST).
    pub fn new(shop: impl Into<String>, access_token: impl Into<String>) -> Self {
        ShopifyConfig {
            shop: shop.into(),
            access_token: access_token.into(),
            graphql_timeout: Duration::from_secs(30),
            rest_timeout: Duration::from_secs(15),
        }
    }

    /// Validates the shop name and token before any request goes out.
    pub fn validate(&self) -> SyncResult<()> {
        if self.shop.trim().is_empty() {
            return Err(SyncError::Config("shop name must not be empty".into()));
        }
        if self.access_token.trim().is_empty() {
            return Err(SyncError::Config("access token must not be empty".into()));
        }

        // A malformed shop name surfaces here instead of as a cryptic DNS
        // failure on the first sync.
        Url::parse(&self.base_url())
            .map_err(|e| SyncError::Config(format!("invalid shop '{}': {}", self.shop, e)))?;

        Ok(())
    }

    fn base_url(&self) -> String {
        format!("https://{}.myshopify.com", self.shop)
    }

    fn graphql_endpoint(&self) -> String {
        format!("{}/admin/api/{}/graphql.json", self.base_url(), API_VERSION)
    }

    fn rest_endpoint(&self, path: &str) -> String {
        format!("{}/admin/api/{}/{}", self.base_url(), API_VERSION, path)
    }
}

// =============================================================================
// SKU Resolution
// =============================================================================

/// Outcome of a batched SKU lookup. Partial results are normal: a failed
/// chunk is logged and skipped without aborting its siblings.
#[derive(Debug, Default)]
pub struct SkuResolution {
    /// SKU → inventory-item id (numeric, gid prefix stripped).
    pub map: HashMap<String, String>,

    /// Lookup chunks that failed outright.
    pub failed_chunks: usize,

    /// Lookup chunks attempted.
    pub total_chunks: usize,
}

// =============================================================================
// Evaluation Outcome
// =============================================================================

/// Result of running the product-evaluation state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationOutcome {
    /// Product was already in draft status; nothing to do.
    AlreadyDraft,

    /// At least one sibling variant still has stock; nothing to do.
    HasStock,

    /// The inventory item did not resolve to a product.
    NotFound,

    /// Drafted; product belongs to no collection, so no redirect.
    DraftedNoCollections,

    /// Drafted and redirected to the named collection handle.
    DraftedRedirected { collection: String },

    /// Drafted, but the redirect write failed (including "already exists").
    /// The draft was the primary goal, so this still counts as success.
    DraftedRedirectFailed,

    /// The evaluation itself failed (absorbed; the batch continues).
    Failed,
}

impl EvaluationOutcome {
    /// True when the product ended up drafted in this evaluation.
    pub fn product_drafted(&self) -> bool {
        matches!(
            self,
            EvaluationOutcome::DraftedNoCollections
                | EvaluationOutcome::DraftedRedirected { .. }
                | EvaluationOutcome::DraftedRedirectFailed
        )
    }
}

// =============================================================================
// Client
// =============================================================================

/// Shopify Admin API client for one store's sync job.
///
/// All remote work flows through the store's rate limiter; the client never
/// issues a request directly.
pub struct ShopifyClient {
    http: reqwest::Client,
    config: Arc<ShopifyConfig>,
    limiter: RateLimiter,
    log: SyncLog,
}

impl ShopifyClient {
    /// Creates a client after validating the account configuration.
    pub fn new(config: ShopifyConfig, limiter: RateLimiter, log: SyncLog) -> SyncResult<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| SyncError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(ShopifyClient {
            http,
            config: Arc::new(config),
            limiter,
            log,
        })
    }

    // =========================================================================
    // SKU Resolution
    // =========================================================================

    /// Resolves SKUs to inventory-item ids in chunks of at most
    /// [`SKU_CHUNK_SIZE`].
    ///
    /// Returns partial results: a failed chunk is logged and skipped, it
    /// never aborts the remaining chunks.
    pub async fn resolve_skus(&self, skus: &[String]) -> SkuResolution {
        let mut resolution = SkuResolution::default();

        if skus.is_empty() {
            return resolution;
        }

        self.log
            .line(format!("Looking up {} SKUs on Shopify...", skus.len()));

        let chunks: Vec<&[String]> = skus.chunks(SKU_CHUNK_SIZE).collect();
        resolution.total_chunks = chunks.len();

        for (index, chunk) in chunks.iter().enumerate() {
            self.log.line(format!(
                "Processing SKU batch {}/{} ({} SKUs)",
                index + 1,
                resolution.total_chunks,
                chunk.len()
            ));

            let operation = self.lookup_operation(chunk);

            match self.limiter.submit(operation).await {
                Ok(body) => {
                    if let Some(errors) = graphql_errors(&body) {
                        self.log.line(format!(
                            "GraphQL errors in batch {}: {}",
                            index + 1,
                            errors
                        ));
                        resolution.failed_chunks += 1;
                        continue;
                    }

                    merge_sku_map(&mut resolution.map, &body);
                    self.log.line(format!(
                        "Batch {}/{}: {} total SKUs resolved so far",
                        index + 1,
                        resolution.total_chunks,
                        resolution.map.len()
                    ));
                }
                Err(err) => {
                    warn!(store = %self.log.store_code(), batch = index + 1, error = %err, "SKU lookup batch failed");
                    self.log
                        .line(format!("Failed to process SKU batch {}: {}", index + 1, err));
                    resolution.failed_chunks += 1;
                }
            }
        }

        self.log.line(format!(
            "SKU lookup complete: {}/{} found",
            resolution.map.len(),
            skus.len()
        ));

        resolution
    }

    fn lookup_operation(&self, chunk: &[String]) -> Operation {
        let query = build_lookup_query(chunk);
        let http = self.http.clone();
        let config = self.config.clone();

        Operation::graphql(SKU_LOOKUP_POINTS, move || {
            let http = http.clone();
            let config = config.clone();
            let body = json!({ "query": query.clone() });
            async move {
                send_json(
                    &http,
                    Method::POST,
                    &config.graphql_endpoint(),
                    &config.access_token,
                    &body,
                    config.graphql_timeout,
                )
                .await
            }
        })
    }

    // =========================================================================
    // Inventory Update
    // =========================================================================

    /// Sets the available quantity for one inventory item at a location.
    ///
    /// Returns false on failure so the caller can continue with the rest of
    /// the batch; the error has already been logged.
    pub async fn set_inventory(
        &self,
        inventory_item_id: &str,
        quantity: u32,
        location_id: &str,
        sku: &str,
    ) -> bool {
        let http = self.http.clone();
        let config = self.config.clone();
        let body = json!({
            "location_id": location_id,
            "inventory_item_id": inventory_item_id,
            "available": quantity,
        });

        let operation = Operation::rest(move || {
            let http = http.clone();
            let config = config.clone();
            let body = body.clone();
            async move {
                send_json(
                    &http,
                    Method::POST,
                    &config.rest_endpoint("inventory_levels/set.json"),
                    &config.access_token,
                    &body,
                    config.rest_timeout,
                )
                .await
            }
        });

        match self.limiter.submit(operation).await {
            Ok(_) => {
                self.log.line(format!(
                    "Updated inventory for SKU {}: {} units",
                    sku, quantity
                ));
                true
            }
            Err(err) => {
                warn!(store = %self.log.store_code(), sku = %sku, error = %err, "Inventory update failed");
                self.log
                    .line(format!("Failed to update inventory for SKU {}: {}", sku, err));
                false
            }
        }
    }

    // =========================================================================
    // Product Evaluation
    // =========================================================================

    /// Runs the product-evaluation state machine for one inventory item.
    ///
    /// Re-fetches live sibling quantities at evaluation time; locally cached
    /// quantities are never trusted. Failures are absorbed into
    /// [`EvaluationOutcome::Failed`] — a bad evaluation never aborts the
    /// surrounding batch.
    pub async fn evaluate_for_drafting(
        &self,
        inventory_item_id: &str,
        _location_id: &str,
    ) -> EvaluationOutcome {
        let body = match self.limiter.submit(self.product_query_operation(inventory_item_id)).await
        {
            Ok(body) => body,
            Err(err) => {
                self.log
                    .line(format!("Failed to evaluate product: {}", err));
                return EvaluationOutcome::Failed;
            }
        };

        if let Some(errors) = graphql_errors(&body) {
            self.log
                .line(format!("GraphQL errors in product evaluation: {}", errors));
            return EvaluationOutcome::Failed;
        }

        let Some(product) = parse_product_snapshot(&body) else {
            self.log.line(format!(
                "No product found for inventory item {}",
                inventory_item_id
            ));
            return EvaluationOutcome::NotFound;
        };

        if product.status == "draft" {
            self.log
                .line(format!("Product {} is already drafted", product.handle));
            return EvaluationOutcome::AlreadyDraft;
        }

        if product.any_sibling_in_stock {
            self.log.line(format!(
                "Product {} still has variants in stock, no action needed",
                product.handle
            ));
            return EvaluationOutcome::HasStock;
        }

        self.log.line(format!(
            "Product {} is out of stock, drafting...",
            product.handle
        ));

        if let Err(err) = self.limiter.submit(self.draft_operation(&product.id)).await {
            self.log.line(format!(
                "Failed to draft product {}: {}",
                product.handle, err
            ));
            return EvaluationOutcome::Failed;
        }
        self.log
            .line(format!("Product {} set to draft", product.handle));

        if product.collections.is_empty() {
            self.log.line(format!(
                "Product {} has no collections, skipping redirect",
                product.handle
            ));
            return EvaluationOutcome::DraftedNoCollections;
        }

        // Longest title wins; ties keep the first encountered collection.
        let target = match pick_redirect_target(&product.collections) {
            Some(target) => target.clone(),
            None => return EvaluationOutcome::DraftedNoCollections,
        };

        match self
            .limiter
            .submit(self.redirect_operation(&product.handle, &target.handle))
            .await
        {
            Ok(_) => {
                self.log.line(format!(
                    "Redirect created: {} -> /collections/{}",
                    product.handle, target.handle
                ));
                EvaluationOutcome::DraftedRedirected {
                    collection: target.handle,
                }
            }
            Err(err) => {
                if is_duplicate_redirect(&err) {
                    self.log.line(format!(
                        "Redirect already exists for {}",
                        product.handle
                    ));
                } else {
                    self.log.line(format!(
                        "Failed to create redirect for {}: {}",
                        product.handle, err
                    ));
                }
                // The draft already landed; redirect failure is tolerated.
                EvaluationOutcome::DraftedRedirectFailed
            }
        }
    }

    fn product_query_operation(&self, inventory_item_id: &str) -> Operation {
        let query = build_product_query(inventory_item_id);
        let http = self.http.clone();
        let config = self.config.clone();

        Operation::graphql(PRODUCT_QUERY_POINTS, move || {
            let http = http.clone();
            let config = config.clone();
            let body = json!({ "query": query.clone() });
            async move {
                send_json(
                    &http,
                    Method::POST,
                    &config.graphql_endpoint(),
                    &config.access_token,
                    &body,
                    config.graphql_timeout,
                )
                .await
            }
        })
    }

    fn draft_operation(&self, product_gid: &str) -> Operation {
        let product_id = trailing_id(product_gid).to_string();
        let http = self.http.clone();
        let config = self.config.clone();

        Operation::rest(move || {
            let http = http.clone();
            let config = config.clone();
            let product_id = product_id.clone();
            let body = json!({
                "product": { "id": product_id, "status": "draft" }
            });
            async move {
                send_json(
                    &http,
                    Method::PUT,
                    &config.rest_endpoint(&format!("products/{}.json", product_id)),
                    &config.access_token,
                    &body,
                    config.rest_timeout,
                )
                .await
            }
        })
    }

    fn redirect_operation(&self, product_handle: &str, collection_handle: &str) -> Operation {
        let http = self.http.clone();
        let config = self.config.clone();
        let body = json!({
            "redirect": {
                "path": format!("/{}", product_handle),
                "target": format!("/collections/{}", collection_handle),
            }
        });

        Operation::rest(move || {
            let http = http.clone();
            let config = config.clone();
            let body = body.clone();
            async move {
                send_json(
                    &http,
                    Method::POST,
                    &config.rest_endpoint("redirects.json"),
                    &config.access_token,
                    &body,
                    config.rest_timeout,
                )
                .await
            }
        })
    }
}

// =============================================================================
// HTTP Plumbing
// =============================================================================

/// Sends a JSON request and normalizes the response into the error taxonomy.
async fn send_json(
    http: &reqwest::Client,
    method: Method,
    url: &str,
    access_token: &str,
    body: &Value,
    timeout: Duration,
) -> SyncResult<Value> {
    let response = http
        .request(method, url)
        .header(ACCESS_TOKEN_HEADER, access_token)
        .json(body)
        .timeout(timeout)
        .send()
        .await?;

    let status = response.status();
    if status.is_success() {
        let value = response.json::<Value>().await?;
        return Ok(value);
    }

    let message = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), "Request failed");
    Err(SyncError::from_status(status.as_u16(), message))
}

// =============================================================================
// Query Builders & Response Parsing
// =============================================================================

/// Builds the batched variant-lookup query for one SKU chunk.
fn build_lookup_query(chunk: &[String]) -> String {
    let filter = chunk
        .iter()
        .map(|sku| format!("sku:{}", sku))
        .collect::<Vec<_>>()
        .join(" OR ");

    format!(
        r#"query {{
  productVariants(first: {}, query: "{}") {{
    edges {{
      node {{
        id
        sku
        inventoryItem {{
          id
        }}
      }}
    }}
  }}
}}"#,
        chunk.len(),
        filter
    )
}

/// Builds the product-evaluation query for one inventory item.
fn build_product_query(inventory_item_id: &str) -> String {
    format!(
        r#"query {{
  inventoryItem(id: "gid://shopify/InventoryItem/{}") {{
    variant {{
      id
      product {{
        id
        handle
        title
        status
        collections(first: 10) {{
          edges {{
            node {{
              handle
              title
            }}
          }}
        }}
        variants(first: 100) {{
          edges {{
            node {{
              inventoryItem {{
                id
              }}
              inventoryQuantity
              sku
            }}
          }}
        }}
      }}
    }}
  }}
}}"#,
        inventory_item_id
    )
}

/// Extracts a GraphQL `errors` array, if present.
fn graphql_errors(body: &Value) -> Option<String> {
    body.get("errors")
        .filter(|errors| !errors.is_null())
        .map(|errors| errors.to_string())
}

/// Merges a lookup response into the SKU map, stripping gid prefixes.
fn merge_sku_map(map: &mut HashMap<String, String>, body: &Value) {
    let Some(edges) = body
        .pointer("/data/productVariants/edges")
        .and_then(Value::as_array)
    else {
        return;
    };

    for edge in edges {
        let node = &edge["node"];
        let (Some(sku), Some(item_gid)) = (
            node["sku"].as_str(),
            node.pointer("/inventoryItem/id").and_then(Value::as_str),
        ) else {
            continue;
        };

        map.insert(sku.to_string(), trailing_id(item_gid).to_string());
    }
}

/// A collection the product belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRef {
    pub handle: String,
    pub title: String,
}

/// What the evaluation needs to know about a product, parsed from the
/// GraphQL response.
#[derive(Debug, Clone)]
pub struct ProductSnapshot {
    pub id: String,
    pub handle: String,
    pub status: String,
    pub collections: Vec<CollectionRef>,
    pub any_sibling_in_stock: bool,
}

/// Parses the evaluation query response. `None` when the inventory item has
/// no associated product.
fn parse_product_snapshot(body: &Value) -> Option<ProductSnapshot> {
    let product = body.pointer("/data/inventoryItem/variant/product")?;
    if product.is_null() {
        return None;
    }

    let id = product["id"].as_str()?.to_string();
    let handle = product["handle"].as_str()?.to_string();
    let status = product["status"]
        .as_str()
        .unwrap_or_default()
        .to_lowercase();

    let collections = product
        .pointer("/collections/edges")
        .and_then(Value::as_array)
        .map(|edges| {
            edges
                .iter()
                .filter_map(|edge| {
                    let node = &edge["node"];
                    Some(CollectionRef {
                        handle: node["handle"].as_str()?.to_string(),
                        title: node["title"].as_str()?.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let any_sibling_in_stock = product
        .pointer("/variants/edges")
        .and_then(Value::as_array)
        .map(|edges| {
            edges
                .iter()
                .any(|edge| edge.pointer("/node/inventoryQuantity").and_then(Value::as_i64) > Some(0))
        })
        .unwrap_or(false);

    Some(ProductSnapshot {
        id,
        handle,
        status,
        collections,
        any_sibling_in_stock,
    })
}

/// Picks the redirect target: longest title wins, ties keep the first
/// encountered collection.
fn pick_redirect_target(collections: &[CollectionRef]) -> Option<&CollectionRef> {
    collections.iter().fold(None, |best, candidate| match best {
        Some(current) if candidate.title.len() <= current.title.len() => Some(current),
        _ => Some(candidate),
    })
}

/// Strips a `gid://shopify/...` prefix down to the trailing numeric id.
fn trailing_id(gid: &str) -> &str {
    gid.rsplit('/').next().unwrap_or(gid)
}

/// Detects the "redirect already exists" rejection: a 422 whose error
/// payload references the `path` field.
fn is_duplicate_redirect(err: &SyncError) -> bool {
    let SyncError::ClientFault {
        status: 422,
        message,
    } = err
    else {
        return false;
    };

    serde_json::from_str::<Value>(message)
        .ok()
        .and_then(|body| body.pointer("/errors/path").cloned())
        .is_some_and(|path| !path.is_null())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(ShopifyConfig::new("jewelry-shop", "shpat_token").validate().is_ok());
        assert!(ShopifyConfig::new("", "shpat_token").validate().is_err());
        assert!(ShopifyConfig::new("jewelry-shop", "").validate().is_err());
    }

    #[test]
    fn test_endpoints() {
        let config = ShopifyConfig::new("jewelry-shop", "token");
        assert_eq!(
            config.graphql_endpoint(),
            "https://jewelry-shop.myshopify.com/admin/api/2024-04/graphql.json"
        );
        assert_eq!(
            config.rest_endpoint("redirects.json"),
            "https://jewelry-shop.myshopify.com/admin/api/2024-04/redirects.json"
        );
    }

    #[test]
    fn test_build_lookup_query() {
        let query = build_lookup_query(&["A-1".to_string(), "B-2".to_string()]);
        assert!(query.contains("productVariants(first: 2"));
        assert!(query.contains(r#"query: "sku:A-1 OR sku:B-2""#));
    }

    #[test]
    fn test_merge_sku_map_strips_gid() {
        let body = serde_json::json!({
            "data": { "productVariants": { "edges": [
                { "node": { "sku": "RING-42", "inventoryItem": { "id": "gid://shopify/InventoryItem/111" } } },
                { "node": { "sku": "BAND-7", "inventoryItem": { "id": "gid://shopify/InventoryItem/222" } } },
                { "node": { "sku": null, "inventoryItem": { "id": "gid://shopify/InventoryItem/333" } } },
            ]}}
        });

        let mut map = HashMap::new();
        merge_sku_map(&mut map, &body);

        assert_eq!(map.len(), 2);
        assert_eq!(map["RING-42"], "111");
        assert_eq!(map["BAND-7"], "222");
    }

    fn product_body(status: &str, quantities: &[i64], collections: &[(&str, &str)]) -> Value {
        serde_json::json!({
            "data": { "inventoryItem": { "variant": { "id": "gid://shopify/ProductVariant/1", "product": {
                "id": "gid://shopify/Product/9000",
                "handle": "gold-ring",
                "title": "Gold Ring",
                "status": status,
                "collections": { "edges": collections.iter().map(|(handle, title)| {
                    serde_json::json!({ "node": { "handle": handle, "title": title } })
                }).collect::<Vec<_>>() },
                "variants": { "edges": quantities.iter().map(|qty| {
                    serde_json::json!({ "node": { "inventoryItem": { "id": "gid://shopify/InventoryItem/1" }, "inventoryQuantity": qty, "sku": "X" } })
                }).collect::<Vec<_>>() },
            }}}}
        })
    }

    #[test]
    fn test_parse_product_snapshot() {
        let body = product_body("ACTIVE", &[0, 3, 0], &[("rings", "Rings")]);
        let product = parse_product_snapshot(&body).unwrap();

        assert_eq!(product.id, "gid://shopify/Product/9000");
        assert_eq!(product.handle, "gold-ring");
        assert_eq!(product.status, "active");
        assert!(product.any_sibling_in_stock);
        assert_eq!(product.collections.len(), 1);
    }

    #[test]
    fn test_parse_product_snapshot_out_of_stock() {
        let body = product_body("active", &[0, 0, -2], &[]);
        let product = parse_product_snapshot(&body).unwrap();
        assert!(!product.any_sibling_in_stock);
    }

    #[test]
    fn test_parse_product_snapshot_missing_product() {
        let body = serde_json::json!({ "data": { "inventoryItem": null } });
        assert!(parse_product_snapshot(&body).is_none());

        let body = serde_json::json!({ "data": { "inventoryItem": { "variant": { "product": null } } } });
        assert!(parse_product_snapshot(&body).is_none());
    }

    #[test]
    fn test_pick_redirect_target_longest_title() {
        let collections = vec![
            CollectionRef {
                handle: "rings".into(),
                title: "Rings".into(),
            },
            CollectionRef {
                handle: "fine-rings".into(),
                title: "Fine Rings".into(),
            },
        ];

        let target = pick_redirect_target(&collections).unwrap();
        assert_eq!(target.handle, "fine-rings");
    }

    #[test]
    fn test_pick_redirect_target_tie_keeps_first() {
        let collections = vec![
            CollectionRef {
                handle: "first".into(),
                title: "Bangles".into(),
            },
            CollectionRef {
                handle: "second".into(),
                title: "Anklets".into(),
            },
        ];

        let target = pick_redirect_target(&collections).unwrap();
        assert_eq!(target.handle, "first");

        assert!(pick_redirect_target(&[]).is_none());
    }

    #[test]
    fn test_trailing_id() {
        assert_eq!(trailing_id("gid://shopify/Product/9000"), "9000");
        assert_eq!(trailing_id("12345"), "12345");
    }

    #[test]
    fn test_graphql_errors_detection() {
        let clean = serde_json::json!({ "data": {} });
        assert!(graphql_errors(&clean).is_none());

        let failed = serde_json::json!({ "errors": [{ "message": "Throttled" }] });
        assert!(graphql_errors(&failed).unwrap().contains("Throttled"));
    }

    #[test]
    fn test_is_duplicate_redirect() {
        let dup = SyncError::ClientFault {
            status: 422,
            message: r#"{"errors":{"path":["has already been taken"]}}"#.into(),
        };
        assert!(is_duplicate_redirect(&dup));

        let other_422 = SyncError::ClientFault {
            status: 422,
            message: r#"{"errors":{"target":["is invalid"]}}"#.into(),
        };
        assert!(!is_duplicate_redirect(&other_422));

        let not_422 = SyncError::ClientFault {
            status: 404,
            message: r#"{"errors":{"path":["missing"]}}"#.into(),
        };
        assert!(!is_duplicate_redirect(&not_422));

        assert!(!is_duplicate_redirect(&SyncError::Transport("reset".into())));
    }

    #[test]
    fn test_evaluation_outcome_drafted() {
        assert!(EvaluationOutcome::DraftedNoCollections.product_drafted());
        assert!(EvaluationOutcome::DraftedRedirectFailed.product_drafted());
        assert!(EvaluationOutcome::DraftedRedirected {
            collection: "rings".into()
        }
        .product_drafted());

        assert!(!EvaluationOutcome::AlreadyDraft.product_drafted());
        assert!(!EvaluationOutcome::HasStock.product_drafted());
        assert!(!EvaluationOutcome::Failed.product_drafted());
    }
}
