//! # Sale Commands
//!
//! The point-of-sale screen: finding items and submitting the draft.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Point of Sale                                        │
//! │                                                                         │
//! │  search text ──► LiveSearch (debounced) ──► numbered listing           │
//! │  (empty box) ──► top-sold products and services                        │
//! │  browse ───────► CatalogBrowser page ─────► numbered listing           │
//! │                                                │                        │
//! │                                      add <n> ◄─┘                        │
//! │                                                                         │
//! │  checkout ──► confirm ──► POST /api/sales ──► draft reset, top reload  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use tracing::{debug, info, warn};

use super::cart;
use crate::error::{CommandResult, ConsoleError};
use crate::state::AppState;
use vetdesk_client::{CatalogBrowser, CheckoutOutcome, SearchScope, SearchState};
use vetdesk_core::{CatalogItem, ItemKind, SalePayload};

/// Extra wait on top of the debounce for search results to arrive.
const SEARCH_WAIT: Duration = Duration::from_secs(10);

/// Picks the listing for the current search state and prints it.
pub fn render(state: &mut AppState) {
    let sales = &mut state.views.sales;
    let (title, items) = match sales.search.state() {
        SearchState::Ready(results) => (format!("Results for \"{}\"", results.query), results.items()),
        SearchState::Idle => (
            "Top sold".to_string(),
            sales
                .top_items
                .as_ref()
                .map(|top| top.visible(sales.scope))
                .unwrap_or_default(),
        ),
    };
    sales.listing = items;

    println!("{}", title);
    print_listing(state);
    cart::show(state);
}

fn print_listing(state: &AppState) {
    let listing = &state.views.sales.listing;
    if listing.is_empty() {
        println!("  (no items)");
        return;
    }
    for (i, item) in listing.iter().enumerate() {
        let stock = match item {
            CatalogItem::Product(p) => format!("stock {}", p.stock),
            CatalogItem::Service(s) => s
                .duracion_min
                .map(|min| format!("{} min", min))
                .unwrap_or_default(),
        };
        println!(
            "{:>3}. {:<6} {:<36} {:>12}  {}",
            i + 1,
            item.key(),
            item.nombre(),
            state.money(item.precio()),
            stock
        );
    }
}

pub async fn search(state: &mut AppState, query: &str) -> CommandResult<()> {
    debug!(query = %query, "search command");

    let sales = &state.views.sales;
    let Some(generation) = sales.search.input(query, sales.scope) else {
        // rejected or empty queries never produce results
        render(state);
        return Ok(());
    };

    // a failed search settles too, after its notice
    let wait = state.config.client.search.debounce() + SEARCH_WAIT;
    if tokio::time::timeout(wait, sales.search.settled(generation)).await.is_err() {
        debug!(query = %query, generation, "Search did not settle in time");
    }
    render(state);
    Ok(())
}

pub fn set_scope(state: &mut AppState, scope: SearchScope) {
    debug!(?scope, "scope command");
    state.views.sales.scope = scope;
    render(state);
}

pub async fn top(state: &mut AppState) -> CommandResult<()> {
    state.views.sales.search.clear();
    super::auth::enter(state, vetdesk_client::Route::Sales).await
}

pub async fn browse(state: &mut AppState, kind: ItemKind, query: &str) -> CommandResult<()> {
    debug!(kind = kind.as_str(), query = %query, "browse command");

    let page_size = state.config.client.search.page_size;
    let browser = state
        .views
        .sales
        .browser
        .insert(CatalogBrowser::new(state.apis.catalog.clone(), kind, page_size));

    if let Err(e) = browser.search(query).await {
        warn!(error = %e, "Browse failed");
        state.notifier.error(&e.user_message("Error loading items"));
        return Err(e.into());
    }
    show_page(state);
    Ok(())
}

pub async fn page(state: &mut AppState, forward: bool) -> CommandResult<()> {
    let Some(browser) = state.views.sales.browser.as_mut() else {
        return Err(ConsoleError::usage("nothing to page: browse products|services"));
    };
    if forward && !browser.has_next() {
        state.notifier.info("No more items");
        return Ok(());
    }

    let loaded = if forward {
        browser.next_page().await.map(|_| ())
    } else {
        browser.prev_page().await.map(|_| ())
    };
    if let Err(e) = loaded {
        warn!(error = %e, "Paging failed");
        state.notifier.error(&e.user_message("Error loading items"));
        return Err(e.into());
    }
    show_page(state);
    Ok(())
}

fn show_page(state: &mut AppState) {
    let Some(browser) = state.views.sales.browser.as_ref() else {
        return;
    };
    let header = format!(
        "Page {}{}",
        browser.page() + 1,
        if browser.has_next() { " (next for more)" } else { "" }
    );
    state.views.sales.listing = browser.items().to_vec();

    println!("{}", header);
    print_listing(state);
}

/// Prints the request body the next checkout would send.
pub fn preview(state: &AppState) -> CommandResult<()> {
    let payload = state
        .cart
        .with_cart(|draft| SalePayload::prepare(&draft.cart, &draft.selection))?;
    let json = serde_json::to_string_pretty(&payload)
        .map_err(|e| ConsoleError::internal(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

pub async fn checkout(state: &mut AppState) -> CommandResult<()> {
    debug!("checkout command");

    let customer_name = state
        .cart
        .with_cart(|draft| draft.selection.customer_id().and_then(|id| id.parse::<i64>().ok()))
        .and_then(|id| state.views.customers.find(id))
        .map(|c| c.nombre.clone());

    let outcome = state
        .views
        .sales
        .checkout
        .submit(state.cart.draft(), customer_name.as_deref())
        .await?;

    match outcome {
        CheckoutOutcome::Declined => {
            debug!("Sale not confirmed");
        }
        CheckoutOutcome::Recorded {
            outcome,
            total,
            top_items,
        } => {
            info!(%total, ?outcome, "Checkout complete");
            state.views.sales.search.clear();
            state.views.sales.browser = None;
            if top_items.is_some() {
                state.views.sales.top_items = top_items;
            }
            render(state);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::auth::go;
    use crate::testing::harness_with;
    use vetdesk_client::testing::{product, service};
    use vetdesk_client::Route;

    async fn on_sales_screen(answers: Vec<bool>) -> crate::testing::Harness {
        let mut h = harness_with(true, answers).await;
        h.api.products.lock().unwrap().extend([
            product(1, "Pipeta perro", 1500, 4),
            product(2, "Alimento gato", 9000, 0),
        ]);
        h.api.services.lock().unwrap().push(service(7, "Consulta", 5000));
        go(&mut h.state, Route::Sales).await.unwrap();
        h
    }

    #[tokio::test]
    async fn test_sales_screen_lists_top_items() {
        let h = on_sales_screen(vec![]).await;
        let keys: Vec<String> = h.state.views.sales.listing.iter().map(|i| i.key()).collect();
        assert!(keys.contains(&"s-7".to_string()));
        assert!(!h.state.views.sales.listing.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_waits_for_results() {
        let mut h = on_sales_screen(vec![]).await;

        search(&mut h.state, "pipeta").await.unwrap();
        let listing = &h.state.views.sales.listing;
        assert!(listing.iter().any(|i| i.key() == "p-1"));
        assert!(listing.iter().all(|i| i.key() != "p-2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_search_returns_promptly() {
        let mut h = on_sales_screen(vec![]).await;
        h.api.fail_on("search_products", 500, Some("Catálogo no disponible"));

        let started = tokio::time::Instant::now();
        search(&mut h.state, "pipeta").await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(h.errors(), vec!["Catálogo no disponible".to_string()]);
        assert!(h.state.views.sales.listing.iter().any(|i| i.key() == "s-7"));
    }

    #[tokio::test]
    async fn test_empty_search_returns_to_top_items() {
        let mut h = on_sales_screen(vec![]).await;
        search(&mut h.state, "   ").await.unwrap();
        assert_eq!(h.state.views.sales.search.state(), SearchState::Idle);
    }

    #[tokio::test]
    async fn test_checkout_declined_keeps_cart() {
        let mut h = on_sales_screen(vec![false]).await;
        cart::add(&mut h.state, 1, 1).unwrap();

        checkout(&mut h.state).await.unwrap();
        assert_eq!(h.state.cart.totals().line_count, 1);
        assert!(h.api.created_sales.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_records_and_resets() {
        let mut h = on_sales_screen(vec![true]).await;
        let index = h
            .state
            .views
            .sales
            .listing
            .iter()
            .position(|i| i.key() == "s-7")
            .unwrap();
        cart::add(&mut h.state, index + 1, 2).unwrap();

        checkout(&mut h.state).await.unwrap();
        assert!(h.state.cart.snapshot().is_empty());
        assert_eq!(h.api.created_sales.lock().unwrap().len(), 1);
        assert_eq!(h.state.views.sales.search.state(), SearchState::Idle);
    }

    #[tokio::test]
    async fn test_empty_cart_checkout_sends_nothing() {
        let mut h = on_sales_screen(vec![true]).await;
        let err = checkout(&mut h.state).await.unwrap_err();
        assert!(err.already_notified());
        assert!(h.api.created_sales.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_paging_needs_browse() {
        let mut h = on_sales_screen(vec![]).await;
        assert!(page(&mut h.state, true).await.is_err());

        browse(&mut h.state, ItemKind::Product, "").await.unwrap();
        assert_eq!(h.state.views.sales.listing.len(), 2);
    }
}
