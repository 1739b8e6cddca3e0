//! # Catalog Administration Commands
//!
//! Product (warehouse) and service listings, plus their forms.
//!
//! ## Form Input
//! ```text
//!   product new nombre="Pipeta perro" precio=1500 stock=10
//!   product 4 precio=1650              ◄── edit: unset fields keep their value
//!   service rm 8                       ◄── asks before deleting
//! ```
//!
//! Field names are the backend's: `nombre`, `marca`, `descripcion`,
//! `categoria`, `precio`, `stock`, `cost`, `vencimiento`, `imagen` for
//! products and `nombre`, `descripcion`, `precio`, `duracion_min`,
//! `categoria` for services.

use tracing::debug;

use super::Fields;
use crate::error::{CommandResult, ConsoleError};
use crate::state::AppState;
use vetdesk_core::forms::{ProductForm, ServiceForm};
use vetdesk_core::{plain_amount, Product, Service};

const OUT_OF_STOCK_FLAG: &str = "--out";

fn unknown_field(key: &str) -> ConsoleError {
    ConsoleError::usage(format!("unknown field '{}'", key))
}

// =============================================================================
// Products
// =============================================================================

fn product_form(product: Option<&Product>) -> ProductForm {
    let Some(p) = product else {
        return ProductForm::default();
    };
    ProductForm {
        nombre: p.nombre.clone(),
        marca: p.marca.clone().unwrap_or_default(),
        descripcion: p.descripcion.clone().unwrap_or_default(),
        categoria: p.categoria.clone().unwrap_or_default(),
        precio: plain_amount(p.precio),
        stock: p.stock.to_string(),
        cost: p.cost.map(plain_amount).unwrap_or_default(),
        vencimiento: p.vencimiento.clone().unwrap_or_default(),
        imagen: p.imagen.clone().unwrap_or_default(),
    }
}

fn apply_product_fields(form: &mut ProductForm, fields: &Fields) -> CommandResult<()> {
    for (key, value) in fields {
        let slot = match key.as_str() {
            "nombre" => &mut form.nombre,
            "marca" => &mut form.marca,
            "descripcion" => &mut form.descripcion,
            "categoria" => &mut form.categoria,
            "precio" => &mut form.precio,
            "stock" => &mut form.stock,
            "cost" => &mut form.cost,
            "vencimiento" => &mut form.vencimiento,
            "imagen" => &mut form.imagen,
            other => return Err(unknown_field(other)),
        };
        *slot = value.clone();
    }
    Ok(())
}

pub fn render_products(state: &AppState) {
    let products = state.views.products.visible();
    println!("Products ({})", products.len());
    for p in products {
        println!(
            "  #{:<5} {:<32} {:<14} {:>12} stock {:>4}{}",
            p.id,
            p.nombre,
            p.marca.as_deref().unwrap_or("-"),
            state.money(p.precio),
            p.stock,
            p.vencimiento
                .as_deref()
                .map(|v| format!("  exp {}", v))
                .unwrap_or_default()
        );
    }
}

/// Filters the product list. `--out` shows only items without stock.
pub async fn products(state: &mut AppState, query: &str) -> CommandResult<()> {
    debug!(query = %query, "products command");

    let only_out = query.split_whitespace().any(|w| w == OUT_OF_STOCK_FLAG);
    let text: Vec<&str> = query
        .split_whitespace()
        .filter(|w| *w != OUT_OF_STOCK_FLAG)
        .collect();

    let admin = &mut state.views.products;
    if admin.products().is_empty() {
        admin.refresh().await?;
    }
    admin.set_only_out_of_stock(only_out);
    admin.set_query(&text.join(" "));
    render_products(state);
    Ok(())
}

pub async fn save_product(state: &mut AppState, id: Option<i64>, fields: &Fields) -> CommandResult<()> {
    debug!(?id, fields = fields.len(), "product save command");

    let admin = &mut state.views.products;
    let existing = match id {
        Some(id) => {
            if admin.products().iter().all(|p| p.id != id) {
                admin.refresh().await?;
            }
            let found = admin.products().iter().find(|p| p.id == id);
            Some(found.ok_or_else(|| ConsoleError::not_found("Product", &id.to_string()))?)
        }
        None => None,
    };

    let mut form = product_form(existing);
    apply_product_fields(&mut form, fields)?;
    admin.save(id, &form).await?;
    render_products(state);
    Ok(())
}

pub async fn delete_product(state: &mut AppState, id: i64) -> CommandResult<()> {
    debug!(id, "product delete command");
    if state.views.products.delete(id).await? {
        render_products(state);
    }
    Ok(())
}

// =============================================================================
// Services
// =============================================================================

fn service_form(service: Option<&Service>) -> ServiceForm {
    let Some(s) = service else {
        return ServiceForm::default();
    };
    ServiceForm {
        nombre: s.nombre.clone(),
        descripcion: s.descripcion.clone().unwrap_or_default(),
        precio: plain_amount(s.precio),
        duracion_min: s.duracion_min.map(|m| m.to_string()).unwrap_or_default(),
        categoria: s.categoria.clone().unwrap_or_default(),
    }
}

fn apply_service_fields(form: &mut ServiceForm, fields: &Fields) -> CommandResult<()> {
    for (key, value) in fields {
        let slot = match key.as_str() {
            "nombre" => &mut form.nombre,
            "descripcion" => &mut form.descripcion,
            "precio" => &mut form.precio,
            "duracion_min" | "duracion" => &mut form.duracion_min,
            "categoria" => &mut form.categoria,
            other => return Err(unknown_field(other)),
        };
        *slot = value.clone();
    }
    Ok(())
}

pub fn render_services(state: &AppState) {
    let services = state.views.services.visible();
    println!("Services ({})", services.len());
    for s in services {
        println!(
            "  #{:<5} {:<32} {:>12} {:>8}  {}",
            s.id,
            s.nombre,
            state.money(s.precio),
            s.duracion_min
                .map(|m| format!("{} min", m))
                .unwrap_or_else(|| "-".to_string()),
            s.categoria.as_deref().unwrap_or("")
        );
    }
}

pub async fn services(state: &mut AppState, query: &str) -> CommandResult<()> {
    debug!(query = %query, "services command");

    let admin = &mut state.views.services;
    if admin.services().is_empty() {
        admin.refresh().await?;
    }
    admin.set_query(query);
    render_services(state);
    Ok(())
}

pub async fn save_service(state: &mut AppState, id: Option<i64>, fields: &Fields) -> CommandResult<()> {
    debug!(?id, fields = fields.len(), "service save command");

    let admin = &mut state.views.services;
    let existing = match id {
        Some(id) => {
            if admin.services().iter().all(|s| s.id != id) {
                admin.refresh().await?;
            }
            let found = admin.services().iter().find(|s| s.id == id);
            Some(found.ok_or_else(|| ConsoleError::not_found("Service", &id.to_string()))?)
        }
        None => None,
    };

    let mut form = service_form(existing);
    apply_service_fields(&mut form, fields)?;
    admin.save(id, &form).await?;
    render_services(state);
    Ok(())
}

pub async fn delete_service(state: &mut AppState, id: i64) -> CommandResult<()> {
    debug!(id, "service delete command");
    if state.views.services.delete(id).await? {
        render_services(state);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::testing::{harness, harness_with};
    use vetdesk_client::testing::{product, service};

    fn fields(pairs: &[(&str, &str)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_edit_form_starts_from_record() {
        let mut p = product(4, "Pipeta perro", 1500, 10);
        p.marca = Some("Frontline".into());
        let mut form = product_form(Some(&p));
        apply_product_fields(&mut form, &fields(&[("precio", "1650")])).unwrap();

        assert_eq!(form.nombre, "Pipeta perro");
        assert_eq!(form.marca, "Frontline");
        assert_eq!(form.stock, "10");
        assert_eq!(form.precio, "1650");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut form = ServiceForm::default();
        let err = apply_service_fields(&mut form, &fields(&[("stock", "3")])).unwrap_err();
        assert_eq!(err.code, ErrorCode::Usage);
    }

    #[tokio::test]
    async fn test_create_product_posts() {
        let mut h = harness(true).await;
        save_product(&mut h.state, None, &fields(&[("nombre", "Collar"), ("precio", "300")]))
            .await
            .unwrap();
        assert_eq!(h.api.count("create_product"), 1);
        assert_eq!(h.successes(), vec!["Product created".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_product_sends_nothing() {
        let mut h = harness(true).await;
        let err = save_product(&mut h.state, None, &fields(&[("precio", "300")]))
            .await
            .unwrap_err();
        assert!(err.already_notified());
        assert_eq!(h.api.count("create_product"), 0);
    }

    #[tokio::test]
    async fn test_edit_missing_product() {
        let mut h = harness(true).await;
        let err = save_product(&mut h.state, Some(99), &fields(&[("precio", "1")]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_out_of_stock_filter() {
        let mut h = harness(true).await;
        h.api.products.lock().unwrap().extend([
            product(1, "Pipeta perro", 1500, 4),
            product(2, "Alimento gato", 9000, 0),
        ]);

        products(&mut h.state, "--out").await.unwrap();
        let visible: Vec<i64> = h.state.views.products.visible().iter().map(|p| p.id).collect();
        assert_eq!(visible, vec![2]);
    }

    #[tokio::test]
    async fn test_declined_service_delete_keeps_row() {
        let mut h = harness_with(true, vec![false]).await;
        h.api.services.lock().unwrap().push(service(8, "Baño", 4000));
        services(&mut h.state, "").await.unwrap();

        delete_service(&mut h.state, 8).await.unwrap();
        assert_eq!(h.api.count("delete_service"), 0);
        assert_eq!(h.state.views.services.services().len(), 1);
    }
}
