//! # Admin Forms
//!
//! Raw form input for products, services and customers, and the validated
//! payloads sent to `POST`/`PUT /api/{products,services,customers}`.
//!
//! ```text
//!   ProductForm (text fields) ──validate()──► ProductInput (typed JSON body)
//!                                   │
//!                                   └──► ValidationError, nothing sent
//! ```

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::validation::{
    optional_text, parse_optional_amount, parse_optional_count, validate_date,
    validate_required, ValidationResult,
};
use crate::error::ValidationError;

// =============================================================================
// Product
// =============================================================================

/// Product form as typed by the operator. Blank means "not provided".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductForm {
    pub nombre: String,
    pub marca: String,
    pub descripcion: String,
    pub categoria: String,
    pub precio: String,
    pub stock: String,
    pub cost: String,
    pub vencimiento: String,
    pub imagen: String,
}

/// Body for product create/update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInput {
    pub nombre: String,
    pub marca: Option<String>,
    pub descripcion: Option<String>,
    pub categoria: Option<String>,
    pub precio: Option<Money>,
    pub stock: Option<i64>,
    pub cost: Option<Money>,
    pub vencimiento: Option<String>,
    pub imagen: Option<String>,
}

impl ProductForm {
    /// ## Rules
    /// - `nombre` required
    /// - `precio`, `cost` numeric when given
    /// - `stock` a non-negative integer when given
    /// - `vencimiento` a `YYYY-MM-DD` date when given
    pub fn validate(&self) -> ValidationResult<ProductInput> {
        let nombre = validate_required("nombre", &self.nombre)?;
        let precio = parse_optional_amount("precio", &self.precio)?;
        let stock = parse_optional_count("stock", &self.stock)?;
        let cost = parse_optional_amount("cost", &self.cost)?;
        let vencimiento = match optional_text(&self.vencimiento) {
            Some(raw) => Some(validate_date("vencimiento", &raw)?.format("%Y-%m-%d").to_string()),
            None => None,
        };

        Ok(ProductInput {
            nombre,
            marca: optional_text(&self.marca),
            descripcion: optional_text(&self.descripcion),
            categoria: optional_text(&self.categoria),
            precio,
            stock,
            cost,
            vencimiento,
            imagen: optional_text(&self.imagen),
        })
    }
}

// =============================================================================
// Service
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceForm {
    pub nombre: String,
    pub descripcion: String,
    pub precio: String,
    pub duracion_min: String,
    pub categoria: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInput {
    pub nombre: String,
    pub descripcion: Option<String>,
    pub precio: Option<Money>,
    pub duracion_min: Option<i64>,
    pub categoria: Option<String>,
}

impl ServiceForm {
    /// ## Rules
    /// - `nombre` required
    /// - `precio` numeric and ≥ 0 when given
    /// - `duracion_min` a non-negative integer when given
    pub fn validate(&self) -> ValidationResult<ServiceInput> {
        let nombre = validate_required("nombre", &self.nombre)?;
        let precio = parse_optional_amount("precio", &self.precio)?;
        if precio.is_some_and(|p| p.is_negative()) {
            return Err(ValidationError::Negative {
                field: "precio".to_string(),
            });
        }
        let duracion_min = parse_optional_count("duracion_min", &self.duracion_min)?;

        Ok(ServiceInput {
            nombre,
            descripcion: optional_text(&self.descripcion),
            precio,
            duracion_min,
            categoria: optional_text(&self.categoria),
        })
    }
}

// =============================================================================
// Customer
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerForm {
    pub nombre: String,
    pub email: String,
    pub telefono: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerInput {
    pub nombre: String,
    pub email: Option<String>,
    pub telefono: Option<String>,
}

impl CustomerForm {
    pub fn validate(&self) -> ValidationResult<CustomerInput> {
        Ok(CustomerInput {
            nombre: validate_required("nombre", &self.nombre)?,
            email: optional_text(&self.email),
            telefono: optional_text(&self.telefono),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_form_requires_name() {
        let form = ProductForm {
            precio: "100".into(),
            ..Default::default()
        };
        assert_eq!(
            form.validate().unwrap_err(),
            ValidationError::Required {
                field: "nombre".into()
            }
        );
    }

    #[test]
    fn test_product_form_builds_payload() {
        let form = ProductForm {
            nombre: " Pipeta ".into(),
            precio: "1500.5".into(),
            stock: "12".into(),
            vencimiento: "2025-03-01".into(),
            ..Default::default()
        };
        let input = form.validate().unwrap();
        assert_eq!(input.nombre, "Pipeta");
        assert_eq!(input.precio, Some(Money::from_cents(150050)));
        assert_eq!(input.stock, Some(12));
        assert_eq!(input.cost, None);
        assert_eq!(input.marca, None);
        assert_eq!(input.vencimiento.as_deref(), Some("2025-03-01"));
    }

    #[test]
    fn test_product_form_rejects_bad_stock() {
        let form = ProductForm {
            nombre: "Pipeta".into(),
            stock: "-2".into(),
            ..Default::default()
        };
        assert!(matches!(
            form.validate(),
            Err(ValidationError::NotANonNegativeInteger { .. })
        ));
    }

    #[test]
    fn test_service_form_rules() {
        let negative = ServiceForm {
            nombre: "Baño".into(),
            precio: "-1".into(),
            ..Default::default()
        };
        assert!(matches!(
            negative.validate(),
            Err(ValidationError::Negative { .. })
        ));

        let fractional = ServiceForm {
            nombre: "Baño".into(),
            duracion_min: "30.5".into(),
            ..Default::default()
        };
        assert!(fractional.validate().is_err());

        let ok = ServiceForm {
            nombre: "Baño".into(),
            precio: "0".into(),
            duracion_min: "45".into(),
            ..Default::default()
        };
        assert_eq!(ok.validate().unwrap().duracion_min, Some(45));
    }

    #[test]
    fn test_customer_form() {
        assert!(CustomerForm::default().validate().is_err());
        let input = CustomerForm {
            nombre: "Ana".into(),
            email: "".into(),
            telefono: "555".into(),
        }
        .validate()
        .unwrap();
        assert_eq!(input.email, None);
        assert_eq!(input.telefono.as_deref(), Some("555"));
    }
}
