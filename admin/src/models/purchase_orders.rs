use jiff::Timestamp;
use jiff::civil::Date;
use payloads::{RecordId, requests, responses};
use rust_decimal::Decimal;
use std::str::FromStr;

use super::{changed, optional, parse_id, require, wire_enum};
use crate::error::AdminError;

wire_enum!(OrderStatus {
    Pendiente => "pendiente", "Pendiente",
    EnProceso => "en_proceso", "En proceso",
    Completada => "completada", "Completada",
    Cancelada => "cancelada", "Cancelada",
});

/// A línea de vida attached to an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedRecord {
    pub id: String,
    pub codigo: String,
    pub cliente: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseOrder {
    pub id: String,
    pub numero: String,
    pub estado: OrderStatus,
    pub fecha_realizacion: Date,
    pub fecha_entrega: Option<Date>,
    pub proveedor: Option<String>,
    pub descripcion: Option<String>,
    pub monto_total: Option<Decimal>,
    pub records: Vec<LinkedRecord>,
    pub created_at: Timestamp,
}

impl From<responses::PurchaseOrder> for PurchaseOrder {
    fn from(order: responses::PurchaseOrder) -> Self {
        Self {
            id: order.id.to_string(),
            numero: order.numero,
            estado: OrderStatus::from_backend(&order.estado),
            fecha_realizacion: order.fecha_realizacion,
            fecha_entrega: order.fecha_entrega,
            proveedor: order.proveedor,
            descripcion: order.descripcion,
            monto_total: order.monto_total,
            records: order
                .records
                .into_iter()
                .map(|record| LinkedRecord {
                    id: record.id.to_string(),
                    codigo: record.codigo,
                    cliente: record.cliente,
                })
                .collect(),
            created_at: order.created_at,
        }
    }
}

impl PurchaseOrder {
    pub fn monto_display(&self) -> String {
        match self.monto_total {
            Some(monto) => format!("S/ {}", monto.round_dp(2)),
            None => "-".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseOrderForm {
    pub numero: String,
    pub estado: OrderStatus,
    pub fecha_realizacion: Option<Date>,
    pub fecha_entrega: Option<Date>,
    pub proveedor: String,
    pub descripcion: String,
    /// Free text as typed; parsed on submit.
    pub monto_total: String,
    pub record_ids: Vec<String>,
}

impl Default for PurchaseOrderForm {
    fn default() -> Self {
        Self {
            numero: String::new(),
            estado: OrderStatus::Pendiente,
            fecha_realizacion: None,
            fecha_entrega: None,
            proveedor: String::new(),
            descripcion: String::new(),
            monto_total: String::new(),
            record_ids: Vec::new(),
        }
    }
}

impl PurchaseOrderForm {
    pub fn from_order(order: &PurchaseOrder) -> Self {
        Self {
            numero: order.numero.clone(),
            estado: order.estado.clone(),
            fecha_realizacion: Some(order.fecha_realizacion),
            fecha_entrega: order.fecha_entrega,
            proveedor: order.proveedor.clone().unwrap_or_default(),
            descripcion: order.descripcion.clone().unwrap_or_default(),
            monto_total: order
                .monto_total
                .map(|monto| monto.to_string())
                .unwrap_or_default(),
            record_ids: order.records.iter().map(|r| r.id.clone()).collect(),
        }
    }

    fn monto(&self, problems: &mut Vec<String>) -> Option<Decimal> {
        let text = self.monto_total.trim().replace(',', ".");
        if text.is_empty() {
            return None;
        }
        match Decimal::from_str(&text) {
            Ok(monto) if monto.is_sign_negative() => {
                problems.push("El monto no puede ser negativo".to_string());
                None
            }
            Ok(monto) => Some(monto),
            Err(_) => {
                problems.push(format!("Monto inválido: {text}"));
                None
            }
        }
    }

    pub fn to_create(
        &self,
    ) -> Result<requests::CreatePurchaseOrder, AdminError> {
        let mut problems = Vec::new();
        require(&mut problems, "El número de orden", &self.numero);
        if self.fecha_realizacion.is_none() {
            problems
                .push("La fecha de realización es requerida".to_string());
        }
        if let (Some(realizacion), Some(entrega)) =
            (self.fecha_realizacion, self.fecha_entrega)
        {
            if entrega < realizacion {
                problems.push(
                    "La fecha de entrega no puede ser anterior a la de \
                     realización"
                        .to_string(),
                );
            }
        }
        let monto_total = self.monto(&mut problems);
        let record_ids = self
            .record_ids
            .iter()
            .map(|id| parse_id::<RecordId>("Línea de vida", id))
            .collect::<Result<Vec<_>, _>>()?;

        match self.fecha_realizacion {
            Some(fecha_realizacion) if problems.is_empty() => {
                Ok(requests::CreatePurchaseOrder {
                    numero: self.numero.trim().to_string(),
                    estado: self.estado.to_backend(),
                    fecha_realizacion,
                    fecha_entrega: self.fecha_entrega,
                    proveedor: optional(&self.proveedor),
                    descripcion: optional(&self.descripcion),
                    monto_total,
                    record_ids,
                })
            }
            _ => Err(AdminError::Validation(problems)),
        }
    }

    pub fn to_update(
        &self,
        original: &PurchaseOrder,
    ) -> Result<requests::UpdatePurchaseOrder, AdminError> {
        let create = self.to_create()?;
        Ok(requests::UpdatePurchaseOrder {
            estado: changed(&original.estado.to_backend(), create.estado),
            fecha_entrega: changed(
                &original.fecha_entrega,
                create.fecha_entrega,
            )
            .flatten(),
            proveedor: changed(&original.proveedor, create.proveedor).flatten(),
            descripcion: changed(&original.descripcion, create.descripcion)
                .flatten(),
            monto_total: changed(&original.monto_total, create.monto_total)
                .flatten(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    fn form() -> PurchaseOrderForm {
        PurchaseOrderForm {
            numero: "OC-2025-010".into(),
            fecha_realizacion: Some(Date::constant(2025, 3, 1)),
            monto_total: "1500,50".into(),
            record_ids: vec!["1".into(), "2".into()],
            ..Default::default()
        }
    }

    #[test]
    fn create_parses_amount_and_record_ids() {
        let request = form().to_create().unwrap();
        assert_eq!(request.monto_total, Some(dec!(1500.50)));
        assert_eq!(request.record_ids, vec![RecordId(1), RecordId(2)]);
        assert_eq!(request.estado, "pendiente");
    }

    #[test]
    fn negative_amount_and_inverted_dates_are_rejected() {
        let form = PurchaseOrderForm {
            monto_total: "-3".into(),
            fecha_entrega: Some(Date::constant(2025, 2, 1)),
            ..form()
        };
        let Err(AdminError::Validation(problems)) = form.to_create() else {
            panic!("expected validation error");
        };
        assert_eq!(problems.len(), 2);
    }

    #[test]
    fn amount_is_displayed_in_soles() {
        let order = PurchaseOrder {
            id: "1".into(),
            numero: "OC-1".into(),
            estado: OrderStatus::Pendiente,
            fecha_realizacion: Date::constant(2025, 3, 1),
            fecha_entrega: None,
            proveedor: None,
            descripcion: None,
            monto_total: Some(dec!(4500.001)),
            records: vec![],
            created_at: "2025-03-01T00:00:00Z".parse().unwrap(),
        };
        assert_eq!(order.monto_display(), "S/ 4500.00");
    }
}
