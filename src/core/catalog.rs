//! SRI catalog codes used across the declaration.
//!
//! Covers the subsets of the official tables that purchase, sale and export
//! records actually carry: document types (tabla 4), tax-support codes
//! (tabla 5) and payment methods (tabla 13). Identification-type codes are
//! small enough to live in match arms next to their callers.

/// Check whether `code` is a known SRI document-type code (tabla 4).
pub fn is_known_document_type(code: &str) -> bool {
    DOCUMENT_TYPES.binary_search(&code).is_ok()
}

/// Check whether `code` is a known tax-support code (tabla 5, `codSustento`).
pub fn is_known_sustento(code: &str) -> bool {
    SUSTENTO_CODES.binary_search(&code).is_ok()
}

/// Check whether `code` is a known payment-method code (tabla 13, `formaPago`).
pub fn is_known_payment_method(code: &str) -> bool {
    PAYMENT_METHODS.binary_search(&code).is_ok()
}

/// Sorted document-type codes from tabla 4. Sorted for binary search.
static DOCUMENT_TYPES: &[&str] = &[
    "01", // Factura
    "02", // Nota o boleta de venta
    "03", // Liquidación de compra de bienes o prestación de servicios
    "04", // Nota de crédito
    "05", // Nota de débito
    "06", // Guía de remisión
    "07", // Comprobante de retención
    "08", // Boleto o entrada a espectáculos públicos
    "09", // Tiquete de máquina registradora
    "11", // Pasaje expedido por empresa de aviación
    "12", // Documento emitido por institución financiera
    "15", // Comprobante de venta emitido en el exterior
    "16", // FUE, DAU o DAS (exportaciones/importaciones)
    "18", // Documento autorizado en ventas, excepto N/C y N/D
    "19", // Comprobante de pago de cuotas o aportes
    "20", // Documento por servicios administrativos del Estado
    "21", // Carta de porte aéreo
    "41", // Comprobante de venta emitido por reembolso intermediario
    "43", // Liquidación para explotación y transporte de hidrocarburos
    "45", // Liquidación por reclamos de aseguradoras
    "47", // Nota de crédito por reembolso emitida por intermediario
    "48", // Nota de débito por reembolso emitida por intermediario
];

/// Sorted tax-support codes from tabla 5. Sorted for binary search.
static SUSTENTO_CODES: &[&str] = &[
    "01", // Crédito tributario para declaración de IVA
    "02", // Costo o gasto para declaración de impuesto a la renta
    "03", // Activo fijo - crédito tributario para declaración de IVA
    "04", // Activo fijo - costo o gasto para declaración de renta
    "05", // Liquidación de gastos de viaje, hospedaje y alimentación
    "06", // Inventario - crédito tributario para declaración de IVA
    "07", // Inventario - costo o gasto para declaración de renta
    "08", // Valor pagado para solicitar reembolso de gasto
    "09", // Reembolso por siniestros
    "10", // Distribución de dividendos, beneficios o utilidades
    "11", // Convenios de débito o recaudación para IFIs
    "12", // Impuestos y retenciones presuntivos
    "13", // Valores reconocidos por entidades del sector público
    "14", // Valores facturados por socios a operadoras de transporte
    "15", // Pagos efectuados por consumos propios
];

/// Sorted payment-method codes from tabla 13. Sorted for binary search.
static PAYMENT_METHODS: &[&str] = &[
    "01", // Sin utilización del sistema financiero
    "02", // Cheque propio
    "03", // Cheque certificado
    "04", // Cheque de gerencia
    "05", // Cheque del exterior
    "06", // Débito de cuenta
    "07", // Transferencia propia
    "08", // Transferencia desde el exterior
    "09", // Tarjeta de crédito nacional
    "10", // Tarjeta de crédito internacional
    "11", // Giro
    "12", // Depósito en cuenta (corriente/ahorros)
    "13", // Endoso de inversión
    "14", // Dación en pago
    "15", // Permuta
    "16", // Tarjeta de débito
    "17", // Dinero electrónico
    "18", // Tarjeta prepago
    "19", // Tarjeta de crédito (establecimiento)
    "20", // Otros con utilización del sistema financiero
    "21", // Endoso de título valor
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_document_types() {
        assert!(is_known_document_type("01"));
        assert!(is_known_document_type("04"));
        assert!(is_known_document_type("07"));
        assert!(is_known_document_type("18"));
    }

    #[test]
    fn unknown_document_types() {
        assert!(!is_known_document_type("00"));
        assert!(!is_known_document_type("99"));
        assert!(!is_known_document_type(""));
        assert!(!is_known_document_type("1"));
    }

    #[test]
    fn known_sustento_and_payment_codes() {
        assert!(is_known_sustento("01"));
        assert!(is_known_sustento("15"));
        assert!(!is_known_sustento("16"));
        assert!(is_known_payment_method("01"));
        assert!(is_known_payment_method("20"));
        assert!(!is_known_payment_method("99"));
    }

    #[test]
    fn lists_are_sorted() {
        for list in [DOCUMENT_TYPES, SUSTENTO_CODES, PAYMENT_METHODS] {
            for window in list.windows(2) {
                assert!(
                    window[0] < window[1],
                    "codes not sorted: {} >= {}",
                    window[0],
                    window[1]
                );
            }
        }
    }
}
