// src/domain/error.rs

use thiserror::Error;

/// Errores visibles para quien invoca los casos de uso.
///
/// Los fallos de entrega por canal (permanentes o transitorios) no son errores:
/// viajan como `DispatchStatus` y se consumen aguas abajo.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// La alerta referenciada ya no existe.
    #[error("does not exist: {message}")]
    NotFound { message: String },

    /// Los destinos indicados no coinciden con ningún output configurado.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Error inesperado con algún colaborador (stores, cola, canales).
    /// El mensaje es genérico; el detalle queda en los logs.
    #[error("internal error: {message}")]
    Internal { message: String },

    /// Fallo de programación detectado después de entregar (p. ej. un reintento que no
    /// se puede serializar). Repetir el lote volvería a entregar, así que no se reintenta.
    #[error("fatal error: {message}")]
    Fatal { message: String },
}

impl DeliveryError {
    pub fn not_found(message: impl Into<String>) -> Self {
        DeliveryError::NotFound { message: message.into() }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        DeliveryError::InvalidInput { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        DeliveryError::Internal { message: message.into() }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        DeliveryError::Fatal { message: message.into() }
    }

    pub fn message(&self) -> &str {
        match self {
            DeliveryError::NotFound { message }
            | DeliveryError::InvalidInput { message }
            | DeliveryError::Internal { message }
            | DeliveryError::Fatal { message } => message,
        }
    }

    /// Only internal errors may go away on their own; the rest need a different request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DeliveryError::Internal { .. })
    }
}
