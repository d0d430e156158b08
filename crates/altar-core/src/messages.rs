//! User-facing messages (es-MX).

pub const NO_CONNECTIVITY: &str = "No hay conexión a internet. Por favor, verifica tu conexión.";
pub const TIMEOUT: &str = "La solicitud tardó demasiado tiempo. Por favor, intenta de nuevo.";
pub const INVALID_RESPONSE_FORMAT: &str = "Formato de respuesta inválido";
pub const INCOMPLETE_RESPONSE: &str = "Respuesta incompleta del servidor";
pub const INVALID_REQUEST: &str = "Se requiere la foto y la descripción de comidas";
pub const INVALID_DESCRIPTION_LENGTH: &str = "La descripción debe tener entre 10 y 500 caracteres";
pub const NETWORK_ERROR: &str =
    "Error de conexión. Por favor, verifica tu internet e intenta de nuevo.";
pub const GENERIC_SERVER_ERROR: &str = "Ocurrió un error";
pub const UNEXPECTED_ERROR: &str = "Ocurrió un error inesperado";

pub const UPLOAD_STAGE_PREFIX: &str = "Error al subir la foto";
pub const GENERATION_STAGE_PREFIX: &str = "Error al generar el altar";
pub const SAVED_WITHOUT_PERSISTENCE: &str =
    "Altar creado exitosamente, pero no se pudo guardar localmente";
pub const LOAD_FAILED_PREFIX: &str = "Error al cargar altares";
pub const DELETE_FAILED_PREFIX: &str = "Error al eliminar el altar";

/// Suffix appended to a message after more than one attempt.
#[must_use]
pub fn attempts_suffix(attempts: u32) -> String {
    format!(" (intentos: {attempts})")
}

/// Message for a non-2xx response without a structured body.
#[must_use]
pub fn http_status(status: u16) -> String {
    format!("El servidor respondió con un error (HTTP {status})")
}
