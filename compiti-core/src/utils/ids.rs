use uuid::Uuid;

/// Genera un nuovo id di compito unico (UUIDv4) come stringa.
pub fn new_task_id() -> String {
    Uuid::new_v4().to_string()
}

/// Genera un nuovo identificativo utente (128 bit casuali) da mettere nel cookie `user_id`.
/// Forma simple (32 cifre esadecimali, senza trattini).
pub fn new_user_id() -> String {
    Uuid::new_v4().simple().to_string()
}
