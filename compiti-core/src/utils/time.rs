use time::{macros::format_description, OffsetDateTime};

/// Restituisce l'istante corrente in UTC, es. "2025-11-02T12:34:56.123456Z".
/// Larghezza fissa: l'ordine lessicografico coincide con quello cronologico,
/// così `ORDER BY created_at` funziona direttamente sul testo.
pub fn now_timestamp() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
    ))
    .expect("error formatting timestamp")
}
