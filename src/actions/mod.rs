//! Database operations. Each function takes a borrowed connection and is
//! called from inside `web::block`.

pub mod auth_flows;
pub mod bookings;
pub mod contacts;
pub mod halls;
pub mod sessions;
pub mod users;

/// Escapes `%`, `_` and `\` so user text matches literally inside `ILIKE`.
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Shared pool for database-backed tests; `None` (and those tests return
/// early) unless `TEST_DATABASE_URL` points at a scratch Postgres database.
#[cfg(test)]
pub fn test_pool() -> Option<crate::db::DbPool> {
    use std::sync::OnceLock;

    use diesel::{r2d2, PgConnection};

    static POOL: OnceLock<Option<crate::db::DbPool>> = OnceLock::new();
    POOL.get_or_init(|| {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let manager = r2d2::ConnectionManager::<PgConnection>::new(url);
        let pool = r2d2::Pool::builder()
            .max_size(8)
            .build(manager)
            .expect("TEST_DATABASE_URL should be reachable");
        crate::db::run_migrations(&pool).expect("migrations should apply");
        Some(pool)
    })
    .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("grand"), "grand");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
    }
}

