//! SQL functions backing the phrase-prefix filter and the score sort

use crate::search::phrase::PhrasePrefix;
use crate::search::scoring::document_score;
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

/// Register `phrase_prefix(name, term, slop)` and `animal_score(salt, id, promoted)`
pub fn register(conn: &Connection) -> rusqlite::Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    conn.create_scalar_function("phrase_prefix", 3, flags, |ctx| {
        let name: Option<String> = ctx.get(0)?;
        let term: String = ctx.get(1)?;
        let slop: i64 = ctx.get(2)?;

        let query = PhrasePrefix::new(&term, slop.max(0) as usize);
        Ok(query.matches(name.as_deref().unwrap_or("")))
    })?;

    conn.create_scalar_function("animal_score", 3, flags, |ctx| {
        let salt: i64 = ctx.get(0)?;
        let id: i64 = ctx.get(1)?;
        let promoted: bool = ctx.get(2)?;

        Ok(document_score(salt as i32, id, promoted))
    })?;

    Ok(())
}
