//! SQLite fact store: read-only loading and filtered working copies
//!
//! The store has three relations: `entities`, `deps` and `contents`. Loading
//! never writes; filtering always happens on a copy of the database file.

use crate::error::{FactError, FactResult};
use crate::graph::FactGraph;
use crate::model::*;
use rusqlite::{params, Connection, OpenFlags, Row};
use serde::Serialize;
use std::path::Path;

/// Schema of a fact base, as produced by the upstream analysis engine.
pub const SCHEMA: &str = r#"
CREATE TABLE contents (
    id BLOB NOT NULL PRIMARY KEY,
    content TEXT NOT NULL
);
CREATE TABLE deps (
    src BLOB NOT NULL,
    tgt BLOB NOT NULL,
    kind TEXT NOT NULL,
    row INT NOT NULL,
    commit_id BLOB
);
CREATE TABLE entities (
    id BLOB NOT NULL PRIMARY KEY,
    parent_id BLOB,
    name TEXT NOT NULL,
    kind TEXT NOT NULL,
    start_byte INT NOT NULL,
    start_row INT NOT NULL,
    start_column INT NOT NULL,
    end_byte INT NOT NULL,
    end_row INT NOT NULL,
    end_column INT NOT NULL,
    comment_start_byte INT,
    comment_start_row INT,
    comment_start_column INT,
    comment_end_byte INT,
    comment_end_row INT,
    comment_end_column INT,
    content_id BLOB NOT NULL,
    simple_id BLOB NOT NULL
);
"#;

const SELECT_ENTITIES: &str = "SELECT id, parent_id, name, kind, \
    start_byte, start_row, start_column, end_byte, end_row, end_column, \
    comment_start_byte, comment_start_row, comment_start_column, \
    comment_end_byte, comment_end_row, comment_end_column, content_id \
    FROM entities ORDER BY rowid";

const SELECT_DEPS: &str = "SELECT src, tgt, kind, row, commit_id FROM deps ORDER BY rowid";

const SELECT_CONTENTS: &str = "SELECT id, content FROM contents";

/// What loading a fact base found, including tolerated defects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub entities: usize,
    pub deps: usize,
    pub contents: usize,
    /// Deps whose src or tgt is not an entity; skipped.
    pub dangling_deps: usize,
    /// Entities whose parent id does not resolve; kept as roots.
    pub orphaned_entities: usize,
}

/// Open a fact base read-only and load it into memory.
pub fn load_fact_base(path: &Path) -> FactResult<(FactGraph, LoadReport)> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    tracing::debug!("Loading fact base: {}", path.display());
    read_fact_graph(&conn)
}

/// Load every relation from an open connection.
pub fn read_fact_graph(conn: &Connection) -> FactResult<(FactGraph, LoadReport)> {
    let mut graph = FactGraph::new();
    let mut report = LoadReport::default();

    let mut stmt = conn.prepare(SELECT_ENTITIES)?;
    let entities = stmt.query_map([], entity_from_row)?;
    for entity in entities {
        graph.add_entity(entity?);
        report.entities += 1;
    }

    report.orphaned_entities = graph
        .all_entities()
        .iter()
        .filter(|e| e.parent_id.as_ref().is_some_and(|p| !graph.contains(p)))
        .count();

    let mut stmt = conn.prepare(SELECT_DEPS)?;
    let deps = stmt.query_map([], |row| {
        Ok(Dep {
            src: EntityId(row.get(0)?),
            tgt: EntityId(row.get(1)?),
            kind: DepKind::from(row.get::<_, String>(2)?),
            row: row.get(3)?,
            commit_id: row.get(4)?,
        })
    })?;
    for dep in deps {
        if graph.add_dep(dep?).is_some() {
            report.deps += 1;
        } else {
            report.dangling_deps += 1;
        }
    }

    let mut stmt = conn.prepare(SELECT_CONTENTS)?;
    let contents = stmt.query_map([], |row| {
        Ok((EntityId(row.get(0)?), row.get::<_, String>(1)?))
    })?;
    for content in contents {
        let (id, text) = content?;
        graph.add_content(id, text);
        report.contents += 1;
    }

    if report.dangling_deps > 0 {
        tracing::warn!(
            "Skipped {} deps referencing unknown entities",
            report.dangling_deps
        );
    }
    if report.orphaned_entities > 0 {
        tracing::warn!(
            "{} entities reference a missing parent",
            report.orphaned_entities
        );
    }
    tracing::info!(
        "Loaded {} entities, {} deps, {} contents",
        report.entities,
        report.deps,
        report.contents
    );
    Ok((graph, report))
}

fn entity_from_row(row: &Row<'_>) -> rusqlite::Result<Entity> {
    let position = |byte: usize| -> rusqlite::Result<Position> {
        Ok(Position {
            byte: row.get(byte)?,
            row: row.get(byte + 1)?,
            column: row.get(byte + 2)?,
        })
    };
    let optional = |byte: usize| -> rusqlite::Result<Option<Position>> {
        let byte_val: Option<u32> = row.get(byte)?;
        let row_val: Option<u32> = row.get(byte + 1)?;
        let column_val: Option<u32> = row.get(byte + 2)?;
        Ok(match (byte_val, row_val, column_val) {
            (Some(byte), Some(row), Some(column)) => Some(Position { byte, row, column }),
            _ => None,
        })
    };
    let comment = match (optional(10)?, optional(13)?) {
        (Some(start), Some(end)) => Some(SourceSpan { start, end }),
        _ => None,
    };
    Ok(Entity {
        id: EntityId(row.get(0)?),
        parent_id: row.get::<_, Option<Vec<u8>>>(1)?.map(EntityId),
        name: row.get(2)?,
        kind: EntityKind::from(row.get::<_, String>(3)?),
        span: SourceSpan {
            start: position(4)?,
            end: position(7)?,
        },
        comment,
        content_id: EntityId(row.get(16)?),
    })
}

/// Create the three fact-base relations on an empty database.
pub fn create_schema(conn: &Connection) -> FactResult<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Insert every entity, dep and content of `graph` in one transaction.
pub fn insert_fact_graph(conn: &mut Connection, graph: &FactGraph) -> FactResult<()> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO entities (id, parent_id, name, kind, \
             start_byte, start_row, start_column, end_byte, end_row, end_column, \
             comment_start_byte, comment_start_row, comment_start_column, \
             comment_end_byte, comment_end_row, comment_end_column, content_id, simple_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        )?;
        for e in graph.all_entities() {
            let comment_start = e.comment.map(|c| c.start);
            let comment_end = e.comment.map(|c| c.end);
            stmt.execute(params![
                e.id.as_bytes(),
                e.parent_id.as_ref().map(EntityId::as_bytes),
                e.name,
                e.kind.as_str(),
                e.span.start.byte,
                e.span.start.row,
                e.span.start.column,
                e.span.end.byte,
                e.span.end.row,
                e.span.end.column,
                comment_start.map(|p| p.byte),
                comment_start.map(|p| p.row),
                comment_start.map(|p| p.column),
                comment_end.map(|p| p.byte),
                comment_end.map(|p| p.row),
                comment_end.map(|p| p.column),
                e.content_id.as_bytes(),
                e.id.as_bytes(),
            ])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO deps (src, tgt, kind, row, commit_id) VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for d in graph.all_deps() {
            stmt.execute(params![
                d.src.as_bytes(),
                d.tgt.as_bytes(),
                d.kind.as_str(),
                d.row,
                d.commit_id,
            ])?;
        }

        let mut stmt = tx.prepare("INSERT INTO contents (id, content) VALUES (?1, ?2)")?;
        for (id, text) in graph.contents() {
            stmt.execute(params![id.as_bytes(), text])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Write `graph` as a brand new fact base at `path`.
pub fn write_fact_base(path: &Path, graph: &FactGraph) -> FactResult<()> {
    if path.exists() {
        return Err(FactError::OutputExists(path.to_path_buf()));
    }
    let mut conn = Connection::open(path)?;
    create_schema(&conn)?;
    insert_fact_graph(&mut conn, graph)
}

/// Copy the fact base at `input` to `output` and delete the `removed` dep rows
/// from the copy. The input file is never opened for writing.
///
/// Rows are matched on `(src, tgt, kind, row)`. Returns the number of rows deleted.
pub fn write_filtered_copy(
    input: &Path,
    output: &Path,
    removed: &[Dep],
    overwrite: bool,
) -> FactResult<usize> {
    if output.exists() {
        if std::fs::canonicalize(input)? == std::fs::canonicalize(output)? {
            return Err(FactError::SameDatabase(output.to_path_buf()));
        }
        if !overwrite {
            return Err(FactError::OutputExists(output.to_path_buf()));
        }
        std::fs::remove_file(output)?;
    }
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::copy(input, output)?;
    tracing::debug!("Copied {} to {}", input.display(), output.display());

    let mut conn = Connection::open(output)?;
    let tx = conn.transaction()?;
    let mut deleted = 0;
    {
        let mut stmt = tx.prepare(
            "DELETE FROM deps WHERE src = ?1 AND tgt = ?2 AND kind = ?3 AND row = ?4",
        )?;
        for d in removed {
            deleted += stmt.execute(params![
                d.src.as_bytes(),
                d.tgt.as_bytes(),
                d.kind.as_str(),
                d.row
            ])?;
        }
    }
    tx.commit()?;
    tracing::info!("Removed {} dep rows from {}", deleted, output.display());
    Ok(deleted)
}
