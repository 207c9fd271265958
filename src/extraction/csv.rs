//! CSV output for the clean tier

use std::io::{self, Write};
use std::path::Path;

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn write_row<W: Write>(w: &mut W, row: &[String]) -> io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            w.write_all(b",")?;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            w.write_all(cell.as_bytes())?;
        }
    }
    w.write_all(b"\n")
}

/// Write rows as comma-separated values, creating the parent directory if needed
pub async fn write_csv(path: &Path, rows: &[Vec<String>]) -> io::Result<()> {
    let mut buf = Vec::new();
    for row in rows {
        write_row(&mut buf, row)?;
    }

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, buf).await
}
