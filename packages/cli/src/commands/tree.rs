use super::load_catalog;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use widgetree_editor::{filter_matches, EditSession, EditorConfig, NodeKey};

#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Input .wtree file
    pub input: PathBuf,

    /// Only show widgets matching this text (and their ancestors)
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Component catalog (JSON); defaults to the built-in Tk catalog
    #[arg(short, long)]
    pub catalog: Option<PathBuf>,

    /// Print the normalized document instead of the outline
    #[arg(long)]
    pub json: bool,
}

pub fn tree(args: TreeArgs, cwd: &Path) -> Result<()> {
    let catalog = Arc::new(load_catalog(args.catalog.as_deref())?);
    let config = EditorConfig::load(cwd)?;
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("Cannot read {}", args.input.display()))?;

    let mut session = EditSession::new(catalog, config);
    session.load_document(&source)?;

    if args.json {
        println!("{}", session.to_document(None)?);
        return Ok(());
    }

    let needle = args.filter.as_deref().unwrap_or("").to_lowercase();
    if let Some(text) = &args.filter {
        session.apply_filter(text);
    }

    let lines = outline(&session, &needle);
    if lines.is_empty() {
        println!("{}", "No widgets to show".yellow());
    }
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

/// Indented rendering of the visible tree
fn outline(session: &EditSession, needle: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let roots = session.filter().visible_roots(session.document());
    for key in roots {
        render(session, key, 0, needle, &mut lines);
    }
    lines
}

fn render(session: &EditSession, key: NodeKey, depth: usize, needle: &str, out: &mut Vec<String>) {
    let doc = session.document();
    let Some(data) = doc.get(key) else {
        return;
    };

    let mut line = format!(
        "{}{} {}",
        "  ".repeat(depth),
        data.identifier.bright_white().bold(),
        data.classname.dimmed()
    );
    if doc.parent(key).is_some() && doc.catalog().get(&data.classname).map_or(true, |s| s.layout_required) {
        line.push_str(&format!(" [{}", data.manager));
        if let Some(cell) = data.cell() {
            line.push_str(&format!(" {},{}", cell.row, cell.column));
        }
        line.push(']');
    }
    if !needle.is_empty() && filter_matches(doc, key, needle) {
        line = format!("{} {}", line, "●".green());
    }
    out.push(line);

    for child in session.filter().visible_children(doc, Some(key)) {
        render(session, child, depth + 1, needle, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use widgetree_catalog::Catalog;

    const SOURCE: &str = r#"{
        "widgets": [
            {
                "class": "ttk.Frame", "id": "main",
                "children": [
                    { "class": "ttk.Label", "id": "title" },
                    { "class": "ttk.Button", "id": "ok" }
                ]
            },
            { "class": "tk.Menu", "id": "menubar" }
        ]
    }"#;

    fn session() -> EditSession {
        colored::control::set_override(false);
        let mut session = EditSession::new(Arc::new(Catalog::tk()), EditorConfig::default());
        session.load_document(SOURCE).unwrap();
        session
    }

    #[test]
    fn test_outline() {
        let lines = outline(&session(), "");
        assert_eq!(
            lines,
            vec![
                "main ttk.Frame",
                "  title ttk.Label [pack]",
                "  ok ttk.Button [pack]",
                "menubar tk.Menu",
            ]
        );
    }

    #[test]
    fn test_filtered_outline() {
        let mut session = session();
        session.apply_filter("ok");
        let lines = outline(&session, "ok");
        assert_eq!(lines, vec!["main ttk.Frame", "  ok ttk.Button [pack] ●"]);
    }
}
