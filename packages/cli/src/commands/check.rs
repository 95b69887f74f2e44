use super::{load_catalog, DOCUMENT_EXTENSION};
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use walkdir::WalkDir;
use widgetree_catalog::Catalog;
use widgetree_editor::{
    Document, EditorError, FragmentCodec, JsonCodec, Manager, NodeKey, Placement,
};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Input .wtree file or directory to check
    pub input: PathBuf,

    /// Component catalog (JSON); defaults to the built-in Tk catalog
    #[arg(short, long)]
    pub catalog: Option<PathBuf>,
}

/// Problems found in one document
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub widgets: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

pub fn check(args: CheckArgs, _cwd: &Path) -> Result<()> {
    let catalog = Arc::new(load_catalog(args.catalog.as_deref())?);

    println!("🔍 {} widget tree check", "Starting".green().bold());
    println!("   Input: {}", args.input.display());
    println!();

    let files = if args.input.is_file() {
        vec![args.input.clone()]
    } else if args.input.is_dir() {
        let files = find_documents(&args.input);
        println!("   Found {} .{} files", files.len(), DOCUMENT_EXTENSION);
        println!();
        files
    } else {
        return Err(anyhow!("Input path does not exist: {}", args.input.display()));
    };

    let mut total_errors = 0;
    let mut total_warnings = 0;
    for file in &files {
        let source = fs::read_to_string(file)?;
        let report = check_source(&catalog, &source);
        print_report(file, &report);
        total_errors += report.errors.len();
        total_warnings += report.warnings.len();
    }

    println!();
    println!(
        "✨ {} Check complete!",
        if total_errors > 0 {
            "Done".red().bold()
        } else {
            "Done".green().bold()
        }
    );
    println!("   Files checked: {}", files.len());
    if total_errors > 0 {
        println!("   {} {}", "Errors:".red(), total_errors);
    }
    if total_warnings > 0 {
        println!("   {} {}", "Warnings:".yellow(), total_warnings);
    }

    if total_errors > 0 {
        return Err(anyhow!("Found {} errors", total_errors));
    }
    Ok(())
}

/// Load every top-level widget of `source` on its own so one bad subtree
/// does not hide the problems of the others. Structure and name clashes
/// surface as the rejection of the widget that brings them in.
pub fn check_source(catalog: &Arc<Catalog>, source: &str) -> CheckReport {
    let mut report = CheckReport::default();

    let fragment = match JsonCodec.decode(source) {
        Ok(fragment) => fragment,
        Err(err) => {
            report.errors.push(err.to_string());
            return report;
        }
    };
    report.widgets = fragment.widgets.len();

    let mut doc = Document::new(Arc::clone(catalog));
    for def in fragment.widgets {
        let label = def.widget.label();
        let index = doc.roots().len();
        match doc.insert_tree(None, index, def, Placement::Verbatim) {
            Ok(_) => {}
            Err(EditorError::UnknownClass(classname)) => {
                report.errors.push(format!("{}: unknown class {}", label, classname));
            }
            Err(err) => report.errors.push(format!("{}: {}", label, err)),
        }
    }

    for (key, node) in doc.iter() {
        report.warnings.extend(grid_warnings(&doc, key, node.data().label()));
    }
    debug!(
        widgets = report.widgets,
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "Checked document"
    );
    report
}

/// Overlapping grid cells and mixed managers below `container`
fn grid_warnings(doc: &Document, container: NodeKey, label: String) -> Vec<String> {
    let mut warnings = Vec::new();
    let info = match doc.layout().container_info(container) {
        Ok(info) => info,
        Err(_) => return warnings,
    };
    if !info.has_children {
        return warnings;
    }

    let mut cells = HashSet::new();
    let mut managers = HashSet::new();
    for child in doc.children(Some(container)) {
        let Some(data) = doc.get(*child) else {
            continue;
        };
        if data.manager != Manager::Place {
            managers.insert(data.manager);
        }
        if let Some(cell) = data.cell() {
            if !cells.insert(cell) {
                warnings.push(format!(
                    "{}: cell ({}, {}) is used by more than one child",
                    label, cell.row, cell.column
                ));
            }
        }
    }
    if managers.len() > 1 {
        warnings.push(format!("{}: children mix layout managers", label));
    }
    warnings
}

fn print_report(file: &Path, report: &CheckReport) {
    if report.errors.is_empty() && report.warnings.is_empty() {
        println!(
            "  {} {} ({} widgets)",
            "✓".green(),
            file.display(),
            report.widgets
        );
        return;
    }

    println!("  {} {}", "✗".red(), file.display());
    for error in &report.errors {
        println!("    {} {}", "error:".red().bold(), error);
    }
    for warning in &report.warnings {
        println!("    {} {}", "warning:".yellow().bold(), warning);
    }
}

fn find_documents(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().map_or(false, |ext| ext == DOCUMENT_EXTENSION))
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tk() -> Arc<Catalog> {
        Arc::new(Catalog::tk())
    }

    #[test]
    fn test_clean_document() {
        let source = r#"{
            "widgets": [
                {
                    "class": "ttk.Frame", "id": "main",
                    "children": [
                        { "class": "ttk.Label", "id": "title", "manager": "grid",
                          "layout": [{ "name": "row", "value": "0" }, { "name": "column", "value": "0" }] },
                        { "class": "ttk.Button", "id": "ok", "manager": "grid",
                          "layout": [{ "name": "row", "value": "1" }, { "name": "column", "value": "0" }] }
                    ]
                }
            ]
        }"#;
        let report = check_source(&tk(), source);
        assert_eq!(report.widgets, 1);
        assert!(report.errors.is_empty(), "{:?}", report.errors);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn test_reports_structure_and_names() {
        let source = r#"{
            "widgets": [
                { "class": "ttk.Label", "id": "orphan" },
                { "class": "ttk.Frame", "id": "a" },
                { "class": "ttk.Frame", "id": "a" },
                { "class": "gtk.Window", "id": "w" }
            ]
        }"#;
        let report = check_source(&tk(), source);
        assert_eq!(report.widgets, 4);
        assert_eq!(report.errors.len(), 3, "{:?}", report.errors);
        assert!(report.errors[0].starts_with("orphan: ttk.Label"));
        assert!(report.errors[1].contains("\"a\" is already in use"), "{:?}", report.errors);
        assert!(report.errors[2].contains("unknown class gtk.Window"));
    }

    #[test]
    fn test_warns_on_shared_cells() {
        let source = r#"{
            "widgets": [
                {
                    "class": "ttk.Frame", "id": "main",
                    "children": [
                        { "class": "ttk.Label", "id": "a", "manager": "grid",
                          "layout": [{ "name": "row", "value": "0" }, { "name": "column", "value": "0" }] },
                        { "class": "ttk.Label", "id": "b", "manager": "grid",
                          "layout": [{ "name": "row", "value": "0" }, { "name": "column", "value": "0" }] }
                    ]
                }
            ]
        }"#;
        let report = check_source(&tk(), source);
        assert!(report.errors.is_empty());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_malformed_source() {
        let report = check_source(&tk(), "<interface/>");
        assert_eq!(report.widgets, 0);
        assert_eq!(report.errors.len(), 1);
    }
}
