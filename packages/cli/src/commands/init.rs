use super::{load_catalog, DOCUMENT_EXTENSION};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use widgetree_editor::{EditSession, EditorConfig, Manager, NamingSeparator, DEFAULT_CONFIG_NAME};

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Layout manager for new widgets (pack, grid, place)
    #[arg(short, long, default_value = "pack")]
    pub layout: Manager,

    /// Separate generated identifiers with an underscore (label_1)
    #[arg(long)]
    pub underscore: bool,

    /// Author written into saved documents
    #[arg(short, long)]
    pub author: Option<String>,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing widget tree project...".bright_blue().bold());

    let config = EditorConfig {
        default_layout_manager: args.layout,
        widget_naming_separator: if args.underscore {
            NamingSeparator::Underscore
        } else {
            NamingSeparator::None
        },
        widget_naming_ufletter: false,
        author: args.author.clone(),
    };
    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);

    let example = PathBuf::from(cwd).join(format!("main.{}", DOCUMENT_EXTENSION));
    if !example.exists() {
        fs::write(&example, example_document(config)?)?;
        println!("  {} Created {}", "✓".green(), example.display());
    }

    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Run: widgetree tree main.{}", DOCUMENT_EXTENSION);
    println!("  2. Run: widgetree check .");

    Ok(())
}

/// A toplevel window with a frame holding a label and a button
fn example_document(config: EditorConfig) -> Result<String> {
    let catalog = Arc::new(load_catalog(None)?);
    let mut session = EditSession::new(catalog, config);
    session.add_widget("tk.Toplevel")?;
    session.add_widget("ttk.Frame")?;
    session.add_widget("ttk.Label")?;
    session.add_widget("ttk.Button")?;
    Ok(session.to_document(None)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use widgetree_catalog::Catalog;

    #[test]
    fn test_example_document_loads() {
        let config = EditorConfig {
            default_layout_manager: Manager::Grid,
            ..EditorConfig::default()
        };
        let text = example_document(config.clone()).unwrap();

        let mut session = EditSession::new(Arc::new(Catalog::tk()), config);
        assert_eq!(session.load_document(&text).unwrap(), 1);
        assert_eq!(session.document().len(), 4);
        assert!(session.namespace().conflicts().is_empty());
        assert!(text.contains("\"button1\""));
    }
}
