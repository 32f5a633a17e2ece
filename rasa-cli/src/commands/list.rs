use anyhow::Result;
use rasa::persona::PersonaCatalog;
use std::io::Write;

/// Prints the personas found in the catalog.
pub fn run(catalog: &PersonaCatalog, out: &mut impl Write) -> Result<()> {
    let personas = catalog.list()?;

    if personas.is_empty() {
        writeln!(out, "No personas found in {}", catalog.apps_dir().display())?;
        return Ok(());
    }

    writeln!(out, "\nAvailable personas:")?;
    for persona in personas {
        writeln!(out, " - {persona}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_lists_personas() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("travel_concierge")).unwrap();
        fs::write(
            root.path().join("travel_concierge/persona.yaml"),
            "name: travel_concierge\nframes: [stateless_frame]\n",
        )
        .unwrap();

        let mut out = Vec::new();
        run(&PersonaCatalog::new(root.path()), &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\nAvailable personas:\n - travel_concierge\n"
        );
    }

    #[test]
    fn test_empty_catalog() {
        let root = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        run(&PersonaCatalog::new(root.path()), &mut out).unwrap();

        assert!(String::from_utf8(out).unwrap().starts_with("No personas found"));
    }
}
