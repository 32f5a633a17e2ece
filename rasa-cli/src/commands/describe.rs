use crate::extensions;
use anyhow::{Context, Result};
use rasa::persona::PersonaCatalog;
use rasa::registry::symbol_name;
use std::io::Write;

/// Prints a persona's configuration and an example invocation.
pub fn run(catalog: &PersonaCatalog, persona_name: &str, out: &mut impl Write) -> Result<()> {
    let persona = catalog
        .load(persona_name)
        .with_context(|| format!("could not load persona '{persona_name}'"))?;
    let package = extensions::package_for(persona.name());

    writeln!(out, "\nPersona: {}\n", persona.name())?;
    writeln!(out, "Description: {}", persona.description())?;
    writeln!(out, "Prompt Style: {}", persona.prompt_style())?;
    writeln!(out, "Memory Scope: {}", persona.memory_scope())?;
    writeln!(out, "Frames: {}", persona.frame_stage_names().join(", "))?;
    writeln!(out, "Operators: {}", persona.operator_stage_names().join(", "))?;
    writeln!(out, "Metadata: {}", serde_json::to_string(persona.metadata())?)?;

    if persona.extension_stage_names().is_empty() {
        writeln!(out, "Extension Stages: none")?;
    } else {
        writeln!(out, "Extension Stages:")?;
        for name in persona.extension_stage_names() {
            let provided = package
                .as_ref()
                .is_some_and(|package| package.get(name).is_some());
            let status = if provided { "" } else { " (not installed)" };
            writeln!(out, " - {name} ({}){status}", symbol_name(name))?;
        }
    }

    if let Some(package) = package.filter(|package| !package.description().is_empty()) {
        writeln!(out, "\nExtension Package '{}':", package.name())?;
        writeln!(out, "{}", package.description())?;
    }

    writeln!(out, "\nExample usage:")?;
    writeln!(
        out,
        "rasa run --persona {persona_name} --input \"<your prompt>\" --preferences key=value"
    )?;
    writeln!(out, "Repeat --preferences for each key=value pair.")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_describe_travel_concierge() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("travel_concierge")).unwrap();
        fs::write(
            root.path().join("travel_concierge/persona.yaml"),
            "name: travel_concierge\n\
             description: Finds trips\n\
             frames: [stateless_frame]\n\
             operators: [preference_agent, heuristic_agent]\n\
             domain_operators: [travel_heuristic_agent, missing_agent]\n",
        )
        .unwrap();

        let mut out = Vec::new();
        run(&PersonaCatalog::new(root.path()), "travel_concierge", &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Persona: travel_concierge"));
        assert!(text.contains("travel_heuristic_agent (TravelHeuristicAgent)\n"));
        assert!(text.contains("missing_agent (MissingAgent) (not installed)"));
        assert!(text.contains("region"));
        assert!(text.contains("\"tone\":\"default\""));
    }

    #[test]
    fn test_describe_unknown_persona() {
        let root = tempfile::tempdir().unwrap();
        let mut out = Vec::new();

        let err = run(&PersonaCatalog::new(root.path()), "ghost", &mut out).unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }
}
