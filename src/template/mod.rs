//! Template instantiation for project and gem creation.
//!
//! A template directory carries a `template.json` descriptor and a
//! `Template/` payload tree. Instantiation copies the payload into the
//! destination, substituting `${Name}` and `${NameLower}` in both relative
//! paths and UTF-8 file contents; non-text files are copied verbatim.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use walkdir::WalkDir;

use crate::manifest::Manifest;
use crate::models::{ObjectKind, TemplateDescriptor};
use crate::utils::{atomic_write, ensure_dir};

/// Name of the payload subtree inside a template directory.
pub const PAYLOAD_DIR: &str = "Template";

/// Token replaced with the new object's name.
pub const NAME_TOKEN: &str = "${Name}";

/// Token replaced with the lowercased name.
pub const NAME_LOWER_TOKEN: &str = "${NameLower}";

/// Find a registered template by name.
pub fn find_template(manifest: &Manifest, template_name: &str) -> Result<PathBuf> {
    for template_path in &manifest.templates {
        let Ok(template) = TemplateDescriptor::load(template_path) else {
            continue;
        };
        if template.template_name == template_name {
            return Ok(template_path.clone());
        }
    }
    Err(crate::core::O3deError::DescriptorNotFound {
        kind: ObjectKind::Template.to_string(),
        target: template_name.to_string(),
    }
    .into())
}

/// Instantiate `template_path`'s payload into `destination`.
///
/// The destination must not already exist; creation is all-or-nothing from
/// the caller's perspective in that a failed run can be deleted wholesale.
pub fn instantiate_template(template_path: &Path, destination: &Path, name: &str) -> Result<()> {
    TemplateDescriptor::load(template_path)?;
    let payload = template_path.join(PAYLOAD_DIR);
    if !payload.is_dir() {
        return Err(anyhow!(
            "Template at {} has no {PAYLOAD_DIR}/ payload directory",
            template_path.display()
        ));
    }
    if destination.exists() {
        return Err(anyhow!("Destination {} already exists", destination.display()));
    }
    ensure_dir(destination)?;

    let lower = name.to_lowercase();
    for entry in WalkDir::new(&payload).follow_links(false) {
        let entry = entry.context("Failed to walk template payload")?;
        let relative = entry
            .path()
            .strip_prefix(&payload)
            .context("Template walk escaped the payload root")?;
        if relative.as_os_str().is_empty() {
            continue;
        }
        let substituted = substitute(&relative.to_string_lossy(), name, &lower);
        let target = destination.join(substituted);

        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
            continue;
        }
        let raw = std::fs::read(entry.path())
            .with_context(|| format!("Failed to read {}", entry.path().display()))?;
        match String::from_utf8(raw) {
            Ok(text) => atomic_write(&target, substitute(&text, name, &lower).as_bytes())?,
            Err(raw) => atomic_write(&target, raw.as_bytes())?,
        }
    }
    Ok(())
}

fn substitute(input: &str, name: &str, lower: &str) -> String {
    input.replace(NAME_TOKEN, name).replace(NAME_LOWER_TOKEN, lower)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn template_fixture(temp: &TempDir) -> PathBuf {
        let template = temp.path().join("DefaultProject");
        let payload = template.join(PAYLOAD_DIR);
        std::fs::create_dir_all(payload.join("Code")).unwrap();
        std::fs::write(
            template.join("template.json"),
            r#"{"template_name": "DefaultProject"}"#,
        )
        .unwrap();
        std::fs::write(
            payload.join("project.json"),
            r#"{"project_name": "${Name}", "gem_names": []}"#,
        )
        .unwrap();
        std::fs::write(payload.join("Code").join("${NameLower}_module.cpp"), "// ${Name}\n")
            .unwrap();
        template
    }

    #[test]
    fn test_instantiate_substitutes_paths_and_contents() {
        let temp = TempDir::new().unwrap();
        let template = template_fixture(&temp);
        let dest = temp.path().join("MyGame");

        instantiate_template(&template, &dest, "MyGame").unwrap();

        let project_json = std::fs::read_to_string(dest.join("project.json")).unwrap();
        assert!(project_json.contains(r#""project_name": "MyGame""#));

        let module = dest.join("Code").join("mygame_module.cpp");
        assert!(module.is_file());
        assert_eq!(std::fs::read_to_string(module).unwrap(), "// MyGame\n");
    }

    #[test]
    fn test_instantiate_refuses_existing_destination() {
        let temp = TempDir::new().unwrap();
        let template = template_fixture(&temp);
        let dest = temp.path().join("taken");
        std::fs::create_dir_all(&dest).unwrap();

        assert!(instantiate_template(&template, &dest, "Taken").is_err());
    }

    #[test]
    fn test_instantiate_requires_payload_dir() {
        let temp = TempDir::new().unwrap();
        let template = temp.path().join("empty");
        std::fs::create_dir_all(&template).unwrap();
        std::fs::write(template.join("template.json"), r#"{"template_name": "empty"}"#).unwrap();

        let err = instantiate_template(&template, &temp.path().join("out"), "X").unwrap_err();
        assert!(err.to_string().contains(PAYLOAD_DIR));
    }

    #[test]
    fn test_find_template_by_name() {
        let temp = TempDir::new().unwrap();
        let template = template_fixture(&temp);

        let mut manifest = Manifest::default();
        manifest.templates.push(template.clone());

        assert_eq!(find_template(&manifest, "DefaultProject").unwrap(), template);
        assert!(find_template(&manifest, "Missing").is_err());
    }
}
